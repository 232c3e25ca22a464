use bitflags::bitflags;

pub static LITERAL_CHARS: &str =
    " abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!";
pub static SPECIAL_CHARS: &str = ".^$";
pub static MODIFIER_CHARS: &str = "*+?";

pub const GROUP_OPEN: char = '(';
pub const GROUP_CLOSE: char = ')';
pub const PIPE: char = '|';

bitflags! {
    /// Lexical classes of the pattern alphabet.
    pub struct TokenClass: u8 {
        const LITERAL = 1 << 0;
        const SPECIAL = 1 << 1;
        const MODIFIER = 1 << 2;
        const GROUP_OPEN = 1 << 3;
        const GROUP_CLOSE = 1 << 4;
        const PIPE = 1 << 5;
        const CHARACTER = Self::LITERAL.bits | Self::SPECIAL.bits;
    }
}

impl TokenClass {
    /// Classifies a single symbol; symbols outside the alphabet get an empty set.
    pub fn of(c: char) -> TokenClass {
        if LITERAL_CHARS.contains(c) {
            TokenClass::LITERAL
        } else if SPECIAL_CHARS.contains(c) {
            TokenClass::SPECIAL
        } else if MODIFIER_CHARS.contains(c) {
            TokenClass::MODIFIER
        } else {
            match c {
                GROUP_OPEN => TokenClass::GROUP_OPEN,
                GROUP_CLOSE => TokenClass::GROUP_CLOSE,
                PIPE => TokenClass::PIPE,
                _ => TokenClass::empty(),
            }
        }
    }
}
