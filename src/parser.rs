use colored::Colorize;
use nom::{
    branch::alt,
    character::complete::{anychar, satisfy},
    combinator::{map, map_opt, opt},
    multi::many1,
    sequence::{delimited, tuple},
    IResult,
};
use std::{error::Error, fmt::Display};

use crate::utils::{TokenClass, PIPE};

use self::visitor::Visitor;

// Character  ::= LITERAL | SPECIAL
// Modifier   ::= '*' | '+' | '?'
// Item       ::= Character | Group
// Group      ::= '(' Expression ')'
// Term       ::= Item Modifier? '|'?
// Expression ::= Term Expression | Term
// Start      ::= Expression?

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Character {
    Literal(char),
    Wildcard,
    StartAnchor,
    EndAnchor,
}

impl Character {
    pub fn from_symbol(symbol: char) -> Option<Character> {
        let class = TokenClass::of(symbol);
        if class.contains(TokenClass::LITERAL) {
            Some(Character::Literal(symbol))
        } else if class.contains(TokenClass::SPECIAL) {
            match symbol {
                '.' => Some(Character::Wildcard),
                '^' => Some(Character::StartAnchor),
                '$' => Some(Character::EndAnchor),
                _ => None,
            }
        } else {
            None
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Self::Literal(c) => *c,
            Self::Wildcard => '.',
            Self::StartAnchor => '^',
            Self::EndAnchor => '$',
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Modifier {
    ZeroOrMore,
    OneOrMore,
    ZeroOrOne,
}

impl Modifier {
    pub fn from_symbol(symbol: char) -> Option<Modifier> {
        if !TokenClass::of(symbol).contains(TokenClass::MODIFIER) {
            return None;
        }
        match symbol {
            '*' => Some(Modifier::ZeroOrMore),
            '+' => Some(Modifier::OneOrMore),
            '?' => Some(Modifier::ZeroOrOne),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Self::ZeroOrMore => '*',
            Self::OneOrMore => '+',
            Self::ZeroOrOne => '?',
        }
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum Item {
    Character(Character),
    Group(Group),
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Group(pub Box<Expression>);

/// An item with its optional modifier.
///
/// Alternation is recorded on the term that precedes the `|`, not as a node
/// of its own: `ab|c` is `a` followed by the alternation of `b` and `c`.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Term {
    pub item: Item,
    pub modifier: Option<Modifier>,
    pub precedes_pipe: bool,
}

impl Term {
    pub fn new(item: Item, modifier: Option<Modifier>) -> Term {
        Term {
            item,
            modifier,
            precedes_pipe: false,
        }
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Expression {
    pub term: Term,
    pub next: Option<Box<Expression>>,
}

impl Expression {
    pub fn new(term: Term, next: Option<Expression>) -> Expression {
        Expression {
            term,
            next: next.map(Box::new),
        }
    }

    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        std::iter::successors(Some(self), |expression| expression.next.as_deref())
            .map(|expression| &expression.term)
    }
}

impl Drop for Expression {
    fn drop(&mut self) {
        // unlink the chain so long patterns are freed without recursion
        let mut next = self.next.take();
        while let Some(mut expression) = next {
            next = expression.next.take();
        }
    }
}

/// Root of a parsed pattern; `None` for the empty pattern.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Start(pub Option<Expression>);

/// Any node of the syntax tree, one variant per grammar production.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum Node {
    Start(Start),
    Expression(Expression),
    Term(Term),
    Item(Item),
    Group(Group),
    Character(Character),
    Modifier(Modifier),
}

pub(crate) trait Data {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Result;
}

impl Data for Start {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Result {
        visitor.visit_start(self)
    }
}

impl Data for Expression {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Result {
        visitor.visit_expression(self)
    }
}

impl Data for Term {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Result {
        visitor.visit_term(self)
    }
}

impl Data for Item {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Result {
        match self {
            Self::Character(character) => visitor.visit_character(character),
            Self::Group(group) => visitor.visit_group(group),
        }
    }
}

impl Data for Group {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Result {
        visitor.visit_group(self)
    }
}

impl Data for Character {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Result {
        visitor.visit_character(self)
    }
}

impl Display for Character {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl Display for Modifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Character(character) => write!(f, "{}", character),
            Self::Group(group) => write!(f, "{}", group),
        }
    }
}

impl Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.0)
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.item)?;
        if let Some(modifier) = self.modifier {
            write!(f, "{}", modifier)?;
        }
        if self.precedes_pipe {
            write!(f, "{}", PIPE)?;
        }
        Ok(())
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.terms().try_for_each(|term| write!(f, "{}", term))
    }
}

impl Display for Start {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(expression) => write!(f, "{}", expression),
            None => Ok(()),
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start(node) => write!(f, "{}", node),
            Self::Expression(node) => write!(f, "{}", node),
            Self::Term(node) => write!(f, "{}", node),
            Self::Item(node) => write!(f, "{}", node),
            Self::Group(node) => write!(f, "{}", node),
            Self::Character(node) => write!(f, "{}", node),
            Self::Modifier(node) => write!(f, "{}", node),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    /// The grammar stopped before the end of the pattern.
    SuffixRemaining { parsed: String, remaining: String },
}

impl ParserError {
    pub fn parsed(&self) -> &str {
        match self {
            Self::SuffixRemaining { parsed, .. } => parsed,
        }
    }

    pub fn remaining(&self) -> &str {
        match self {
            Self::SuffixRemaining { remaining, .. } => remaining,
        }
    }

    /// Offset, in characters, of the first symbol that could not be parsed.
    pub fn position(&self) -> usize {
        self.parsed().chars().count()
    }
}

impl Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SuffixRemaining { parsed, remaining } => write!(
                f,
                "{} {}:\n | {}{}\n | {}{}",
                format!("[{:0>3}]", 1).red().bold(),
                "failed to parse pattern",
                parsed,
                remaining.red(),
                " ".repeat(self.position()),
                "^".green()
            ),
        }
    }
}

impl Error for ParserError {}

fn token<'a>(class: TokenClass) -> impl FnMut(&'a str) -> IResult<&'a str, char> {
    satisfy(move |c| TokenClass::of(c).intersects(class))
}

pub fn character(tokens: &str) -> IResult<&str, Character> {
    map_opt(anychar, Character::from_symbol)(tokens)
}

pub fn modifier(tokens: &str) -> IResult<&str, Modifier> {
    map_opt(anychar, Modifier::from_symbol)(tokens)
}

pub fn item(tokens: &str) -> IResult<&str, Item> {
    alt((map(character, Item::Character), map(group, Item::Group)))(tokens)
}

pub fn group(tokens: &str) -> IResult<&str, Group> {
    map(
        delimited(
            token(TokenClass::GROUP_OPEN),
            expression,
            token(TokenClass::GROUP_CLOSE),
        ),
        |inner| Group(Box::new(inner)),
    )(tokens)
}

pub fn term(tokens: &str) -> IResult<&str, Term> {
    map(
        tuple((item, opt(modifier), opt(token(TokenClass::PIPE)))),
        |(parsed_item, parsed_modifier, pipe)| Term {
            item: parsed_item,
            modifier: parsed_modifier,
            precedes_pipe: pipe.is_some(),
        },
    )(tokens)
}

pub fn expression(tokens: &str) -> IResult<&str, Expression> {
    map_opt(many1(term), |terms| {
        terms
            .into_iter()
            .rev()
            .fold(None, |next, head| Some(Expression::new(head, next)))
    })(tokens)
}

pub fn start(tokens: &str) -> IResult<&str, Start> {
    map(opt(expression), Start)(tokens)
}

/// Parses a whole pattern, failing if any suffix is left unparsed.
pub fn parse(pattern: &str) -> Result<Start, ParserError> {
    let remaining = match start(pattern) {
        Ok((remaining, root)) if remaining.is_empty() => return Ok(root),
        Ok((remaining, _)) => remaining,
        Err(_) => pattern,
    };
    Err(ParserError::SuffixRemaining {
        parsed: pattern[..pattern.len() - remaining.len()].to_string(),
        remaining: remaining.to_string(),
    })
}

pub mod visitor {
    use super::{Character, Expression, Group, Start, Term};

    pub trait Visitor {
        type Result;
        fn visit_start(&mut self, start: &Start) -> Self::Result;
        fn visit_expression(&mut self, expression: &Expression) -> Self::Result;
        fn visit_term(&mut self, term: &Term) -> Self::Result;
        fn visit_group(&mut self, group: &Group) -> Self::Result;
        fn visit_character(&mut self, character: &Character) -> Self::Result;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(c: char) -> Term {
        Term::new(Item::Character(Character::Literal(c)), None)
    }

    fn sequence(terms: Vec<Term>) -> Expression {
        terms
            .into_iter()
            .rev()
            .fold(None, |next, term| Some(Expression::new(term, next)))
            .expect("at least one term")
    }

    #[test]
    fn test_character() {
        assert!(character("").is_err());
        assert_eq!(character("a"), Ok(("", Character::Literal('a'))));
        assert_eq!(character("abc"), Ok(("bc", Character::Literal('a'))));
        assert_eq!(character("777"), Ok(("77", Character::Literal('7'))));
        assert_eq!(character("."), Ok(("", Character::Wildcard)));
        assert_eq!(character("^"), Ok(("", Character::StartAnchor)));
        assert_eq!(character("$"), Ok(("", Character::EndAnchor)));
        assert_eq!(character(" !"), Ok(("!", Character::Literal(' '))));
        assert!(character("&").is_err());
        assert!(character("(").is_err());
    }

    #[test]
    fn test_modifier() {
        assert!(modifier("").is_err());
        assert_eq!(modifier("*"), Ok(("", Modifier::ZeroOrMore)));
        assert_eq!(modifier("+"), Ok(("", Modifier::OneOrMore)));
        assert_eq!(modifier("?"), Ok(("", Modifier::ZeroOrOne)));
        assert_eq!(modifier("*abc"), Ok(("abc", Modifier::ZeroOrMore)));
        assert!(modifier("7").is_err());
    }

    #[test]
    fn test_item() {
        assert!(item("").is_err());
        assert_eq!(
            item("abc"),
            Ok(("bc", Item::Character(Character::Literal('a'))))
        );
        assert_eq!(
            item("7*"),
            Ok(("*", Item::Character(Character::Literal('7'))))
        );
        assert_eq!(
            item("(a)"),
            Ok((
                "",
                Item::Group(Group(Box::new(Expression::new(literal('a'), None))))
            ))
        );
    }

    #[test]
    fn test_group() {
        assert!(group("").is_err());
        assert!(group("(foo").is_err());
        assert!(group("bar)").is_err());
        assert!(group("()").is_err());
        assert_eq!(
            group("(0)"),
            Ok(("", Group(Box::new(Expression::new(literal('0'), None)))))
        );
    }

    #[test]
    fn test_term() {
        assert!(term("").is_err());
        assert!(term("*").is_err());
        assert_eq!(term("a"), Ok(("", literal('a'))));
        assert_eq!(
            term("a*"),
            Ok((
                "",
                Term::new(
                    Item::Character(Character::Literal('a')),
                    Some(Modifier::ZeroOrMore)
                )
            ))
        );
        let (remaining, piped) = term("a?|b").unwrap();
        assert_eq!(remaining, "b");
        assert_eq!(piped.modifier, Some(Modifier::ZeroOrOne));
        assert!(piped.precedes_pipe);
    }

    #[test]
    fn test_expression() {
        assert!(expression("").is_err());
        assert!(expression("*").is_err());
        assert_eq!(
            expression("a"),
            Ok(("", Expression::new(literal('a'), None)))
        );
        assert_eq!(
            expression("ab"),
            Ok(("", sequence(vec![literal('a'), literal('b')])))
        );
        let grouped = Term::new(
            Item::Group(Group(Box::new(sequence(vec![literal('a'), literal('b')])))),
            Some(Modifier::OneOrMore),
        );
        assert_eq!(
            expression("(ab)+c"),
            Ok(("", sequence(vec![grouped, literal('c')])))
        );
        assert_eq!(
            expression("ab)"),
            Ok((")", sequence(vec![literal('a'), literal('b')])))
        );
    }

    #[test]
    fn test_start() {
        assert_eq!(start(""), Ok(("", Start(None))));
        assert_eq!(
            start("a"),
            Ok(("", Start(Some(Expression::new(literal('a'), None)))))
        );
        assert_eq!(start("&"), Ok(("&", Start(None))));
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse(""), Ok(Start(None)));
    }

    #[test]
    fn test_parse_unparsable() {
        let err = parse("&%foo").unwrap_err();
        assert_eq!(err.parsed(), "");
        assert_eq!(err.remaining(), "&%foo");
        assert_eq!(err.position(), 0);

        let err = parse("ab&c").unwrap_err();
        assert_eq!(
            err,
            ParserError::SuffixRemaining {
                parsed: "ab".to_string(),
                remaining: "&c".to_string()
            }
        );
        assert_eq!(err.position(), 2);
        assert!(err.to_string().contains("failed to parse pattern"));

        assert_eq!(parse("a||b").unwrap_err().remaining(), "|b");
        assert_eq!(parse("(ab").unwrap_err().remaining(), "(ab");
        assert_eq!(parse("a)").unwrap_err().parsed(), "a");
    }

    #[test]
    fn test_pipe_marks_preceding_term() {
        let root = parse("ab|c").unwrap();
        let flags: Vec<bool> = root
            .0
            .as_ref()
            .unwrap()
            .terms()
            .map(|term| term.precedes_pipe)
            .collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[test]
    fn test_parse_long_pattern() {
        let pattern = "ab".repeat(10_000);
        let root = parse(&pattern).unwrap();
        let expression = root.0.as_ref().unwrap();
        assert_eq!(expression.terms().count(), 20_000);
        assert_eq!(root.to_string(), pattern);

        let groups = "(a)".repeat(5_000);
        assert_eq!(parse(&groups).unwrap().to_string(), groups);
    }

    #[test]
    fn test_display_reproduces_pattern() {
        for pattern in ["", "hi.", "(ab)*|c", "^0*|1*$", "(he)*lo*l", "((a)?b)+", "a|"] {
            assert_eq!(parse(pattern).unwrap().to_string(), pattern);
        }
        assert_eq!(Node::Modifier(Modifier::OneOrMore).to_string(), "+");
    }
}
