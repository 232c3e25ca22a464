//! Compiles a small regular-expression language into a Thompson NFA and
//! simulates it against input strings.
//!
//! ```
//! use reg_nfa::{Matcher, Regex};
//!
//! let regex = Regex::new("(ab)*|c").unwrap();
//! assert!(regex.is_match("abab"));
//! assert!(!regex.is_match("abc"));
//! ```

pub mod fsm;
pub mod matching;
pub mod parser;
pub mod utils;

pub use fsm::{compile, compile_pattern, Graph, ReError};
pub use matching::{Evaluator, Matcher, Regex, Trace};
pub use parser::{parse, ParserError};
