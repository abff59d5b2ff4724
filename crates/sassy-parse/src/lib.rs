#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]

mod parser;
pub mod scanner;
pub mod selector;
pub mod token;
mod values;

pub use parser::{parse_str, parse_with_mode};
pub use scanner::{ScanMode, Scanner};
pub use token::{Tok, TokKind};

/// Scan `src` to completion. The last token is always `Eof`; an `Error`
/// token, if any, comes right before it.
pub fn tokenize(src: &str, mode: ScanMode) -> Vec<Tok> {
    Scanner::new(src).with_mode(mode).collect()
}
