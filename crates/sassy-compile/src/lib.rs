#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
#![forbid(unsafe_code)]

pub mod builtins;
mod codegen;
mod error;
mod eval;
pub mod scope;
pub mod selector;

pub use builtins::{BuiltinError, BuiltinFn, Builtins};
pub use codegen::{compile, Compiler, Options};
pub use error::CompileError;
pub use eval::{format_number, Evaluator, Mode};
