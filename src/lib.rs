//! Front end for a small Scheme-like language: a lexer and a recursive
//! descent parser with a fixed set of diagnostics.
//!
//! The parser is a pure function from a token stream to either a sequence
//! of [`parser::Expr`] nodes or a single error. There is no error recovery:
//! the first grammar violation aborts the parse, and the diagnostic it
//! carries identifies the exact production that was being parsed.
//!
//! ## Usage
//! ```
//! use scmfront::{parser, reader};
//!
//! let source = "(define (double x) (+ x x))";
//! let mut tokens = reader::TokenStream::new(source).peekable();
//! let program = parser::parse_program(&mut tokens).unwrap();
//! assert_eq!(program.len(), 1);
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod lexer;
pub mod parser;
pub mod reader;

use thiserror::Error;

pub use crate::parser::ParseError;

/// The toplevel error type for the crate
#[derive(Error, Debug)]
pub enum CompilerError {
    /// Indicates a lexing error
    ///
    /// `LexError` wraps around a `String` and two `usize`s. The first `usize` is the line number
    /// in the input, the second `usize` is the column number, and the `String` is a copy of the
    /// leftover unlexed input from the line.
    #[error("Error at line {1}, column {2}, near \"{0}\" while lexing input")]
    LexError(String, usize, usize),
    /// Indicates a syntax error raised by the parser
    #[error(transparent)]
    ParseError(#[from] ParseError),
}
