//! Handles reading source files, and annotating tokens with line and column numbers
use std::fs;
use std::io;

use crate::lexer::{lex_token, Token};
use crate::CompilerError;

/// Wrapper around `Token` that keeps track of line and column
///
/// The parser only ever needs the positions to survive lexing; its own diagnostics are
/// position-free by contract.
#[derive(Debug, PartialEq, Clone)]
pub struct TokenWithPosition {
    /// The classified token
    pub token: Token,
    /// Line number in input, starting at zero
    pub line: usize,
    /// Column number in input, starting at zero
    pub column: usize,
}

/// Iterator of `Token`s that maintains position state
///
/// Whitespace and comments are consumed here and never yielded, so consumers only see
/// significant tokens. A stretch of input no lexer accepts yields a single
/// [`CompilerError::LexError`] and ends the stream.
#[derive(Debug)]
pub struct TokenStream<'a> {
    input_slice: &'a str,
    line: usize,
    column: usize,
}

impl<'a> TokenStream<'a> {
    /// Creates a new `TokenStream` from a string slice
    pub fn new(input: &'a str) -> TokenStream<'a> {
        TokenStream {
            input_slice: input,
            line: 0,
            column: 0,
        }
    }

    /// Checks whether any more input is left
    pub fn is_empty(&self) -> bool {
        self.input_slice.is_empty()
    }
}

impl<'a> Iterator for TokenStream<'a> {
    type Item = Result<TokenWithPosition, CompilerError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.input_slice.is_empty() {
                return None;
            }
            match lex_token(self.input_slice) {
                Ok((leftover, token)) => {
                    let consumed_len = self.input_slice.len() - leftover.len();
                    let (line, column) = (self.line, self.column);
                    for c in self.input_slice[..consumed_len].chars() {
                        if c == '\n' {
                            self.line += 1;
                            self.column = 0;
                        } else {
                            self.column += 1;
                        }
                    }
                    self.input_slice = leftover;
                    match token {
                        Token::Whitespace | Token::Comment => continue,
                        token => return Some(Ok(TokenWithPosition { token, line, column })),
                    }
                }
                Err(_) => {
                    let near = self.input_slice.lines().next().unwrap_or("").to_string();
                    let error = CompilerError::LexError(near, self.line, self.column);
                    // Fuse the stream; one lexing error is all we report.
                    self.input_slice = "";
                    return Some(Err(error));
                }
            }
        }
    }
}

/// Owns the contents of a source file and lexes them on demand
#[derive(Debug)]
pub struct FileLexer {
    source: String,
}

impl FileLexer {
    /// Creates a new `FileLexer` by reading the file at `path` into memory
    pub fn new(path: &str) -> io::Result<FileLexer> {
        let source = fs::read_to_string(path)?;
        Ok(FileLexer { source })
    }

    /// Returns a [`TokenStream`] over the file contents
    pub fn tokens(&self) -> TokenStream<'_> {
        TokenStream::new(&self.source)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::LispNum;

    #[test]
    fn annotates_positions() {
        let tokens: Vec<TokenWithPosition> = TokenStream::new("(define x 10)\n(display x)")
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            tokens[0],
            TokenWithPosition {
                token: Token::OpenParen,
                line: 0,
                column: 0,
            }
        );
        assert_eq!(
            tokens[2],
            TokenWithPosition {
                token: Token::Symbol(String::from("x")),
                line: 0,
                column: 8,
            }
        );
        assert_eq!(
            tokens[5],
            TokenWithPosition {
                token: Token::OpenParen,
                line: 1,
                column: 0,
            }
        );
    }

    #[test]
    fn skips_trivia() {
        let tokens: Vec<TokenWithPosition> = TokenStream::new("  ; comment\n 42 ")
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token, Token::Number(LispNum::Integer(42)));
        assert_eq!(tokens[0].line, 1);
    }

    #[test]
    fn trivia_only_input_is_an_empty_stream() {
        let mut stream = TokenStream::new(" \n; nothing to see\n");
        assert!(stream.next().is_none());
    }

    #[test]
    fn reports_lexing_errors_and_fuses() {
        let mut stream = TokenStream::new("(define #q 5)");
        assert_eq!(stream.next().unwrap().unwrap().token, Token::OpenParen);
        assert_eq!(
            stream.next().unwrap().unwrap().token,
            Token::Symbol(String::from("define"))
        );
        match stream.next().unwrap() {
            Err(CompilerError::LexError(near, line, column)) => {
                assert_eq!(near, "#q 5)");
                assert_eq!(line, 0);
                assert_eq!(column, 8);
            }
            other => panic!("expected a lexing error, got {:?}", other),
        }
        assert!(stream.next().is_none());
    }
}
