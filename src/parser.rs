//! Module to parse a stream of `Token`s into `Expr`s by recursive descent.
//!
//! Every production carries its own diagnostic: the parser commits to a grammar rule as
//! soon as it has seen the rule's marker (a keyword, an opening paren), and from then on
//! any violation fails with the message belonging to that rule rather than a generic one.
//! The first error aborts the whole parse; there is no recovery and no partial result.

use std::collections::HashSet;
use std::fmt;
use std::iter::Peekable;

use lazy_static::lazy_static;
use thiserror::Error;

use crate::lexer::{LispNum, Token};
use crate::reader::TokenWithPosition;
use crate::CompilerError;

lazy_static! {
    static ref SPECIAL_FORMS: HashSet<&'static str> =
        ["define", "let"].iter().cloned().collect();
}

/// A syntax error raised at the first grammar violation
///
/// Each variant corresponds to exactly one committed grammar state; the `Display`
/// messages are a stable contract and must not be reworded.
#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    /// The token stream held nothing at all
    #[error("Program is empty.")]
    EmptyProgram,
    /// EOF inside a list not yet classified as a specific form
    #[error("Reached EOF while parsing a list.")]
    UnexpectedEofInList,
    /// EOF after the parse committed to a function call
    #[error("Reached EOF while parsing function call.")]
    UnexpectedEofInCall,
    /// EOF immediately after the `define` keyword
    #[error("Reached EOF while parsing a definition.")]
    UnexpectedEofInDefinition,
    /// A function definition head with no symbol in name position
    #[error("Missing function name in definition.")]
    MissingFunctionName,
    /// A variable definition whose first argument is not a symbol
    #[error("Expected symbol as first argument of define.")]
    ExpectedSymbolInDefine,
    /// A variable definition that closes before its value expression
    #[error("Missing expression in variable definition.")]
    MissingVarExpr,
    /// An expression was required and the stream ended
    #[error("Expected expression.")]
    ExpectedExpression,
    /// A non-symbol inside a parameter list
    #[error("Invalid expression in argument list. Only symbols are allowed.")]
    InvalidArgListExpr,
    /// A `let` binding with fewer than two elements
    #[error("Binding list must have exactly two elements: id, expression.")]
    BindingWrongArity,
    /// A `let` binding that does not start with a symbol
    #[error("First element of binding list must be a symbol.")]
    BindingNotSymbol,
    /// A body that closes without a single expression
    #[error("Missing expression in a body.")]
    MissingBodyExpr,
    /// EOF while a body still expected an expression or its closing paren
    #[error("Reached EOF while parsing a body.")]
    UnexpectedEofInBody,
    /// A specific token was required and something else was found
    #[error("Expected token \"{0}\".")]
    ExpectedToken(&'static str),
    /// A token that cannot start an atom, e.g. a stray closing paren
    #[error("Invalid token for an atom.")]
    InvalidAtomToken,
}

/// An enum representing the nodes of the abstract syntax tree
#[derive(Debug, PartialEq)]
pub enum Expr {
    /// Represents a symbol
    Symbol(String),
    /// Represents a `LispNum`
    Number(LispNum),
    /// Represents a string
    String(String),
    /// Represents a boolean
    Boolean(bool),
    /// Represents a list: an empty list, or a function call with the callee first
    List(Vec<Expr>),
    /// Represents a quoted `Expr`
    Quoted(Box<Expr>),
    /// Represents `(define name value)`
    DefineVar(String, Box<Expr>),
    /// Represents `(define (name params...) body...)` with a non-empty body
    DefineFunc(String, Vec<String>, Vec<Expr>),
    /// Represents `(let (bindings...) body...)` with a non-empty body
    Let(Vec<Binding>, Vec<Expr>),
}

/// A single `let` binding: exactly two sub-forms, an identifier and its value
#[derive(Debug, PartialEq)]
pub struct Binding {
    /// The bound identifier
    pub name: String,
    /// The expression it is bound to
    pub value: Expr,
}

/// Parses a whole program from the token stream
///
/// Returns the top-level expressions in source order, or the single error that aborted
/// the parse. An exhausted stream at the very start is rejected up front.
pub fn parse_program<I>(tokens: &mut Peekable<I>) -> Result<Vec<Expr>, CompilerError>
where
    I: Iterator<Item = Result<TokenWithPosition, CompilerError>>,
{
    if tokens.peek().is_none() {
        return Err(ParseError::EmptyProgram.into());
    }
    let mut program = Vec::new();
    while tokens.peek().is_some() {
        program.push(parse_expr(tokens)?);
    }
    Ok(program)
}

/// Parses a single `Expr` from the token stream
pub fn parse_expr<I>(tokens: &mut Peekable<I>) -> Result<Expr, CompilerError>
where
    I: Iterator<Item = Result<TokenWithPosition, CompilerError>>,
{
    match tokens.peek() {
        Some(Ok(with_position)) => match &with_position.token {
            Token::Symbol(_) | Token::Number(_) | Token::String(_) | Token::Boolean(_) => {
                parse_atom(tokens)
            }
            Token::Quote => {
                tokens.next();
                let quoted = parse_expr(tokens)?;
                Ok(Expr::Quoted(Box::new(quoted)))
            }
            Token::OpenParen => parse_list(tokens),
            Token::CloseParen => Err(ParseError::InvalidAtomToken.into()),
            Token::Whitespace | Token::Comment => {
                tokens.next();
                parse_expr(tokens)
            }
        },

        Some(Err(_)) => Err(tokens.next().unwrap().unwrap_err()),

        None => Err(ParseError::ExpectedExpression.into()),
    }
}

fn parse_atom<I>(tokens: &mut Peekable<I>) -> Result<Expr, CompilerError>
where
    I: Iterator<Item = Result<TokenWithPosition, CompilerError>>,
{
    let TokenWithPosition { token, .. } = tokens.next().unwrap()?;
    match token {
        Token::Symbol(s) => Ok(Expr::Symbol(s)),
        Token::Number(n) => Ok(Expr::Number(n)),
        Token::String(s) => Ok(Expr::String(s)),
        Token::Boolean(b) => Ok(Expr::Boolean(b)),
        _ => unreachable!(),
    }
}

/// Consumes a symbol the caller has already peeked
fn take_symbol<I>(tokens: &mut Peekable<I>) -> Result<String, CompilerError>
where
    I: Iterator<Item = Result<TokenWithPosition, CompilerError>>,
{
    match tokens.next().unwrap()? {
        TokenWithPosition {
            token: Token::Symbol(s),
            ..
        } => Ok(s),
        _ => unreachable!(),
    }
}

fn expect_open<I>(tokens: &mut Peekable<I>) -> Result<(), CompilerError>
where
    I: Iterator<Item = Result<TokenWithPosition, CompilerError>>,
{
    match tokens.next() {
        Some(Ok(with_position)) if with_position.token == Token::OpenParen => Ok(()),
        Some(Err(error)) => Err(error),
        _ => Err(ParseError::ExpectedToken("(").into()),
    }
}

fn expect_close<I>(tokens: &mut Peekable<I>) -> Result<(), CompilerError>
where
    I: Iterator<Item = Result<TokenWithPosition, CompilerError>>,
{
    match tokens.next() {
        Some(Ok(with_position)) if with_position.token == Token::CloseParen => Ok(()),
        Some(Err(error)) => Err(error),
        _ => Err(ParseError::ExpectedToken(")").into()),
    }
}

/// Parses the inside of a parenthesized form, the opening paren not yet consumed
///
/// The list is not committed to anything until its head is seen: EOF here is the
/// generic list diagnostic. A `define` or `let` head hands the rest of the paren
/// scope to the dedicated parser; any other head makes this a function call.
fn parse_list<I>(tokens: &mut Peekable<I>) -> Result<Expr, CompilerError>
where
    I: Iterator<Item = Result<TokenWithPosition, CompilerError>>,
{
    // Consuming the "("
    tokens.next();

    match tokens.peek() {
        Some(Ok(with_position)) => match &with_position.token {
            Token::CloseParen => {
                tokens.next();
                Ok(Expr::List(Vec::new()))
            }
            Token::Symbol(head) if SPECIAL_FORMS.contains(head.as_str()) => {
                let keyword = take_symbol(tokens)?;
                let form = if keyword == "define" {
                    parse_define(tokens)?
                } else {
                    parse_let(tokens)?
                };
                expect_close(tokens)?;
                Ok(form)
            }
            _ => parse_call(tokens),
        },

        Some(Err(_)) => Err(tokens.next().unwrap().unwrap_err()),

        None => Err(ParseError::UnexpectedEofInList.into()),
    }
}

fn parse_call<I>(tokens: &mut Peekable<I>) -> Result<Expr, CompilerError>
where
    I: Iterator<Item = Result<TokenWithPosition, CompilerError>>,
{
    let mut call = vec![parse_expr(tokens)?];

    loop {
        match tokens.peek() {
            Some(Ok(with_position)) => match &with_position.token {
                Token::CloseParen => {
                    tokens.next();
                    return Ok(Expr::List(call));
                }
                _ => {
                    call.push(parse_expr(tokens)?);
                }
            },

            Some(Err(_)) => {
                return Err(tokens.next().unwrap().unwrap_err());
            }

            None => {
                return Err(ParseError::UnexpectedEofInCall.into());
            }
        }
    }
}

/// Parses a definition, the `define` keyword already consumed
fn parse_define<I>(tokens: &mut Peekable<I>) -> Result<Expr, CompilerError>
where
    I: Iterator<Item = Result<TokenWithPosition, CompilerError>>,
{
    match tokens.peek() {
        Some(Ok(with_position)) => match &with_position.token {
            Token::OpenParen => {
                tokens.next();
                parse_define_func(tokens)
            }
            Token::Symbol(_) => {
                let name = take_symbol(tokens)?;
                parse_define_var(tokens, name)
            }
            _ => Err(ParseError::ExpectedSymbolInDefine.into()),
        },

        Some(Err(_)) => Err(tokens.next().unwrap().unwrap_err()),

        None => Err(ParseError::UnexpectedEofInDefinition.into()),
    }
}

fn parse_define_func<I>(tokens: &mut Peekable<I>) -> Result<Expr, CompilerError>
where
    I: Iterator<Item = Result<TokenWithPosition, CompilerError>>,
{
    // "no name at all" and "name is not a symbol" share one diagnostic
    let name = match tokens.peek() {
        Some(Ok(with_position)) => match &with_position.token {
            Token::Symbol(_) => take_symbol(tokens)?,
            _ => return Err(ParseError::MissingFunctionName.into()),
        },
        Some(Err(_)) => return Err(tokens.next().unwrap().unwrap_err()),
        None => return Err(ParseError::MissingFunctionName.into()),
    };

    let params = parse_param_list(tokens)?;
    let body = parse_body(tokens)?;
    Ok(Expr::DefineFunc(name, params, body))
}

fn parse_param_list<I>(tokens: &mut Peekable<I>) -> Result<Vec<String>, CompilerError>
where
    I: Iterator<Item = Result<TokenWithPosition, CompilerError>>,
{
    let mut params = Vec::new();

    loop {
        match tokens.peek() {
            Some(Ok(with_position)) => match &with_position.token {
                Token::CloseParen => {
                    tokens.next();
                    return Ok(params);
                }
                Token::Symbol(_) => {
                    params.push(take_symbol(tokens)?);
                }
                _ => {
                    return Err(ParseError::InvalidArgListExpr.into());
                }
            },

            Some(Err(_)) => {
                return Err(tokens.next().unwrap().unwrap_err());
            }

            // Parameter lists share the generic list diagnostic on EOF.
            None => {
                return Err(ParseError::UnexpectedEofInList.into());
            }
        }
    }
}

fn parse_define_var<I>(tokens: &mut Peekable<I>, name: String) -> Result<Expr, CompilerError>
where
    I: Iterator<Item = Result<TokenWithPosition, CompilerError>>,
{
    match tokens.peek() {
        Some(Ok(with_position)) if with_position.token == Token::CloseParen => {
            Err(ParseError::MissingVarExpr.into())
        }
        // EOF here surfaces as "Expected expression." out of parse_expr.
        _ => {
            let value = parse_expr(tokens)?;
            Ok(Expr::DefineVar(name, Box::new(value)))
        }
    }
}

/// Parses a `let` form, the `let` keyword already consumed
fn parse_let<I>(tokens: &mut Peekable<I>) -> Result<Expr, CompilerError>
where
    I: Iterator<Item = Result<TokenWithPosition, CompilerError>>,
{
    expect_open(tokens)?;
    let bindings = parse_bindings(tokens)?;
    let body = parse_body(tokens)?;
    Ok(Expr::Let(bindings, body))
}

fn parse_bindings<I>(tokens: &mut Peekable<I>) -> Result<Vec<Binding>, CompilerError>
where
    I: Iterator<Item = Result<TokenWithPosition, CompilerError>>,
{
    let mut bindings = Vec::new();

    loop {
        match tokens.peek() {
            Some(Ok(with_position)) => match &with_position.token {
                Token::CloseParen => {
                    tokens.next();
                    return Ok(bindings);
                }
                Token::OpenParen => {
                    tokens.next();
                    bindings.push(parse_binding(tokens)?);
                }
                _ => {
                    return Err(ParseError::ExpectedToken("(").into());
                }
            },

            Some(Err(_)) => {
                return Err(tokens.next().unwrap().unwrap_err());
            }

            // Binding lists share the generic list diagnostic on EOF.
            None => {
                return Err(ParseError::UnexpectedEofInList.into());
            }
        }
    }
}

fn parse_binding<I>(tokens: &mut Peekable<I>) -> Result<Binding, CompilerError>
where
    I: Iterator<Item = Result<TokenWithPosition, CompilerError>>,
{
    let name = match tokens.peek() {
        Some(Ok(with_position)) => match &with_position.token {
            Token::Symbol(_) => take_symbol(tokens)?,
            _ => return Err(ParseError::BindingNotSymbol.into()),
        },
        Some(Err(_)) => return Err(tokens.next().unwrap().unwrap_err()),
        None => return Err(ParseError::BindingNotSymbol.into()),
    };

    let value = match tokens.peek() {
        Some(Ok(with_position)) => match &with_position.token {
            Token::CloseParen => return Err(ParseError::BindingWrongArity.into()),
            _ => parse_expr(tokens)?,
        },
        Some(Err(_)) => return Err(tokens.next().unwrap().unwrap_err()),
        None => return Err(ParseError::UnexpectedEofInList.into()),
    };

    expect_close(tokens)?;
    Ok(Binding { name, value })
}

/// Parses a non-empty body, leaving the closing paren for the enclosing form
fn parse_body<I>(tokens: &mut Peekable<I>) -> Result<Vec<Expr>, CompilerError>
where
    I: Iterator<Item = Result<TokenWithPosition, CompilerError>>,
{
    let mut body = Vec::new();

    loop {
        match tokens.peek() {
            Some(Ok(with_position)) => match &with_position.token {
                Token::CloseParen => {
                    if body.is_empty() {
                        return Err(ParseError::MissingBodyExpr.into());
                    }
                    return Ok(body);
                }
                _ => {
                    body.push(parse_expr(tokens)?);
                }
            },

            Some(Err(_)) => {
                return Err(tokens.next().unwrap().unwrap_err());
            }

            None => {
                return Err(ParseError::UnexpectedEofInBody.into());
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Symbol(s) => write!(f, "{}", s),
            Expr::Number(n) => write!(f, "{}", n),
            Expr::String(s) => write!(
                f,
                "\"{}\"",
                s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
            ),
            Expr::Boolean(true) => write!(f, "#t"),
            Expr::Boolean(false) => write!(f, "#f"),
            Expr::Quoted(quoted) => write!(f, "'{}", quoted),
            Expr::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Expr::DefineVar(name, value) => write!(f, "(define {} {})", name, value),
            Expr::DefineFunc(name, params, body) => {
                write!(f, "(define ({}", name)?;
                for param in params {
                    write!(f, " {}", param)?;
                }
                write!(f, ")")?;
                for expr in body {
                    write!(f, " {}", expr)?;
                }
                write!(f, ")")
            }
            Expr::Let(bindings, body) => {
                write!(f, "(let (")?;
                for (i, binding) in bindings.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "({} {})", binding.name, binding.value)?;
                }
                write!(f, ")")?;
                for expr in body {
                    write!(f, " {}", expr)?;
                }
                write!(f, ")")
            }
        }
    }
}
