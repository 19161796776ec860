//! Module to lex the input stream and return a stream of tokens
use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag},
    character::complete::{digit0, digit1, none_of, one_of, satisfy},
    combinator::{map, opt, peek, recognize, value},
    error::ErrorKind,
    multi::{many0, many1},
    sequence::tuple,
    IResult,
};

use nom::error::Error as NomErrorStruct;
use nom::Err::Error as NomErrorEnum;

/// Type alias for the common return type for the lexers
type LexResult<'a> = IResult<&'a str, Token, NomErrorStruct<&'a str>>;

/// Terminal token types for the lexer
///
/// The variants of `Token` wrap around the corresponding Rust types in the case of `String`,
/// `Boolean`, and `Symbol`. `Number` wraps around `LispNum`, which can either be an `i64`
/// or an `f64`. The parentheses and the quote mark get their own variants since the parser
/// dispatches on them individually. `Whitespace` and `Comment` are trivia: the lexer produces
/// them but the [`reader`](crate::reader) drops them before the parser ever looks.
#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    /// Wraps a string literal
    String(String),
    /// Wraps a boolean (`#t` or `#f`)
    Boolean(bool),
    /// Wraps a number
    Number(LispNum),
    /// Wraps a symbol name
    Symbol(String),
    /// An opening parenthesis
    OpenParen,
    /// A closing parenthesis
    CloseParen,
    /// A quote mark `'`
    Quote,
    /// Represents whitespace
    Whitespace,
    /// Represents comments
    Comment,
}

/// Internal representation of numeric types in the language
///
/// `LispNum` is an enum wrapping around Rust's `i64` and `f64` types; the only two numeric
/// types the language currently has.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum LispNum {
    /// Wraps an `i64`
    Integer(i64),
    /// Wraps an `f64`
    Float(f64),
}

impl fmt::Display for LispNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // {:?} keeps the decimal point on round floats
            LispNum::Integer(n) => write!(f, "{}", n),
            LispNum::Float(x) => write!(f, "{:?}", x),
        }
    }
}

/// Lexes a single token off the front of the input
pub fn lex_token(input: &str) -> LexResult<'_> {
    alt((
        lex_string,
        lex_boolean,
        lex_symbol,
        lex_number,
        lex_punctuator,
        lex_whitespace,
        lex_comment,
    ))(input)
}

fn lex_string(input: &str) -> LexResult<'_> {
    let (input, _) = tag("\"")(input)?;
    let (leftover, parsed) = escaped_transform(
        is_not("\\\""),
        '\\',
        alt((
            value("\\", tag("\\")),
            value("\"", tag("\"")),
            value("\n", tag("n")),
        )),
    )(input)?;
    let (input, _) = tag("\"")(leftover)?;
    Ok((input, Token::String(parsed)))
}

fn lex_boolean(input: &str) -> LexResult<'_> {
    let (input, _) = tag("#")(input)?;
    let (leftover, parsed) = one_of("tf")(input)?;
    match parsed {
        't' => Ok((leftover, Token::Boolean(true))),
        'f' => Ok((leftover, Token::Boolean(false))),
        _ => Err(NomErrorEnum(NomErrorStruct::new(input, ErrorKind::OneOf))),
    }
}

fn peek_delimiter(input: &str) -> IResult<&str, ()> {
    // End of input delimits a token just as well as whitespace does.
    if input.is_empty() {
        return Ok((input, ()));
    }
    let whitespace = one_of(" \n\t\r");
    let delimiter = alt((whitespace, one_of("()\";'")));
    map(peek(delimiter), |_: char| ())(input)
}

fn non_peculiar(input: &str) -> IResult<&str, &str> {
    let special_initial = one_of("!$%&*/:<=>?^_~");
    let letter = satisfy(|c| c.is_alphabetic());
    let initial = alt((letter, special_initial));
    let digit = satisfy(|c| c.is_numeric());
    let special_subsequent = one_of("+-.@");
    let subsequent = alt((initial, digit, special_subsequent));

    // The repeated code is to get around the compiler's move semantics.
    let special_initial = one_of("!$%&*/:<=>?^_~");
    let letter = satisfy(|c| c.is_alphabetic());
    let initial = alt((letter, special_initial));

    recognize(tuple((initial, many0(subsequent))))(input)
}

fn lex_symbol(input: &str) -> LexResult<'_> {
    let peculiar_identifier = alt((tag("+"), tag("-"), tag("...")));
    let (leftover, parsed) = alt((non_peculiar, peculiar_identifier))(input)?;
    peek_delimiter(leftover)?;
    Ok((leftover, Token::Symbol(parsed.to_string())))
}

fn lex_number(input: &str) -> LexResult<'_> {
    let integer_parser = tuple((opt(one_of("+-")), digit1));
    let float_parser =
        tuple::<_, _, (_, ErrorKind), _>((opt(one_of("+-")), digit0, tag("."), digit1));
    // Note that one needs to annotate the tuple function in this case because the compiler
    // is unable to infer the return type.
    if let Ok((l, p)) = recognize(float_parser)(input) {
        if let Ok(num) = p.parse() {
            Ok((l, Token::Number(LispNum::Float(num))))
        } else {
            Err(NomErrorEnum(NomErrorStruct::new(l, ErrorKind::TooLarge)))
        }
    } else {
        let (l, p) = recognize(integer_parser)(input)?;
        if let Ok(num) = p.parse() {
            Ok((l, Token::Number(LispNum::Integer(num))))
        } else {
            Err(NomErrorEnum(NomErrorStruct::new(l, ErrorKind::TooLarge)))
        }
    }
}

fn lex_punctuator(input: &str) -> LexResult<'_> {
    alt((
        value(Token::OpenParen, tag("(")),
        value(Token::CloseParen, tag(")")),
        value(Token::Quote, tag("'")),
    ))(input)
}

fn lex_whitespace(input: &str) -> LexResult<'_> {
    many1(one_of(" \t\r\n"))(input).map(|(l, _)| (l, Token::Whitespace))
}

fn lex_comment(input: &str) -> LexResult<'_> {
    let ends_with_newline = recognize(tuple((tag(";"), many0(none_of("\n")), tag("\n"))));
    let ends_without_newline = recognize(tuple((tag(";"), many0(none_of("\n")))));
    alt((ends_with_newline, ends_without_newline))(input).map(|(l, _)| (l, Token::Comment))
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn lex_string_test() {
        assert_eq!(
            lex_string(r#""string""#),
            Ok(("", Token::String(String::from("string"))))
        );
        assert_eq!(
            lex_string(r#""st\"ring""#),
            Ok(("", Token::String(String::from("st\"ring"))))
        );
        assert_eq!(
            lex_string(r#""fail"#),
            Err(NomErrorEnum(NomErrorStruct::new("", ErrorKind::Tag)))
        );
        assert_eq!(
            lex_string(r#""new\nline""#),
            Ok(("", Token::String(String::from("new\nline"))))
        );
        assert_eq!(
            lex_string(r#"blah"string""#),
            Err(NomErrorEnum(NomErrorStruct::new(
                "blah\"string\"",
                ErrorKind::Tag
            )))
        );
    }

    #[test]
    fn lex_boolean_test() {
        assert_eq!(lex_boolean("#t"), Ok(("", Token::Boolean(true))));
        assert_eq!(lex_boolean("#f"), Ok(("", Token::Boolean(false))));
        assert_eq!(
            lex_boolean("#m"),
            Err(NomErrorEnum(NomErrorStruct::new("m", ErrorKind::OneOf)))
        );
    }

    #[test]
    fn non_peculiar_symbol_test() {
        assert_eq!(non_peculiar("a"), Ok(("", "a")));
        assert_eq!(non_peculiar("a+"), Ok(("", "a+")));
        assert_eq!(non_peculiar("&a+"), Ok(("", "&a+")));
        assert_eq!(
            non_peculiar("+&a+"),
            Err(NomErrorEnum(NomErrorStruct::new("+&a+", ErrorKind::OneOf)))
        );
    }

    #[test]
    fn lex_symbol_test() {
        assert_eq!(
            lex_symbol("var\n"),
            Ok(("\n", Token::Symbol(String::from("var"))))
        );
        assert_eq!(
            lex_symbol("var "),
            Ok((" ", Token::Symbol(String::from("var"))))
        );
        assert_eq!(
            lex_symbol("var)"),
            Ok((")", Token::Symbol(String::from("var"))))
        );
        // End of input terminates a symbol.
        assert_eq!(lex_symbol("var"), Ok(("", Token::Symbol(String::from("var")))));
        assert_eq!(lex_symbol("..."), Ok(("", Token::Symbol(String::from("...")))));
        assert_eq!(lex_symbol("+ "), Ok((" ", Token::Symbol(String::from("+")))));
        assert_eq!(
            lex_symbol("he++o "),
            Ok((" ", Token::Symbol(String::from("he++o"))))
        );
        assert_eq!(
            lex_symbol("set! "),
            Ok((" ", Token::Symbol(String::from("set!"))))
        );
        assert_eq!(
            lex_symbol("+3.14"),
            Err(NomErrorEnum(NomErrorStruct::new("3.14", ErrorKind::OneOf)))
        );
    }

    #[test]
    fn lex_number_test() {
        assert_eq!(
            lex_number("+3.14;"),
            Ok((";", Token::Number(LispNum::Float(3.14))))
        );
        assert_eq!(
            lex_number("-3.14;"),
            Ok((";", Token::Number(LispNum::Float(-3.14))))
        );
        assert_eq!(
            lex_number("3.14;"),
            Ok((";", Token::Number(LispNum::Float(3.14))))
        );
        assert_eq!(
            lex_number(".14;"),
            Ok((";", Token::Number(LispNum::Float(0.14))))
        );
        assert_eq!(
            lex_number("1;"),
            Ok((";", Token::Number(LispNum::Integer(1))))
        );
        assert_eq!(
            lex_number("-1;"),
            Ok((";", Token::Number(LispNum::Integer(-1))))
        );
        assert_eq!(
            lex_number("99999999999999999999;"),
            Err(NomErrorEnum(NomErrorStruct::new(";", ErrorKind::TooLarge)))
        );
    }

    #[test]
    fn lex_punctuator_test() {
        assert_eq!(lex_punctuator("(a"), Ok(("a", Token::OpenParen)));
        assert_eq!(lex_punctuator(")"), Ok(("", Token::CloseParen)));
        assert_eq!(lex_punctuator("'x"), Ok(("x", Token::Quote)));
    }

    #[test]
    fn lex_whitespace_test() {
        assert_eq!(lex_whitespace(" 3"), Ok(("3", Token::Whitespace)));
        assert_eq!(lex_whitespace(" \n3"), Ok(("3", Token::Whitespace)));
        assert_eq!(lex_whitespace("\t3"), Ok(("3", Token::Whitespace)));
    }

    #[test]
    fn lex_comment_test() {
        assert_eq!(lex_comment("; Blah"), Ok(("", Token::Comment)));
        assert_eq!(lex_comment("; Blah\n3"), Ok(("3", Token::Comment)));
    }

    #[test]
    fn display_number_test() {
        assert_eq!(LispNum::Integer(42).to_string(), "42");
        assert_eq!(LispNum::Float(3.14).to_string(), "3.14");
        assert_eq!(LispNum::Float(2.0).to_string(), "2.0");
    }
}
