//! Tokenizer that converts a mathematical expression in a string form into a series of `Token`s.
//!
//! The underlying parser is built using the [nom] parser combinator crate: there is one small
//! combinator per token class and [`Tokens`] drives them lazily over the input.
//!
//! The tokenizer only knows about lexemes. Whether the tokens form a well-formed expression is
//! decided by the [parser](../parser/index.html).
//!
//! [nom]: https://crates.io/crates/nom
use std::fmt;
use std::iter::FusedIterator;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit0, digit1, one_of, satisfy},
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    error::ErrorKind,
    sequence::{pair, tuple},
    IResult,
};
use thiserror::Error;

type ParseResult<'a, T> = IResult<&'a str, T, (&'a str, ErrorKind)>;

/// An unrecognized character in the source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unexpected character `{ch}` at position {position}")]
pub struct LexError {
    /// The offending character.
    pub ch: char,
    /// Byte offset of the offending character.
    pub position: usize,
}

/// Mathematical operations.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Operation {
    Plus,
    Minus,
    Times,
    Div,
    Rem,
    Pow,
}

impl Operation {
    pub fn symbol(self) -> &'static str {
        match self {
            Operation::Plus => "+",
            Operation::Minus => "-",
            Operation::Times => "*",
            Operation::Div => "/",
            Operation::Rem => "%",
            Operation::Pow => "**",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// What a token is.
#[derive(Debug, PartialEq, Clone)]
pub enum TokenKind {
    /// A number.
    Number(f64),
    /// A constant or function name.
    Ident(String),
    /// An operator; whether it is binary or unary is up to the parser.
    Op(Operation),
    /// Left parenthesis.
    LParen,
    /// Right parenthesis.
    RParen,
    /// Comma: function argument separator.
    Comma,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "number `{}`", n),
            TokenKind::Ident(name) => write!(f, "identifier `{}`", name),
            TokenKind::Op(op) => write!(f, "`{}`", op),
            TokenKind::LParen => f.write_str("`(`"),
            TokenKind::RParen => f.write_str("`)`"),
            TokenKind::Comma => f.write_str("`,`"),
        }
    }
}

/// Expression token together with the byte offset where it starts.
#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

fn operation(i: &str) -> ParseResult<'_, Operation> {
    // `**` has to win over `*`
    alt((
        value(Operation::Pow, tag("**")),
        value(Operation::Plus, char('+')),
        value(Operation::Minus, char('-')),
        value(Operation::Times, char('*')),
        value(Operation::Div, char('/')),
        value(Operation::Rem, char('%')),
    ))(i)
}

fn ident(i: &str) -> ParseResult<'_, &str> {
    recognize(pair(
        satisfy(|c| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(i)
}

/// Decimal number with an optional exponent. Signs are left to the parser.
///
/// An exponent marker without digits is not consumed, so `2e` is the number `2` followed by
/// the identifier `e`.
fn number(i: &str) -> ParseResult<'_, f64> {
    map_res(
        recognize(pair(
            alt((
                recognize(pair(digit1, opt(pair(char('.'), digit0)))),
                recognize(pair(char('.'), digit1)),
            )),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        )),
        str::parse::<f64>,
    )(i)
}

fn token(i: &str) -> ParseResult<'_, TokenKind> {
    alt((
        map(number, TokenKind::Number),
        map(ident, |s: &str| TokenKind::Ident(s.to_owned())),
        map(operation, TokenKind::Op),
        value(TokenKind::LParen, char('(')),
        value(TokenKind::RParen, char(')')),
        value(TokenKind::Comma, char(',')),
    ))(i)
}

/// Returns `true` if `name` could be written as a constant or function name in an expression.
pub fn is_identifier(name: &str) -> bool {
    all_consuming(ident)(name).is_ok()
}

/// Lazy token stream over an expression.
///
/// Whitespace between tokens is skipped. The stream ends after the first [`LexError`], and it
/// can be rewound with [`Tokens::restart`] (or simply cloned before use).
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    input: &'a str,
    rest: &'a str,
    failed: bool,
}

impl<'a> Tokens<'a> {
    pub fn new(input: &'a str) -> Tokens<'a> {
        Tokens {
            input,
            rest: input,
            failed: false,
        }
    }

    /// The full source string.
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Byte offset of the first character not yet consumed.
    pub fn offset(&self) -> usize {
        self.input.len() - self.rest.len()
    }

    /// Rewind to the beginning of the input.
    pub fn restart(&mut self) {
        self.rest = self.input;
        self.failed = false;
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let start = self.rest.trim_start();
        self.rest = start;
        let ch = start.chars().next()?;
        let position = self.offset();

        match token(start) {
            Ok((rest, kind)) => {
                self.rest = rest;
                Some(Ok(Token { kind, position }))
            }
            Err(_) => {
                self.failed = true;
                Some(Err(LexError { ch, position }))
            }
        }
    }
}

impl<'a> FusedIterator for Tokens<'a> {}

/// Start tokenizing `input`.
pub fn tokens(input: &str) -> Tokens<'_> {
    Tokens::new(input)
}

/// Tokenize a given mathematical expression eagerly.
///
/// # Failure
///
/// Returns `Err` at the first character that does not start any token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    tokens(input).collect()
}
