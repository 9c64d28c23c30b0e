//! Recursive descent parser that turns the token stream into an expression tree.
//!
//! Grammar, from the loosest to the tightest binding:
//!
//! ```text
//! expression := term (("+" | "-") term)*
//! term       := unary (("*" | "/" | "%") unary)*
//! unary      := ("+" | "-") unary | power
//! power      := primary ("**" unary)?
//! primary    := number | ident | ident "(" (expression ("," expression)*)? ")" | "(" expression ")"
//! ```
//!
//! so `**` is right-associative and a prefix sign applies to the whole power: `-2 ** 2` is `-4`
//! while `2 ** -1` is `0.5`.
use thiserror::Error;

use crate::error::{Error, Result};
use crate::expr::{Expr, Node, UnaryOp};
use crate::tokenizer::{tokens, Operation, Token, TokenKind, Tokens};

/// Maximum depth of the expression tree: parentheses, calls, signs, exponents and every
/// operator of a `+ - * / %` chain each add a level.
pub const MAX_NESTING: usize = 256;

/// An input that is not a well-formed expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntaxError {
    #[error("expected {expected}, found {found} at position {position}")]
    UnexpectedToken {
        found: TokenKind,
        expected: &'static str,
        position: usize,
    },

    #[error("expected {expected}, found end of input")]
    UnexpectedEnd { expected: &'static str },

    #[error("unclosed `(` at position {position}")]
    UnclosedParen { position: usize },

    #[error("unmatched `)` at position {position}")]
    UnmatchedParen { position: usize },

    #[error("`,` outside of a function call at position {position}")]
    CommaOutsideCall { position: usize },

    #[error("expression nested too deeply at position {position}")]
    TooDeep { position: usize },
}

fn unexpected(token: Token, expected: &'static str) -> Error {
    SyntaxError::UnexpectedToken {
        found: token.kind,
        expected,
        position: token.position,
    }
    .into()
}

struct Parser<'a> {
    tokens: Tokens<'a>,
    current: Option<Token>,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Parser<'a>> {
        let mut parser = Parser {
            tokens: tokens(input),
            current: None,
            depth: 0,
        };
        parser.advance()?;
        Ok(parser)
    }

    /// Pull the next token and hand back the one that was current.
    fn advance(&mut self) -> Result<Option<Token>> {
        let next = self.tokens.next().transpose()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn position(&self) -> usize {
        self.current
            .as_ref()
            .map_or(self.tokens.input().len(), |t| t.position)
    }

    fn peek_op(&self) -> Option<Operation> {
        match self.current {
            Some(Token {
                kind: TokenKind::Op(op),
                ..
            }) => Some(op),
            _ => None,
        }
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.current.as_ref().map_or(false, |t| t.kind == *kind)
    }

    fn deepen(&mut self, position: usize) -> Result<()> {
        if self.depth >= MAX_NESTING {
            return Err(SyntaxError::TooDeep { position }.into());
        }
        self.depth += 1;
        Ok(())
    }

    fn nested<T>(&mut self, position: usize, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.deepen(position)?;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // Chains grow to the left, so each operator deepens the tree by one.
    fn expression(&mut self) -> Result<Node> {
        let outer = self.depth;
        let mut left = self.term()?;
        while let Some(op @ (Operation::Plus | Operation::Minus)) = self.peek_op() {
            let position = self.position();
            self.deepen(position)?;
            self.advance()?;
            let right = self.term()?;
            left = Node::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth = outer;
        Ok(left)
    }

    fn term(&mut self) -> Result<Node> {
        let outer = self.depth;
        let mut left = self.unary()?;
        while let Some(op @ (Operation::Times | Operation::Div | Operation::Rem)) = self.peek_op() {
            let position = self.position();
            self.deepen(position)?;
            self.advance()?;
            let right = self.unary()?;
            left = Node::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth = outer;
        Ok(left)
    }

    fn unary(&mut self) -> Result<Node> {
        let op = match self.peek_op() {
            Some(Operation::Plus) => UnaryOp::Plus,
            Some(Operation::Minus) => UnaryOp::Minus,
            _ => return self.power(),
        };
        let position = self.position();
        self.advance()?;
        let operand = self.nested(position, Self::unary)?;
        Ok(Node::Unary(op, Box::new(operand)))
    }

    fn power(&mut self) -> Result<Node> {
        let base = self.primary()?;
        if self.peek_op() != Some(Operation::Pow) {
            return Ok(base);
        }
        let position = self.position();
        self.advance()?;
        let exponent = self.nested(position, Self::unary)?;
        Ok(Node::Binary(Operation::Pow, Box::new(base), Box::new(exponent)))
    }

    fn primary(&mut self) -> Result<Node> {
        let token = match self.advance()? {
            Some(token) => token,
            None => {
                return Err(SyntaxError::UnexpectedEnd {
                    expected: "an operand",
                }
                .into())
            }
        };
        let position = token.position;

        match token.kind {
            TokenKind::Number(n) => Ok(Node::Literal(n)),
            TokenKind::Ident(name) => {
                if !self.at(&TokenKind::LParen) {
                    return Ok(Node::Identifier(name));
                }
                let open = self.position();
                self.advance()?;
                let args = self.nested(open, |p| p.arguments(open))?;
                Ok(Node::Call(name, args))
            }
            TokenKind::LParen => {
                let inner = self.nested(position, Self::expression)?;
                self.close(position)?;
                Ok(inner)
            }
            kind => Err(unexpected(Token { kind, position }, "an operand")),
        }
    }

    /// Comma separated arguments after `name(`, including the closing parenthesis.
    fn arguments(&mut self, open: usize) -> Result<Vec<Node>> {
        let mut args = Vec::new();
        if self.at(&TokenKind::RParen) {
            self.advance()?;
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            match self.advance()? {
                Some(Token {
                    kind: TokenKind::Comma,
                    ..
                }) => continue,
                Some(Token {
                    kind: TokenKind::RParen,
                    ..
                }) => return Ok(args),
                Some(token) => return Err(unexpected(token, "`,` or `)`")),
                None => return Err(SyntaxError::UnclosedParen { position: open }.into()),
            }
        }
    }

    fn close(&mut self, open: usize) -> Result<()> {
        match self.advance()? {
            Some(Token {
                kind: TokenKind::RParen,
                ..
            }) => Ok(()),
            Some(Token {
                kind: TokenKind::Comma,
                position,
            }) => Err(SyntaxError::CommaOutsideCall { position }.into()),
            Some(token) => Err(unexpected(token, "`)`")),
            None => Err(SyntaxError::UnclosedParen { position: open }.into()),
        }
    }
}

/// Parse a complete expression.
///
/// # Failure
///
/// Returns `Error::Lex` for characters that do not start a token and `Error::Syntax` for
/// everything else that is not a single well-formed expression.
pub fn parse(input: &str) -> Result<Expr> {
    let mut parser = Parser::new(input)?;
    if parser.current.is_none() {
        return Err(SyntaxError::UnexpectedEnd {
            expected: "an expression",
        }
        .into());
    }

    let root = parser.expression()?;

    match parser.advance()? {
        None => Ok(Expr::new(root)),
        Some(Token {
            kind: TokenKind::RParen,
            position,
        }) => Err(SyntaxError::UnmatchedParen { position }.into()),
        Some(Token {
            kind: TokenKind::Comma,
            position,
        }) => Err(SyntaxError::CommaOutsideCall { position }.into()),
        Some(token) => Err(unexpected(token, "an operator or end of input")),
    }
}
