//! Error types for plugcalc

use thiserror::Error;

use crate::parser::SyntaxError;
use crate::registry::Arity;
use crate::tokenizer::LexError;

/// Failure to parse or evaluate an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("unknown identifier `{0}`")]
    UnknownIdentifier(String),

    #[error("`{0}` is a function and needs arguments")]
    NotAConstant(String),

    #[error("`{0}` is a constant and cannot be called")]
    NotCallable(String),

    #[error("`{name}` expects {expected}, got {found}")]
    Arity {
        name: String,
        expected: Arity,
        found: usize,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("math domain error in `{name}`: {reason}")]
    Domain { name: String, reason: String },

    #[error("call depth limit exceeded in `{0}`")]
    RecursionLimit(String),
}

impl Error {
    pub fn unknown_identifier(name: impl Into<String>) -> Self {
        Self::UnknownIdentifier(name.into())
    }

    pub fn domain(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Domain {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Failure reported by a native function. The evaluator attaches the function name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FuncEvalError {
    #[error("{0}")]
    Domain(String),

    #[error("division by zero")]
    DivisionByZero,
}

impl FuncEvalError {
    pub fn domain(reason: impl Into<String>) -> Self {
        Self::Domain(reason.into())
    }

    pub(crate) fn into_error(self, name: &str) -> Error {
        match self {
            FuncEvalError::Domain(reason) => Error::domain(name, reason),
            FuncEvalError::DivisionByZero => Error::DivisionByZero,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
