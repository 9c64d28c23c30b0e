//! This Rust crate provides a simple math expression parser and evaluator whose set of constants
//! and functions can be extended with plugin files.
//!
//! # Simple examples
//!
//! ```rust
//! let r = plugcalc::eval_str("1 + 2").unwrap();
//!
//! assert_eq!(r, 3.);
//! ```
//!
//! Names are resolved through a [`Registry`]. Start from the built-ins, add your own entries and
//! freeze it:
//!
//! ```rust
//! use plugcalc::{Arity, Function, RegistryBuilder, eval_str_with_context};
//!
//! let mut builder = RegistryBuilder::new();
//! builder
//!     .constant("x", 3.)
//!     .unwrap()
//!     .function("double", Function::native(Arity::Exact(1), |args| Ok(2. * args[0])))
//!     .unwrap();
//! let registry = builder.build();
//!
//! assert_eq!(eval_str_with_context("double(x) ** 2", &registry), Ok(36.));
//! ```
//!
//! # Supported expressions
//!
//! - numbers such as `3`, `2.5`, `.5` or `1e-3`,
//! - binary operators `+`, `-`, `*`, `/`, `%` (floored modulo) and `**` (right-associative),
//! - unary `+` and `-`,
//! - parentheses,
//! - constants and function calls with comma separated arguments.
//!
//! Operator precedence follows the usual conventions: `-2 ** 2` is `-4`, `2 ** 3 ** 2` is `512`.
//! See [`builtins`] for the built-in names and [`plugin`] for the plugin file format.
//!
//! # Errors
//!
//! Parsing and evaluation report an [`Error`]. Division and modulo by zero are errors rather
//! than infinities, and so are domain violations such as `sqrt(-1)` or `log(0)`.
pub mod builtins;
pub mod config;
pub mod de;
mod error;
mod expr;
pub mod extra_math;
pub mod parser;
pub mod plugin;
mod registry;
pub mod repl;
pub mod tokenizer;

pub use config::{Config, ConflictPolicy, DEFAULT_PLUGIN_DIR};
pub use error::{Error, FuncEvalError, Result};
pub use expr::{ContextProvider, Expr, Node, UnaryOp, MAX_CALL_DEPTH};
pub use parser::{parse, SyntaxError};
pub use plugin::{load_dir, LoadReport, PluginError};
pub use registry::{
    Arity, ConflictError, Entry, Function, NativeFn, Origin, Registry, RegistryBuilder,
};
pub use tokenizer::{tokenize, LexError, Operation, Token, TokenKind};

/// Evaluate a string with the built-in constants and functions.
pub fn eval_str<S: AsRef<str>>(expr: S) -> Result<f64> {
    let expr: Expr = expr.as_ref().parse()?;

    expr.eval()
}

/// Evaluate a string with names resolved by `ctx`.
pub fn eval_str_with_context<S: AsRef<str>, C: ContextProvider>(expr: S, ctx: C) -> Result<f64> {
    let expr: Expr = expr.as_ref().parse()?;

    expr.eval_with_context(ctx)
}
