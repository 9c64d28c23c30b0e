use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::extra_math::floored_rem;
use crate::parser;
use crate::registry::{Body, Function, Registry};
use crate::tokenizer::Operation;

/// How many user-defined function calls may be active at once.
pub const MAX_CALL_DEPTH: usize = 64;

/// Prefix sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

/// One node of the expression tree. Children are owned by their parent.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(f64),
    Identifier(String),
    Unary(UnaryOp, Box<Node>),
    Binary(Operation, Box<Node>, Box<Node>),
    Call(String, Vec<Node>),
}

impl fmt::Display for Node {
    /// Fully parenthesized form, handy to see how an input was grouped.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Node::Literal(n) => write!(f, "{}", n),
            Node::Identifier(name) => f.write_str(name),
            Node::Unary(UnaryOp::Plus, operand) => write!(f, "(+{})", operand),
            Node::Unary(UnaryOp::Minus, operand) => write!(f, "(-{})", operand),
            Node::Binary(op, left, right) => write!(f, "({} {} {})", left, op, right),
            Node::Call(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    root: Node,
}

impl Expr {
    pub fn new(root: Node) -> Expr {
        Expr { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Evaluates the expression with the built-in constants and functions.
    pub fn eval(&self) -> Result<f64> {
        self.eval_with_context(Registry::default())
    }

    /// Evaluates the expression with names resolved by `ctx`.
    pub fn eval_with_context<C: ContextProvider>(&self, ctx: C) -> Result<f64> {
        Evaluator { globals: &ctx }.eval(&self.root, &ctx, 0)
    }
}

impl FromStr for Expr {
    type Err = Error;

    /// Constructs an expression by parsing a string.
    fn from_str(s: &str) -> Result<Expr> {
        parser::parse(s)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.root.fmt(f)
    }
}

/// Source of constants and functions for evaluation.
pub trait ContextProvider {
    fn get_var(&self, name: &str) -> Option<f64>;
    fn get_func(&self, name: &str) -> Option<&Function>;
}

impl<'a, T: ContextProvider + ?Sized> ContextProvider for &'a T {
    fn get_var(&self, name: &str) -> Option<f64> {
        (**self).get_var(name)
    }

    fn get_func(&self, name: &str) -> Option<&Function> {
        (**self).get_func(name)
    }
}

/// Parameters of a user-defined function layered over the global names.
struct Scope<'a> {
    params: &'a [String],
    values: &'a [f64],
    globals: &'a dyn ContextProvider,
}

impl<'a> ContextProvider for Scope<'a> {
    fn get_var(&self, name: &str) -> Option<f64> {
        match self.params.iter().position(|p| p == name) {
            Some(i) => self.values.get(i).copied(),
            None => self.globals.get_var(name),
        }
    }

    fn get_func(&self, name: &str) -> Option<&Function> {
        if self.params.iter().any(|p| p == name) {
            None
        } else {
            self.globals.get_func(name)
        }
    }
}

struct Evaluator<'g> {
    globals: &'g dyn ContextProvider,
}

impl<'g> Evaluator<'g> {
    fn eval(&self, node: &Node, scope: &dyn ContextProvider, depth: usize) -> Result<f64> {
        match node {
            Node::Literal(n) => Ok(*n),
            Node::Identifier(name) => scope.get_var(name).ok_or_else(|| {
                if scope.get_func(name).is_some() {
                    Error::NotAConstant(name.clone())
                } else {
                    Error::unknown_identifier(name.as_str())
                }
            }),
            Node::Unary(op, operand) => {
                let x = self.eval(operand, scope, depth)?;
                Ok(match op {
                    UnaryOp::Plus => x,
                    UnaryOp::Minus => -x,
                })
            }
            Node::Binary(op, left, right) => {
                let left = self.eval(left, scope, depth)?;
                let right = self.eval(right, scope, depth)?;
                binary(*op, left, right)
            }
            Node::Call(name, args) => self.call(name, args, scope, depth),
        }
    }

    fn call(
        &self,
        name: &str,
        args: &[Node],
        scope: &dyn ContextProvider,
        depth: usize,
    ) -> Result<f64> {
        let function = match scope.get_func(name) {
            Some(function) => function,
            None if scope.get_var(name).is_some() => return Err(Error::NotCallable(name.into())),
            None => return Err(Error::unknown_identifier(name)),
        };

        let values = args
            .iter()
            .map(|arg| self.eval(arg, scope, depth))
            .collect::<Result<Vec<f64>>>()?;

        if !function.arity().accepts(values.len()) {
            return Err(Error::Arity {
                name: name.into(),
                expected: function.arity(),
                found: values.len(),
            });
        }

        match function.body() {
            Body::Native(f) => {
                let out = f(&values).map_err(|e| e.into_error(name))?;
                if out.is_nan() && !values.iter().any(|v| v.is_nan()) {
                    return Err(Error::domain(name, "result is not a number"));
                }
                Ok(out)
            }
            Body::Defined { params, expr } => {
                if depth >= MAX_CALL_DEPTH {
                    return Err(Error::RecursionLimit(name.into()));
                }
                // the body sees its parameters and the globals, never the caller's parameters
                let inner = Scope {
                    params,
                    values: &values,
                    globals: self.globals,
                };
                self.eval(expr.root(), &inner, depth + 1)
            }
        }
    }
}

fn binary(op: Operation, left: f64, right: f64) -> Result<f64> {
    use crate::tokenizer::Operation::*;

    match op {
        Plus => Ok(left + right),
        Minus => Ok(left - right),
        Times => Ok(left * right),
        Div if right == 0.0 => Err(Error::DivisionByZero),
        Div => Ok(left / right),
        Rem if right == 0.0 => Err(Error::DivisionByZero),
        Rem => Ok(floored_rem(left, right)),
        Pow if left == 0.0 && right < 0.0 => Err(Error::DivisionByZero),
        Pow => {
            let r = left.powf(right);
            if r.is_nan() && !left.is_nan() && !right.is_nan() {
                Err(Error::domain(
                    "**",
                    "negative base with a fractional exponent",
                ))
            } else {
                Ok(r)
            }
        }
    }
}
