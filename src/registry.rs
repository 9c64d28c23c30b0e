//! Names available to expressions.
//!
//! A [`RegistryBuilder`] collects built-ins, host definitions and plugin definitions. Once
//! everything is merged it is frozen into a [`Registry`], which is immutable, cheap to clone and
//! safe to share between threads.
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::builtins;
use crate::config::ConflictPolicy;
use crate::error::FuncEvalError;
use crate::expr::{ContextProvider, Expr};

/// Number of arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Inclusive bounds.
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exact(k) => n == k,
            Arity::Range(lo, hi) => lo <= n && n <= hi,
            Arity::AtLeast(k) => n >= k,
        }
    }
}

fn arguments(n: usize) -> &'static str {
    if n == 1 {
        "argument"
    } else {
        "arguments"
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Arity::Exact(n) => write!(f, "{} {}", n, arguments(n)),
            Arity::Range(lo, hi) if hi.checked_sub(lo) == Some(1) => {
                write!(f, "{} or {} arguments", lo, hi)
            }
            Arity::Range(lo, hi) => write!(f, "{} to {} arguments", lo, hi),
            Arity::AtLeast(n) => write!(f, "at least {} {}", n, arguments(n)),
        }
    }
}

/// Signature of functions implemented in Rust.
///
/// The slice always satisfies the declared [`Arity`].
pub type NativeFn = dyn Fn(&[f64]) -> Result<f64, FuncEvalError> + Send + Sync;

#[derive(Clone)]
pub(crate) enum Body {
    Native(Arc<NativeFn>),
    Defined { params: Arc<[String]>, expr: Arc<Expr> },
}

/// A callable registry entry.
#[derive(Clone)]
pub struct Function {
    arity: Arity,
    body: Body,
}

impl Function {
    /// Function implemented by a closure.
    pub fn native<F>(arity: Arity, f: F) -> Function
    where
        F: Fn(&[f64]) -> Result<f64, FuncEvalError> + Send + Sync + 'static,
    {
        Function {
            arity,
            body: Body::Native(Arc::new(f)),
        }
    }

    /// Function whose body is an expression over `params`.
    pub fn defined(params: Vec<String>, expr: Expr) -> Function {
        Function {
            arity: Arity::Exact(params.len()),
            body: Body::Defined {
                params: params.into(),
                expr: Arc::new(expr),
            },
        }
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Parameter names, for functions defined by an expression.
    pub fn params(&self) -> Option<&[String]> {
        match &self.body {
            Body::Native(_) => None,
            Body::Defined { params, .. } => Some(&params[..]),
        }
    }

    pub(crate) fn body(&self) -> &Body {
        &self.body
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = f.debug_struct("Function");
        s.field("arity", &self.arity);
        match &self.body {
            Body::Native(_) => s.field("body", &"<native>"),
            Body::Defined { params, expr } => s
                .field("params", params)
                .field("body", &format_args!("{}", expr)),
        };
        s.finish()
    }
}

/// A registered name.
#[derive(Debug, Clone)]
pub enum Entry {
    Constant(f64),
    Function(Function),
}

/// Where a definition came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Builtin,
    /// Added programmatically by the embedding application.
    Host,
    Plugin(PathBuf),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Origin::Builtin => f.write_str("built-in"),
            Origin::Host => f.write_str("host"),
            Origin::Plugin(path) => write!(f, "plugin `{}`", path.display()),
        }
    }
}

/// A definition refused under [`ConflictPolicy::Reject`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{name}` is already defined by {existing}")]
pub struct ConflictError {
    pub name: String,
    pub existing: Origin,
}

#[derive(Debug, Clone)]
struct Definition {
    entry: Entry,
    origin: Origin,
}

/// Mutable registry under construction.
#[derive(Debug)]
pub struct RegistryBuilder {
    definitions: BTreeMap<String, Definition>,
    policy: ConflictPolicy,
}

impl RegistryBuilder {
    /// Builder pre-populated with the built-in constants and functions.
    pub fn new() -> RegistryBuilder {
        let mut builder = RegistryBuilder::empty();
        builtins::install(&mut builder);
        builder
    }

    /// Builder without any definitions.
    pub fn empty() -> RegistryBuilder {
        RegistryBuilder {
            definitions: BTreeMap::new(),
            policy: ConflictPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ConflictPolicy) -> RegistryBuilder {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Fails if defining `name` now would be refused by the conflict policy.
    pub fn check(&self, name: &str) -> Result<(), ConflictError> {
        match (self.policy, self.definitions.get(name)) {
            (ConflictPolicy::Reject, Some(existing)) => Err(ConflictError {
                name: name.into(),
                existing: existing.origin.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Add or replace `name`, as the conflict policy allows.
    pub fn define(
        &mut self,
        name: impl Into<String>,
        entry: Entry,
        origin: Origin,
    ) -> Result<(), ConflictError> {
        let name = name.into();
        self.check(&name)?;

        if let Some(existing) = self.definitions.get(&name) {
            if self.policy == ConflictPolicy::Warn {
                warn!(
                    name = %name,
                    shadowed = %existing.origin,
                    by = %origin,
                    "definition shadows an existing entry"
                );
            } else {
                debug!(name = %name, shadowed = %existing.origin, by = %origin, "redefined");
            }
        }

        self.definitions.insert(name, Definition { entry, origin });
        Ok(())
    }

    pub fn constant(
        &mut self,
        name: impl Into<String>,
        value: f64,
    ) -> Result<&mut Self, ConflictError> {
        self.define(name, Entry::Constant(value), Origin::Host)?;
        Ok(self)
    }

    pub fn function(
        &mut self,
        name: impl Into<String>,
        function: Function,
    ) -> Result<&mut Self, ConflictError> {
        self.define(name, Entry::Function(function), Origin::Host)?;
        Ok(self)
    }

    pub(crate) fn builtin(&mut self, name: &str, entry: Entry) {
        self.definitions.insert(
            name.into(),
            Definition {
                entry,
                origin: Origin::Builtin,
            },
        );
    }

    pub fn origin(&self, name: &str) -> Option<&Origin> {
        self.definitions.get(name).map(|d| &d.origin)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Freeze the definitions.
    pub fn build(self) -> Registry {
        debug!(entries = self.definitions.len(), "registry frozen");
        Registry {
            entries: Arc::new(
                self.definitions
                    .into_iter()
                    .map(|(name, d)| (name, d.entry))
                    .collect(),
            ),
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> RegistryBuilder {
        RegistryBuilder::new()
    }
}

impl ContextProvider for RegistryBuilder {
    fn get_var(&self, name: &str) -> Option<f64> {
        match self.definitions.get(name).map(|d| &d.entry) {
            Some(Entry::Constant(v)) => Some(*v),
            _ => None,
        }
    }

    fn get_func(&self, name: &str) -> Option<&Function> {
        match self.definitions.get(name).map(|d| &d.entry) {
            Some(Entry::Function(f)) => Some(f),
            _ => None,
        }
    }
}

/// Frozen mapping from names to constants and functions.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: Arc<BTreeMap<String, Entry>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// All names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Registry {
    /// Registry with the built-ins only.
    fn default() -> Registry {
        RegistryBuilder::new().build()
    }
}

impl ContextProvider for Registry {
    fn get_var(&self, name: &str) -> Option<f64> {
        match self.entries.get(name) {
            Some(Entry::Constant(v)) => Some(*v),
            _ => None,
        }
    }

    fn get_func(&self, name: &str) -> Option<&Function> {
        match self.entries.get(name) {
            Some(Entry::Function(f)) => Some(f),
            _ => None,
        }
    }
}
