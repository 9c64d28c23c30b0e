//! Deserialization utilities.
//!
//! An [`Expr`](../struct.Expr.html) deserializes from a string holding its source, so any
//! serde format can carry expressions:
//!
//! ```rust
//! use plugcalc::Expr;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Foo {
//!     x: Expr,
//! }
//!
//! let foo: Foo = toml::from_str(r#" x = "cos(0) + 1" "#).unwrap();
//! assert_eq!(foo.x.eval(), Ok(2.));
//!
//! let foo: Result<Foo, _> = toml::from_str(r#" x = "cos(" "#);
//! assert!(foo.is_err());
//! ```
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, Visitor};

use crate::Expr;

struct ExprVisitor;

impl<'de> Visitor<'de> for ExprVisitor {
    type Value = Expr;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string containing a math expression")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Expr, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Expr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(ExprVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Holder {
        body: Expr,
    }

    #[test]
    fn test_deserialize() {
        let h: Holder = toml::from_str(r#"body = "2 ** 3 ** 2""#).unwrap();
        assert_eq!(h.body.to_string(), "(2 ** (3 ** 2))");
        assert_eq!(h.body.eval(), Ok(512.));
    }

    #[test]
    fn test_deserialize_errors() {
        let err = toml::from_str::<Holder>(r#"body = "1 +""#).unwrap_err();
        assert!(err.to_string().contains("found end of input"), "{}", err);

        let err = toml::from_str::<Holder>("body = 3").unwrap_err();
        assert!(err.to_string().contains("math expression"), "{}", err);
    }
}
