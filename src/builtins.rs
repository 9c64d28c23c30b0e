//! Built-in constants and functions.
//!
//! | name | value |
//! |------|-------|
//! | `pi`, `e`, `tau` | the usual constants |
//! | `phi` | the golden ratio |
//! | `sin cos tan asin acos atan sinh cosh tanh asinh acosh atanh` | trigonometry, radians |
//! | `atan2(y, x)` | four-quadrant arctangent |
//! | `sqrt exp ln log2 log10 abs floor ceil signum` | one argument each |
//! | `log(x)`, `log(x, base)` | natural or arbitrary-base logarithm |
//! | `round(x)`, `round(x, digits)` | half to even |
//! | `min(...)`, `max(...)` | one or more arguments |
//! | `fact(n)` | factorial of a non-negative integer |
use std::f64::consts;

use crate::error::FuncEvalError;
use crate::extra_math::{factorial, max_array, min_array, round_to};
use crate::registry::{Arity, Entry, Function, RegistryBuilder};

/// The golden ratio, `(1 + sqrt(5)) / 2`.
pub const PHI: f64 = 1.618_033_988_749_895_f64;

fn one_arg(f: fn(f64) -> f64) -> Function {
    Function::native(Arity::Exact(1), move |args| Ok(f(args[0])))
}

fn guarded(f: fn(f64) -> f64, valid: fn(f64) -> bool, reason: &'static str) -> Function {
    Function::native(Arity::Exact(1), move |args| {
        let x = args[0];
        if valid(x) {
            Ok(f(x))
        } else {
            Err(FuncEvalError::domain(reason))
        }
    })
}

fn integer(x: f64, what: &str) -> Result<f64, FuncEvalError> {
    if x.is_finite() && x.fract() == 0. {
        Ok(x)
    } else {
        Err(FuncEvalError::domain(format!("{} must be an integer", what)))
    }
}

fn log(args: &[f64]) -> Result<f64, FuncEvalError> {
    let x = args[0];
    if x <= 0. {
        return Err(FuncEvalError::domain("argument must be positive"));
    }
    match args.get(1) {
        None => Ok(x.ln()),
        Some(&base) if base <= 0. => Err(FuncEvalError::domain("base must be positive")),
        Some(&base) if base == 1. => Err(FuncEvalError::DivisionByZero),
        Some(&base) => Ok(x.ln() / base.ln()),
    }
}

fn round(args: &[f64]) -> Result<f64, FuncEvalError> {
    match args.get(1) {
        None => Ok(args[0].round_ties_even()),
        Some(&digits) => {
            let digits = integer(digits, "number of digits")?;
            Ok(round_to(args[0], digits.clamp(i32::MIN as f64, i32::MAX as f64) as i32))
        }
    }
}

fn fact(args: &[f64]) -> Result<f64, FuncEvalError> {
    let n = integer(args[0], "argument")?;
    if n < 0. {
        return Err(FuncEvalError::domain("argument must not be negative"));
    }
    // saturates for huge inputs, which overflow anyway
    Ok(factorial(n as u64))
}

pub(crate) fn install(builder: &mut RegistryBuilder) {
    let constants = [
        ("pi", consts::PI),
        ("e", consts::E),
        ("tau", consts::TAU),
        ("phi", PHI),
    ];
    for (name, value) in constants {
        builder.builtin(name, Entry::Constant(value));
    }

    let plain: &[(&str, fn(f64) -> f64)] = &[
        ("sin", f64::sin),
        ("cos", f64::cos),
        ("tan", f64::tan),
        ("atan", f64::atan),
        ("sinh", f64::sinh),
        ("cosh", f64::cosh),
        ("tanh", f64::tanh),
        ("asinh", f64::asinh),
        ("exp", f64::exp),
        ("abs", f64::abs),
        ("floor", f64::floor),
        ("ceil", f64::ceil),
        ("signum", f64::signum),
    ];
    for &(name, f) in plain {
        builder.builtin(name, Entry::Function(one_arg(f)));
    }

    let checked: &[(&str, fn(f64) -> f64, fn(f64) -> bool, &'static str)] = &[
        ("sqrt", f64::sqrt, |x: f64| x >= 0., "argument must not be negative"),
        ("ln", f64::ln, |x: f64| x > 0., "argument must be positive"),
        ("log2", f64::log2, |x: f64| x > 0., "argument must be positive"),
        ("log10", f64::log10, |x: f64| x > 0., "argument must be positive"),
        ("asin", f64::asin, |x: f64| (-1. ..=1.).contains(&x), "argument must be in [-1, 1]"),
        ("acos", f64::acos, |x: f64| (-1. ..=1.).contains(&x), "argument must be in [-1, 1]"),
        ("acosh", f64::acosh, |x: f64| x >= 1., "argument must be at least 1"),
        ("atanh", f64::atanh, |x: f64| x > -1. && x < 1., "argument must be in (-1, 1)"),
    ];
    for &(name, f, valid, reason) in checked {
        builder.builtin(name, Entry::Function(guarded(f, valid, reason)));
    }

    let functions = [
        ("atan2", Function::native(Arity::Exact(2), |args| Ok(args[0].atan2(args[1])))),
        ("log", Function::native(Arity::Range(1, 2), log)),
        ("round", Function::native(Arity::Range(1, 2), round)),
        ("min", Function::native(Arity::AtLeast(1), |args| Ok(min_array(args)))),
        ("max", Function::native(Arity::AtLeast(1), |args| Ok(max_array(args)))),
        ("fact", Function::native(Arity::Exact(1), fact)),
    ];
    for (name, function) in functions {
        builder.builtin(name, Entry::Function(function));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::eval_str;

    fn approx(expr: &str, expected: f64) {
        let value = eval_str(expr).unwrap();
        assert!(
            (value - expected).abs() < 1e-12,
            "{} = {}, expected {}",
            expr,
            value,
            expected
        );
    }

    fn domain_error(expr: &str) {
        match eval_str(expr) {
            Err(Error::Domain { .. }) => {}
            other => panic!("expected a domain error for `{}`, got {:?}", expr, other),
        }
    }

    #[test]
    fn test_constants() {
        approx("pi", consts::PI);
        approx("e", consts::E);
        approx("tau / 2", consts::PI);
        approx("phi", (1. + 5f64.sqrt()) / 2.);
        approx("phi ** 2 - phi", 1.);
    }

    #[test]
    fn test_functions() {
        approx("sin(pi / 2)", 1.);
        approx("cos(0)", 1.);
        approx("tan(0)", 0.);
        approx("atan2(1, 1)", consts::FRAC_PI_4);
        approx("sqrt(16)", 4.);
        approx("ln(e)", 1.);
        approx("log(e ** 2)", 2.);
        approx("log(8, 2)", 3.);
        approx("log10(1000)", 3.);
        approx("log2(1024)", 10.);
        approx("abs(-3.5)", 3.5);
        approx("floor(-1.5) + ceil(1.2)", 0.);
        approx("signum(-7)", -1.);
        approx("exp(0)", 1.);
        approx("min(4, 2, 8)", 2.);
        approx("max(4, 2, 8)", 8.);
        approx("fact(5)", 120.);
        approx("fact(0)", 1.);
        approx("acosh(1)", 0.);
    }

    #[test]
    fn test_round() {
        approx("round(2.5)", 2.);
        approx("round(3.5)", 4.);
        approx("round(-0.4)", 0.);
        approx("round(3.14159, 2)", 3.14);
        approx("round(1234, -2)", 1200.);
        domain_error("round(1, 0.5)");
    }

    #[test]
    fn test_domain_errors() {
        domain_error("sqrt(-1)");
        domain_error("log(0)");
        domain_error("log(-2)");
        domain_error("log(2, -1)");
        domain_error("ln(0)");
        domain_error("log10(-1)");
        domain_error("asin(2)");
        domain_error("acos(-1.5)");
        domain_error("acosh(0.5)");
        domain_error("atanh(1)");
        domain_error("fact(-1)");
        domain_error("fact(2.5)");

        assert_eq!(
            eval_str("sqrt(-4)"),
            Err(Error::domain("sqrt", "argument must not be negative"))
        );
        assert_eq!(eval_str("log(5, 1)"), Err(Error::DivisionByZero));
    }

    #[test]
    fn test_nan_results_are_domain_errors() {
        // sin(inf) is NaN without any explicit check in `sin`
        domain_error("sin(10 ** 400)");
    }
}
