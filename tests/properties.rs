use std::fs;

use plugcalc::{eval_str, eval_str_with_context, Config, ConflictPolicy, Error, Expr, Registry};
use tempfile::TempDir;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * b.abs().max(1.)
}

#[test]
fn arithmetic_matches_expected_values() {
    let cases = [
        ("3 * (2 + 5)", 21.),
        ("1 + 2 * 3 - 4 / 8", 6.5),
        ("(1 + 2) * (3 - 4) / 8", -0.375),
        ("2 ** 10 % 1000", 24.),
        ("-(3 - 5) ** 2", -4.),
        ("0.1 + 0.2", 0.3),
        ("1e3 / 8e-1", 1250.),
        ("((((7))))", 7.),
    ];
    for (expr, expected) in cases {
        let value = eval_str(expr).unwrap();
        assert!(close(value, expected), "{} = {}, expected {}", expr, value, expected);
    }
}

#[test]
fn precedence_and_associativity() {
    assert_eq!(eval_str("2 + 3 * 4"), Ok(14.));
    assert_eq!(eval_str("2 ** 3 ** 2"), Ok(512.));
    assert_eq!(eval_str("10 - 2 - 3"), Ok(5.));
    assert_eq!(eval_str("64 / 4 / 2"), Ok(8.));
    assert_eq!(eval_str("-3 ** 2"), Ok(-9.));
}

#[test]
fn division_by_zero_is_an_error() {
    for expr in ["5 / 0", "5 % 0", "1 / (3 - 3)", "-1 / 0", "0 / 0", "2 % (1 - 1)"] {
        assert_eq!(eval_str(expr), Err(Error::DivisionByZero), "{}", expr);
    }
}

#[test]
fn unknown_identifiers_are_errors() {
    assert_eq!(eval_str("3 + foo"), Err(Error::UnknownIdentifier("foo".into())));
    assert_eq!(eval_str("bar(1)"), Err(Error::UnknownIdentifier("bar".into())));
    assert_eq!(eval_str("0 * baz"), Err(Error::UnknownIdentifier("baz".into())));
}

#[test]
fn errors_read_well() {
    let message = |expr: &str| eval_str(expr).unwrap_err().to_string();

    assert_eq!(message("1 + $"), "unexpected character `$` at position 4");
    assert_eq!(message("(1 + 2"), "unclosed `(` at position 0");
    assert_eq!(message("1 + 2)"), "unmatched `)` at position 5");
    assert_eq!(message("1 +"), "expected an operand, found end of input");
    assert_eq!(message("sqrt(-1)"), "math domain error in `sqrt`: argument must not be negative");
    assert_eq!(message("atan2(1)"), "`atan2` expects 2 arguments, got 1");
    assert_eq!(message("log(1, 2, 3)"), "`log` expects 1 or 2 arguments, got 3");
}

#[test]
fn plugin_constant_overrides_builtin() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("pi.toml"), "[constants]\npi = 3\n").unwrap();

    let registry = Config {
        plugin_dir: Some(dir.path().to_path_buf()),
        on_conflict: ConflictPolicy::default(),
    }
    .build_registry();

    assert_eq!(eval_str_with_context("pi", &registry), Ok(3.));
    assert_eq!(eval_str_with_context("2 * pi", &registry), Ok(6.));
}

#[test]
fn malformed_plugins_do_not_block_the_rest() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.toml"), "this is = = not toml").unwrap();
    fs::write(dir.path().join("bad_body.toml"), "[functions]\nf = { body = \"(\" }\n").unwrap();
    fs::write(
        dir.path().join("good.toml"),
        "[constants]\ng = 9.81\n\n[functions]\nweight = { params = [\"m\"], body = \"m * g\" }\n",
    )
    .unwrap();

    let registry = Config {
        plugin_dir: Some(dir.path().to_path_buf()),
        on_conflict: ConflictPolicy::Warn,
    }
    .build_registry();

    assert!(close(eval_str_with_context("weight(2)", &registry).unwrap(), 19.62));
    assert_eq!(eval_str_with_context("sqrt(16)", &registry), Ok(4.));
    assert!(!registry.contains("f"));
}

#[test]
fn evaluation_is_deterministic() {
    let registry = Registry::default();
    for source in ["sin(1) + cos(2) * tan(0.5)", "phi ** 10 / e", "max(1, 2, 3) % 2"] {
        let expr: Expr = source.parse().unwrap();
        let first = expr.eval_with_context(&registry);
        for _ in 0..3 {
            assert_eq!(expr.eval_with_context(&registry), first);
            assert_eq!(eval_str_with_context(source, &registry), first);
        }
    }
}
