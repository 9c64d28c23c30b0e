use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn plugcalc(plugins: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_plugcalc"));
    cmd.arg("--plugins")
        .arg(plugins)
        .env_remove("RUST_LOG")
        .env_remove("PLUGCALC_PLUGINS")
        .env_remove("PLUGCALC_ON_CONFLICT");
    cmd
}

fn eval(plugins: &Path, args: &[&str]) -> Output {
    plugcalc(plugins).args(args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn prints_result_and_exits_zero() {
    let dir = TempDir::new().unwrap();
    let output = eval(dir.path(), &["3 * (2 + 5)"]);

    assert!(output.status.success());
    assert_eq!(stdout(&output), "21\n");
}

#[test]
fn reports_errors_on_stderr_with_failure_status() {
    let dir = TempDir::new().unwrap();

    let output = eval(dir.path(), &["5 / 0"]);
    assert!(!output.status.success());
    assert_eq!(stdout(&output), "");
    assert!(stderr(&output).contains("Error: division by zero"));

    let output = eval(dir.path(), &["3 + foo"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown identifier `foo`"));

    let output = eval(dir.path(), &["2 ^ 3"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unexpected character `^`"));
}

#[test]
fn plugins_extend_and_override() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("pi.toml"), "[constants]\npi = 3\n").unwrap();
    fs::write(
        dir.path().join("geometry.toml"),
        "[functions]\nhypot = { params = [\"a\", \"b\"], body = \"sqrt(a ** 2 + b ** 2)\" }\n",
    )
    .unwrap();

    let output = eval(dir.path(), &["hypot(3, 4) + pi"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "8\n");
    assert!(stderr(&output).contains("definition shadows an existing entry"));

    let output = eval(dir.path(), &["--on-conflict", "overwrite", "pi"]);
    assert_eq!(stdout(&output), "3\n");
    assert!(!stderr(&output).contains("shadows"));

    let output = eval(dir.path(), &["--on-conflict", "reject", "hypot(3, 4) + pi"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), format!("{}\n", 5. + std::f64::consts::PI));

    let output = eval(dir.path(), &["--no-plugins", "pi"]);
    assert_eq!(stdout(&output), format!("{}\n", std::f64::consts::PI));
}

#[test]
fn broken_plugin_is_skipped() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.toml"), "[constants\n").unwrap();
    fs::write(dir.path().join("ok.toml"), "[constants]\nanswer = 42\n").unwrap();

    let output = eval(dir.path(), &["answer"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "42\n");
    assert!(stderr(&output).contains("skipping plugin"));
}

#[test]
fn missing_plugin_directory_is_fine() {
    let dir = TempDir::new().unwrap();
    let output = eval(&dir.path().join("nope"), &["1 + 1"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "2\n");
    assert_eq!(stderr(&output), "");
}

#[test]
fn interactive_mode_keeps_going_after_errors() {
    let dir = TempDir::new().unwrap();
    let mut child = plugcalc(dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"1 + 1\n5 / 0\n\n2 ** 3 ** 2\nexit\n1000 + 1\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Interactive mode"));
    assert!(out.contains("2\n"));
    assert!(out.contains("512\n"));
    assert!(!out.contains("1001"));
    assert!(stderr(&output).contains("Error: division by zero"));
}

#[test]
fn interactive_mode_ends_at_end_of_input() {
    let dir = TempDir::new().unwrap();
    let mut child = plugcalc(dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child.stdin.take().unwrap().write_all(b"7 * 6\n").unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert!(stdout(&output).contains("42\n"));
}

#[test]
fn expressions_may_start_with_a_minus() {
    let dir = TempDir::new().unwrap();

    let output = eval(dir.path(), &["-3 + 5"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "2\n");

    let output = eval(dir.path(), &["-2 ** 2"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "-4\n");

    let output = eval(dir.path(), &["-v", "-1 - 1"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "-2\n");
}

#[test]
fn overlong_operator_chain_is_a_syntax_error() {
    let dir = TempDir::new().unwrap();
    let sum = format!("1{}", " + 1".repeat(10_000));

    let output = eval(dir.path(), &[&sum]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Error: expression nested too deeply"));

    let sum = format!("1{}", " + 1".repeat(200));
    let output = eval(dir.path(), &[&sum]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "201\n");
}

#[test]
fn interactive_mode_survives_overlong_lines() {
    let dir = TempDir::new().unwrap();
    let mut child = plugcalc(dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let input = format!("1{}\n6 * 7\n", " + 1".repeat(300_000));
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert!(stderr(&output).contains("Error: expression nested too deeply"));
    assert!(stdout(&output).contains("42\n"));
}
