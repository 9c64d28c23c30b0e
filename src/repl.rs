//! Interactive read-evaluate-print loop.
//!
//! The loop is written over any source of lines and any pair of writers; the binary feeds it from
//! a line editor and the terminal.
use std::io::{self, Write};

use crate::eval_str_with_context;
use crate::registry::Registry;

pub const PROMPT: &str = ">>> ";
pub const BANNER: &str = "Interactive mode (type 'exit' to quit)";

/// What a line of input asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Line<'a> {
    Blank,
    Quit,
    Expression(&'a str),
}

pub fn classify(line: &str) -> Line<'_> {
    let line = line.trim();
    if line.is_empty() {
        Line::Blank
    } else if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        Line::Quit
    } else {
        Line::Expression(line)
    }
}

/// Evaluate each line against `registry` until the lines run out or a quit command.
///
/// Results go to `out`, errors to `err`; an error never ends the loop.
pub fn run<I, O, E>(lines: I, registry: &Registry, out: &mut O, err: &mut E) -> io::Result<()>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
    O: Write,
    E: Write,
{
    for line in lines {
        match classify(line.as_ref()) {
            Line::Blank => continue,
            Line::Quit => break,
            Line::Expression(expr) => match eval_str_with_context(expr, registry) {
                Ok(value) => writeln!(out, "{}", value)?,
                Err(e) => writeln!(err, "Error: {}", e)?,
            },
        }
    }
    Ok(())
}
