//! plugcalc - command line calculator with plugin support
//!
//! `plugcalc EXPR` evaluates one expression; without arguments an interactive prompt is started.
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use plugcalc::{repl, Config, ConflictPolicy, Registry, DEFAULT_PLUGIN_DIR};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "plugcalc", version)]
#[command(about = "Evaluate math expressions with user-extensible functions and constants")]
struct Cli {
    /// Expression to evaluate (e.g. '3 + 4 * 2'); starts an interactive prompt when omitted
    #[arg(allow_hyphen_values = true)]
    expression: Option<String>,

    /// Directory scanned for plugin files
    #[arg(short, long, env = "PLUGCALC_PLUGINS", default_value = DEFAULT_PLUGIN_DIR)]
    plugins: PathBuf,

    /// Do not load any plugins
    #[arg(long)]
    no_plugins: bool,

    /// What to do when a plugin redefines an existing name
    #[arg(long, value_enum, env = "PLUGCALC_ON_CONFLICT", default_value_t = ConflictPolicy::Warn)]
    on_conflict: ConflictPolicy,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            plugin_dir: (!self.no_plugins).then(|| self.plugins.clone()),
            on_conflict: self.on_conflict,
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run_repl(registry: &Registry) -> Result<()> {
    let mut rl = DefaultEditor::new().context("failed to initialize line editor")?;

    println!("{}", repl::BANNER);

    let lines = std::iter::from_fn(|| loop {
        match rl.readline(repl::PROMPT) {
            Ok(line) => {
                if let Err(e) = rl.add_history_entry(line.as_str()) {
                    debug!(error = %e, "cannot record history entry");
                }
                return Some(line);
            }
            // Ctrl+C drops the current line
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => return None,
            Err(e) => {
                error!(error = %e, "cannot read input");
                return None;
            }
        }
    });

    repl::run(lines, registry, &mut io::stdout(), &mut io::stderr())
        .context("failed to write output")
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let registry = cli.config().build_registry();

    match &cli.expression {
        Some(expr) => match plugcalc::eval_str_with_context(expr, &registry) {
            Ok(value) => {
                println!("{}", value);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
        None => match run_repl(&registry) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}
