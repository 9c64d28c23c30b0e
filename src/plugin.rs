//! Loading user plugins from a directory.
//!
//! A plugin is a TOML file in the plugin directory (only `*.toml` files directly inside it are
//! read, in file name order). It may define constants and functions:
//!
//! ```toml
//! [constants]
//! g = 9.80665
//! half_pi = "pi / 2"      # expression, evaluated once at load time
//!
//! [functions]
//! hypot = { params = ["a", "b"], body = "sqrt(a ** 2 + b ** 2)" }
//! fall_time = { params = ["h"], body = "sqrt(2 * h / g)" }
//! ```
//!
//! Constant expressions see whatever was registered before the file was read. Function bodies
//! are resolved when they are called, so they may use names from any plugin.
//!
//! A plugin file is merged entirely or not at all. A broken file is logged and skipped; it never
//! stops the remaining plugins from loading.
use std::collections::{BTreeMap, HashSet};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::Error;
use crate::expr::Expr;
use crate::registry::{ConflictError, Entry, Function, Origin, RegistryBuilder};
use crate::eval_str_with_context;
use crate::tokenizer::is_identifier;

/// Extension of plugin files.
pub const PLUGIN_EXTENSION: &str = "toml";

/// Why a plugin file was skipped.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("cannot read plugin file: {0}")]
    Io(#[from] io::Error),

    #[error("malformed plugin file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("`{0}` is not a valid name")]
    InvalidName(String),

    #[error("`{0}` is defined more than once")]
    DuplicateName(String),

    #[error("function `{function}` lists parameter `{param}` more than once")]
    DuplicateParam { function: String, param: String },

    #[error("constant `{name}` could not be evaluated: {source}")]
    Constant {
        name: String,
        #[source]
        source: Error,
    },

    #[error(transparent)]
    Conflict(#[from] ConflictError),
}

/// Outcome of [`load_dir`].
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Files merged into the registry.
    pub loaded: Vec<PathBuf>,
    /// Files skipped, with the reason.
    pub failed: Vec<(PathBuf, PluginError)>,
    /// Number of names defined by the loaded files.
    pub definitions: usize,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConstantDef {
    Number(f64),
    Source(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FunctionDef {
    #[serde(default)]
    params: Vec<String>,
    body: Expr,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PluginFile {
    #[serde(default)]
    constants: BTreeMap<String, ConstantDef>,
    #[serde(default)]
    functions: BTreeMap<String, FunctionDef>,
}

fn check_name(name: &str) -> Result<(), PluginError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(PluginError::InvalidName(name.into()))
    }
}

/// Parse plugin source into the entries it defines, without touching `builder`.
pub fn parse_plugin(
    source: &str,
    builder: &RegistryBuilder,
) -> Result<Vec<(String, Entry)>, PluginError> {
    let plugin: PluginFile = toml::from_str(source)?;
    let mut entries = Vec::with_capacity(plugin.constants.len() + plugin.functions.len());

    for (name, def) in plugin.constants {
        check_name(&name)?;
        let value = match def {
            ConstantDef::Number(value) => value,
            ConstantDef::Source(expr) => eval_str_with_context(&expr, builder)
                .map_err(|source| PluginError::Constant {
                    name: name.clone(),
                    source,
                })?,
        };
        entries.push((name, Entry::Constant(value)));
    }

    for (name, def) in plugin.functions {
        check_name(&name)?;
        if entries.iter().any(|(n, _)| *n == name) {
            return Err(PluginError::DuplicateName(name));
        }
        let mut seen = HashSet::new();
        for param in &def.params {
            check_name(param)?;
            if !seen.insert(param.as_str()) {
                return Err(PluginError::DuplicateParam {
                    function: name.clone(),
                    param: param.clone(),
                });
            }
        }
        entries.push((name, Entry::Function(Function::defined(def.params, def.body))));
    }

    Ok(entries)
}

/// Load one plugin file into `builder`, returning the number of names it defined.
///
/// Nothing is merged unless the whole file is valid.
pub fn load_file(path: &Path, builder: &mut RegistryBuilder) -> Result<usize, PluginError> {
    let source = fs::read_to_string(path)?;
    let entries = parse_plugin(&source, builder)?;

    for (name, _) in &entries {
        builder.check(name)?;
    }

    let count = entries.len();
    for (name, entry) in entries {
        builder.define(name, entry, Origin::Plugin(path.to_path_buf()))?;
    }
    Ok(count)
}

fn plugin_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(error) => {
                warn!(dir = %dir.display(), %error, "cannot read plugin directory entry");
                continue;
            }
        };
        let hidden = path
            .file_name()
            .and_then(OsStr::to_str)
            .map_or(true, |name| name.starts_with('.'));
        let is_plugin = path.extension().and_then(OsStr::to_str) == Some(PLUGIN_EXTENSION);
        if hidden || !is_plugin || !path.is_file() {
            debug!(path = %path.display(), "not a plugin, ignored");
            continue;
        }
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}

/// Load every plugin file found directly in `dir`.
///
/// A missing directory yields an empty report.
pub fn load_dir(dir: &Path, builder: &mut RegistryBuilder) -> LoadReport {
    let mut report = LoadReport::default();

    let paths = match plugin_files(dir) {
        Ok(paths) => paths,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "no plugin directory");
            return report;
        }
        Err(error) => {
            warn!(dir = %dir.display(), %error, "cannot read plugin directory");
            return report;
        }
    };

    for path in paths {
        match load_file(&path, builder) {
            Ok(count) => {
                debug!(plugin = %path.display(), definitions = count, "plugin loaded");
                report.definitions += count;
                report.loaded.push(path);
            }
            Err(error) => {
                warn!(plugin = %path.display(), %error, "skipping plugin");
                report.failed.push((path, error));
            }
        }
    }

    report
}
