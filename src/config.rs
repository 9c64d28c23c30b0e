//! Startup configuration.
use std::path::PathBuf;

use clap::ValueEnum;
use tracing::debug;

use crate::plugin;
use crate::registry::{Registry, RegistryBuilder};

/// Directory scanned for plugins unless configured otherwise.
pub const DEFAULT_PLUGIN_DIR: &str = "plugins";

/// What happens when a definition reuses a name that is already registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ConflictPolicy {
    /// Replace the existing entry silently
    Overwrite,
    /// Replace the existing entry and log a warning
    #[default]
    Warn,
    /// Keep the existing entry and refuse the new one
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `None` disables plugin loading.
    pub plugin_dir: Option<PathBuf>,
    pub on_conflict: ConflictPolicy,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            plugin_dir: Some(PathBuf::from(DEFAULT_PLUGIN_DIR)),
            on_conflict: ConflictPolicy::default(),
        }
    }
}

impl Config {
    pub fn without_plugins() -> Config {
        Config {
            plugin_dir: None,
            ..Config::default()
        }
    }

    /// Built-ins, then plugins, then freeze.
    pub fn build_registry(&self) -> Registry {
        let mut builder = RegistryBuilder::new().with_policy(self.on_conflict);
        if let Some(dir) = &self.plugin_dir {
            let report = plugin::load_dir(dir, &mut builder);
            debug!(
                dir = %dir.display(),
                loaded = report.loaded.len(),
                failed = report.failed.len(),
                definitions = report.definitions,
                "plugins merged"
            );
        }
        builder.build()
    }
}
