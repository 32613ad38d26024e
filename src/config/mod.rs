//! Configuration for magicboot
//!
//! A single JSON config file controls the dynamic-files root folder and the
//! module policy applied during slot discovery. Everything else the
//! bootstrap protocols touch is a fixed literal of the runtime's file
//! layout, declared here as constants.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MagicError, Result};
use crate::slots::ModulePolicy;

/// Reserved folder name whose contents execute once at process start.
pub const STARTUP_FOLDER: &str = "magic.startup";

/// Reserved extension of executable script files.
pub const SCRIPT_EXTENSION: &str = ".hl";

/// Reserved filename of per-folder exception handler scripts.
pub const EXCEPTIONS_FILE: &str = "exceptions.hl";

/// Slot name every script is dispatched under.
pub const EVALUATE_SLOT: &str = "evaluate";

/// Environment variable overriding the configured root folder.
pub const ROOT_FOLDER_ENV: &str = "MAGICBOOT_ROOT";

/// Top-level configuration, typically loaded from `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the dynamic files hierarchy containing `system/` and
    /// `modules/`. Defaults to `files/` relative to the working directory.
    /// A leading `~/` expands to the user's home directory.
    pub root_folder: String,

    /// Module policy applied during slot discovery.
    pub modules: ModulePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_folder: default_root_folder(),
            modules: ModulePolicy::default(),
        }
    }
}

fn default_root_folder() -> String {
    "files/".to_string()
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            MagicError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Load configuration from `~/.magicboot/config.json` when present,
    /// falling back to defaults. The `MAGICBOOT_ROOT` environment variable
    /// overrides the root folder either way.
    pub fn load_default() -> Result<Self> {
        let mut config = match default_config_path() {
            Some(path) if path.is_file() => Self::load(&path)?,
            _ => Self::default(),
        };

        if let Ok(root) = std::env::var(ROOT_FOLDER_ENV) {
            if !root.trim().is_empty() {
                config.root_folder = root;
            }
        }

        Ok(config)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".magicboot").join("config.json"))
}

/// Maps the logical roots (`system/`, `modules/`) and virtual paths to
/// absolute filesystem locations under the configured root folder.
#[derive(Debug, Clone)]
pub struct RootResolver {
    root: PathBuf,
}

impl RootResolver {
    /// Create a resolver from configuration, expanding a leading `~/`.
    pub fn new(config: &Config) -> Self {
        let raw = config.root_folder.trim_end_matches('/');
        let root = match raw.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(rest),
            None => PathBuf::from(raw),
        };
        Self { root }
    }

    /// The configured root folder.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the `system/` root.
    pub fn system(&self) -> PathBuf {
        self.root.join("system")
    }

    /// Absolute path of the `modules/` root.
    pub fn modules(&self) -> PathBuf {
        self.root.join("modules")
    }

    /// Resolve a virtual path (`/modules/invoices/create`) to an absolute
    /// filesystem path under the root.
    pub fn resolve(&self, virtual_path: &str) -> PathBuf {
        self.root.join(virtual_path.trim_start_matches('/'))
    }
}
