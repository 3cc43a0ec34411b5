//! Discovery configuration file.
//!
//! # Responsibility
//! - Load ordered search roots and policies from a JSON document.
//!
//! # Invariants
//! - Root order in the file is the visiting order.
//! - Relative roots are resolved against the directory holding the file.
//! - Unknown keys are rejected.

use crate::discovery::DiscoveryPolicy;
use crate::root::DirectoryRoot;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Discovery settings, e.g.
///
/// ```json
/// {
///   "roots": ["manual", "/opt/plugins"],
///   "policy": { "on_malformed": "skip", "duplicates": "preserve" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    pub roots: Vec<PathBuf>,
    pub policy: DiscoveryPolicy,
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl DiscoveryConfig {
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Directory roots in configured order.
    pub fn directory_roots(&self) -> Vec<DirectoryRoot> {
        self.roots.iter().cloned().map(DirectoryRoot::new).collect()
    }

    fn resolve_relative_roots(&mut self, base: &Path) {
        for root in &mut self.roots {
            if root.is_relative() {
                *root = base.join(&*root);
            }
        }
    }
}

/// Loads a config file and resolves relative roots against its directory.
pub fn load_config(path: &Path) -> Result<DiscoveryConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config = DiscoveryConfig::from_json(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(base) = path.parent() {
        config.resolve_relative_roots(base);
    }
    Ok(config)
}
