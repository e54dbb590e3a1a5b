//! Editor configuration file support.
//!
//! Automated callers (batch tools, tests, services) resolve conflicts with a
//! fixed policy read from a TOML file:
//!
//! ```toml
//! [resolver]
//! collision = "replace"
//! missing_predecessor = "skip"
//! ordering = "move"
//! abandoned_successor = "skip"
//! ```
//!
//! Every key is optional and defaults to the preselected choice of its
//! conflict kind.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::edit::{ConflictKind, PolicyResolver, Resolution};
use crate::error::ConfigError;

/// Editor configuration from file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub resolver: ResolverSettings,
}

/// Resolution policy per conflict kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverSettings {
    #[serde(default = "default_collision")]
    pub collision: Resolution,
    #[serde(default = "default_missing_predecessor")]
    pub missing_predecessor: Resolution,
    #[serde(default = "default_ordering")]
    pub ordering: Resolution,
    #[serde(default = "default_abandoned_successor")]
    pub abandoned_successor: Resolution,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            collision: default_collision(),
            missing_predecessor: default_missing_predecessor(),
            ordering: default_ordering(),
            abandoned_successor: default_abandoned_successor(),
        }
    }
}

fn default_collision() -> Resolution {
    ConflictKind::Collision.default_choice()
}

fn default_missing_predecessor() -> Resolution {
    ConflictKind::MissingPredecessor.default_choice()
}

fn default_ordering() -> Resolution {
    ConflictKind::Ordering.default_choice()
}

fn default_abandoned_successor() -> Resolution {
    ConflictKind::AbandonedSuccessor.default_choice()
}

impl EditorConfig {
    /// Load editor configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(EditorConfig)` if the file was read, parsed and validated
    /// * `Err(ConfigError)` otherwise
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded editor configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load editor configuration from the default location.
    ///
    /// Searches for `planner.toml` in:
    /// 1. Current directory
    /// 2. `config/` directory
    /// 3. Parent directory
    ///
    /// # Returns
    /// * `Ok(EditorConfig)` if found and parsed successfully
    /// * `Err(ConfigError)` if no config file found or parse error
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from("planner.toml"),
            PathBuf::from("config/planner.toml"),
            PathBuf::from("../planner.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(ConfigError::NotFound)
    }

    /// Check every policy against the choices its conflict kind offers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policy_resolver().map(|_| ())
    }

    /// Build the automated resolver described by the `[resolver]` section.
    pub fn policy_resolver(&self) -> Result<PolicyResolver, ConfigError> {
        let r = &self.resolver;
        PolicyResolver::new(r.collision, r.missing_predecessor, r.ordering, r.abandoned_successor)
    }
}
