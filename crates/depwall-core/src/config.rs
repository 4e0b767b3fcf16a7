//! TOML configuration for package constraints.
//!
//! ```toml
//! ignoreExternal = true
//! recursive = true
//! concurrency = 4
//!
//! [[constraint]]
//! from = "./domain"
//! allow = ["./domain"]
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Config {
    /// Declared constraints, checked in order.
    #[serde(rename = "constraint", alias = "constraints", default)]
    pub constraints: Vec<Constraint>,

    /// Skip packages outside the module instead of checking them.
    #[serde(alias = "ignore_external", default)]
    pub ignore_external: bool,

    /// Follow imports transitively instead of direct imports only.
    #[serde(default)]
    pub recursive: bool,

    /// Maximum number of roots checked at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

/// A single layering rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Constraint {
    /// Package pattern the rule applies to; may be `./`-relative and end in `**`.
    pub from: String,
    /// Package prefixes the matched packages may depend on.
    #[serde(default)]
    pub allow: Vec<String>,
}

/// Values given on the command line that take precedence over the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Overrides [`Config::ignore_external`].
    pub ignore_external: Option<bool>,
    /// Overrides [`Config::recursive`].
    pub recursive: Option<bool>,
    /// Overrides [`Config::concurrency`].
    pub concurrency: Option<usize>,
}

fn default_concurrency() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            constraints: Vec::new(),
            ignore_external: false,
            recursive: false,
            concurrency: default_concurrency(),
        }
    }
}

/// Errors when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read config file.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// IO error.
        source: std::io::Error,
    },
    /// Failed to parse TOML.
    #[error("invalid config: {message}")]
    Parse {
        /// Parse error detail.
        message: String,
    },
    /// Config is structurally invalid.
    #[error("config validation: {0}")]
    Validation(String),
}

impl Config {
    /// Load from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parse from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Applies command-line overrides.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(ignore_external) = overrides.ignore_external {
            self.ignore_external = ignore_external;
        }
        if let Some(recursive) = overrides.recursive {
            self.recursive = recursive;
        }
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = concurrency;
        }
    }

    /// Import levels the resolver should expand below a root.
    ///
    /// `Some(1)` limits checks to direct imports; `None` is unbounded.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        if self.recursive {
            None
        } else {
            Some(1)
        }
    }

    /// Validate config consistency.
    ///
    /// # Errors
    ///
    /// Returns error describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Validation(
                "concurrency must be at least 1".into(),
            ));
        }

        for (i, c) in self.constraints.iter().enumerate() {
            if c.from.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "constraint[{i}]: empty 'from'"
                )));
            }
            if let Some(j) = c.allow.iter().position(|a| a.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "constraint[{i}].allow[{j}]: empty pattern"
                )));
            }
        }

        Ok(())
    }
}
