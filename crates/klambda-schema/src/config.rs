//! # Validator Configuration
//!
//! Optional knobs for building a [`crate::Validator`], loaded from YAML.
//!
//! ```yaml
//! validate_formats: false
//! bindings:
//!   io.knative.lambda.command.function.rollback: function-deploy
//! ```
//!
//! Every field defaults, so an empty file is the same as
//! [`crate::Validator::new`]. Extra bindings replace built-in bindings
//! with the same event type.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error loading a [`ValidatorConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config '{}': {source}", path.display())]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// The YAML was malformed or had unknown keys.
    #[error("invalid validator config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Registry construction options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Assert `format` keywords (`date-time`, ...) instead of treating them
    /// as annotations.
    pub validate_formats: bool,
    /// Additional event type to document-name bindings.
    pub bindings: BTreeMap<String, String>,
}

impl ValidatorConfig {
    /// Parse a config from YAML text. Empty text yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] on malformed YAML or unknown keys.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a config from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if its contents do not parse.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Add a binding, replacing any previous one for `event_type`.
    pub fn bind(mut self, event_type: impl Into<String>, document: impl Into<String>) -> Self {
        self.bindings.insert(event_type.into(), document.into());
        self
    }
}
