//! Provider settings and application context
//!
//! Settings are loaded from JSON and validated via `garde::Validate`.

use crate::defaults::{default_event_capacity, default_provider};
use garde::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Settings loading and validation errors
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to parse JSON settings
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// Settings parsed but failed validation
    #[error("Invalid settings: {0}")]
    Invalid(#[from] garde::Report),

    /// Failed to read the settings file
    #[error("Failed to read settings file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SettingsError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Provider-level policy consulted by the draft controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    /// Provider whose accounts and catalog entries are used
    #[serde(default = "default_provider")]
    #[garde(length(min = 1))]
    pub provider: String,

    /// Applications created at or after this instant (epoch ms) may not launch
    /// into classic networking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(range(min = 0))]
    pub classic_launch_lockout: Option<i64>,

    /// Label of the VPC preferred when a default has to be picked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(length(min = 1))]
    pub default_vpc_label: Option<String>,

    /// Capacity of the draft event channel
    #[serde(default = "default_event_capacity")]
    #[garde(range(min = 1))]
    pub event_capacity: usize,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            classic_launch_lockout: None,
            default_vpc_label: None,
            event_capacity: default_event_capacity(),
        }
    }
}

impl ProviderSettings {
    /// Parse and validate settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::io(path.display().to_string(), e))?;
        Self::from_json(&content)
    }

    /// Whether classic networking is locked out for an application created at `create_ts`
    pub fn classic_locked_out(&self, create_ts: i64) -> bool {
        self.classic_launch_lockout
            .is_some_and(|lockout| create_ts >= lockout)
    }
}

/// The application a draft belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationContext {
    pub name: String,
    /// Creation time of the application (epoch ms); 0 when unknown
    #[serde(default)]
    pub create_ts: i64,
}

impl ApplicationContext {
    pub fn new(name: impl Into<String>, create_ts: i64) -> Self {
        Self {
            name: name.into(),
            create_ts,
        }
    }
}
