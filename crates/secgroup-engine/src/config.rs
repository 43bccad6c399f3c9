//! Session configuration loading from JSON

use anyhow::{Context, Result};
use secgroup_common::{ApplicationContext, Draft, ProviderSettings};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// The application and draft a session is opened for
#[derive(Debug, Clone, Deserialize)]
pub struct SessionFile {
    pub application: ApplicationContext,
    pub draft: Draft,
}

impl SessionFile {
    /// Load a session description from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse session file: {}", path.display()))
    }
}

/// Load provider settings, falling back to defaults when no file is given
pub fn load_settings(path: Option<&Path>) -> Result<ProviderSettings> {
    match path {
        Some(path) => ProviderSettings::load(path)
            .with_context(|| format!("Failed to load settings: {}", path.display())),
        None => Ok(ProviderSettings::default()),
    }
}
