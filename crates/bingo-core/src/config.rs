//! Game configuration
//!
//! Loaded from JSON or YAML. Every section falls back to its defaults, so a
//! config file only needs the keys it overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{BingoError, BingoResult};
use crate::identity::AdminPolicy;

/// Default requester name for identities without a display name
pub const DEFAULT_ANONYMOUS_NAME: &str = "Anonymous player";

/// Top-level game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Administrator settings
    pub admin: AdminConfig,
    /// Requester name used when an identity has no display name
    pub anonymous_name: String,
    /// Fixed seed for card generation (None = OS entropy)
    pub card_seed: Option<u64>,
    /// Reject confirmation requests for already validated outcomes
    pub strict_requests: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            admin: AdminConfig::default(),
            anonymous_name: DEFAULT_ANONYMOUS_NAME.to_string(),
            card_seed: None,
            strict_requests: false,
        }
    }
}

/// Administrator settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Emails allowed to curate events and validate outcomes
    pub emails: Vec<String>,
}

impl GameConfig {
    /// Config with the given administrator emails and defaults otherwise
    pub fn with_admins<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admin: AdminConfig {
                emails: emails.into_iter().map(Into::into).collect(),
            },
            ..Self::default()
        }
    }

    /// Build the administrator policy from the allow-list
    pub fn admin_policy(&self) -> AdminPolicy {
        AdminPolicy::new(&self.admin.emails)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> BingoResult<Self> {
        serde_json::from_str(json).map_err(|e| BingoError::Config(e.to_string()))
    }

    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> BingoResult<Self> {
        serde_yml::from_str(yaml).map_err(|e| BingoError::Config(e.to_string()))
    }

    /// Load from a file, picking the format from the extension
    pub fn load_from<P: AsRef<Path>>(path: P) -> BingoResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| BingoError::Config(format!("{}: {}", path.display(), e)))?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content)?,
            _ => Self::from_json(&content)?,
        };

        if config.admin.emails.is_empty() {
            log::warn!("No administrators configured in {}", path.display());
        }
        log::debug!("Loaded game config from {}", path.display());
        Ok(config)
    }

    /// Save as pretty JSON, creating parent directories
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> BingoResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BingoError::Config(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| BingoError::Config(e.to_string()))
    }
}
