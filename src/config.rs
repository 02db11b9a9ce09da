use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::token::DEFAULT_TOKEN_PATTERN;

/// Environment variable that overrides `feed.access_token`.
pub const ACCESS_TOKEN_ENV: &str = "BOBA_SKILL_ACCESS_TOKEN";

pub const DEFAULT_CLOSED_MESSAGE: &str =
    "Drive through boba is not open today or they haven't posted on facebook yet.";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reject requests from any other application when set.
    pub app_id: Option<String>,
    pub feed: FeedConfig,
    pub selection: SelectionConfig,
    pub speech: SpeechConfig,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    pub api_version: String,
    pub page_id: String,
    pub access_token: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://graph.facebook.com".to_string(),
            api_version: "v2.6".to_string(),
            page_id: "drivethruboba".to_string(),
            access_token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub token_pattern: String,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            token_pattern: DEFAULT_TOKEN_PATTERN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub closed_message: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            closed_message: DEFAULT_CLOSED_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Console level
    pub level: String,
    /// Level for the log file, when one is set
    pub file_level: String,
    pub file: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_level: "debug".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load from a YAML file, falling back to defaults when the file is absent.
    /// The access token environment variable always wins over the file.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            Self::from_yaml(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path))?
        } else {
            Self::default()
        };

        config.apply_env(std::env::var(ACCESS_TOKEN_ENV).ok());
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        // an empty file deserializes to unit, not to a mapping
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    fn apply_env(&mut self, access_token: Option<String>) {
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            self.feed.access_token = Some(token);
        }
    }
}
