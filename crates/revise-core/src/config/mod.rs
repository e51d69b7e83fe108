//! Configuration system for revise.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ReviseError, ReviseResult};

/// Study session tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Maximum never-reviewed cards pulled into a session.
    pub new_card_limit: usize,
    /// Maximum due cards pulled into a session.
    pub due_card_limit: usize,
    /// How many positions deep a weakly-recalled card is re-inserted.
    pub requeue_offset: usize,
    /// Repetition tiers eligible for the due pull. `None` means any tier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_repetition_tiers: Option<Vec<u32>>,
    /// Hours after which an untouched active session is reclaimed.
    pub session_staleness_hours: i64,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            new_card_limit: 20,
            due_card_limit: 50,
            requeue_offset: 10,
            due_repetition_tiers: Some(vec![1, 2, 3]),
            session_staleness_hours: 24,
        }
    }
}

/// Main engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Study session tuning.
    pub study: StudyConfig,
    /// Path to the card database.
    pub db_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let revise_dir = dirs::home_dir()
            .map(|h| h.join(".revise"))
            .unwrap_or_else(|| PathBuf::from(".revise"));

        Self {
            study: StudyConfig::default(),
            db_path: revise_dir.join("revise.db"),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> ReviseResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| ReviseError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| ReviseError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| ReviseError::Configuration(e.to_string())),
            _ => Err(ReviseError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("REVISE_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(limit) = env_usize("REVISE_NEW_CARD_LIMIT") {
            config.study.new_card_limit = limit;
        }
        if let Some(limit) = env_usize("REVISE_DUE_CARD_LIMIT") {
            config.study.due_card_limit = limit;
        }
        if let Some(offset) = env_usize("REVISE_REQUEUE_OFFSET") {
            config.study.requeue_offset = offset;
        }
        if let Ok(hours) = std::env::var("REVISE_SESSION_STALENESS_HOURS") {
            if let Ok(hours) = hours.parse() {
                config.study.session_staleness_hours = hours;
            }
        }

        config
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Builder for EngineConfig.
#[derive(Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set study tuning.
    pub fn study(mut self, study: StudyConfig) -> Self {
        self.config.study = study;
        self
    }

    /// Set database path.
    pub fn db_path(mut self, path: PathBuf) -> Self {
        self.config.db_path = path;
        self
    }

    /// Set the new-card pull limit.
    pub fn new_card_limit(mut self, limit: usize) -> Self {
        self.config.study.new_card_limit = limit;
        self
    }

    /// Set the due-card pull limit.
    pub fn due_card_limit(mut self, limit: usize) -> Self {
        self.config.study.due_card_limit = limit;
        self
    }

    /// Set the re-queue offset.
    pub fn requeue_offset(mut self, offset: usize) -> Self {
        self.config.study.requeue_offset = offset;
        self
    }

    /// Set the due repetition tiers, or `None` to pull every tier.
    pub fn due_repetition_tiers(mut self, tiers: Option<Vec<u32>>) -> Self {
        self.config.study.due_repetition_tiers = tiers;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> EngineConfig {
        self.config
    }
}
