//! Board settings, read from `.leadboard/config.toml`.
//!
//! Every field has a default, so a missing file or section is valid.

use crate::{
    domain::{FollowUpClassifier, StatusId},
    error::{LeadboardError, Result},
    storage::file_storage::FileLeadStore,
};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What a session does with its optimistic board after a failed persist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Keep the local order and only report the error
    #[default]
    Keep,
    /// Move the lead back unless a later move rewrote one of its columns
    Revert,
    /// Reload the whole board from the store
    Refetch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub board: BoardSettings,
    pub follow_up: FollowUpSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoardSettings {
    /// Column for leads whose status is missing or unknown; first column if unset
    pub default_status: Option<StatusId>,
    pub failure_policy: FailurePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FollowUpSettings {
    pub terminal_statuses: Vec<String>,
    /// Offset of the local day boundary from UTC
    pub utc_offset_minutes: i32,
    pub snooze_days: u32,
}

impl Default for FollowUpSettings {
    fn default() -> Self {
        Self {
            terminal_statuses: vec!["booked".to_string(), "lost".to_string()],
            utc_offset_minutes: 0,
            snooze_days: 1,
        }
    }
}

impl FollowUpSettings {
    pub fn classifier(&self) -> FollowUpClassifier {
        FollowUpClassifier::new(self.terminal_statuses.iter().cloned())
    }

    pub fn timezone(&self) -> Result<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                LeadboardError::ConfigError(format!(
                    "follow_up.utc_offset_minutes out of range: {}",
                    self.utc_offset_minutes
                ))
            })
    }
}

impl Settings {
    const CONFIG_FILE: &'static str = "config.toml";

    /// Loads `<project_root>/.leadboard/config.toml`, or defaults when the
    /// file does not exist
    pub fn load(project_root: impl AsRef<Path>) -> Result<Self> {
        let path = project_root
            .as_ref()
            .join(FileLeadStore::LEADBOARD_DIR)
            .join(Self::CONFIG_FILE);
        if !path.exists() {
            tracing::debug!(path = ?path, "no config file; using defaults");
            return Ok(Self::default());
        }
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.follow_up.timezone()?;
        if self.follow_up.snooze_days == 0 {
            return Err(LeadboardError::ConfigError(
                "follow_up.snooze_days must be at least 1".to_string(),
            ));
        }
        if self
            .follow_up
            .terminal_statuses
            .iter()
            .any(|name| name.trim().is_empty())
        {
            return Err(LeadboardError::ConfigError(
                "follow_up.terminal_statuses must not contain empty names".to_string(),
            ));
        }
        Ok(())
    }
}
