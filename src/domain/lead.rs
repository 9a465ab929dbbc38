use crate::domain::status::StatusId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Opaque unique identifier for a lead
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(String);

impl LeadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for LeadId {
    type Err = crate::error::LeadboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(crate::error::LeadboardError::InvalidLeadId(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A lead record as persisted by the lead store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Missing or unknown statuses land in the board's default column
    #[serde(default)]
    pub status_id: Option<StatusId>,
    #[serde(default)]
    pub position: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Creates a new lead in the given status with a generated ID
    pub fn new(name: String, status_id: StatusId) -> Self {
        Self::with_id(LeadId::generate(), name, status_id)
    }

    pub fn with_id(id: LeadId, name: String, status_id: StatusId) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            email: None,
            phone: None,
            status_id: Some(status_id),
            position: 0,
            follow_up_at: None,
            agent_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_status(&mut self, status_id: StatusId, position: i64) {
        self.status_id = Some(status_id);
        self.position = position;
        self.updated_at = Utc::now();
    }

    pub fn set_follow_up(&mut self, at: Option<DateTime<Utc>>) {
        self.follow_up_at = at;
        self.updated_at = Utc::now();
    }

    /// Pushes the follow-up to `days` after `now`
    pub fn snooze(&mut self, now: DateTime<Utc>, days: u32) {
        self.set_follow_up(Some(now + Duration::days(i64::from(days))));
    }

    pub fn assign_agent(&mut self, agent_id: Option<String>) {
        self.agent_id = agent_id;
        self.updated_at = Utc::now();
    }
}
