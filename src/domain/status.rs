use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Identifier of a status column (e.g., `new`, `contacted`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusId(String);

impl StatusId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for StatusId {
    type Err = crate::error::LeadboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(crate::error::LeadboardError::InvalidStatusId(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl fmt::Display for StatusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A status column definition. Statuses are owned by the workspace and
/// only read by the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub id: StatusId,
    pub label: String,
    /// Column order, ascending left to right
    pub position: i64,
}

impl Status {
    pub fn new(id: impl Into<String>, label: impl Into<String>, position: i64) -> Self {
        Self {
            id: StatusId::new(id),
            label: label.into(),
            position,
        }
    }

    /// Whether either the id or the label matches `name`, ignoring case
    pub fn matches(&self, name: &str) -> bool {
        self.id.as_str().eq_ignore_ascii_case(name) || self.label.eq_ignore_ascii_case(name)
    }
}

/// Statuses seeded into a freshly initialized store
pub fn default_statuses() -> Vec<Status> {
    vec![
        Status::new("new", "New", 0),
        Status::new("contacted", "Contacted", 1),
        Status::new("quoted", "Quoted", 2),
        Status::new("booked", "Booked", 3),
        Status::new("lost", "Lost", 4),
    ]
}
