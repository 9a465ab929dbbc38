use thiserror::Error;

pub type Result<T> = std::result::Result<T, LeadboardError>;

#[derive(Debug, Error)]
pub enum LeadboardError {
    #[error("Lead not found: {0}")]
    LeadNotFound(String),

    #[error("Status not found: {0}")]
    StatusNotFound(String),

    #[error("Lead {lead} is not in column {column}")]
    LeadNotInColumn { lead: String, column: String },

    #[error("Board not initialized")]
    BoardNotInitialized,

    #[error("Invalid lead ID: {0}")]
    InvalidLeadId(String),

    #[error("Invalid status ID: {0}")]
    InvalidStatusId(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
