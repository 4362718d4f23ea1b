//! Error types for relclean

use thiserror::Error;

/// Result type alias using CleanupError
pub type Result<T> = std::result::Result<T, CleanupError>;

/// Error type alias for convenience
pub type Error = CleanupError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for relclean
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid cleanup service: {0}")]
    InvalidService(String),

    #[error("CleanupService with identifier \"{0}\" is not registered")]
    NotRegistered(String),

    #[error("Reference update failed: {0}")]
    ReferenceUpdate(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CleanupError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotRegistered(_) => exit_codes::NOT_FOUND,
            Self::InvalidService(_) | Self::Config(_) | Self::Schema(_) => {
                exit_codes::INVALID_INPUT
            }
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}
