use chrono::{DateTime, Utc};
use thiserror::Error;

/// Message carried by [`SyncError::Network`] when an attempt hit its deadline.
pub const TIMEOUT_MESSAGE: &str = "timeout";

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    /// HTTP 403. Reported as [`ErrorKind::Unknown`] except where a caller
    /// knows what a refusal means (login treats it as a rejected credential).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded, resets at {reset_at}")]
    RateLimit { reset_at: DateTime<Utc> },

    #[error("{0}")]
    Unknown(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification used by callers that branch on the failure cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Authentication,
    Network,
    NotFound,
    RateLimit,
    Unknown,
}

impl SyncError {
    pub fn timeout() -> Self {
        SyncError::Network(TIMEOUT_MESSAGE.to_string())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, SyncError::Network(msg) if msg == TIMEOUT_MESSAGE)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Validation(_) => ErrorKind::Validation,
            SyncError::Authentication(_) => ErrorKind::Authentication,
            SyncError::Network(_) => ErrorKind::Network,
            SyncError::NotFound(_) => ErrorKind::NotFound,
            SyncError::RateLimit { .. } => ErrorKind::RateLimit,
            SyncError::Forbidden(_)
            | SyncError::Unknown(_)
            | SyncError::Database(_)
            | SyncError::Serialization(_)
            | SyncError::Io(_)
            | SyncError::Config(_) => ErrorKind::Unknown,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
