//! Error types for the uptime state store.

use thiserror::Error;

use crate::types::MonitorId;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during state store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    /// A read or write against an open table failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// A stored record could not be encoded or decoded as JSON.
    #[error("codec error: {0}")]
    Codec(String),

    #[error("monitor {0} not found")]
    MonitorNotFound(MonitorId),
}

impl StateError {
    /// Whether the error means the target record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MonitorNotFound(_))
    }
}
