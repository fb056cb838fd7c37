//! Checker error types.
//!
//! Probe failures are not errors: they are verdicts that drive the state
//! machine. These variants cover setup and persistence only.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("invalid checker config: {0}")]
    Config(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("state store error: {0}")]
    State(#[from] uptime_state::StateError),
}

pub type HealthResult<T> = Result<T, HealthError>;
