//! Error types for the engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration rejected before a run starts
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// Operation called in the wrong lifecycle state
    #[error("Invalid engine state: expected {expected}, found {actual}")]
    InvalidState {
        expected: &'static str,
        actual: String,
    },

    /// Exchange call failed (price, account or order)
    #[error("Exchange error: {0}")]
    Exchange(#[source] anyhow::Error),
}
