use thiserror::Error;

use crate::models::state::ModuleState;

/// Errors reported by a radio driver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RadioError {
    /// The radio hardware is not present or not initialized
    #[error("radio unavailable: {0}")]
    Unavailable(String),

    /// The radio is already capturing or advertising
    #[error("radio busy: {0}")]
    Busy(String),

    /// Channel outside the range the radio supports
    #[error("channel {0} not supported by radio")]
    InvalidChannel(u8),

    /// Raw frame transmission was rejected
    #[error("transmit failed: {0}")]
    Transmit(String),
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// A consumer task or event queue could not be created
    #[error("resource allocation failed: {0}")]
    ResourceAllocation(String),

    /// The coordinator is in the error state and must be stopped first
    #[error("coordinator is in state {0}; stop it before starting a new mode")]
    Faulted(ModuleState),

    /// Requested channel is outside 1..=14
    #[error("invalid channel: {0}")]
    InvalidChannel(u8),

    /// Unknown mode name from an outer surface
    #[error("unknown mode: {0}")]
    UnknownMode(String),

    /// Error from the radio driver
    #[error("radio error: {0}")]
    Radio(#[from] RadioError),

    /// Error from configuration loading
    #[error("configuration error: {0}")]
    Config(String),

    /// Error from I/O operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from JSON serialization/deserialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl AppError {
    /// Whether the error was caused by bad caller input rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidChannel(_) | AppError::UnknownMode(_) | AppError::Faulted(_)
        )
    }
}

/// Result type for application
pub type AppResult<T> = Result<T, AppError>;
