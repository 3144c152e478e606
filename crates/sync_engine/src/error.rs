//! Synchronizer error types

use thiserror::Error;

/// Errors that prevent the synchronizer from starting.
///
/// Nothing in the steady-state tick is an error.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A required peer driver is not registered
    #[error("no {name} peer")]
    MissingPeer { name: String },

    /// Configuration rejected at start
    #[error("invalid synchronizer config: {message}")]
    InvalidConfig { message: String },
}

impl SyncError {
    pub fn missing_peer(name: impl Into<String>) -> Self {
        Self::MissingPeer { name: name.into() }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
