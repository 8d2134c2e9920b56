//! Error types for ParityIO
//!
//! This module defines the common error types used throughout the workspace.

use thiserror::Error;

/// Common result type for ParityIO operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for ParityIO
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Erasure coding errors
    #[error("insufficient shards for reconstruction: have {available}, need {required}")]
    InsufficientShards { available: usize, required: usize },

    #[error("erasure coding error: {0}")]
    ErasureCoding(String),

    // Caller errors
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Check if the error was caused by the caller's input
    ///
    /// Caller errors are never transient; repeating the call with the same
    /// input yields the same error.
    #[must_use]
    pub const fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidArgument(_) | Self::Configuration(_))
    }

    /// Check if this error reports lost redundancy
    #[must_use]
    pub const fn is_data_loss(&self) -> bool {
        matches!(self, Self::InsufficientShards { .. })
    }

    /// Process exit code used by ParityIO binaries
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            // 2: usage / input problems
            Self::InvalidArgument(_) | Self::Configuration(_) => 2,

            // 3: data cannot be recovered
            Self::InsufficientShards { .. } | Self::ErasureCoding(_) => 3,

            // 1: everything else
            Self::Io(_) | Self::Serialization(_) => 1,
        }
    }
}
