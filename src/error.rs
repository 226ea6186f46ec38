// =============================================================================
// Error types for the channel core
// =============================================================================

use thiserror::Error;

/// Result alias for channel computations.
pub type Result<T> = std::result::Result<T, ChannelError>;

/// Failures the channel core reports instead of producing NaN/Inf levels.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
    /// A configuration value is out of its accepted range.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The supplied bar window is too short for the computation.
    #[error("Insufficient history: need at least {required} bars, got {available}")]
    InsufficientHistory { required: usize, available: usize },
}

impl ChannelError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn insufficient_history(required: usize, available: usize) -> Self {
        Self::InsufficientHistory {
            required,
            available,
        }
    }
}
