//! Error types and handling for the Tributary library

use thiserror::Error;

/// Result type alias for Tributary operations
pub type Result<T> = std::result::Result<T, TributaryError>;

/// Main error type for the Tributary library
///
/// Runtime capture outcomes are reported through [`State`](crate::State),
/// never through this type. Errors here are raised at construction time,
/// before any captor participates in a frame.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TributaryError {
    /// Invalid configuration parameter
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message describing the configuration issue
        message: String,
    },
}

impl TributaryError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::error::TributaryError::config(format!($($arg)*))
    };
}
