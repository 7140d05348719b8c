//! Error types for covariance kernel computation
//!
//! Provides a unified error type for all gramian crates.

use thiserror::Error;

/// Core error type for kernel and distance operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid kernel, parameter, or prior configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operands whose shapes cannot be combined
    #[error("Shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Parameter value outside the supported set
    #[error("Unsupported parameter: {0}")]
    UnsupportedParameter(String),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an error for incompatible shapes
    pub fn shape_mismatch(context: &str, expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            context: context.to_string(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Create an error for a parameter value outside the supported set
    pub fn unsupported_parameter(msg: impl Into<String>) -> Self {
        Self::UnsupportedParameter(msg.into())
    }
}
