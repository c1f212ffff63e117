//! Error types for the clustering crate

use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during clustering operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A caller contract was violated (bad configuration, malformed column
    /// indices, mismatched initial centroid arrays). Checked before any work.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Error message
        message: String,
    },

    /// The input data (or sample weights) cannot be clustered as given
    #[error("Invalid data: {message}")]
    InvalidData {
        /// Error message
        message: String,
    },

    /// No initial partition without empty clusters could be found
    #[error("Initialization failure: {message}")]
    InitializationFailure {
        /// Error message
        message: String,
    },

    /// The requested configuration is not supported
    #[error("Not implemented: {message}")]
    NotImplemented {
        /// Error message
        message: String,
    },

    /// Runtime failure unrelated to the input (e.g. the worker pool)
    #[error("Computation error: {message}")]
    ComputationError {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a new InvalidParameter error
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create a new InvalidData error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new InitializationFailure error
    pub fn initialization_failure(message: impl Into<String>) -> Self {
        Self::InitializationFailure {
            message: message.into(),
        }
    }

    /// Create a new NotImplemented error
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::NotImplemented {
            message: message.into(),
        }
    }

    /// Create a new ComputationError
    pub fn computation_error(message: impl Into<String>) -> Self {
        Self::ComputationError {
            message: message.into(),
        }
    }

    /// Whether the error stems from the values supplied rather than from how
    /// the API was called. Such errors go away with corrected input.
    pub fn is_value_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidData { .. } | Self::InitializationFailure { .. }
        )
    }

    /// The human-readable message carried by the error
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidParameter { message }
            | Self::InvalidData { message }
            | Self::InitializationFailure { message }
            | Self::NotImplemented { message }
            | Self::ComputationError { message } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_error_class() {
        assert!(Error::invalid_data("x").is_value_error());
        assert!(Error::initialization_failure("x").is_value_error());
        assert!(!Error::invalid_parameter("x").is_value_error());
        assert!(!Error::not_implemented("x").is_value_error());
    }

    #[test]
    fn test_display_includes_message() {
        let err = Error::not_implemented("unknown init method 'nonsense'");
        assert_eq!(err.message(), "unknown init method 'nonsense'");
        assert_eq!(
            err.to_string(),
            "Not implemented: unknown init method 'nonsense'"
        );
    }
}
