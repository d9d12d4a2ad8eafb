//! Error handling types

use std::sync::Arc;
use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the caching subsystem
#[derive(Error, Debug)]
pub enum Error {
    /// Backing store unreachable. Reads fail open, writes fail silent;
    /// this variant never surfaces as a failure of the wrapped operation.
    #[error("Store unavailable: {message}")]
    StoreUnavailable {
        /// Description of the connectivity failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The wrapped operation itself failed; propagated verbatim and never cached
    #[error("Operation failed: {message}")]
    Executor {
        /// Description of the executor failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Destructive operation attempted without the confirmation flag
    #[error("Confirmation required: {message}")]
    ConfirmationRequired {
        /// What the caller must confirm
        message: String,
    },

    /// Confirmation flag set but the confirmation phrase did not match
    #[error("Invalid confirmation: {message}")]
    InvalidConfirmation {
        /// Description of the mismatch
        message: String,
    },

    /// Malformed key pattern; rejected before touching the store
    #[error("Invalid pattern: {message}")]
    InvalidPattern {
        /// Description of the malformed pattern
        message: String,
    },

    /// Configuration-related error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Payload serialization or deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

// Store error creation methods
impl Error {
    /// Create a store unavailable error
    pub fn store_unavailable<S: Into<String>>(message: S) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create a store unavailable error with source
    pub fn store_unavailable_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// True when the error is store unavailability, the fail-open condition
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}

// Executor error creation methods
impl Error {
    /// Create an executor error
    pub fn executor<S: Into<String>>(message: S) -> Self {
        Self::Executor {
            message: message.into(),
            source: None,
        }
    }

    /// Create an executor error with source
    pub fn executor_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Executor {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Administrative guard error creation methods
impl Error {
    /// Create a confirmation required error
    pub fn confirmation_required<S: Into<String>>(message: S) -> Self {
        Self::ConfirmationRequired {
            message: message.into(),
        }
    }

    /// Create an invalid confirmation error
    pub fn invalid_confirmation<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfirmation {
            message: message.into(),
        }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern<S: Into<String>>(message: S) -> Self {
        Self::InvalidPattern {
            message: message.into(),
        }
    }
}

// Configuration and serialization error creation methods
impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a serialization error with source
    pub fn serialization_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::Serialization {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Cheaply cloneable error handle used to deliver one settled failure to
/// every caller attached to the same population.
///
/// `Error` itself is not `Clone` (boxed sources), so the population
/// coordinator wraps the leader's failure in an `Arc` and each waiter keeps
/// the original in its source chain.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct SharedError(pub Arc<Error>);

impl SharedError {
    /// Wrap an error for fan-out to multiple waiters
    pub fn new(error: Error) -> Self {
        Self(Arc::new(error))
    }

    /// Access the underlying error
    pub fn inner(&self) -> &Error {
        &self.0
    }
}

impl From<Error> for SharedError {
    fn from(error: Error) -> Self {
        Self::new(error)
    }
}

impl From<SharedError> for Error {
    /// Surface a shared population failure to one caller.
    ///
    /// The sole owner gets the original error back; additional waiters get
    /// an executor error carrying the same message with the shared handle as
    /// its source, so the chain survives for every caller.
    fn from(shared: SharedError) -> Self {
        match Arc::try_unwrap(shared.0) {
            Ok(error) => error,
            Err(arc) => Self::Executor {
                message: arc.to_string(),
                source: Some(Box::new(SharedError(arc))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_unavailable_is_distinguishable() {
        let err = Error::store_unavailable("connection refused");
        assert!(err.is_store_unavailable());
        assert!(!Error::executor("boom").is_store_unavailable());
    }

    #[test]
    fn test_shared_error_sole_owner_unwraps_to_original() {
        let shared = SharedError::new(Error::executor("rpc timed out"));
        let err: Error = shared.into();
        assert!(matches!(err, Error::Executor { ref message, .. } if message == "rpc timed out"));
    }

    #[test]
    fn test_shared_error_fanned_out_keeps_message_and_chain() {
        let shared = SharedError::new(Error::executor("rpc timed out"));
        let other = shared.clone();
        let err: Error = shared.into();
        match err {
            Error::Executor { message, source } => {
                assert!(message.contains("rpc timed out"));
                assert!(source.is_some());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert!(other.inner().to_string().contains("rpc timed out"));
    }
}
