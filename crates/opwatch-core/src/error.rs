//! Unified error handling for opwatch-core
//!
//! Every failure a monitoring session can end with is a [`CoreError`]. Fetch
//! failures keep the underlying [`ApiError`] as their source so callers can
//! still ask whether the cause was a 404, an auth problem, and so on.
//!
//! # Example
//!
//! ```rust
//! use opwatch_core::{ApiError, CoreError};
//!
//! let err = CoreError::Fetch {
//!     operation_id: "op_123".to_string(),
//!     source: ApiError::NotFound { message: "no such operation".to_string() },
//! };
//! assert!(err.is_not_found());
//! assert_eq!(err.operation_id(), Some("op_123"));
//! ```

use thiserror::Error;

use crate::client::ApiError;
use crate::config::ConfigError;

/// Core error type for operation monitoring
#[derive(Error, Debug)]
pub enum CoreError {
    /// The operation location is not a well-formed URL
    #[error("parse url of operation '{location}': {source}")]
    ReferenceParse {
        location: String,
        #[source]
        source: url::ParseError,
    },

    /// The operation location parsed but has no trailing path segment
    #[error("operation url '{location}' has no operation id")]
    MissingOperationId { location: String },

    /// An HTTP response that should have started an operation had no usable Location header
    #[error("response has no Location header pointing to an operation")]
    MissingLocation,

    /// Fetching the operation status failed
    #[error("get operation {operation_id}: {source}")]
    Fetch {
        operation_id: String,
        #[source]
        source: ApiError,
    },

    /// The remote operation finished with status `error`
    #[error("Operation '{op_type}' ({operation_id}) failed, an error occurred: {detail}")]
    OperationFailed {
        op_type: String,
        operation_id: String,
        detail: String,
    },

    /// The poller signalled completion for a status that is not terminal
    #[error("operation {operation_id} signalled completion with non-terminal status '{status}'")]
    UnexpectedStatus {
        operation_id: String,
        status: String,
    },

    /// The poller went away without sending either signal
    #[error("poller for operation {operation_id} stopped without reporting a result")]
    PollerStopped { operation_id: String },

    #[error("operation {operation_id} does not expose an attach URL")]
    MissingAttachUrl { operation_id: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Wrap a fetch failure with the operation it was for
    pub(crate) fn fetch(operation_id: &str, source: ApiError) -> Self {
        CoreError::Fetch {
            operation_id: operation_id.to_string(),
            source,
        }
    }

    /// The operation this error is about, when known
    #[must_use]
    pub fn operation_id(&self) -> Option<&str> {
        match self {
            CoreError::Fetch { operation_id, .. }
            | CoreError::OperationFailed { operation_id, .. }
            | CoreError::UnexpectedStatus { operation_id, .. }
            | CoreError::PollerStopped { operation_id }
            | CoreError::MissingAttachUrl { operation_id } => Some(operation_id),
            _ => None,
        }
    }

    /// Returns true if the location itself was unusable (no request was made)
    #[must_use]
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            CoreError::ReferenceParse { .. }
                | CoreError::MissingOperationId { .. }
                | CoreError::MissingLocation
        )
    }

    /// Returns true if the remote operation itself reported a failure
    #[must_use]
    pub fn is_operation_failure(&self) -> bool {
        matches!(self, CoreError::OperationFailed { .. })
    }

    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            CoreError::Fetch { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            CoreError::Fetch { source, .. } => source.is_unauthorized(),
            _ => false,
        }
    }

    /// Returns true if this error is potentially retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Fetch { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}
