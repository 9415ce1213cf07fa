//! Error type for the operations API client

use thiserror::Error;

/// Errors returned while talking to the operations API
#[derive(Error, Debug)]
pub enum ApiError {
    /// 401/403 from the API
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    /// Any other 4xx response
    #[error("Bad request ({status}): {message}")]
    BadRequest { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The response body could not be decoded into an operation
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid API URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl ApiError {
    /// Map a non-success HTTP status and its body text to an error
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => ApiError::AuthenticationFailed { message },
            404 => ApiError::NotFound { message },
            429 => ApiError::RateLimited { message },
            500..=599 => ApiError::ServerError { status, message },
            _ => ApiError::BadRequest { status, message },
        }
    }

    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::AuthenticationFailed { .. })
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, ApiError::ServerError { .. })
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout(_))
    }

    /// Returns true if this is a rate limiting error (429)
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. })
    }

    /// Returns true if a later request might succeed where this one failed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited { .. }
                | ApiError::ServerError { .. }
                | ApiError::ConnectionError(_)
                | ApiError::Timeout(_)
        )
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::ConnectionError(err.to_string())
        }
    }
}
