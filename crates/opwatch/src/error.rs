//! Error types for the opwatch CLI
//!
//! Core errors are mapped onto user-facing categories that know how to
//! suggest a fix, and printed as a cargo-style diagnostic.

use colored::Colorize;
use opwatch_core::{ApiError, ConfigError, CoreError};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Authentication failed: get operation op_123: invalid token
///
///   tip: check the api_token of your profile
/// ```
pub struct CliDiagnostic {
    message: String,
    tips: Vec<String>,
}

impl CliDiagnostic {
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            tips: Vec::new(),
        }
    }

    pub fn tip(mut self, description: &str) -> Self {
        self.tips.push(description.to_string());
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        for description in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
        }
    }
}

/// Main error type for the opwatch application
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile configured. {suggestion}")]
    NoProfileConfigured { suggestion: String },

    #[error("Invalid operation location: {message}")]
    InvalidLocation { message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("{message}")]
    OperationFailed { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for opwatch operations
pub type Result<T> = std::result::Result<T, CliError>;

impl CliError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            CliError::ProfileNotFound { name } => vec![
                format!("Add a [profiles.{}] section to your config file", name),
                "Check the profile name spelling".to_string(),
            ],
            CliError::AuthenticationFailed { .. } => vec![
                "Check the api_token of your profile".to_string(),
                "Tokens set through OPWATCH_API_TOKEN override the profile".to_string(),
            ],
            CliError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the api_url of your profile is correct".to_string(),
            ],
            CliError::InvalidLocation { .. } => vec![
                "Pass the full operation URL, e.g. https://api.example.com/v1/apps/my-app/operations/<id>"
                    .to_string(),
            ],
            CliError::ApiError { message } if message.contains("Not found") => vec![
                "Verify the operation id and the --app value".to_string(),
                "Check that you're using the correct profile".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&self.to_string());

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion);
        }

        diag.print();
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match &err {
            _ if err.is_reference_error() => CliError::InvalidLocation { message },
            CoreError::Fetch {
                operation_id,
                source: ApiError::AuthenticationFailed { message: detail },
            } => CliError::AuthenticationFailed {
                message: format!("get operation {}: {}", operation_id, detail),
            },
            CoreError::Fetch {
                source: ApiError::ConnectionError(_) | ApiError::Timeout(_),
                ..
            } => CliError::ConnectionError { message },
            CoreError::OperationFailed { .. } => CliError::OperationFailed { message },
            CoreError::Config(_) => CliError::Configuration(message),
            _ => CliError::ApiError { message },
        }
    }
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::InvalidUrl { .. } => CliError::Configuration(err.to_string()),
            ApiError::AuthenticationFailed { message } => {
                CliError::AuthenticationFailed { message }
            }
            _ => CliError::ConnectionError {
                message: err.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound { name },
            ConfigError::NoProfiles { suggestion } => CliError::NoProfileConfigured { suggestion },
            _ => CliError::Configuration(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}
