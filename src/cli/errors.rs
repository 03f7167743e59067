//! CLI-specific error types
//!
//! Errors loading inputs are fatal for the process; errors in the request
//! itself are reported as an error response.

use std::path::PathBuf;

use thiserror::Error;

use crate::errors::PlanError;
use crate::executor::ExecutorError;
use crate::schema::SchemaError;

#[derive(Debug, Error)]
pub enum CliError {
    /// I/O error (stdin/stdout)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Request is not valid JSON or has the wrong shape
    #[error("Invalid request: {0}")]
    Request(String),

    #[error("Failed to load config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Catalog(#[from] SchemaError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl CliError {
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Io(_) => "SEEK_CLI_IO",
            CliError::Request(_) => "SEEK_CLI_INVALID_REQUEST",
            CliError::Config { .. } => "SEEK_CLI_CONFIG",
            CliError::Catalog(err) => err.code(),
            CliError::Executor(err) => err.code(),
            CliError::Plan(err) => err.code(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::request(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(CliError::request("x").code(), "SEEK_CLI_INVALID_REQUEST");
        assert_eq!(
            CliError::from(PlanError::AccessDenied("Board".into())).code(),
            "SEEK_ACCESS_DENIED"
        );
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(CliError::from(json_err).code(), "SEEK_CLI_INVALID_REQUEST");
    }
}
