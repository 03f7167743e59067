//! Executor error types
//!
//! Error codes:
//! - plan error codes, passed through unchanged
//! - SEEK_EXEC_INVALID_ROW
//! - SEEK_EXEC_IO
//! - SEEK_EXEC_JSON

use std::path::PathBuf;

use thiserror::Error;

use crate::errors::PlanError;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// Stored row is not a JSON object or cannot be projected
    #[error("Invalid row for entity '{entity}': {reason}")]
    InvalidRow { entity: String, reason: String },

    #[error("Failed to read data file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse data file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ExecutorError {
    pub fn invalid_row(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRow {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ExecutorError::Plan(err) => err.code(),
            ExecutorError::InvalidRow { .. } => "SEEK_EXEC_INVALID_ROW",
            ExecutorError::Io { .. } => "SEEK_EXEC_IO",
            ExecutorError::Json { .. } => "SEEK_EXEC_JSON",
        }
    }
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_errors_keep_their_code() {
        let err: ExecutorError = PlanError::EntityNotFound("Ghost".into()).into();
        assert_eq!(err.code(), "SEEK_ENTITY_NOT_FOUND");
        assert_eq!(err.to_string(), "Entity 'Ghost' not found");
    }

    #[test]
    fn test_invalid_row() {
        let err = ExecutorError::invalid_row("User", "expected an object");
        assert_eq!(err.code(), "SEEK_EXEC_INVALID_ROW");
        assert!(err.to_string().contains("User"));
    }
}
