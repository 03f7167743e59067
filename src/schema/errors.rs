//! Catalog loading errors
//!
//! Loading happens once at startup; every failure is fatal to the caller.

use thiserror::Error;

/// Catalog errors
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to read catalog '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog JSON in '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed entity '{entity}': {reason}")]
    MalformedEntity { entity: String, reason: String },

    #[error("Entity '{0}' declared twice")]
    DuplicateEntity(String),
}

impl SchemaError {
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::Io { .. } => "SEEK_SCHEMA_IO",
            SchemaError::Json { .. } => "SEEK_SCHEMA_JSON",
            SchemaError::MalformedEntity { .. } => "SEEK_SCHEMA_MALFORMED",
            SchemaError::DuplicateEntity(_) => "SEEK_SCHEMA_DUPLICATE",
        }
    }
}

pub type SchemaResult<T> = Result<T, SchemaError>;
