//! Shared error type
//!
//! Every Vista crate reports failures through [`Error`]. Composition failures
//! (a definition or schema that cannot produce SQL) are kept apart from
//! backend failures reported by the connection.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Vista error
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Composition Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("fail to compose the sql statement: {message}")]
    Composition { message: String },

    #[error("invalid entity definition: {message}")]
    InvalidDefinition { message: String },

    #[error("schema validation error: {message}")]
    SchemaValidation { message: String },

    #[error("entity definition not found: {key}")]
    DefinitionNotFound { key: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Backend Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("backend error: {message}")]
    Backend { message: String },

    #[error("{source} (rollback also failed: {rollback})")]
    Rollback {
        source: Box<Error>,
        rollback: Box<Error>,
    },

    // ─────────────────────────────────────────────────────────────────────────────
    // Config/Serialization Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("config error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn composition(message: impl Into<String>) -> Self {
        Error::Composition {
            message: message.into(),
        }
    }

    pub fn invalid_definition(message: impl Into<String>) -> Self {
        Error::InvalidDefinition {
            message: message.into(),
        }
    }

    pub fn schema_validation(message: impl Into<String>) -> Self {
        Error::SchemaValidation {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Error::Backend {
            message: message.into(),
        }
    }

    /// Whether the failure happened before anything reached the database
    pub fn is_composition(&self) -> bool {
        matches!(
            self,
            Error::Composition { .. }
                | Error::InvalidDefinition { .. }
                | Error::SchemaValidation { .. }
                | Error::DefinitionNotFound { .. }
        )
    }

    /// Error code for callers
    pub fn code(&self) -> &'static str {
        match self {
            Error::Composition { .. } => "COMPOSITION_ERROR",
            Error::InvalidDefinition { .. } => "INVALID_DEFINITION",
            Error::SchemaValidation { .. } => "SCHEMA_VALIDATION_ERROR",
            Error::DefinitionNotFound { .. } => "DEFINITION_NOT_FOUND",
            Error::Backend { .. } => "BACKEND_ERROR",
            Error::Rollback { source, .. } => source.code(),
            Error::Config { .. } => "CONFIG_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Yaml(_) => "YAML_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composition_classification() {
        assert!(Error::composition("empty").is_composition());
        assert!(Error::schema_validation("no columns").is_composition());
        assert!(!Error::backend("gone away").is_composition());
    }

    #[test]
    fn test_rollback_keeps_original_code() {
        let err = Error::Rollback {
            source: Box::new(Error::backend("duplicate entry")),
            rollback: Box::new(Error::backend("connection lost")),
        };
        assert_eq!(err.code(), "BACKEND_ERROR");
        assert!(err.to_string().contains("duplicate entry"));
        assert!(err.to_string().contains("connection lost"));
    }
}
