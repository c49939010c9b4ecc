//! Error types for the field registry

use std::path::PathBuf;
use thiserror::Error;

/// Result type for field operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Errors that can occur in field registry operations
#[derive(Debug, Error)]
pub enum FieldsError {
    /// No field with this identifier in the field set
    #[error("field not found: {identifier}")]
    FieldNotFound { identifier: String },

    /// Declarations directory not found
    #[error("declarations directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Record store error
    #[error(transparent)]
    Store(#[from] recordgrid_store::StoreError),
}

impl FieldsError {
    /// Create a field not found error
    pub fn field_not_found(identifier: impl Into<String>) -> Self {
        Self::FieldNotFound {
            identifier: identifier.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FieldsError::field_not_found("email");
        assert_eq!(err.to_string(), "field not found: email");
    }

    #[test]
    fn test_store_error_is_transparent() {
        let err = FieldsError::from(recordgrid_store::StoreError::unknown_entity("app::User"));
        assert_eq!(err.to_string(), "unknown entity type: app::User");
    }
}
