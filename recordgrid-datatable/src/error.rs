//! Error types for the datatable engine

use thiserror::Error;

/// Result type for datatable operations
pub type Result<T> = std::result::Result<T, DatatableError>;

/// Errors that can occur while serving datatable, form or search requests
///
/// Invalid request input never ends up here: malformed sorting, paging or
/// search parameters fall back to safe defaults.
#[derive(Debug, Error)]
pub enum DatatableError {
    /// Record store error, passed through unchanged
    #[error(transparent)]
    Store(#[from] recordgrid_store::StoreError),

    /// Field registry error
    #[error(transparent)]
    Fields(#[from] recordgrid_fields::FieldsError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordgrid_store::StoreError;

    #[test]
    fn test_store_errors_pass_through() {
        let err = DatatableError::from(StoreError::unknown_entity("app::User"));
        assert_eq!(err.to_string(), "unknown entity type: app::User");
        assert!(matches!(err, DatatableError::Store(StoreError::UnknownEntity { .. })));
    }

    #[test]
    fn test_fields_error() {
        let err = DatatableError::from(recordgrid_fields::FieldsError::field_not_found("email"));
        assert_eq!(err.to_string(), "field not found: email");
    }
}
