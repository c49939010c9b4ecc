//! Error types for the record store

use thiserror::Error;

/// Result type for record store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by a record store backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// No table is registered for the entity type
    #[error("unknown entity type: {entity}")]
    UnknownEntity { entity: String },

    /// A table, alias, column or cast type that cannot be used as an SQL identifier
    #[error("invalid identifier: {name}")]
    InvalidIdentifier { name: String },

    /// An update was requested for a record without an identifier value
    #[error("record of {entity} has no identifier value")]
    MissingIdentifier { entity: String },

    /// A filter references a parameter that was never set
    #[error("query parameter not set: {name}")]
    MissingParameter { name: String },

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    /// Create an unknown entity error
    pub fn unknown_entity(entity: impl Into<String>) -> Self {
        Self::UnknownEntity {
            entity: entity.into(),
        }
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(name: impl Into<String>) -> Self {
        Self::InvalidIdentifier { name: name.into() }
    }
}
