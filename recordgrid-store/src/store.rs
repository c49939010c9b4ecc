//! Record store and entity metadata capabilities.

use crate::error::Result;
use crate::query::Query;
use crate::record::{RowRecord, DEFAULT_IDENTIFIER};
use crate::value::Value;

/// Entity metadata needed by the query engine.
pub trait EntityMetadataProvider: Send + Sync {
    /// Identifier column names of an entity type, primary first. Empty when unknown.
    fn identifier_columns(&self, entity: &str) -> Vec<String>;

    /// The primary identifier column, falling back to `id`.
    fn identifier_column(&self, entity: &str) -> String {
        self.identifier_columns(entity)
            .into_iter()
            .next()
            .unwrap_or_else(|| DEFAULT_IDENTIFIER.to_string())
    }
}

/// The persistence layer queried and written by the engine.
///
/// Implementations own their own concurrency and transaction discipline.
/// Errors are returned as-is to callers of the engine.
pub trait RecordStore: EntityMetadataProvider {
    /// A fresh query over `entity` under the given root alias.
    fn create_query(&self, entity: &str, alias: &str) -> Query {
        Query::new(entity, alias)
    }

    /// Execute a record query.
    fn fetch(&self, query: &Query) -> Result<Vec<RowRecord>>;

    /// Execute a projection returning a single scalar.
    fn single_scalar(&self, query: &Query) -> Result<Value>;

    /// Execute a count projection.
    fn count(&self, query: &Query) -> Result<u64> {
        let scalar = self.single_scalar(query)?;
        Ok(match scalar {
            Value::Int(n) => u64::try_from(n).unwrap_or(0),
            other => other.to_text().parse().unwrap_or(0),
        })
    }

    /// A blank record for `entity` with every known column present.
    fn create_record(&self, entity: &str) -> Result<RowRecord>;

    /// Insert a new record, filling in a generated identifier.
    fn insert(&self, entity: &str, record: &mut RowRecord) -> Result<()>;

    /// Write an existing record back, matched on its identifier.
    fn update(&self, entity: &str, record: &RowRecord) -> Result<()>;
}
