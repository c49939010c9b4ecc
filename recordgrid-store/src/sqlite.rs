//! SQLite-backed record store.
//!
//! Entity types are mapped onto tables up front. Queries are rendered to SQL
//! with every identifier quoted and every value bound as a named parameter,
//! so neither search terms nor sort columns are ever spliced into the
//! statement text.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::types::ToSql;
use rusqlite::Connection;
use tracing::{debug, trace};

use crate::error::{Result, StoreError};
use crate::query::{ColumnRef, Expr, Query, Selection};
use crate::record::{Record, RowRecord};
use crate::store::{EntityMetadataProvider, RecordStore};
use crate::value::Value;

/// Maps an entity type onto a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMapping {
    pub entity_type: String,
    pub table: String,
    pub identifier: Vec<String>,
}

impl EntityMapping {
    /// Map `entity_type` onto `table` with an `id` identifier column.
    pub fn new(entity_type: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            table: table.into(),
            identifier: vec![crate::record::DEFAULT_IDENTIFIER.to_string()],
        }
    }

    pub fn with_identifier(mut self, columns: Vec<String>) -> Self {
        self.identifier = columns;
        self
    }
}

/// SQL text plus the named parameters it references.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    pub sql: String,
    pub parameters: Vec<(String, Value)>,
}

/// Record store over a single SQLite connection.
///
/// The connection sits behind a mutex so the store is `Send + Sync`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    entities: HashMap<String, EntityMapping>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_connection(Connection::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            entities: HashMap::new(),
        }
    }

    /// Register an entity type → table mapping.
    pub fn with_entity(mut self, mapping: EntityMapping) -> Self {
        self.entities.insert(mapping.entity_type.clone(), mapping);
        self
    }

    /// Run raw SQL statements, e.g. schema setup.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn().execute_batch(sql)?;
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mapping(&self, entity: &str) -> Result<&EntityMapping> {
        self.entities
            .get(entity)
            .ok_or_else(|| StoreError::unknown_entity(entity))
    }

    /// Render a query to SQL against its mapped table.
    pub fn render(&self, query: &Query) -> Result<RenderedQuery> {
        let mapping = self.mapping(query.entity())?;
        let alias = quote_ident(query.root_alias())?;

        let projection = match query.selection() {
            Selection::Records => format!("{alias}.*"),
            Selection::Count(column) => format!("COUNT({})", render_column(column)?),
        };
        let mut sql = format!(
            "SELECT {projection} FROM {} AS {alias}",
            quote_ident(&mapping.table)?
        );

        let mut parameters = Vec::new();
        if !query.filters().is_empty() {
            let clauses = query
                .filters()
                .iter()
                .map(|expr| render_expr(expr, query, &mut parameters))
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        if !query.order_by().is_empty() {
            let order = query
                .order_by()
                .iter()
                .map(|(column, direction)| {
                    Ok(format!("{} {}", render_column(column)?, direction.as_str()))
                })
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }

        match (query.max_results(), query.first_result()) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }

        Ok(RenderedQuery { sql, parameters })
    }

    fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)?))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }
}

impl EntityMetadataProvider for SqliteStore {
    fn identifier_columns(&self, entity: &str) -> Vec<String> {
        self.entities
            .get(entity)
            .map(|m| m.identifier.clone())
            .unwrap_or_default()
    }
}

impl RecordStore for SqliteStore {
    fn fetch(&self, query: &Query) -> Result<Vec<RowRecord>> {
        let rendered = self.render(&query.clone().select_records())?;
        let identifier = self.identifier_column(query.entity());
        trace!(sql = %rendered.sql, "fetching records");

        let conn = self.conn();
        let mut stmt = conn.prepare(&rendered.sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let bound = bind_named(&rendered.parameters);
        let rows = stmt
            .query_map(bound.as_slice(), |row| {
                let mut record = RowRecord::new().identified_by(identifier.clone());
                for (idx, name) in names.iter().enumerate() {
                    record = record.column(name.clone(), row.get::<_, Value>(idx)?);
                }
                Ok(record)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(entity = %query.entity(), rows = rows.len(), "fetched records");
        Ok(rows)
    }

    fn single_scalar(&self, query: &Query) -> Result<Value> {
        let rendered = self.render(query)?;
        trace!(sql = %rendered.sql, "fetching scalar");

        let conn = self.conn();
        let bound = bind_named(&rendered.parameters);
        let value = conn.query_row(&rendered.sql, bound.as_slice(), |row| row.get::<_, Value>(0))?;
        Ok(value)
    }

    fn create_record(&self, entity: &str) -> Result<RowRecord> {
        let mapping = self.mapping(entity)?;
        let columns = self.table_columns(&mapping.table)?;
        Ok(RowRecord::with_columns(columns).identified_by(self.identifier_column(entity)))
    }

    fn insert(&self, entity: &str, record: &mut RowRecord) -> Result<()> {
        let mapping = self.mapping(entity)?;
        let identifier = self.identifier_column(entity);

        // A null identifier is left to the table to generate
        let columns: Vec<(&String, &Value)> = record
            .columns()
            .iter()
            .filter(|(name, value)| !(**name == identifier && value.is_null()))
            .collect();

        let names = columns
            .iter()
            .map(|(name, _)| quote_ident(name))
            .collect::<Result<Vec<_>>>()?;
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", quote_ident(&mapping.table)?)
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_ident(&mapping.table)?,
                names.join(", "),
                placeholders.join(", ")
            )
        };
        trace!(sql = %sql, "inserting record");

        let generated = {
            let conn = self.conn();
            conn.execute(&sql, rusqlite::params_from_iter(columns.iter().map(|(_, v)| *v)))?;
            conn.last_insert_rowid()
        };

        if record.id().is_none() {
            record.set(&identifier, Value::Int(generated));
        }
        debug!(entity, id = generated, "inserted record");
        Ok(())
    }

    fn update(&self, entity: &str, record: &RowRecord) -> Result<()> {
        let mapping = self.mapping(entity)?;
        let identifier = self.identifier_column(entity);
        let id = record.id().ok_or_else(|| StoreError::MissingIdentifier {
            entity: entity.to_string(),
        })?;

        let columns: Vec<(&String, &Value)> = record
            .columns()
            .iter()
            .filter(|(name, _)| **name != identifier)
            .collect();
        if columns.is_empty() {
            return Ok(());
        }

        let assignments = columns
            .iter()
            .enumerate()
            .map(|(i, (name, _))| Ok(format!("{} = ?{}", quote_ident(name)?, i + 1)))
            .collect::<Result<Vec<_>>>()?;
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote_ident(&mapping.table)?,
            assignments.join(", "),
            quote_ident(&identifier)?,
            columns.len() + 1
        );
        trace!(sql = %sql, "updating record");

        let values = columns.iter().map(|(_, v)| *v).chain(std::iter::once(&id));
        self.conn().execute(&sql, rusqlite::params_from_iter(values))?;
        debug!(entity, id = %id, "updated record");
        Ok(())
    }
}

/// Quote an SQL identifier, doubling embedded quotes.
fn quote_ident(name: &str) -> Result<String> {
    if name.is_empty() || name.contains('\0') {
        return Err(StoreError::invalid_identifier(name));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

fn render_column(column: &ColumnRef) -> Result<String> {
    let base = format!(
        "{}.{}",
        quote_ident(&column.alias)?,
        quote_ident(&column.column)?
    );
    match &column.cast {
        None => Ok(base),
        Some(type_name) => {
            if type_name.is_empty()
                || !type_name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(StoreError::invalid_identifier(type_name.as_str()));
            }
            Ok(format!("CAST({base} AS {type_name})"))
        }
    }
}

fn render_expr(expr: &Expr, query: &Query, parameters: &mut Vec<(String, Value)>) -> Result<String> {
    match expr {
        Expr::Like { column, param } => Ok(format!(
            "{} LIKE {}",
            render_column(column)?,
            bind_parameter(query, parameters, param)?
        )),
        Expr::Eq { column, param } => Ok(format!(
            "{} = {}",
            render_column(column)?,
            bind_parameter(query, parameters, param)?
        )),
        Expr::NotEq { column, param } => Ok(format!(
            "{} <> {}",
            render_column(column)?,
            bind_parameter(query, parameters, param)?
        )),
        Expr::And(parts) | Expr::Or(parts) => {
            if parts.is_empty() {
                return Ok("1 = 1".to_string());
            }
            let joiner = if matches!(expr, Expr::And(_)) { " AND " } else { " OR " };
            let rendered = parts
                .iter()
                .map(|part| render_expr(part, query, parameters))
                .collect::<Result<Vec<_>>>()?;
            Ok(format!("({})", rendered.join(joiner)))
        }
    }
}

/// Resolve a parameter's value and return its placeholder, binding it once.
fn bind_parameter(
    query: &Query,
    parameters: &mut Vec<(String, Value)>,
    param: &str,
) -> Result<String> {
    let value = query
        .parameter(param)
        .cloned()
        .ok_or_else(|| StoreError::MissingParameter {
            name: param.to_string(),
        })?;
    let placeholder = format!(":{param}");
    if !parameters.iter().any(|(name, _)| *name == placeholder) {
        parameters.push((placeholder.clone(), value));
    }
    Ok(placeholder)
}

fn bind_named(parameters: &[(String, Value)]) -> Vec<(&str, &dyn ToSql)> {
    parameters
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect()
}
