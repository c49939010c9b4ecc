//! Backend-neutral query AST.
//!
//! A [`Query`] targets one entity type under a root alias and accumulates
//! AND-ed filter expressions, named parameters, ordering and a page window.
//! Queries are plain data, so a partially built query can be cloned to run a
//! count projection independently of the row fetch.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Root alias used when a caller does not supply one.
pub const DEFAULT_ALIAS: &str = "p";

/// Sort direction of an order-by clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    /// Parse `ASC`/`DESC`, ignoring case and surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A column addressed through a query alias, optionally cast to another type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub alias: String,
    pub column: String,
    pub cast: Option<String>,
}

impl ColumnRef {
    pub fn new(alias: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            column: column.into(),
            cast: None,
        }
    }

    /// Wrap the column in `CAST(column AS type)`.
    pub fn cast(mut self, type_name: impl Into<String>) -> Self {
        self.cast = Some(type_name.into());
        self
    }
}

/// Filter expression. Parameters are referenced by name and bound from
/// [`Query::parameters`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Like { column: ColumnRef, param: String },
    Eq { column: ColumnRef, param: String },
    NotEq { column: ColumnRef, param: String },
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    pub fn like(column: ColumnRef, param: impl Into<String>) -> Self {
        Self::Like {
            column,
            param: param.into(),
        }
    }

    pub fn eq(column: ColumnRef, param: impl Into<String>) -> Self {
        Self::Eq {
            column,
            param: param.into(),
        }
    }

    pub fn not_eq(column: ColumnRef, param: impl Into<String>) -> Self {
        Self::NotEq {
            column,
            param: param.into(),
        }
    }

    pub fn and(parts: Vec<Expr>) -> Self {
        Self::And(parts)
    }

    pub fn or(parts: Vec<Expr>) -> Self {
        Self::Or(parts)
    }

    /// Names of all parameters referenced by this expression, in order.
    pub fn parameter_names(&self) -> Vec<&str> {
        match self {
            Self::Like { param, .. } | Self::Eq { param, .. } | Self::NotEq { param, .. } => {
                vec![param.as_str()]
            }
            Self::And(parts) | Self::Or(parts) => {
                parts.iter().flat_map(Expr::parameter_names).collect()
            }
        }
    }
}

/// What a query returns.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Whole records of the root entity
    Records,
    /// A single `count(column)` scalar
    Count(ColumnRef),
}

/// A filtered, sorted, paginated query over one entity type.
#[derive(Debug, Clone)]
pub struct Query {
    entity: String,
    alias: String,
    selection: Selection,
    filters: Vec<Expr>,
    parameters: IndexMap<String, Value>,
    order_by: Vec<(ColumnRef, Direction)>,
    first_result: Option<u64>,
    max_results: Option<u64>,
    parameter_seq: u64,
}

impl Query {
    pub fn new(entity: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            alias: alias.into(),
            selection: Selection::Records,
            filters: Vec::new(),
            parameters: IndexMap::new(),
            order_by: Vec::new(),
            first_result: None,
            max_results: None,
            parameter_seq: 0,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn root_alias(&self) -> &str {
        &self.alias
    }

    /// Column reference under the root alias.
    pub fn column(&self, name: impl Into<String>) -> ColumnRef {
        ColumnRef::new(self.alias.clone(), name)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Project to `count(alias.column)`.
    pub fn select_count(mut self, column: impl Into<String>) -> Self {
        self.selection = Selection::Count(self.column(column));
        self
    }

    pub fn select_records(mut self) -> Self {
        self.selection = Selection::Records;
        self
    }

    /// AND an expression onto the query.
    pub fn and_where(&mut self, expr: Expr) -> &mut Self {
        self.filters.push(expr);
        self
    }

    pub fn filters(&self) -> &[Expr] {
        &self.filters
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    pub fn parameters(&self) -> &IndexMap<String, Value> {
        &self.parameters
    }

    /// Generate a parameter name that is unused within this query.
    ///
    /// Dots in the prefix are replaced so the name stays a valid placeholder.
    pub fn next_parameter_name(&mut self, prefix: &str) -> String {
        let prefix: String = prefix
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        loop {
            self.parameter_seq += 1;
            let name = format!("{prefix}_{}", self.parameter_seq);
            if !self.parameters.contains_key(&name) {
                return name;
            }
        }
    }

    pub fn add_order_by(&mut self, column: ColumnRef, direction: Direction) -> &mut Self {
        self.order_by.push((column, direction));
        self
    }

    pub fn order_by(&self) -> &[(ColumnRef, Direction)] {
        &self.order_by
    }

    pub fn set_first_result(&mut self, offset: u64) -> &mut Self {
        self.first_result = Some(offset);
        self
    }

    pub fn set_max_results(&mut self, limit: u64) -> &mut Self {
        self.max_results = Some(limit);
        self
    }

    pub fn first_result(&self) -> Option<u64> {
        self.first_result
    }

    pub fn max_results(&self) -> Option<u64> {
        self.max_results
    }
}
