//! Per-field behavior that varies by field kind.
//!
//! A [`Field`] delegates value preparation, value finalization, search
//! predicate construction and initialization to its [`FieldHooks`].

use std::fmt;

use recordgrid_store::{ColumnRef, Expr, Query, Value};

use crate::field::Field;

/// Customization points of a field.
pub trait FieldHooks: fmt::Debug + Send + Sync {
    /// Transform a raw record value before display or form prefill.
    fn prepare_value(&self, _field: &Field, value: Value) -> Value {
        value
    }

    /// Transform a submitted value before it is written to a record.
    fn finalize_value(&self, _field: &Field, value: Value) -> Value {
        value
    }

    /// Store predicate matching `term`, or `None` to stay out of the search.
    fn search_expression(
        &self,
        field: &Field,
        query: &mut Query,
        alias: &str,
        term: &str,
    ) -> Option<Expr> {
        like_expression(field, query, alias, term, None)
    }

    /// Called once the owning field set knows its final field list.
    fn init(&self, _field: &mut Field, _siblings: &[String]) {}
}

/// `alias.identifier LIKE %term%` under a fresh parameter.
///
/// Declines for fields that are not live-searchable and for the options column.
pub fn like_expression(
    field: &Field,
    query: &mut Query,
    alias: &str,
    term: &str,
    cast: Option<&str>,
) -> Option<Expr> {
    if !field.is_searchable() {
        return None;
    }
    let param = query.next_parameter_name(&format!("search_{}", field.identifier()));
    query.set_parameter(param.clone(), format!("%{term}%"));

    let mut column = ColumnRef::new(alias, field.identifier());
    if let Some(type_name) = cast {
        column = column.cast(type_name);
    }
    Some(Expr::like(column, param))
}

/// Plain text field: substring search.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextHooks;

impl FieldHooks for TextHooks {}

/// Matches the search term exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactHooks;

impl FieldHooks for ExactHooks {
    fn search_expression(
        &self,
        field: &Field,
        query: &mut Query,
        alias: &str,
        term: &str,
    ) -> Option<Expr> {
        if !field.is_searchable() {
            return None;
        }
        let param = query.next_parameter_name(&format!("search_{}", field.identifier()));
        query.set_parameter(param.clone(), term);
        Some(Expr::eq(ColumnRef::new(alias, field.identifier()), param))
    }
}

/// Substring search over the column cast to another type, e.g. numbers as text.
#[derive(Debug, Clone)]
pub struct CastTextHooks {
    type_name: String,
}

impl CastTextHooks {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
        }
    }
}

impl Default for CastTextHooks {
    fn default() -> Self {
        Self::new("TEXT")
    }
}

impl FieldHooks for CastTextHooks {
    fn search_expression(
        &self,
        field: &Field,
        query: &mut Query,
        alias: &str,
        term: &str,
    ) -> Option<Expr> {
        like_expression(field, query, alias, term, Some(&self.type_name))
    }
}
