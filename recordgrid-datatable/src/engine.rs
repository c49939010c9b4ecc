//! Tabular query engine.
//!
//! [`DatatableEngine::handle_request`] turns a resolved [`FieldSet`] and a
//! request's parameters into one page of rendered rows:
//!
//! 1. start from the caller's query (keeping its root alias) or a fresh one
//! 2. build column headers from the table fields
//! 3. OR together every field's predicate for the global search term
//! 4. AND each extended search entry onto the query
//! 5. count the filtered query and the unfiltered entity
//! 6. apply sorting, clamp the page, apply the page window
//! 7. fetch and render each record through its table fields
//!
//! Bad paging, sorting or search input falls back to defaults. Store errors
//! are returned unchanged.

use std::sync::Arc;

use indexmap::IndexMap;
use recordgrid_fields::{Field, FieldSet};
use recordgrid_store::{ColumnRef, Direction, Expr, Query, RecordStore, Value};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::config::DatatableConfig;
use crate::error::Result;
use crate::params::{clean_search_fields, ParameterBag, RequestParams};
use crate::response::{Column, Counts, DataRow, DatatableResponse, Head, SearchValue};
use crate::translator::{IdentityTranslator, Translator};

/// Sorting, search and paging input read from a parameter bag.
#[derive(Debug, Clone, PartialEq)]
struct TableRequest {
    sorting: IndexMap<String, Direction>,
    search: String,
    page: i64,
    perpage: u64,
    searchisnew: bool,
    search_fields: IndexMap<String, JsonValue>,
}

impl TableRequest {
    fn parse(params: &ParameterBag, config: &DatatableConfig) -> Self {
        let searchisnew = params.get_bool("searchisnew", false);
        let page = if searchisnew {
            1
        } else {
            params.get_int("page", 1)
        };
        Self {
            sorting: parse_sorting(params.get("sorting")),
            search: params.get_str("search").unwrap_or_default(),
            page,
            perpage: config.clamp_perpage(params.get_int("perpage", config.default_perpage)),
            searchisnew,
            search_fields: clean_search_fields(params.get_map("search_fields")),
        }
    }
}

/// Decode the JSON sort map `{"column": "ASC" | "DESC"}`.
///
/// Accepts the map as a JSON string or an already decoded object. Entries
/// with an unknown direction are dropped; anything malformed yields no sorting.
fn parse_sorting(raw: Option<&JsonValue>) -> IndexMap<String, Direction> {
    let decoded = match raw {
        Some(JsonValue::String(s)) => serde_json::from_str::<JsonValue>(s).ok(),
        Some(object @ JsonValue::Object(_)) => Some(object.clone()),
        _ => None,
    };
    let Some(JsonValue::Object(map)) = decoded else {
        return IndexMap::new();
    };
    map.into_iter()
        .filter_map(|(column, direction)| {
            let direction = Direction::parse(direction.as_str()?)?;
            Some((column, direction))
        })
        .collect()
}

/// Extended search value as a single term; lists are comma-joined.
fn search_term(value: &JsonValue) -> String {
    match Value::from(value) {
        Value::List(items) => items
            .iter()
            .map(Value::to_text)
            .collect::<Vec<_>>()
            .join(","),
        scalar => scalar.to_text(),
    }
}

/// Serves paginated, searchable, sortable tables over a record store.
pub struct DatatableEngine {
    store: Arc<dyn RecordStore>,
    translator: Arc<dyn Translator>,
    config: DatatableConfig,
}

impl DatatableEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            translator: Arc::new(IdentityTranslator),
            config: DatatableConfig::default(),
        }
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_config(mut self, config: DatatableConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DatatableConfig {
        &self.config
    }

    /// Answer one datatable request.
    ///
    /// `base` may carry filters of its own; its root alias is used for every
    /// column reference. Column names are translated in `translation_domain`.
    pub fn handle_request(
        &self,
        request: &RequestParams,
        set: &FieldSet,
        base: Option<Query>,
        translation_domain: Option<&str>,
    ) -> Result<DatatableResponse> {
        let entity = set.entity_type();
        let mut query = match base {
            Some(query) => query,
            None => self.store.create_query(entity, &self.config.default_alias),
        };
        let alias = query.root_alias().to_string();

        let head = Head {
            columns: self.columns(set, translation_domain),
        };
        let table = TableRequest::parse(request.active(), &self.config);

        if !table.search.is_empty() {
            let predicates: Vec<Expr> = set
                .fields()
                .iter()
                .filter(|f| !f.is_options())
                .filter_map(|f| f.search_expression(&mut query, &alias, &table.search))
                .collect();
            if !predicates.is_empty() {
                query.and_where(Expr::or(predicates));
            }
        }

        for (identifier, value) in &table.search_fields {
            let Some(field) = set
                .fields()
                .iter()
                .find(|f| f.identifier() == identifier && f.is_extended_search())
            else {
                continue;
            };
            let term = search_term(value);
            if let Some(predicate) = field.search_expression(&mut query, &alias, &term) {
                query.and_where(predicate);
            }
        }

        let id_column = self.store.identifier_column(entity);
        let filtered = self
            .store
            .count(&query.clone().select_count(id_column.as_str()))?;
        let total = self.store.count(
            &self
                .store
                .create_query(entity, &alias)
                .select_count(id_column.as_str()),
        )?;

        let sorting = self.applicable_sorting(set, table.sorting);
        for (column, direction) in &sorting {
            query.add_order_by(ColumnRef::new(alias.as_str(), column.as_str()), *direction);
        }

        let perpage = table.perpage;
        let max_page = filtered.div_ceil(perpage).max(1);
        let page = table.page.clamp(1, i64::try_from(max_page).unwrap_or(i64::MAX)) as u64;
        query
            .set_first_result((page - 1) * perpage)
            .set_max_results(perpage);

        let table_fields: Vec<&Field> = set
            .fields()
            .iter()
            .filter(|f| f.is_render_in_table())
            .collect();
        let data: Vec<DataRow> = self
            .store
            .fetch(&query)?
            .iter()
            .map(|record| {
                DataRow::new(
                    table_fields
                        .iter()
                        .map(|f| (f.identifier().to_string(), f.render_datatable(record)))
                        .collect(),
                )
            })
            .collect();

        debug!(
            entity_type = entity,
            page,
            perpage,
            total,
            filtered,
            rows = data.len(),
            "handled datatable request"
        );

        Ok(DatatableResponse {
            head,
            sorting: sorting
                .into_iter()
                .map(|(column, direction)| (column, direction.as_str().to_string()))
                .collect(),
            search: SearchValue {
                value: table.search,
            },
            page,
            perpage,
            searchisnew: table.searchisnew,
            search_fields: table.search_fields,
            data,
            count: Counts::new(total, filtered, page, perpage),
        })
    }

    fn columns(&self, set: &FieldSet, translation_domain: Option<&str>) -> Vec<Column> {
        set.fields()
            .iter()
            .filter(|f| f.is_render_in_table())
            .map(|f| {
                let options = f.is_options();
                Column {
                    name: self
                        .translator
                        .translate(f.name(), &IndexMap::new(), translation_domain),
                    sortable: f.is_sortable(),
                    identifier: f.identifier().to_string(),
                    raw: options.then_some(true),
                    class: options.then(|| self.config.options_column_class.clone()),
                }
            })
            .collect()
    }

    /// Sort entries to apply. Under strict sorting only sortable data fields
    /// of the set are kept.
    fn applicable_sorting(
        &self,
        set: &FieldSet,
        sorting: IndexMap<String, Direction>,
    ) -> IndexMap<String, Direction> {
        if !self.config.strict_sorting {
            return sorting;
        }
        sorting
            .into_iter()
            .filter(|(column, _)| {
                let known = set
                    .field(column)
                    .is_some_and(|f| f.is_sortable() && !f.is_options());
                if !known {
                    debug!(column = %column, "dropping sort on unknown or unsortable column");
                }
                known
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorting_accepts_string_or_object() {
        let from_string = parse_sorting(Some(&json!(r#"{"name":"desc","age":"ASC"}"#)));
        assert_eq!(from_string.len(), 2);
        assert_eq!(from_string["name"], Direction::Desc);
        assert_eq!(from_string["age"], Direction::Asc);

        let from_object = parse_sorting(Some(&json!({"name": "ASC"})));
        assert_eq!(from_object["name"], Direction::Asc);
    }

    #[test]
    fn malformed_sorting_is_empty() {
        assert!(parse_sorting(Some(&json!("{not json"))).is_empty());
        assert!(parse_sorting(Some(&json!("[\"name\"]"))).is_empty());
        assert!(parse_sorting(Some(&json!(42))).is_empty());
        assert!(parse_sorting(None).is_empty());

        let partial = parse_sorting(Some(&json!(r#"{"name":"sideways","age":"DESC"}"#)));
        assert_eq!(partial.keys().collect::<Vec<_>>(), vec!["age"]);
    }

    #[test]
    fn search_terms_join_lists() {
        assert_eq!(search_term(&json!(["a", "b", 3])), "a,b,3");
        assert_eq!(search_term(&json!("x")), "x");
        assert_eq!(search_term(&json!(7)), "7");
    }

    #[test]
    fn searchisnew_resets_page() {
        let config = DatatableConfig::default();
        let params = ParameterBag::new()
            .with("page", 4)
            .with("perpage", 0)
            .with("searchisnew", "1");
        let table = TableRequest::parse(&params, &config);
        assert_eq!(table.page, 1);
        assert_eq!(table.perpage, 1);
        assert!(table.searchisnew);
    }

    #[test]
    fn defaults_without_parameters() {
        let table = TableRequest::parse(&ParameterBag::new(), &DatatableConfig::default());
        assert_eq!(table.page, 1);
        assert_eq!(table.perpage, 10);
        assert!(table.search.is_empty());
        assert!(table.sorting.is_empty());
        assert!(table.search_fields.is_empty());
    }
}
