//! Extended search form and its persisted state.
//!
//! Submitted search values are kept per search id between requests so the
//! table and the search form agree on what is being filtered.

use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use recordgrid_fields::{Field, FieldSet};
use recordgrid_store::Value;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::params::{clean_search_fields, ParameterBag, RequestParams};

pub const DEFAULT_SEARCH_TEMPLATE: &str = "@DDM/form/search.html.twig";

/// Body parameter that clears the stored search.
pub const RESET_PARAMETER: &str = "_reset";

/// State key for a search id; `None` selects the shared default slot.
pub fn session_key(id: Option<&str>) -> String {
    format!("ddm_search_{}", id.unwrap_or("default"))
}

/// Where submitted extended search values live between requests.
pub trait SearchStateStore: Send + Sync {
    fn load(&self, key: &str) -> Option<IndexMap<String, JsonValue>>;
    fn save(&self, key: &str, fields: IndexMap<String, JsonValue>);
    fn remove(&self, key: &str);
}

/// Process-local search state.
#[derive(Debug, Default)]
pub struct MemorySearchState {
    entries: DashMap<String, IndexMap<String, JsonValue>>,
}

impl MemorySearchState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SearchStateStore for MemorySearchState {
    fn load(&self, key: &str) -> Option<IndexMap<String, JsonValue>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn save(&self, key: &str, fields: IndexMap<String, JsonValue>) {
        self.entries.insert(key.to_string(), fields);
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}

/// JSON answer to a search submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub success: bool,
    pub search_fields: IndexMap<String, JsonValue>,
}

/// Bundle handed to an external renderer for the search form.
#[derive(Debug)]
pub struct SearchView<'a> {
    pub template: String,
    /// Extended search fields, prefilled from stored state.
    pub fields: Vec<&'a Field>,
    pub field_set: &'a FieldSet,
    pub id: Option<&'a str>,
    pub is_search: bool,
}

#[derive(Debug)]
pub enum SearchResponse<'a> {
    View(SearchView<'a>),
    Submitted(SearchOutcome),
}

pub struct SearchHandler {
    state: Arc<dyn SearchStateStore>,
}

impl SearchHandler {
    pub fn new(state: Arc<dyn SearchStateStore>) -> Self {
        Self { state }
    }

    /// Store values on POST, render the form otherwise.
    pub fn handle<'a>(
        &self,
        request: &RequestParams,
        set: &'a mut FieldSet,
        id: Option<&'a str>,
        template: Option<&str>,
    ) -> SearchResponse<'a> {
        if request.is_post() {
            return SearchResponse::Submitted(self.submit(&request.body, id));
        }
        SearchResponse::View(self.form(set, id, template))
    }

    /// Persist the cleaned `search_fields` of a submission.
    ///
    /// With `_reset` present the stored state is dropped and the answer
    /// carries no fields.
    pub fn submit(&self, body: &ParameterBag, id: Option<&str>) -> SearchOutcome {
        let key = session_key(id);
        let search_fields = clean_search_fields(body.get_map("search_fields"));

        if body.has(RESET_PARAMETER) {
            self.state.remove(&key);
            debug!(key = %key, "search state reset");
            return SearchOutcome {
                success: true,
                search_fields: IndexMap::new(),
            };
        }

        debug!(key = %key, fields = search_fields.len(), "search state saved");
        self.state.save(&key, search_fields.clone());
        SearchOutcome {
            success: true,
            search_fields,
        }
    }

    /// Search form fields: extended-search fields rendered in the search
    /// form, each prefilled with its stored value.
    pub fn form<'a>(
        &self,
        set: &'a mut FieldSet,
        id: Option<&'a str>,
        template: Option<&str>,
    ) -> SearchView<'a> {
        let stored = self.state.load(&session_key(id)).unwrap_or_default();
        for field in set
            .fields_mut()
            .iter_mut()
            .filter(|f| f.is_extended_search() && f.is_render_in_search())
        {
            if let Some(value) = stored.get(field.identifier()) {
                field.set_value_form(Value::from(value));
            }
        }

        let set: &'a FieldSet = set;
        SearchView {
            template: template.unwrap_or(DEFAULT_SEARCH_TEMPLATE).to_string(),
            fields: set
                .fields()
                .iter()
                .filter(|f| f.is_extended_search() && f.is_render_in_search())
                .collect(),
            field_set: set,
            id,
            is_search: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordgrid_fields::Declaration;
    use serde_json::json;

    const USER: &str = "app::entity::User";

    fn field_set() -> FieldSet {
        let declared = |f: Field| f.with_declaration(Declaration::for_entity(USER));
        FieldSet::for_entity(USER, "user_admin").build(vec![
            declared(Field::new("name")),
            declared(Field::new("status")),
            declared(Field::new("notes").with_extended_search(false)),
            declared(Field::new("hidden").with_render_in_search(false)),
        ])
    }

    fn handler() -> (SearchHandler, Arc<MemorySearchState>) {
        let state = Arc::new(MemorySearchState::new());
        (SearchHandler::new(state.clone()), state)
    }

    #[test]
    fn session_keys() {
        assert_eq!(session_key(None), "ddm_search_default");
        assert_eq!(session_key(Some("users")), "ddm_search_users");
    }

    #[test]
    fn submit_stores_cleaned_fields() {
        let (handler, state) = handler();
        let body = ParameterBag::from_json(json!({
            "search_fields": {"name": "ada", "status": "", "tags": []}
        }));
        let outcome = handler.submit(&body, Some("users"));
        assert!(outcome.success);
        assert_eq!(outcome.search_fields.len(), 1);
        assert_eq!(outcome.search_fields["name"], json!("ada"));
        assert_eq!(
            state.load("ddm_search_users").map(|s| s.len()),
            Some(1)
        );
        assert!(state.load("ddm_search_default").is_none());
    }

    #[test]
    fn reset_clears_state() {
        let (handler, state) = handler();
        handler.submit(
            &ParameterBag::from_json(json!({"search_fields": {"name": "ada"}})),
            None,
        );
        let outcome = handler.submit(
            &ParameterBag::from_json(json!({"search_fields": {"name": "bob"}, "_reset": "1"})),
            None,
        );
        assert!(outcome.success);
        assert!(outcome.search_fields.is_empty());
        assert!(state.load("ddm_search_default").is_none());
    }

    #[test]
    fn form_prefills_extended_search_fields() {
        let (handler, _) = handler();
        handler.submit(
            &ParameterBag::from_json(json!({
                "search_fields": {"status": ["active", "locked"], "notes": "x", "hidden": "y"}
            })),
            Some("users"),
        );

        let mut set = field_set();
        let view = handler.form(&mut set, Some("users"), None);
        assert_eq!(view.template, DEFAULT_SEARCH_TEMPLATE);
        assert!(view.is_search);
        let identifiers: Vec<&str> = view.fields.iter().map(|f| f.identifier()).collect();
        assert_eq!(identifiers, vec!["name", "status"]);
        assert_eq!(view.fields[0].value_form(), Value::Null);
        assert_eq!(view.fields[1].value_form(), Value::from("active, locked"));
    }

    #[test]
    fn handle_dispatches_on_method() {
        let (handler, _) = handler();
        let mut set = field_set();
        let request = RequestParams::post(ParameterBag::from_json(json!({
            "search_fields": {"name": "ada"}
        })));
        let SearchResponse::Submitted(outcome) = handler.handle(&request, &mut set, None, None)
        else {
            panic!("POST should submit");
        };
        assert_eq!(outcome.search_fields["name"], json!("ada"));

        let mut set = field_set();
        let response = handler.handle(
            &RequestParams::default(),
            &mut set,
            None,
            Some("custom/search.html"),
        );
        let SearchResponse::View(view) = response else {
            panic!("GET should render the form");
        };
        assert_eq!(view.template, "custom/search.html");
        assert_eq!(view.fields[0].value_form(), Value::from("ada"));
    }
}
