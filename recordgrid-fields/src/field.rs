//! Field descriptors.

use std::cmp::Reverse;
use std::sync::Arc;

use indexmap::IndexMap;
use recordgrid_store::{Expr, Query, Record, Value};
use serde::Serialize;
use tracing::trace;

use crate::declaration::Declaration;
use crate::hooks::{FieldHooks, TextHooks};
use crate::validator::{FieldSetScope, ValidationContext, Validator, Verdict};
use crate::value_box::{StringBox, ValueBox};

/// Identifier of the action column. It holds no data and never takes part in search.
pub const OPTIONS_IDENTIFIER: &str = "options";

/// Order of a field no declaration has placed yet.
pub const DEFAULT_ORDER: i32 = 100;

pub const DEFAULT_TEMPLATE: &str = "@DDM/fields/text.html.twig";

/// Error domain of a validator without an alias.
pub const DEFAULT_VALIDATOR_DOMAIN: &str = "validator_default";

/// A recorded validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub message: String,
    pub parameters: IndexMap<String, String>,
    /// Translation domain, `validator_<alias>`.
    pub domain: String,
}

/// The field set a field was resolved into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSetRef {
    pub entity_type: String,
    pub context: String,
}

/// One data attribute of an entity type, with its display, search and
/// validation behavior.
#[derive(Debug, Clone)]
pub struct Field {
    key: String,
    identifier: String,
    name: String,
    order: i32,
    template: String,
    livesearch: bool,
    extended_search: bool,
    sortable: bool,
    render_in_form: bool,
    render_in_table: bool,
    render_in_search: bool,
    value_box: Option<Box<dyn ValueBox>>,
    validators: Vec<Arc<dyn Validator>>,
    errors: Vec<FieldError>,
    sub_fields: Vec<Field>,
    routes: IndexMap<String, String>,
    owner: Option<FieldSetRef>,
    hooks: Arc<dyn FieldHooks>,
    declarations: Vec<Declaration>,
}

impl Field {
    /// A text field named after its identifier, participating everywhere.
    pub fn new(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        Self {
            key: identifier.clone(),
            name: identifier.clone(),
            identifier,
            order: DEFAULT_ORDER,
            template: DEFAULT_TEMPLATE.to_string(),
            livesearch: true,
            extended_search: true,
            sortable: true,
            render_in_form: true,
            render_in_table: true,
            render_in_search: true,
            value_box: None,
            validators: Vec::new(),
            errors: Vec::new(),
            sub_fields: Vec::new(),
            routes: IndexMap::new(),
            owner: None,
            hooks: Arc::new(TextHooks),
            declarations: Vec::new(),
        }
    }

    /// Registry key used to look up declarations; defaults to the identifier.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_livesearch(mut self, livesearch: bool) -> Self {
        self.livesearch = livesearch;
        self
    }

    pub fn with_extended_search(mut self, extended_search: bool) -> Self {
        self.extended_search = extended_search;
        self
    }

    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn with_render_in_form(mut self, render: bool) -> Self {
        self.render_in_form = render;
        self
    }

    pub fn with_render_in_table(mut self, render: bool) -> Self {
        self.render_in_table = render;
        self
    }

    pub fn with_render_in_search(mut self, render: bool) -> Self {
        self.render_in_search = render;
        self
    }

    pub fn with_value_box(mut self, value_box: impl ValueBox + 'static) -> Self {
        self.value_box = Some(Box::new(value_box));
        self
    }

    pub fn with_hooks(mut self, hooks: impl FieldHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.add_validator(Arc::new(validator));
        self
    }

    pub fn with_sub_field(mut self, field: Field) -> Self {
        self.sub_fields.push(field);
        self
    }

    /// Attach an applicability declaration read by [`crate::InlineDeclarations`].
    pub fn with_declaration(mut self, declaration: Declaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn set_order(&mut self, order: i32) -> &mut Self {
        self.order = order;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn is_livesearch(&self) -> bool {
        self.livesearch
    }

    pub fn is_extended_search(&self) -> bool {
        self.extended_search
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    pub fn is_render_in_form(&self) -> bool {
        self.render_in_form
    }

    pub fn is_render_in_table(&self) -> bool {
        self.render_in_table
    }

    pub fn is_render_in_search(&self) -> bool {
        self.render_in_search
    }

    pub fn is_options(&self) -> bool {
        self.identifier == OPTIONS_IDENTIFIER
    }

    /// Live-searchable and not the options column.
    pub fn is_searchable(&self) -> bool {
        self.livesearch && !self.is_options()
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn sub_fields(&self) -> &[Field] {
        &self.sub_fields
    }

    pub fn owner(&self) -> Option<&FieldSetRef> {
        self.owner.as_ref()
    }

    // Value box

    /// The field's value box, created as a [`StringBox`] on first access.
    pub fn value_box(&mut self) -> &mut dyn ValueBox {
        self.value_box
            .get_or_insert_with(|| Box::new(StringBox::new()))
            .as_mut()
    }

    /// Raw value held for form rendering.
    pub fn value_form(&self) -> Value {
        self.value_box
            .as_ref()
            .map_or(Value::Null, |boxed| boxed.value())
    }

    pub fn set_value_form(&mut self, value: Value) -> &mut Self {
        self.value_box().set_value(value);
        self
    }

    // Validators

    /// Add a validator, replacing any with the same alias, and keep the chain
    /// sorted by descending priority. Equal priorities keep insertion order.
    pub fn add_validator(&mut self, validator: Arc<dyn Validator>) -> &mut Self {
        if let Some(alias) = validator.alias() {
            let alias = alias.to_string();
            self.remove_validator(&alias);
        }
        self.validators.push(validator);
        self.validators.sort_by_key(|v| Reverse(v.priority()));
        self
    }

    pub fn remove_validator(&mut self, alias: &str) -> &mut Self {
        self.validators.retain(|v| v.alias() != Some(alias));
        self
    }

    pub fn validators(&self) -> &[Arc<dyn Validator>] {
        &self.validators
    }

    /// Run the validator chain, stopping at the first failure.
    ///
    /// Clears previous errors. On failure exactly one error is recorded.
    /// Callers go through [`FieldSet::validate_field`](crate::FieldSet::validate_field)
    /// so validators see the owning set.
    pub(crate) fn validate_with(&mut self, value: &Value, scope: Option<FieldSetScope<'_>>) -> bool {
        self.errors.clear();
        let ctx = ValidationContext {
            identifier: &self.identifier,
            scope,
        };

        for validator in &self.validators {
            if let Verdict::Invalid(rejection) = validator.validate(value, &ctx) {
                let domain = validator
                    .alias()
                    .map_or_else(|| DEFAULT_VALIDATOR_DOMAIN.to_string(), |a| format!("validator_{a}"));
                trace!(
                    field = %self.identifier,
                    validator = validator.alias().unwrap_or("default"),
                    message = %rejection.message,
                    "validation failed"
                );
                self.errors.push(FieldError {
                    message: rejection.message,
                    parameters: rejection.parameters,
                    domain,
                });
                return false;
            }
        }
        true
    }

    /// True if any validator makes the field mandatory in this scope.
    pub(crate) fn is_required_with(&self, scope: Option<FieldSetScope<'_>>) -> bool {
        let ctx = ValidationContext {
            identifier: &self.identifier,
            scope,
        };
        self.validators.iter().any(|v| v.is_required(&ctx))
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn error(&self) -> Option<&FieldError> {
        self.errors.first()
    }

    // Routes

    pub fn routes(&self) -> &IndexMap<String, String> {
        &self.routes
    }

    pub fn set_routes(&mut self, routes: IndexMap<String, String>) -> &mut Self {
        self.routes = routes;
        self
    }

    pub fn route(&self, name: &str) -> Option<&str> {
        self.routes.get(name).map(String::as_str)
    }

    // Record access

    pub fn prepare_value(&self, value: Value) -> Value {
        self.hooks.prepare_value(self, value)
    }

    pub fn finalize_value(&self, value: Value) -> Value {
        self.hooks.finalize_value(self, value)
    }

    /// Display string of this field for one table row.
    ///
    /// Each call starts from an empty box, so a record missing the attribute
    /// renders empty rather than repeating the previous row.
    pub fn render_datatable(&self, record: &dyn Record) -> String {
        let mut boxed = self
            .value_box
            .clone()
            .unwrap_or_else(|| Box::new(StringBox::new()));
        let raw = record.get(&self.identifier).unwrap_or_default();
        boxed.set_value(self.prepare_value(raw));
        boxed.to_string()
    }

    /// Prepared raw value for form prefill.
    pub fn render_form(&self, record: &dyn Record) -> Value {
        self.prepare_value(record.get(&self.identifier).unwrap_or_default())
    }

    /// Display string for search form prefill.
    pub fn render_search(&self, record: &dyn Record) -> String {
        self.render_datatable(record)
    }

    /// Store predicate for a search term, or `None` when the field declines.
    pub fn search_expression(&self, query: &mut Query, alias: &str, term: &str) -> Option<Expr> {
        self.hooks.search_expression(self, query, alias, term)
    }

    /// Attach the field to its owning field set once the final list is known.
    pub fn init(&mut self, owner: FieldSetRef, siblings: &[String]) {
        self.owner = Some(owner);
        let hooks = Arc::clone(&self.hooks);
        hooks.init(self, siblings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{
        CallbackValidator, RequiredValidator, StringLengthValidator, ValidatorSettings,
    };
    use crate::value_box::ListBox;
    use recordgrid_store::RowRecord;
    use std::sync::Mutex;

    /// Records every call so tests can see which validators ran.
    #[derive(Debug)]
    struct Probe {
        settings: ValidatorSettings,
        passes: bool,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Probe {
        fn new(alias: &str, priority: i32, passes: bool, calls: &Arc<Mutex<Vec<String>>>) -> Self {
            let mut settings = ValidatorSettings::new(Some(alias));
            settings.priority = priority;
            Self {
                settings,
                passes,
                calls: Arc::clone(calls),
            }
        }
    }

    impl Validator for Probe {
        fn settings(&self) -> &ValidatorSettings {
            &self.settings
        }

        fn validate(&self, _value: &Value, _ctx: &ValidationContext<'_>) -> Verdict {
            let alias = self.settings.alias.clone().unwrap_or_default();
            self.calls.lock().unwrap().push(alias.clone());
            if self.passes {
                Verdict::Valid
            } else {
                Verdict::reject(format!("{alias}.failed"))
            }
        }
    }

    fn aliases(field: &Field) -> Vec<&str> {
        field
            .validators()
            .iter()
            .map(|v| v.alias().unwrap_or(""))
            .collect()
    }

    #[test]
    fn defaults() {
        let mut field = Field::new("email");
        assert_eq!(field.key(), "email");
        assert_eq!(field.name(), "email");
        assert_eq!(field.order(), DEFAULT_ORDER);
        assert!(field.is_livesearch() && field.is_sortable() && field.is_render_in_table());
        assert_eq!(field.value_box().box_type(), "text");
        assert_eq!(field.value_form(), Value::Null);
    }

    #[test]
    fn validation_is_fail_fast() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut field = Field::new("name")
            .with_validator(Probe::new("first", 100, false, &calls))
            .with_validator(Probe::new("second", 100, false, &calls));

        assert!(!field.validate_with(&Value::from("x"), None));
        assert_eq!(field.errors().len(), 1);
        assert_eq!(
            field.error(),
            Some(&FieldError {
                message: "first.failed".into(),
                parameters: IndexMap::new(),
                domain: "validator_first".into(),
            })
        );
        assert_eq!(*calls.lock().unwrap(), vec!["first"]);
    }

    #[test]
    fn validators_run_by_descending_priority() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut field = Field::new("name")
            .with_validator(Probe::new("low", 50, true, &calls))
            .with_validator(Probe::new("high", 100, true, &calls));

        assert!(field.validate_with(&Value::from("x"), None));
        assert!(field.errors().is_empty());
        assert_eq!(*calls.lock().unwrap(), vec!["high", "low"]);
    }

    #[test]
    fn alias_replaces_existing_validator() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut field = Field::new("name")
            .with_validator(Probe::new("a", 100, true, &calls))
            .with_validator(Probe::new("b", 100, true, &calls))
            .with_validator(Probe::new("a", 100, false, &calls));

        assert_eq!(aliases(&field), vec!["b", "a"]);
        assert!(!field.validate_with(&Value::Null, None));
        assert_eq!(*calls.lock().unwrap(), vec!["b", "a"]);

        field.remove_validator("a");
        assert_eq!(aliases(&field), vec!["b"]);
    }

    #[test]
    fn errors_reset_between_calls() {
        let mut field = Field::new("name").with_validator(RequiredValidator::new());
        assert!(!field.validate_with(&Value::Null, None));
        assert_eq!(field.error().unwrap().domain, "validator_required");
        assert!(field.validate_with(&Value::from("Ada"), None));
        assert!(field.error().is_none());
    }

    #[test]
    fn unaliased_validator_uses_default_domain() {
        let mut field = Field::new("name").with_validator(CallbackValidator::new(|_, _| false));
        assert!(!field.validate_with(&Value::Null, None));
        assert_eq!(field.error().unwrap().domain, DEFAULT_VALIDATOR_DOMAIN);
    }

    #[test]
    fn required_is_any_validator() {
        let field = Field::new("name").with_validator(StringLengthValidator::new().max(10));
        assert!(!field.is_required_with(None));
        let field = field.with_validator(RequiredValidator::new());
        assert!(field.is_required_with(None));
    }

    #[test]
    fn render_datatable_resets_per_record() {
        let field = Field::new("city");
        let berlin = RowRecord::new().column("city", "Berlin");
        let nowhere = RowRecord::new().column("name", "Ada");

        assert_eq!(field.render_datatable(&berlin), "Berlin");
        assert_eq!(field.render_datatable(&nowhere), "");
        assert_eq!(field.render_search(&berlin), "Berlin");
    }

    #[test]
    fn render_through_list_box() {
        let field = Field::new("tags").with_value_box(ListBox::new());
        let record = RowRecord::new().column("tags", vec!["a", "b"]);
        assert_eq!(field.render_datatable(&record), "a, b");
        assert_eq!(field.render_form(&record), Value::from(vec!["a", "b"]));
    }

    #[test]
    fn value_form_round_trip() {
        let mut field = Field::new("age");
        field.set_value_form(Value::Int(36));
        assert_eq!(field.value_form(), Value::from("36"));
    }

    #[test]
    fn init_sets_owner() {
        let mut field = Field::new("name");
        assert!(field.owner().is_none());
        field.init(
            FieldSetRef {
                entity_type: "app::entity::User".into(),
                context: "user_admin".into(),
            },
            &["name".to_string()],
        );
        assert_eq!(field.owner().unwrap().context, "user_admin");
    }

    #[test]
    fn routes() {
        let mut field = Field::new("name");
        field.set_routes(IndexMap::from([("edit".to_string(), "/users/edit".to_string())]));
        assert_eq!(field.route("edit"), Some("/users/edit"));
        assert_eq!(field.route("delete"), None);
    }
}
