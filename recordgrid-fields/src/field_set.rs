//! Field sets: the fields of one entity type in one usage context.
//!
//! A [`FieldSet`] is resolved from a pool of candidate fields. A field is
//! included when one of its declarations matches the entity type or the
//! context; the first matching declaration sets its order. Included fields
//! are stably sorted by order and then initialized with the final list.
//!
//! Resolution mutates the fields it includes, so each resolution works on
//! its own copies. [`FieldSetFactory`] clones its template pool per call.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use recordgrid_store::{Record, RecordStore, Value};
use serde::Serialize;
use tracing::debug;

use crate::declaration::{DeclarationProvider, InlineDeclarations};
use crate::error::{FieldsError, Result};
use crate::field::{Field, FieldError, FieldSetRef};
use crate::validator::FieldSetScope;

/// Resolved, ordered fields of an `(entity type, context)` pair.
pub struct FieldSet {
    entity_type: String,
    context: String,
    fields: Vec<Field>,
    routes: IndexMap<String, String>,
    title: Option<String>,
    form_template: Option<String>,
    table_template: Option<String>,
    bound_record_id: Option<Value>,
    store: Option<Arc<dyn RecordStore>>,
}

impl fmt::Debug for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSet")
            .field("entity_type", &self.entity_type)
            .field("context", &self.context)
            .field("fields", &self.fields)
            .field("routes", &self.routes)
            .field("title", &self.title)
            .field("bound_record_id", &self.bound_record_id)
            .field("store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`FieldSet`]. Created by [`FieldSet::for_entity`].
pub struct FieldSetBuilder {
    entity_type: String,
    context: String,
    provider: Arc<dyn DeclarationProvider>,
    store: Option<Arc<dyn RecordStore>>,
    title: Option<String>,
}

impl FieldSetBuilder {
    /// Where declarations come from. Defaults to [`InlineDeclarations`].
    pub fn with_provider(mut self, provider: Arc<dyn DeclarationProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Resolve the candidate pool into a field set.
    pub fn build(self, pool: impl IntoIterator<Item = Field>) -> FieldSet {
        let fields = resolve(
            pool,
            self.provider.as_ref(),
            &self.entity_type,
            &self.context,
        );
        FieldSet {
            entity_type: self.entity_type,
            context: self.context,
            fields,
            routes: IndexMap::new(),
            title: self.title,
            form_template: None,
            table_template: None,
            bound_record_id: None,
            store: self.store,
        }
    }
}

/// Select, order and initialize the fields applying to `(entity_type, context)`.
fn resolve(
    pool: impl IntoIterator<Item = Field>,
    provider: &dyn DeclarationProvider,
    entity_type: &str,
    context: &str,
) -> Vec<Field> {
    let mut included: Vec<Field> = pool
        .into_iter()
        .filter_map(|mut field| {
            let order = provider
                .declarations(&field)
                .into_iter()
                .find(|d| d.matches(entity_type, context))?
                .order;
            field.set_order(order);
            Some(field)
        })
        .collect();

    included.sort_by_key(Field::order);

    let owner = FieldSetRef {
        entity_type: entity_type.to_string(),
        context: context.to_string(),
    };
    let siblings: Vec<String> = included
        .iter()
        .map(|f| f.identifier().to_string())
        .collect();
    for field in &mut included {
        field.init(owner.clone(), &siblings);
    }

    debug!(
        entity_type,
        context,
        fields = included.len(),
        "resolved field set"
    );
    included
}

/// Outcome of validating a whole submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// First error of each failing field, in field order.
    pub invalid: IndexMap<String, FieldError>,
    /// Identifiers of the fields that passed.
    pub valid: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.invalid.is_empty()
    }
}

impl FieldSet {
    /// Start building the field set of `entity_type` in `context`.
    pub fn for_entity(entity_type: impl Into<String>, context: impl Into<String>) -> FieldSetBuilder {
        FieldSetBuilder {
            entity_type: entity_type.into(),
            context: context.into(),
            provider: Arc::new(InlineDeclarations),
            store: None,
            title: None,
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [Field] {
        &mut self.fields
    }

    pub fn field(&self, identifier: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.identifier() == identifier)
    }

    pub fn field_mut(&mut self, identifier: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.identifier() == identifier)
    }

    /// Append a field as-is: no declaration matching, no re-sort, no init.
    pub fn add_field(&mut self, field: Field) -> &mut Self {
        self.fields.push(field);
        self
    }

    pub fn routes(&self) -> &IndexMap<String, String> {
        &self.routes
    }

    /// Replace the routes and copy them onto every field currently held.
    pub fn set_routes(&mut self, routes: IndexMap<String, String>) -> &mut Self {
        for field in &mut self.fields {
            field.set_routes(routes.clone());
        }
        self.routes = routes;
        self
    }

    pub fn route(&self, name: &str) -> Option<&str> {
        self.routes.get(name).map(String::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: Option<String>) -> &mut Self {
        self.title = title;
        self
    }

    pub fn form_template(&self) -> Option<&str> {
        self.form_template.as_deref()
    }

    pub fn set_form_template(&mut self, template: Option<String>) -> &mut Self {
        self.form_template = template;
        self
    }

    pub fn table_template(&self) -> Option<&str> {
        self.table_template.as_deref()
    }

    pub fn set_table_template(&mut self, template: Option<String>) -> &mut Self {
        self.table_template = template;
        self
    }

    /// Use one template for both the form and the table.
    pub fn set_template(&mut self, template: Option<String>) -> &mut Self {
        self.form_template = template.clone();
        self.table_template = template;
        self
    }

    pub fn store(&self) -> Option<&Arc<dyn RecordStore>> {
        self.store.as_ref()
    }

    pub fn set_store(&mut self, store: Option<Arc<dyn RecordStore>>) -> &mut Self {
        self.store = store;
        self
    }

    /// Bind the record being edited, or unbind with `None`.
    pub fn bind_record(&mut self, record: Option<&dyn Record>) -> &mut Self {
        self.bound_record_id = record.and_then(|r| r.id());
        self
    }

    /// Identifier of the bound record.
    pub fn entity_id(&self) -> Option<&Value> {
        self.bound_record_id.as_ref()
    }

    /// True when the bound record already has a truthy identifier.
    pub fn is_editing(&self) -> bool {
        self.bound_record_id.as_ref().is_some_and(Value::is_truthy)
    }

    /// Validate one value against the named field's chain.
    pub fn validate_field(&mut self, identifier: &str, value: &Value) -> Result<bool> {
        let (scope, fields) = self.scoped_fields();
        let field = fields
            .iter_mut()
            .find(|f| f.identifier() == identifier)
            .ok_or_else(|| FieldsError::field_not_found(identifier))?;
        Ok(field.validate_with(value, Some(scope)))
    }

    pub fn is_field_required(&self, identifier: &str) -> Result<bool> {
        let field = self
            .field(identifier)
            .ok_or_else(|| FieldsError::field_not_found(identifier))?;
        Ok(field.is_required_with(Some(self.scope())))
    }

    /// Validate every form field against the submitted values.
    ///
    /// All fields are checked; the report lists each failing field's error
    /// and the identifiers of those that passed.
    pub fn validate_submission<F>(&mut self, mut submitted: F) -> ValidationReport
    where
        F: FnMut(&str) -> Value,
    {
        let (scope, fields) = self.scoped_fields();
        let mut report = ValidationReport::default();
        for field in fields.iter_mut().filter(|f| f.is_render_in_form()) {
            let value = submitted(field.identifier());
            if field.validate_with(&value, Some(scope)) {
                report.valid.push(field.identifier().to_string());
            } else if let Some(error) = field.error() {
                report
                    .invalid
                    .insert(field.identifier().to_string(), error.clone());
            }
        }
        debug!(
            entity_type = %self.entity_type,
            invalid = report.invalid.len(),
            valid = report.valid.len(),
            "validated submission"
        );
        report
    }

    fn scope(&self) -> FieldSetScope<'_> {
        scope_of(
            &self.entity_type,
            &self.context,
            &self.bound_record_id,
            &self.store,
        )
    }

    /// The validation scope alongside mutable access to the fields.
    fn scoped_fields(&mut self) -> (FieldSetScope<'_>, &mut [Field]) {
        let Self {
            entity_type,
            context,
            fields,
            bound_record_id,
            store,
            ..
        } = self;
        (scope_of(entity_type, context, bound_record_id, store), fields)
    }
}

fn scope_of<'a>(
    entity_type: &'a str,
    context: &'a str,
    bound_record_id: &'a Option<Value>,
    store: &'a Option<Arc<dyn RecordStore>>,
) -> FieldSetScope<'a> {
    FieldSetScope {
        entity_type,
        context,
        bound_record_id: bound_record_id.as_ref(),
        store: store.as_deref(),
    }
}

/// Creates field sets from a shared template pool.
///
/// Each call resolves fresh clones, so concurrent resolutions never share
/// field state.
#[derive(Clone)]
pub struct FieldSetFactory {
    pool: Arc<Vec<Field>>,
    provider: Arc<dyn DeclarationProvider>,
    store: Option<Arc<dyn RecordStore>>,
}

impl FieldSetFactory {
    pub fn new(pool: Vec<Field>) -> Self {
        Self {
            pool: Arc::new(pool),
            provider: Arc::new(InlineDeclarations),
            store: None,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn DeclarationProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn create(&self, entity_type: &str, context: &str) -> FieldSet {
        let mut builder =
            FieldSet::for_entity(entity_type, context).with_provider(Arc::clone(&self.provider));
        if let Some(store) = &self.store {
            builder = builder.with_store(Arc::clone(store));
        }
        builder.build(self.pool.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::{Declaration, DeclarationRegistry};
    use crate::validator::{password_pair, PasswordPolicyValidator, RequiredValidator, UniqueValidator};
    use recordgrid_store::{EntityMapping, RowRecord, SqliteStore};

    const USER: &str = "app::entity::User";
    const CONTEXT: &str = "user_admin";

    fn field(identifier: &str, order: i32) -> Field {
        Field::new(identifier).with_declaration(Declaration::for_entity(USER).with_order(order))
    }

    fn identifiers(set: &FieldSet) -> Vec<&str> {
        set.fields().iter().map(Field::identifier).collect()
    }

    #[test]
    fn resolution_orders_by_declared_order() {
        let set = FieldSet::for_entity(USER, CONTEXT).build(vec![
            field("c", 30),
            field("a", 10),
            field("b", 20),
        ]);
        assert_eq!(identifiers(&set), vec!["a", "b", "c"]);
        let orders: Vec<i32> = set.fields().iter().map(Field::order).collect();
        assert_eq!(orders, vec![10, 20, 30]);
    }

    #[test]
    fn equal_orders_keep_input_order() {
        let set = FieldSet::for_entity(USER, CONTEXT).build(vec![
            field("x", 5),
            field("y", 1),
            field("z", 5),
            field("w", 1),
        ]);
        assert_eq!(identifiers(&set), vec!["y", "w", "x", "z"]);
    }

    #[test]
    fn unmatched_fields_are_excluded() {
        let set = FieldSet::for_entity(USER, CONTEXT).build(vec![
            field("name", 10),
            Field::new("total").with_declaration(Declaration::for_entity("Order")),
            Field::new("bare"),
        ]);
        assert_eq!(identifiers(&set), vec!["name"]);
    }

    #[test]
    fn first_matching_declaration_wins() {
        let pool = vec![Field::new("email")
            .with_declaration(Declaration::for_entity("Order").with_order(1))
            .with_declaration(Declaration::for_context(CONTEXT).with_order(40))
            .with_declaration(Declaration::for_entity("user").with_order(5))];
        let set = FieldSet::for_entity(USER, CONTEXT).build(pool);
        assert_eq!(set.fields()[0].order(), 40);
    }

    #[test]
    fn short_name_and_context_matches() {
        let pool = vec![
            Field::new("a").with_declaration(Declaration::for_entity("user").with_order(2)),
            Field::new("b").with_declaration(Declaration::for_entity(CONTEXT).with_order(1)),
        ];
        let set = FieldSet::for_entity(USER, CONTEXT).build(pool);
        assert_eq!(identifiers(&set), vec!["b", "a"]);
    }

    #[test]
    fn resolved_fields_know_their_owner() {
        let set = FieldSet::for_entity(USER, CONTEXT).build(vec![field("name", 1)]);
        let owner = set.fields()[0].owner().unwrap();
        assert_eq!(owner.entity_type, USER);
        assert_eq!(owner.context, CONTEXT);
    }

    #[test]
    fn add_field_appends_without_init() {
        let mut set = FieldSet::for_entity(USER, CONTEXT).build(vec![field("b", 50)]);
        set.add_field(Field::new("a"));
        assert_eq!(identifiers(&set), vec!["b", "a"]);
        assert!(set.field("a").unwrap().owner().is_none());
    }

    #[test]
    fn routes_propagate_to_current_fields_only() {
        let mut set = FieldSet::for_entity(USER, CONTEXT).build(vec![field("name", 1)]);
        let routes = IndexMap::from([("edit".to_string(), "/users/edit".to_string())]);
        set.set_routes(routes.clone());
        set.add_field(Field::new("late"));

        assert_eq!(set.field("name").unwrap().route("edit"), Some("/users/edit"));
        assert_eq!(set.field("late").unwrap().route("edit"), None);
        assert_eq!(set.route("edit"), Some("/users/edit"));

        set.set_routes(routes);
        assert_eq!(set.field("late").unwrap().route("edit"), Some("/users/edit"));
    }

    #[test]
    fn templates_and_title() {
        let mut set = FieldSet::for_entity(USER, CONTEXT)
            .with_title("Users")
            .build(vec![]);
        assert_eq!(set.title(), Some("Users"));
        set.set_template(Some("admin.html".into()));
        assert_eq!(set.form_template(), Some("admin.html"));
        assert_eq!(set.table_template(), Some("admin.html"));
        set.set_table_template(None);
        assert_eq!(set.table_template(), None);
    }

    #[test]
    fn bound_record_drives_editing() {
        let mut set = FieldSet::for_entity(USER, CONTEXT).build(vec![field("password", 1)
            .with_validator(RequiredValidator::new())]);
        for validator in password_pair(PasswordPolicyValidator::new()) {
            set.field_mut("password").unwrap().add_validator(validator);
        }

        assert!(!set.is_editing());
        assert!(set.is_field_required("password").unwrap());
        assert!(!set.validate_field("password", &Value::from(vec!["", ""])).unwrap());
        assert_eq!(
            set.field("password").unwrap().error().unwrap().message,
            "required"
        );

        let record = RowRecord::new().column("id", 7).column("password", "");
        set.bind_record(Some(&record));
        assert!(set.is_editing());
        assert_eq!(set.entity_id(), Some(&Value::Int(7)));
        assert!(!set.is_field_required("password").unwrap());
        assert!(set.validate_field("password", &Value::from(vec!["", ""])).unwrap());

        set.bind_record(None);
        assert!(!set.is_editing());
    }

    #[test]
    fn unknown_field_is_an_error() {
        let mut set = FieldSet::for_entity(USER, CONTEXT).build(vec![]);
        let err = set.validate_field("missing", &Value::Null).unwrap_err();
        assert!(matches!(err, FieldsError::FieldNotFound { .. }));
        assert!(set.is_field_required("missing").is_err());
    }

    #[test]
    fn uniqueness_excludes_bound_record() {
        let store = SqliteStore::open_in_memory()
            .unwrap()
            .with_entity(EntityMapping::new(USER, "users"));
        store
            .execute_batch(
                "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT);
                 INSERT INTO users (email) VALUES ('ada@example.com');",
            )
            .unwrap();
        let store: Arc<dyn RecordStore> = Arc::new(store);

        let mut set = FieldSet::for_entity(USER, CONTEXT)
            .with_store(Arc::clone(&store))
            .build(vec![field("email", 1).with_validator(UniqueValidator::new())]);
        let own = RowRecord::new().column("id", 1);
        set.bind_record(Some(&own));
        let email = Value::from("ada@example.com");

        assert!(set.validate_field("email", &email).unwrap());

        let mut other = store.create_record(USER).unwrap();
        other.set("email", email.clone());
        store.insert(USER, &mut other).unwrap();

        assert!(!set.validate_field("email", &email).unwrap());
        assert_eq!(set.field("email").unwrap().error().unwrap().domain, "validator_unique");
    }

    #[test]
    fn submission_report_lists_valid_and_invalid() {
        let mut set = FieldSet::for_entity(USER, CONTEXT).build(vec![
            field("name", 1).with_validator(RequiredValidator::new()),
            field("email", 2),
            field("internal", 3)
                .with_render_in_form(false)
                .with_validator(RequiredValidator::new()),
        ]);
        let report = set.validate_submission(|id| match id {
            "email" => Value::from("ada@example.com"),
            _ => Value::Null,
        });
        assert!(!report.is_valid());
        assert_eq!(report.valid, vec!["email"]);
        assert_eq!(
            report.invalid["name"].message,
            "error.ddm.validator.required"
        );
        assert!(!report.invalid.contains_key("internal"));
    }

    #[test]
    fn factory_resolves_independent_copies() {
        let registry = DeclarationRegistry::new()
            .register("name", Declaration::for_entity("User").with_order(2))
            .register("name", Declaration::for_entity("Order").with_order(9))
            .register("email", Declaration::for_entity("User").with_order(1));
        let factory = FieldSetFactory::new(vec![Field::new("name"), Field::new("email")])
            .with_provider(Arc::new(registry));

        let users = factory.create(USER, CONTEXT);
        let orders = factory.create("app::entity::Order", "order_admin");

        assert_eq!(identifiers(&users), vec!["email", "name"]);
        assert_eq!(identifiers(&orders), vec!["name"]);
        assert_eq!(users.field("name").unwrap().order(), 2);
        assert_eq!(orders.field("name").unwrap().order(), 9);
    }
}
