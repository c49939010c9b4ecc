//! Form handling: prefill, view bundle and validated submission.
//!
//! A submission is all-or-nothing. Every form field is validated first; only
//! when all pass are the finalized values written to the record and the
//! record handed to the store.

use std::sync::Arc;

use indexmap::IndexMap;
use recordgrid_fields::{Field, FieldSet};
use recordgrid_store::{Record, RecordStore, RowRecord};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::config::DatatableConfig;
use crate::error::Result;
use crate::params::{ParameterBag, RequestParams};
use crate::translator::{IdentityTranslator, Translator};

/// Template used when neither the caller nor the field set names one.
pub const DEFAULT_FORM_TEMPLATE: &str = "@DDM/vis/form.html.twig";

/// Per-call form options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormOptions {
    /// Domain for field labels, passed to the renderer.
    pub translation_domain: Option<String>,
    /// Identifier handed to the renderer.
    pub id: Option<JsonValue>,
    /// Write the record through the store after a successful submission.
    pub auto_flush: bool,
    /// Overrides the field set's form template.
    pub template: Option<String>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            translation_domain: None,
            id: None,
            auto_flush: true,
            template: None,
        }
    }
}

/// Everything an external renderer needs to draw the form.
#[derive(Debug)]
pub struct FormView<'a> {
    pub template: String,
    /// Form fields in field-set order.
    pub fields: Vec<&'a Field>,
    pub field_set: &'a FieldSet,
    pub options: &'a FormOptions,
    pub id: Option<&'a JsonValue>,
}

impl FormView<'_> {
    /// Whether `field` is mandatory for the record bound to the field set.
    ///
    /// Password fields stop being required once an existing record is bound.
    pub fn is_required(&self, field: &Field) -> bool {
        self.field_set
            .is_field_required(field.identifier())
            .unwrap_or(false)
    }
}

/// JSON answer to a submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Translated error per failing field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid: Option<IndexMap<String, String>>,
    /// Identifiers of the fields that passed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<Vec<String>>,
    /// The written record, with its identifier once inserted.
    #[serde(skip)]
    pub record: Option<RowRecord>,
}

impl FormOutcome {
    pub fn rejected(invalid: IndexMap<String, String>, valid: Vec<String>) -> Self {
        Self {
            success: false,
            message: None,
            invalid: Some(invalid),
            valid: Some(valid),
            record: None,
        }
    }

    pub fn saved(message: String, record: RowRecord) -> Self {
        Self {
            success: true,
            message: Some(message),
            invalid: None,
            valid: None,
            record: Some(record),
        }
    }
}

/// Result of [`FormHandler::handle`].
#[derive(Debug)]
pub enum FormResponse<'a> {
    View(FormView<'a>),
    Submitted(FormOutcome),
}

pub struct FormHandler {
    store: Arc<dyn RecordStore>,
    translator: Arc<dyn Translator>,
    config: DatatableConfig,
}

impl FormHandler {
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

    /// Render on GET, submit on POST. An existing record prefills the form
    /// unless `preload` asks for a blank copy.
    pub fn handle<'a>(
        &self,
        request: &RequestParams,
        set: &'a mut FieldSet,
        record: Option<RowRecord>,
        preload: bool,
        options: &'a FormOptions,
    ) -> Result<FormResponse<'a>> {
        if let Some(record) = record.as_ref().filter(|_| !preload) {
            self.prefill(set, record);
        }
        if request.is_post() {
            let outcome = self.submit(set, &request.body, record, preload, options)?;
            return Ok(FormResponse::Submitted(outcome));
        }
        Ok(FormResponse::View(self.form_view(set, options)))
    }

    /// Load form field values from a record into the fields' value boxes.
    ///
    /// Attributes the record lacks or holds as null leave the box untouched.
    pub fn prefill(&self, set: &mut FieldSet, record: &dyn Record) {
        for field in set.fields_mut().iter_mut().filter(|f| f.is_render_in_form()) {
            let Some(value) = record.get(field.identifier()).filter(|v| !v.is_null()) else {
                continue;
            };
            let prepared = field.prepare_value(value);
            field.set_value_form(prepared);
        }
    }

    pub fn form_view<'a>(&self, set: &'a FieldSet, options: &'a FormOptions) -> FormView<'a> {
        let template = options
            .template
            .as_deref()
            .or(set.form_template())
            .unwrap_or(DEFAULT_FORM_TEMPLATE)
            .to_string();
        FormView {
            template,
            fields: set
                .fields()
                .iter()
                .filter(|f| f.is_render_in_form())
                .collect(),
            field_set: set,
            options,
            id: options.id.as_ref(),
        }
    }

    /// Validate and apply a submission.
    ///
    /// A fresh record is created when `preload` is set or no record is given.
    pub fn submit(
        &self,
        set: &mut FieldSet,
        submission: &ParameterBag,
        record: Option<RowRecord>,
        preload: bool,
        options: &FormOptions,
    ) -> Result<FormOutcome> {
        set.bind_record(record.as_ref().map(|r| r as &dyn Record));

        let report = set.validate_submission(|identifier| submission.value(identifier));
        if !report.is_valid() {
            let invalid = report
                .invalid
                .into_iter()
                .map(|(identifier, error)| {
                    let message = self.translator.translate(
                        &error.message,
                        &error.parameters,
                        Some(&error.domain),
                    );
                    (identifier, message)
                })
                .collect();
            debug!(entity_type = set.entity_type(), "form submission rejected");
            return Ok(FormOutcome::rejected(invalid, report.valid));
        }

        let entity = set.entity_type();
        let (mut record, is_new) = match record {
            Some(record) if !preload => (record, false),
            _ => (self.store.create_record(entity)?, true),
        };

        for field in set.fields().iter().filter(|f| f.is_render_in_form()) {
            let value = field.finalize_value(submission.value(field.identifier()));
            record.set(field.identifier(), value);
        }

        if options.auto_flush {
            if is_new {
                self.store.insert(entity, &mut record)?;
            } else {
                self.store.update(entity, &record)?;
            }
        }
        debug!(
            entity_type = entity,
            is_new,
            flushed = options.auto_flush,
            "form submission saved"
        );

        let key = if is_new {
            &self.config.success_create_key
        } else {
            &self.config.success_update_key
        };
        let message =
            self.translator
                .translate(key, &IndexMap::new(), Some(&self.config.message_domain));
        Ok(FormOutcome::saved(message, record))
    }
}
