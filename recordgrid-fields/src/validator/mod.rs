//! Validation pipeline building blocks.
//!
//! A [`Validator`] inspects one submitted value and returns a [`Verdict`].
//! Validators are stateless: a rejection carries its message key and
//! parameters back to the field, which records the error.
//!
//! Validators that need the surrounding record (uniqueness, the password
//! pair) read it from the [`ValidationContext`], which is detached when the
//! field has not been resolved into a field set.

/// Builder methods over a validator's `settings` field.
macro_rules! impl_settings_builders {
    ($ty:ty) => {
        impl $ty {
            pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
                self.settings.alias = Some(alias.into());
                self
            }

            pub fn with_priority(mut self, priority: i32) -> Self {
                self.settings.priority = priority;
                self
            }

            pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
                self.settings.error_message = Some(message.into());
                self
            }
        }
    };
}

mod callback;
mod email;
mod password;
mod required;
mod string;
mod unique;

use std::fmt;

use indexmap::IndexMap;
use recordgrid_store::{RecordStore, Value};
use serde::Serialize;

pub use callback::CallbackValidator;
pub use email::EmailValidator;
pub use password::{password_pair, PasswordPolicyValidator, PasswordRequiredValidator};
pub use required::RequiredValidator;
pub use string::StringLengthValidator;
pub use unique::UniqueValidator;

/// Priority of a validator that was not given one.
pub const DEFAULT_PRIORITY: i32 = 100;

/// Alias, priority and message override shared by every validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorSettings {
    pub alias: Option<String>,
    pub priority: i32,
    pub error_message: Option<String>,
}

impl ValidatorSettings {
    pub fn new(alias: Option<&str>) -> Self {
        Self {
            alias: alias.map(str::to_string),
            priority: DEFAULT_PRIORITY,
            error_message: None,
        }
    }

    /// The configured message, or `default` when none was set.
    pub fn message_or(&self, default: &str) -> String {
        self.error_message
            .clone()
            .unwrap_or_else(|| default.to_string())
    }
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Message key and parameters of a failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub message: String,
    pub parameters: IndexMap<String, String>,
}

impl Rejection {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            parameters: IndexMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.parameters.insert(name.into(), value.to_string());
        self
    }
}

/// Outcome of a single validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid(Rejection),
}

impl Verdict {
    pub fn reject(message: impl Into<String>) -> Self {
        Self::Invalid(Rejection::new(message))
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl From<Rejection> for Verdict {
    fn from(rejection: Rejection) -> Self {
        Self::Invalid(rejection)
    }
}

/// The field set a field was resolved into, as seen by its validators.
#[derive(Clone, Copy)]
pub struct FieldSetScope<'a> {
    pub entity_type: &'a str,
    pub context: &'a str,
    /// Identifier value of the bound record, when one is bound.
    pub bound_record_id: Option<&'a Value>,
    pub store: Option<&'a dyn RecordStore>,
}

impl fmt::Debug for FieldSetScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSetScope")
            .field("entity_type", &self.entity_type)
            .field("context", &self.context)
            .field("bound_record_id", &self.bound_record_id)
            .field("store", &self.store.is_some())
            .finish()
    }
}

/// What a validator knows about the value it is checking.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Identifier of the field being validated.
    pub identifier: &'a str,
    pub scope: Option<FieldSetScope<'a>>,
}

impl<'a> ValidationContext<'a> {
    /// Context of a field that belongs to no field set.
    pub fn detached(identifier: &'a str) -> Self {
        Self {
            identifier,
            scope: None,
        }
    }

    pub fn entity_type(&self) -> Option<&'a str> {
        self.scope.map(|s| s.entity_type)
    }

    pub fn bound_record_id(&self) -> Option<&'a Value> {
        self.scope.and_then(|s| s.bound_record_id)
    }

    pub fn store(&self) -> Option<&'a dyn RecordStore> {
        self.scope.and_then(|s| s.store)
    }

    /// True when the owning field set has a bound record with a truthy identifier.
    pub fn is_editing(&self) -> bool {
        self.bound_record_id().is_some_and(Value::is_truthy)
    }
}

/// A check applied to one submitted value.
pub trait Validator: fmt::Debug + Send + Sync {
    fn settings(&self) -> &ValidatorSettings;

    /// Validators sharing an alias replace each other on a field.
    fn alias(&self) -> Option<&str> {
        self.settings().alias.as_deref()
    }

    /// Higher runs first.
    fn priority(&self) -> i32 {
        self.settings().priority
    }

    fn validate(&self, value: &Value, ctx: &ValidationContext<'_>) -> Verdict;

    /// Whether this validator makes its field mandatory.
    fn is_required(&self, _ctx: &ValidationContext<'_>) -> bool {
        false
    }
}
