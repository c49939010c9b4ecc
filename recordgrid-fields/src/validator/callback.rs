use std::fmt;
use std::sync::Arc;

use recordgrid_store::Value;

use super::{ValidationContext, Validator, ValidatorSettings, Verdict};

type Check = dyn Fn(&Value, &ValidationContext<'_>) -> bool + Send + Sync;

/// Ad-hoc validator wrapping a predicate closure.
#[derive(Clone)]
pub struct CallbackValidator {
    settings: ValidatorSettings,
    check: Arc<Check>,
    required: bool,
}

impl CallbackValidator {
    pub const MESSAGE: &'static str = "invalid";

    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Value, &ValidationContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            settings: ValidatorSettings::default(),
            check: Arc::new(check),
            required: false,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

impl_settings_builders!(CallbackValidator);

impl fmt::Debug for CallbackValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackValidator")
            .field("settings", &self.settings)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

impl Validator for CallbackValidator {
    fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    fn validate(&self, value: &Value, ctx: &ValidationContext<'_>) -> Verdict {
        if (self.check)(value, ctx) {
            Verdict::Valid
        } else {
            Verdict::reject(self.settings.message_or(Self::MESSAGE))
        }
    }

    fn is_required(&self, _ctx: &ValidationContext<'_>) -> bool {
        self.required
    }
}
