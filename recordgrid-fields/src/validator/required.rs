use recordgrid_store::Value;

use super::{ValidationContext, Validator, ValidatorSettings, Verdict};

/// Rejects null, whitespace-only strings and empty lists.
#[derive(Debug, Clone)]
pub struct RequiredValidator {
    settings: ValidatorSettings,
}

impl RequiredValidator {
    pub const ALIAS: &'static str = "required";
    pub const MESSAGE: &'static str = "error.ddm.validator.required";

    pub fn new() -> Self {
        Self {
            settings: ValidatorSettings::new(Some(Self::ALIAS)),
        }
    }
}

impl Default for RequiredValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl_settings_builders!(RequiredValidator);

impl Validator for RequiredValidator {
    fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    fn validate(&self, value: &Value, _ctx: &ValidationContext<'_>) -> Verdict {
        if value.is_blank() {
            return Verdict::reject(self.settings.message_or(Self::MESSAGE));
        }
        Verdict::Valid
    }

    fn is_required(&self, _ctx: &ValidationContext<'_>) -> bool {
        true
    }
}
