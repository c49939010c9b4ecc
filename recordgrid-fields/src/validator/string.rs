use recordgrid_store::Value;

use super::{Rejection, ValidationContext, Validator, ValidatorSettings, Verdict};

/// Bounds the character count of the string-coerced value.
#[derive(Debug, Clone)]
pub struct StringLengthValidator {
    settings: ValidatorSettings,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl StringLengthValidator {
    pub const ALIAS: &'static str = "string";
    pub const MIN_MESSAGE: &'static str = "string.min_length";
    pub const MAX_MESSAGE: &'static str = "string.max_length";

    pub fn new() -> Self {
        Self {
            settings: ValidatorSettings::new(Some(Self::ALIAS)),
            min_length: None,
            max_length: None,
        }
    }

    pub fn min(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn max(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

impl Default for StringLengthValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl_settings_builders!(StringLengthValidator);

impl Validator for StringLengthValidator {
    fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    fn validate(&self, value: &Value, _ctx: &ValidationContext<'_>) -> Verdict {
        let length = value.to_text().chars().count();

        if let Some(min) = self.min_length.filter(|min| length < *min) {
            return Rejection::new(self.settings.message_or(Self::MIN_MESSAGE))
                .with_parameter("{min_length}", min)
                .with_parameter("{current_length}", length)
                .into();
        }

        if let Some(max) = self.max_length.filter(|max| length > *max) {
            return Rejection::new(self.settings.message_or(Self::MAX_MESSAGE))
                .with_parameter("{max_length}", max)
                .with_parameter("{current_length}", length)
                .into();
        }

        Verdict::Valid
    }

    fn is_required(&self, _ctx: &ValidationContext<'_>) -> bool {
        self.min_length.is_some_and(|min| min > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ValidationContext<'static> {
        ValidationContext::detached("name")
    }

    #[test]
    fn too_short_reports_lengths() {
        let validator = StringLengthValidator::new().min(3);
        let Verdict::Invalid(rejection) = validator.validate(&Value::from("ab"), &ctx()) else {
            panic!("expected rejection");
        };
        assert_eq!(rejection.message, "string.min_length");
        assert_eq!(rejection.parameters["{min_length}"], "3");
        assert_eq!(rejection.parameters["{current_length}"], "2");
    }

    #[test]
    fn too_long_counts_characters() {
        let validator = StringLengthValidator::new().max(3);
        assert!(validator.validate(&Value::from("äöü"), &ctx()).is_valid());

        let Verdict::Invalid(rejection) = validator.validate(&Value::from("äöüß"), &ctx()) else {
            panic!("expected rejection");
        };
        assert_eq!(rejection.message, "string.max_length");
        assert_eq!(rejection.parameters["{max_length}"], "3");
        assert_eq!(rejection.parameters["{current_length}"], "4");
    }

    #[test]
    fn numbers_are_coerced() {
        let validator = StringLengthValidator::new().min(2).max(4);
        assert!(validator.validate(&Value::Int(123), &ctx()).is_valid());
        assert!(!validator.validate(&Value::Int(7), &ctx()).is_valid());
    }

    #[test]
    fn required_iff_min_positive() {
        assert!(!StringLengthValidator::new().is_required(&ctx()));
        assert!(!StringLengthValidator::new().min(0).is_required(&ctx()));
        assert!(StringLengthValidator::new().min(1).is_required(&ctx()));
    }
}
