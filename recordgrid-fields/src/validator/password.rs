//! Password policy and the conditional-required password pair.
//!
//! A password field submits either a single value or a `[password,
//! confirmation]` list. [`password_pair`] returns the two validators that
//! together check, in order: presence unless editing, length, character
//! classes, then that both entries match.

use std::sync::Arc;

use recordgrid_store::Value;

use super::{Rejection, ValidationContext, Validator, ValidatorSettings, Verdict};

/// Letters outside ASCII that still count as letters, not specials.
const LETTER_EXTRAS: &[char] = &['ä', 'ö', 'ü', 'Ä', 'Ö', 'Ü'];

/// The two entries of a pair submission, or the value and nothing.
fn pair_of(value: &Value) -> (String, Option<String>) {
    match value.as_list() {
        Some(items) if items.len() >= 2 => (items[0].to_text(), Some(items[1].to_text())),
        Some(items) => (items.first().map(Value::to_text).unwrap_or_default(), None),
        None => (value.to_text(), None),
    }
}

fn is_special(c: char) -> bool {
    !c.is_ascii_alphanumeric() && !LETTER_EXTRAS.contains(&c)
}

/// Length, character class and confirmation checks.
#[derive(Debug, Clone)]
pub struct PasswordPolicyValidator {
    settings: ValidatorSettings,
    min_length: usize,
    require_lowercase: bool,
    require_uppercase: bool,
    require_numbers: bool,
    require_special_chars: bool,
}

impl PasswordPolicyValidator {
    pub const ALIAS: &'static str = "password";
    pub const DEFAULT_MIN_LENGTH: usize = 8;

    pub fn new() -> Self {
        Self {
            settings: ValidatorSettings::new(Some(Self::ALIAS)),
            min_length: Self::DEFAULT_MIN_LENGTH,
            require_lowercase: true,
            require_uppercase: true,
            require_numbers: true,
            require_special_chars: true,
        }
    }

    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn require_lowercase(mut self, required: bool) -> Self {
        self.require_lowercase = required;
        self
    }

    pub fn require_uppercase(mut self, required: bool) -> Self {
        self.require_uppercase = required;
        self
    }

    pub fn require_numbers(mut self, required: bool) -> Self {
        self.require_numbers = required;
        self
    }

    pub fn require_special_chars(mut self, required: bool) -> Self {
        self.require_special_chars = required;
        self
    }

    fn check_policy(&self, password: &str) -> Option<Rejection> {
        if password.chars().count() < self.min_length {
            return Some(
                Rejection::new(self.settings.message_or("password.too_short"))
                    .with_parameter("{min_length}", self.min_length),
            );
        }
        let classes: [(bool, fn(char) -> bool, &str); 4] = [
            (
                self.require_lowercase,
                |c| c.is_ascii_lowercase(),
                "password.require_lowercase",
            ),
            (
                self.require_uppercase,
                |c| c.is_ascii_uppercase(),
                "password.require_uppercase",
            ),
            (
                self.require_numbers,
                |c| c.is_ascii_digit(),
                "password.require_numbers",
            ),
            (
                self.require_special_chars,
                is_special,
                "password.require_special_chars",
            ),
        ];
        classes
            .into_iter()
            .find(|(required, matches, _)| *required && !password.chars().any(*matches))
            .map(|(_, _, message)| Rejection::new(self.settings.message_or(message)))
    }
}

impl Default for PasswordPolicyValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl_settings_builders!(PasswordPolicyValidator);

impl Validator for PasswordPolicyValidator {
    fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    fn validate(&self, value: &Value, _ctx: &ValidationContext<'_>) -> Verdict {
        let (password, confirmation) = pair_of(value);
        let password = password.trim();

        if !password.is_empty() {
            if let Some(rejection) = self.check_policy(password) {
                return rejection.into();
            }
        }

        if let Some(confirmation) = confirmation {
            let confirmation = confirmation.trim();
            if password != confirmation {
                return Verdict::reject(self.settings.message_or("password.match_error"));
            }
        }

        Verdict::Valid
    }
}

/// Requires a password when creating a record, not when editing one.
///
/// While editing, an empty submission (both entries empty) keeps the
/// stored password.
#[derive(Debug, Clone)]
pub struct PasswordRequiredValidator {
    settings: ValidatorSettings,
}

impl PasswordRequiredValidator {
    /// Shares the alias of the plain required validator, which it replaces.
    pub const ALIAS: &'static str = "required";
    pub const MESSAGE: &'static str = "required";

    pub fn new() -> Self {
        Self {
            settings: ValidatorSettings::new(Some(Self::ALIAS)),
        }
    }
}

impl Default for PasswordRequiredValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl_settings_builders!(PasswordRequiredValidator);

impl Validator for PasswordRequiredValidator {
    fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    fn validate(&self, value: &Value, ctx: &ValidationContext<'_>) -> Verdict {
        let (password, confirmation) = pair_of(value);
        let confirmation = confirmation.unwrap_or_default();
        let both_empty = password.trim().is_empty() && confirmation.trim().is_empty();

        if both_empty && !ctx.is_editing() {
            return Verdict::reject(self.settings.message_or(Self::MESSAGE));
        }
        Verdict::Valid
    }

    fn is_required(&self, ctx: &ValidationContext<'_>) -> bool {
        !ctx.is_editing()
    }
}

/// The conditional-required password pair: presence first, then policy.
pub fn password_pair(policy: PasswordPolicyValidator) -> [Arc<dyn Validator>; 2] {
    [Arc::new(PasswordRequiredValidator::new()), Arc::new(policy)]
}
