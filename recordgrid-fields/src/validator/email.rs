use std::sync::OnceLock;

use recordgrid_store::Value;
use regex::Regex;

use super::{ValidationContext, Validator, ValidatorSettings, Verdict};

/// Address grammar: dot-atom local part, hostname labels, at least one dot.
static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
        )
        .expect("Invalid email regex")
    })
}

const MAX_LOCAL_LENGTH: usize = 64;
const MAX_ADDRESS_LENGTH: usize = 254;

fn is_valid_address(address: &str) -> bool {
    let Some((local, _)) = address.rsplit_once('@') else {
        return false;
    };
    address.len() <= MAX_ADDRESS_LENGTH
        && local.len() <= MAX_LOCAL_LENGTH
        && email_regex().is_match(address)
}

/// Empty values pass; anything else must be an email address.
#[derive(Debug, Clone)]
pub struct EmailValidator {
    settings: ValidatorSettings,
}

impl EmailValidator {
    pub const ALIAS: &'static str = "email";
    pub const MESSAGE: &'static str = "email.invalid";

    pub fn new() -> Self {
        Self {
            settings: ValidatorSettings::new(Some(Self::ALIAS)),
        }
    }
}

impl Default for EmailValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl_settings_builders!(EmailValidator);

impl Validator for EmailValidator {
    fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    fn validate(&self, value: &Value, _ctx: &ValidationContext<'_>) -> Verdict {
        if value.is_empty() {
            return Verdict::Valid;
        }
        if is_valid_address(&value.to_text()) {
            Verdict::Valid
        } else {
            Verdict::reject(self.settings.message_or(Self::MESSAGE))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(value: impl Into<Value>) -> bool {
        EmailValidator::new()
            .validate(&value.into(), &ValidationContext::detached("email"))
            .is_valid()
    }

    #[test]
    fn empty_values_pass() {
        assert!(check(Value::Null));
        assert!(check(""));
        assert!(check(Value::List(vec![])));
    }

    #[test]
    fn accepts_addresses() {
        assert!(check("ada@example.com"));
        assert!(check("first.last+tag@mail.example.co.uk"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!check("plainaddress"));
        assert!(!check("ada@"));
        assert!(!check("ada@localhost"));
        assert!(!check(".ada@example.com"));
        assert!(!check("ada..b@example.com"));
        assert!(!check("ada@-example.com"));
        assert!(!check(Value::from(vec!["ada@example.com"])));
    }

    #[test]
    fn rejects_overlong_local_part() {
        let local = "a".repeat(65);
        assert!(!check(format!("{local}@example.com")));
    }

    #[test]
    fn never_required() {
        assert!(!EmailValidator::new().is_required(&ValidationContext::detached("email")));
    }
}
