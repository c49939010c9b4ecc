//! Translation boundary.
//!
//! Display names and message keys are opaque strings. A [`Translator`]
//! turns them into locale text; the domain is passed through unchanged.

use std::collections::HashMap;

use indexmap::IndexMap;

pub trait Translator: Send + Sync {
    fn translate(
        &self,
        key: &str,
        parameters: &IndexMap<String, String>,
        domain: Option<&str>,
    ) -> String;
}

/// Returns the key itself with parameters substituted.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(
        &self,
        key: &str,
        parameters: &IndexMap<String, String>,
        _domain: Option<&str>,
    ) -> String {
        substitute(key, parameters)
    }
}

/// In-memory message catalog keyed by domain and key.
///
/// Unknown keys translate to themselves.
#[derive(Debug, Clone, Default)]
pub struct CatalogTranslator {
    messages: HashMap<(Option<String>, String), String>,
}

impl CatalogTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(
        mut self,
        domain: Option<&str>,
        key: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.messages
            .insert((domain.map(str::to_string), key.into()), text.into());
        self
    }
}

impl Translator for CatalogTranslator {
    fn translate(
        &self,
        key: &str,
        parameters: &IndexMap<String, String>,
        domain: Option<&str>,
    ) -> String {
        let text = self
            .messages
            .get(&(domain.map(str::to_string), key.to_string()))
            .map_or(key, String::as_str);
        substitute(text, parameters)
    }
}

/// Replace each parameter name occurring in `text` with its value.
fn substitute(text: &str, parameters: &IndexMap<String, String>) -> String {
    parameters
        .iter()
        .fold(text.to_string(), |acc, (name, value)| acc.replace(name, value))
}
