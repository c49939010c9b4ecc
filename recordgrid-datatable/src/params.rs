//! Request-shaped input.
//!
//! Handlers read a flat key → value bag extracted from a request. Accessors
//! are lenient: a missing or malformed value yields the caller's default.

use indexmap::IndexMap;
use recordgrid_store::Value;
use serde_json::Value as JsonValue;

/// Flat parameter bag, e.g. a query string or a form body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterBag {
    params: IndexMap<String, JsonValue>,
}

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries of a JSON object; anything else yields an empty bag.
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Object(map) => Self {
                params: map.into_iter().collect(),
            },
            _ => Self::default(),
        }
    }

    /// Add or replace a parameter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn has(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.params.get(key)
    }

    /// Scalar parameter as a string; arrays and objects read as absent.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            JsonValue::Bool(true) => Some("1".to_string()),
            JsonValue::Bool(false) | JsonValue::Null => Some(String::new()),
            JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }

    /// Integer parameter, or `default` when missing or not an integer.
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.get(key) {
            Some(JsonValue::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .unwrap_or(default),
            Some(JsonValue::String(s)) => s.trim().parse().unwrap_or(default),
            Some(JsonValue::Bool(b)) => i64::from(*b),
            _ => default,
        }
    }

    /// Boolean parameter: `1`, `true`, `on` and `yes` are true; `0`, `false`,
    /// `off`, `no` and the empty string are false; anything else is `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(JsonValue::Bool(b)) => *b,
            Some(JsonValue::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(JsonValue::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => true,
                "0" | "false" | "off" | "no" | "" => false,
                _ => default,
            },
            Some(JsonValue::Null) => false,
            _ => default,
        }
    }

    /// Object parameter as an ordered map; anything else yields an empty map.
    pub fn get_map(&self, key: &str) -> IndexMap<String, JsonValue> {
        match self.get(key) {
            Some(JsonValue::Object(map)) => map.clone().into_iter().collect(),
            _ => IndexMap::new(),
        }
    }

    /// Parameter as a record value; missing reads as null.
    pub fn value(&self, key: &str) -> Value {
        self.get(key).map(Value::from).unwrap_or_default()
    }
}

/// HTTP-style method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
}

/// Query and body parameters of one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
    pub method: Method,
    pub query: ParameterBag,
    pub body: ParameterBag,
}

impl RequestParams {
    pub fn get(query: ParameterBag) -> Self {
        Self {
            method: Method::Get,
            query,
            body: ParameterBag::new(),
        }
    }

    pub fn post(body: ParameterBag) -> Self {
        Self {
            method: Method::Post,
            query: ParameterBag::new(),
            body,
        }
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::Post
    }

    /// Body parameters for POST requests, query parameters otherwise.
    pub fn active(&self) -> &ParameterBag {
        if self.is_post() {
            &self.body
        } else {
            &self.query
        }
    }
}

/// Drop search entries that are null, empty strings, empty lists or empty objects.
pub fn clean_search_fields(fields: IndexMap<String, JsonValue>) -> IndexMap<String, JsonValue> {
    fields
        .into_iter()
        .filter(|(_, value)| match value {
            JsonValue::Null => false,
            JsonValue::String(s) => !s.is_empty(),
            JsonValue::Array(items) => !items.is_empty(),
            JsonValue::Object(map) => !map.is_empty(),
            _ => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lenient_integers() {
        let bag = ParameterBag::from_json(json!({
            "page": "3",
            "perpage": 25,
            "float": 2.9,
            "junk": "abc",
            "list": [1]
        }));
        assert_eq!(bag.get_int("page", 1), 3);
        assert_eq!(bag.get_int("perpage", 10), 25);
        assert_eq!(bag.get_int("float", 1), 2);
        assert_eq!(bag.get_int("junk", 1), 1);
        assert_eq!(bag.get_int("list", 7), 7);
        assert_eq!(bag.get_int("missing", 10), 10);
    }

    #[test]
    fn booleans() {
        let bag = ParameterBag::new()
            .with("a", "true")
            .with("b", "1")
            .with("c", "off")
            .with("d", true)
            .with("e", "maybe")
            .with("f", 0);
        assert!(bag.get_bool("a", false));
        assert!(bag.get_bool("b", false));
        assert!(!bag.get_bool("c", true));
        assert!(bag.get_bool("d", false));
        assert!(bag.get_bool("e", true));
        assert!(!bag.get_bool("f", true));
        assert!(!bag.get_bool("missing", false));
    }

    #[test]
    fn strings_and_maps() {
        let bag = ParameterBag::from_json(json!({
            "search": "ada",
            "n": 4,
            "search_fields": {"name": "x"},
            "tags": ["a"]
        }));
        assert_eq!(bag.get_str("search").as_deref(), Some("ada"));
        assert_eq!(bag.get_str("n").as_deref(), Some("4"));
        assert_eq!(bag.get_str("tags"), None);
        assert_eq!(bag.get_map("search_fields")["name"], json!("x"));
        assert!(bag.get_map("search").is_empty());
        assert_eq!(bag.value("tags"), Value::from(vec!["a"]));
        assert_eq!(bag.value("missing"), Value::Null);
    }

    #[test]
    fn post_prefers_body() {
        let mut request = RequestParams::post(ParameterBag::new().with("page", 2));
        request.query = ParameterBag::new().with("page", 9);
        assert_eq!(request.active().get_int("page", 1), 2);

        let request = RequestParams::get(ParameterBag::new().with("page", 9));
        assert_eq!(request.active().get_int("page", 1), 9);
    }

    #[test]
    fn clean_drops_empty_entries() {
        let cleaned = clean_search_fields(
            ParameterBag::from_json(json!({
                "a": "",
                "b": [],
                "c": "x",
                "d": null,
                "e": {},
                "f": 0
            }))
            .params,
        );
        let keys: Vec<_> = cleaned.keys().cloned().collect();
        assert_eq!(keys, vec!["c", "f"]);
    }
}
