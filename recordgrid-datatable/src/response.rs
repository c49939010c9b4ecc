//! Serialized result of a datatable request.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatatableResponse {
    pub head: Head,
    /// Sort columns actually applied, in request order.
    pub sorting: IndexMap<String, String>,
    pub search: SearchValue,
    pub page: u64,
    pub perpage: u64,
    pub searchisnew: bool,
    /// Extended search entries that survived cleaning.
    pub search_fields: IndexMap<String, JsonValue>,
    pub data: Vec<DataRow>,
    pub count: Counts,
}

impl DatatableResponse {
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Head {
    pub columns: Vec<Column>,
}

/// Header of one table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Translated display name.
    pub name: String,
    pub sortable: bool,
    #[serde(rename = "id")]
    pub identifier: String,
    /// Cell content is markup, set on the options column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchValue {
    pub value: String,
}

/// One rendered record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    /// Display string per table column identifier.
    pub data: IndexMap<String, String>,
    pub config: IndexMap<String, JsonValue>,
    pub class: String,
    pub data_class: Vec<String>,
}

impl DataRow {
    pub fn new(data: IndexMap<String, String>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }
}

/// Pagination counters. `start` and `end` are 1-based and inclusive; both
/// are 0 when nothing matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub total: u64,
    pub filtered: u64,
    pub start: u64,
    pub end: u64,
    pub perpage: u64,
    pub page: u64,
}

impl Counts {
    pub fn new(total: u64, filtered: u64, page: u64, perpage: u64) -> Self {
        let start = if filtered > 0 {
            1 + page.saturating_sub(1) * perpage
        } else {
            0
        };
        Self {
            total,
            filtered,
            start,
            end: filtered.min(page * perpage),
            perpage,
            page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_window() {
        let counts = Counts::new(10, 3, 2, 2);
        assert_eq!((counts.start, counts.end), (3, 3));

        let empty = Counts::new(10, 0, 1, 10);
        assert_eq!((empty.start, empty.end), (0, 0));
    }

    #[test]
    fn column_serialization() {
        let plain = Column {
            name: "Name".into(),
            sortable: true,
            identifier: "name".into(),
            raw: None,
            class: None,
        };
        assert_eq!(
            serde_json::to_value(&plain).unwrap(),
            json!({"name": "Name", "sortable": true, "id": "name"})
        );

        let options = Column {
            name: "Options".into(),
            sortable: false,
            identifier: "options".into(),
            raw: Some(true),
            class: Some("avalynx-datatable-options".into()),
        };
        assert_eq!(
            serde_json::to_value(&options).unwrap()["class"],
            json!("avalynx-datatable-options")
        );
    }

    #[test]
    fn row_shape() {
        let row = DataRow::new(IndexMap::from([("name".to_string(), "Ada".to_string())]));
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!({"data": {"name": "Ada"}, "config": {}, "class": "", "data_class": []})
        );
    }
}
