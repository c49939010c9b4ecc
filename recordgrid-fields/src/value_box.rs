//! Value boxes: a field's current raw value plus a rendering hint.

use std::fmt;

use recordgrid_store::Value;

/// Rendering hint of a freshly created box.
pub const DEFAULT_BOX_TYPE: &str = "text";

/// Holds a field's raw value and converts it to display text.
pub trait ValueBox: fmt::Display + fmt::Debug + Send + Sync {
    /// Rendering hint, opaque to the engine.
    fn box_type(&self) -> &str;

    fn set_box_type(&mut self, box_type: String);

    fn value(&self) -> Value;

    /// Store a value, coercing it into the box's domain.
    fn set_value(&mut self, value: Value);

    fn clone_box(&self) -> Box<dyn ValueBox>;
}

impl Clone for Box<dyn ValueBox> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Box holding an optional string. Scalars are stringified, null stays null.
#[derive(Debug, Clone, PartialEq)]
pub struct StringBox {
    box_type: String,
    value: Option<String>,
}

impl StringBox {
    pub fn new() -> Self {
        Self {
            box_type: DEFAULT_BOX_TYPE.to_string(),
            value: None,
        }
    }

    pub fn with_type(mut self, box_type: impl Into<String>) -> Self {
        self.box_type = box_type.into();
        self
    }
}

impl Default for StringBox {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StringBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value.as_deref().unwrap_or_default())
    }
}

impl ValueBox for StringBox {
    fn box_type(&self) -> &str {
        &self.box_type
    }

    fn set_box_type(&mut self, box_type: String) {
        self.box_type = box_type;
    }

    fn value(&self) -> Value {
        self.value.clone().map_or(Value::Null, Value::Text)
    }

    fn set_value(&mut self, value: Value) {
        self.value = match value {
            Value::Null => None,
            Value::List(items) => Some(join_items(&items)),
            scalar => Some(scalar.to_text()),
        };
    }

    fn clone_box(&self) -> Box<dyn ValueBox> {
        Box::new(self.clone())
    }
}

/// Box holding a list. Scalars are wrapped, null becomes the empty list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListBox {
    box_type: String,
    items: Vec<Value>,
}

impl ListBox {
    pub fn new() -> Self {
        Self {
            box_type: DEFAULT_BOX_TYPE.to_string(),
            items: Vec::new(),
        }
    }

    pub fn with_type(mut self, box_type: impl Into<String>) -> Self {
        self.box_type = box_type.into();
        self
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }
}

impl Default for ListBox {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_items(&self.items))
    }
}

impl ValueBox for ListBox {
    fn box_type(&self) -> &str {
        &self.box_type
    }

    fn set_box_type(&mut self, box_type: String) {
        self.box_type = box_type;
    }

    fn value(&self) -> Value {
        Value::List(self.items.clone())
    }

    fn set_value(&mut self, value: Value) {
        self.items = match value {
            Value::List(items) => items,
            Value::Null => Vec::new(),
            scalar => vec![scalar],
        };
    }

    fn clone_box(&self) -> Box<dyn ValueBox> {
        Box::new(self.clone())
    }
}

/// `", "`-joined text of list items; nested lists render empty.
fn join_items(items: &[Value]) -> String {
    items
        .iter()
        .map(Value::to_text)
        .collect::<Vec<_>>()
        .join(", ")
}
