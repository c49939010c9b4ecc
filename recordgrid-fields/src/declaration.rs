//! Applicability declarations and where they come from.
//!
//! A [`Declaration`] says a field belongs to an entity type or a usage
//! context, and at which position. Declarations are plain data: they are
//! either attached to a [`Field`] directly or registered by field key in a
//! [`DeclarationRegistry`], which can be loaded from YAML files.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{FieldsError, Result};
use crate::field::{Field, DEFAULT_ORDER};

fn default_order() -> i32 {
    DEFAULT_ORDER
}

/// One applicability declaration of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Entity type, its short name, or a context identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    /// Context identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default = "default_order")]
    pub order: i32,
}

impl Default for Declaration {
    fn default() -> Self {
        Self {
            entity: None,
            identifier: None,
            order: DEFAULT_ORDER,
        }
    }
}

impl Declaration {
    pub fn for_entity(entity: impl Into<String>) -> Self {
        Self {
            entity: Some(entity.into()),
            ..Self::default()
        }
    }

    pub fn for_context(identifier: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            ..Self::default()
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Whether this declaration places a field in the `(entity_type, context)` set.
    pub fn matches(&self, entity_type: &str, context: &str) -> bool {
        let entity = self.entity.as_deref();
        let entity_matches = entity == Some(entity_type)
            || entity.is_some_and(|e| e.to_lowercase() == short_name(entity_type).to_lowercase());
        let context_matches = self.identifier.as_deref() == Some(context) || entity == Some(context);
        entity_matches || context_matches
    }
}

/// Last path segment of an entity type name: `app::entity::User` → `User`.
pub fn short_name(entity_type: &str) -> &str {
    entity_type
        .rsplit(|c| c == ':' || c == '\\' || c == '/')
        .next()
        .unwrap_or(entity_type)
}

/// Source of a field's applicability declarations.
pub trait DeclarationProvider: Send + Sync {
    /// Declarations of `field`, in evaluation order.
    fn declarations(&self, field: &Field) -> Vec<Declaration>;
}

/// Reads the declarations attached to the field itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineDeclarations;

impl DeclarationProvider for InlineDeclarations {
    fn declarations(&self, field: &Field) -> Vec<Declaration> {
        field.declarations().to_vec()
    }
}

/// Declarations registered by field key.
///
/// Fields with no registered key fall back to their inline declarations.
#[derive(Debug, Clone, Default)]
pub struct DeclarationRegistry {
    by_key: HashMap<String, Vec<Declaration>>,
}

impl DeclarationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a declaration for the field with this key.
    pub fn register(mut self, key: impl Into<String>, declaration: Declaration) -> Self {
        self.by_key.entry(key.into()).or_default().push(declaration);
        self
    }

    /// Parse a YAML mapping of field key to a list of declarations.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut registry = Self::new();
        registry.merge_yaml(yaml)?;
        Ok(registry)
    }

    fn merge_yaml(&mut self, yaml: &str) -> Result<()> {
        let parsed: HashMap<String, Vec<Declaration>> = serde_yaml_ng::from_str(yaml)?;
        for (key, declarations) in parsed {
            self.by_key.entry(key).or_default().extend(declarations);
        }
        Ok(())
    }

    /// Load every `*.yaml` file of a directory. Invalid files are skipped.
    pub async fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !fs::try_exists(dir).await? {
            return Err(FieldsError::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut paths = Vec::new();
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("yaml") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut registry = Self::new();
        for path in paths {
            let content = fs::read_to_string(&path).await?;
            if let Err(e) = registry.merge_yaml(&content) {
                warn!(?path, %e, "skipping invalid declaration file");
            }
        }
        debug!(keys = registry.by_key.len(), "loaded field declarations");
        Ok(registry)
    }

    pub fn get(&self, key: &str) -> Option<&[Declaration]> {
        self.by_key.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl DeclarationProvider for DeclarationRegistry {
    fn declarations(&self, field: &Field) -> Vec<Declaration> {
        match self.get(field.key()) {
            Some(declarations) => declarations.to_vec(),
            None => field.declarations().to_vec(),
        }
    }
}
