//! Engine configuration.
//!
//! Sources, later overriding earlier:
//! 1. Built-in defaults
//! 2. `recordgrid.toml`, `recordgrid.yaml` or `recordgrid.json` in the
//!    working directory (or an explicit file)
//! 3. `RECORDGRID_*` environment variables

use std::path::Path;

use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Prefix of environment variables overriding configuration keys.
pub const ENV_PREFIX: &str = "RECORDGRID_";

/// Base name of configuration files.
pub const CONFIG_FILE_STEM: &str = "recordgrid";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatatableConfig {
    /// Page size when the request gives none.
    pub default_perpage: i64,
    /// Largest accepted page size; 0 means unlimited.
    pub max_perpage: i64,
    /// Root alias of freshly created queries.
    pub default_alias: String,
    /// CSS class of the options column header.
    pub options_column_class: String,
    /// Drop sort keys that do not name a sortable table column.
    pub strict_sorting: bool,
    /// Translation domain of form success messages.
    pub message_domain: String,
    pub success_create_key: String,
    pub success_update_key: String,
}

impl Default for DatatableConfig {
    fn default() -> Self {
        Self {
            default_perpage: 10,
            max_perpage: 0,
            default_alias: recordgrid_store::DEFAULT_ALIAS.to_string(),
            options_column_class: "avalynx-datatable-options".to_string(),
            strict_sorting: true,
            message_domain: "datatable".to_string(),
            success_create_key: "ddm.successCreate".to_string(),
            success_update_key: "ddm.successUpdate".to_string(),
        }
    }
}

impl DatatableConfig {
    /// Load from defaults, config files in the working directory, then environment.
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(format!("{CONFIG_FILE_STEM}.toml")))
            .merge(Yaml::file(format!("{CONFIG_FILE_STEM}.yaml")))
            .merge(Json::file(format!("{CONFIG_FILE_STEM}.json")))
            .merge(Env::prefixed(ENV_PREFIX));
        Self::extract(figment)
    }

    /// Load from defaults, the given file (format by extension), then environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Figment::from(Yaml::file(path)),
            Some("json") => Figment::from(Json::file(path)),
            _ => Figment::from(Toml::file(path)),
        };
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX));
        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract()?;
        debug!(
            default_perpage = config.default_perpage,
            max_perpage = config.max_perpage,
            strict_sorting = config.strict_sorting,
            "loaded datatable configuration"
        );
        Ok(config)
    }

    /// Clamp a requested page size to at least 1 and at most `max_perpage`.
    pub fn clamp_perpage(&self, requested: i64) -> u64 {
        let mut perpage = requested.max(1);
        if self.max_perpage > 0 {
            perpage = perpage.min(self.max_perpage);
        }
        perpage.unsigned_abs()
    }
}
