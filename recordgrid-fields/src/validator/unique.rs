use recordgrid_store::{Expr, Value, DEFAULT_ALIAS};
use tracing::{debug, warn};

use super::{ValidationContext, Validator, ValidatorSettings, Verdict};

/// Rejects a value already stored on the field's column by another record.
///
/// Blank values pass. So does every value when the field is not resolved
/// into a field set with a record store: there is nothing to check against.
/// A failing store lookup rejects the value.
#[derive(Debug, Clone)]
pub struct UniqueValidator {
    settings: ValidatorSettings,
}

impl UniqueValidator {
    pub const ALIAS: &'static str = "unique";
    pub const MESSAGE: &'static str = "unique";

    pub fn new() -> Self {
        Self {
            settings: ValidatorSettings::new(Some(Self::ALIAS)),
        }
    }
}

impl Default for UniqueValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl_settings_builders!(UniqueValidator);

impl Validator for UniqueValidator {
    fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    fn validate(&self, value: &Value, ctx: &ValidationContext<'_>) -> Verdict {
        if value.is_blank() {
            return Verdict::Valid;
        }

        let (Some(entity_type), Some(store)) = (ctx.entity_type(), ctx.store()) else {
            debug!(
                field = ctx.identifier,
                "no record store bound, skipping uniqueness check"
            );
            return Verdict::Valid;
        };
        if ctx.identifier.is_empty() {
            return Verdict::Valid;
        }

        let id_column = store.identifier_column(entity_type);
        let mut query = store.create_query(entity_type, DEFAULT_ALIAS);

        let param = query.next_parameter_name(&format!("unique_{}", ctx.identifier));
        query.set_parameter(param.clone(), value.clone());
        query.and_where(Expr::eq(query.column(ctx.identifier), param));

        if let Some(id) = ctx.bound_record_id().filter(|id| !id.is_null()) {
            let param = query.next_parameter_name("unique_self");
            query.set_parameter(param.clone(), id.clone());
            query.and_where(Expr::not_eq(query.column(id_column.as_str()), param));
        }

        match store.count(&query.select_count(id_column)) {
            Ok(0) => Verdict::Valid,
            Ok(matches) => {
                debug!(field = ctx.identifier, matches, "value already taken");
                Verdict::reject(self.settings.message_or(Self::MESSAGE))
            }
            Err(e) => {
                warn!(field = ctx.identifier, error = %e, "uniqueness lookup failed");
                Verdict::reject(self.settings.message_or(Self::MESSAGE))
            }
        }
    }
}
