//! Builds the field name to rule table for a masking pass.
//!
//! Rules come either from the caller (a bare list of names or an explicit
//! table) or from a type implementing [`MaskedModel`]. Model tables are built
//! once per type and shared afterwards.

use arc_swap::ArcSwap;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

use super::rule::{FieldSet, MaskingRule, RuleTable};
use crate::cipher::DataCipher;

/// Caller supplied masking configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldConfig {
    /// Each name gets the default rule.
    Names(Vec<String>),
    /// Explicit per-name rules, used verbatim.
    Rules(RuleTable),
}

impl FieldConfig {
    /// Resolves against `template`, the rule handed to bare names. Bare
    /// names are reversible exactly when `cipher` is not the identity.
    pub fn resolve(&self, template: MaskingRule, cipher: &dyn DataCipher) -> RuleTable {
        match self {
            FieldConfig::Names(names) => {
                let rule = template.with_reversible(!cipher.is_identity());
                RuleTable::from_fields(names.iter().cloned(), rule)
            }
            FieldConfig::Rules(table) => table.clone(),
        }
    }

    pub fn field_set(&self) -> FieldSet {
        match self {
            FieldConfig::Names(names) => names.iter().cloned().collect(),
            FieldConfig::Rules(table) => table.field_set(),
        }
    }
}

impl From<RuleTable> for FieldConfig {
    fn from(table: RuleTable) -> Self {
        FieldConfig::Rules(table)
    }
}

impl From<Vec<String>> for FieldConfig {
    fn from(names: Vec<String>) -> Self {
        FieldConfig::Names(names)
    }
}

impl From<Vec<&str>> for FieldConfig {
    fn from(names: Vec<&str>) -> Self {
        FieldConfig::Names(names.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FieldConfig {
    fn from(names: [&str; N]) -> Self {
        FieldConfig::Names(names.into_iter().map(String::from).collect())
    }
}

/// A type whose serialized fields carry their own masking rules.
///
/// Usually implemented through [`masked_model!`](crate::masked_model).
pub trait MaskedModel: 'static {
    /// Rules keyed by serialized field name.
    fn masking_rules() -> RuleTable;
}

type ModelRules = HashMap<TypeId, Arc<RuleTable>>;

fn model_cache() -> &'static ArcSwap<ModelRules> {
    static CACHE: OnceLock<ArcSwap<ModelRules>> = OnceLock::new();
    CACHE.get_or_init(|| ArcSwap::from_pointee(HashMap::new()))
}

/// Cached rule table for `T`.
pub fn rules_for<T: MaskedModel>() -> Arc<RuleTable> {
    let id = TypeId::of::<T>();
    if let Some(table) = model_cache().load().get(&id) {
        return Arc::clone(table);
    }

    let table = Arc::new(T::masking_rules());
    debug!(
        model = std::any::type_name::<T>(),
        fields = table.len(),
        "caching model masking rules"
    );
    model_cache().rcu(|current| {
        let mut next = HashMap::clone(current);
        next.entry(id).or_insert_with(|| Arc::clone(&table));
        next
    });

    model_cache()
        .load()
        .get(&id)
        .map(Arc::clone)
        .unwrap_or(table)
}

/// Declares per-field masking rules for a model type.
///
/// ```
/// use datamask_core::masking::{MaskingRule, Representation};
///
/// #[derive(serde::Serialize, serde::Deserialize)]
/// struct Company {
///     name: String,
///     card: String,
/// }
///
/// datamask_core::masked_model!(Company {
///     "card" => MaskingRule::new(3, 4)
///         .with_reversible(true)
///         .with_representation(Representation::Object),
/// });
/// ```
#[macro_export]
macro_rules! masked_model {
    ($model:ty { $($field:literal => $rule:expr),* $(,)? }) => {
        impl $crate::masking::MaskedModel for $model {
            fn masking_rules() -> $crate::masking::RuleTable {
                $crate::masking::RuleTable::new()
                    $(.with_rule($field, $rule))*
            }
        }
    };
}
