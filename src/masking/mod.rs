//! Masking and unmasking of sensitive fields in JSON documents.

pub mod masker;
pub mod resolver;
pub mod rule;
pub mod unmasker;
pub mod walker;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::cipher::{DataCipher, DataDecipher, NoOpCipher, NoOpDecipher};
use crate::error::MaskingResult;

pub use masker::{mask, masked_preview, MaskedValue};
pub use resolver::{rules_for, FieldConfig, MaskedModel};
pub use rule::{FieldSet, MaskingRule, Representation, RuleTable};
pub use unmasker::{detect, unmask, unmask_value, MaskedEncoding};
pub use walker::{walk, UnmaskScope, WalkMode};

/// Marks an inline reversible value.
pub const MASKING_PREFIX: &str = "masked_pair=";
/// Separates the preview from the base64 ciphertext in inline values.
pub const PAIR_SEPARATOR: char = '|';
pub const MASKED_KEY: &str = "masked";
pub const ENC_KEY: &str = "enc";

/// Masks and unmasks documents against caller supplied field configuration.
#[derive(Clone)]
pub struct DataMasker {
    cipher: Arc<dyn DataCipher>,
    decipher: Arc<dyn DataDecipher>,
    template: MaskingRule,
}

impl Default for DataMasker {
    fn default() -> Self {
        Self::new(Arc::new(NoOpCipher), Arc::new(NoOpDecipher))
    }
}

impl DataMasker {
    pub fn new(cipher: Arc<dyn DataCipher>, decipher: Arc<dyn DataDecipher>) -> Self {
        Self {
            cipher,
            decipher,
            template: MaskingRule::default(),
        }
    }

    /// Rule given to fields configured by name only.
    pub fn with_template(mut self, template: MaskingRule) -> Self {
        self.template = template;
        self
    }

    pub fn template(&self) -> MaskingRule {
        self.template
    }

    pub fn resolve(&self, config: &FieldConfig) -> RuleTable {
        config.resolve(self.template, self.cipher.as_ref())
    }

    pub fn mask_value(&self, tree: Value, config: &FieldConfig) -> MaskingResult<Value> {
        let rules = self.resolve(config);
        self.mask_with_rules(tree, &rules)
    }

    pub fn mask_with_rules(&self, tree: Value, rules: &RuleTable) -> MaskingResult<Value> {
        debug!(fields = rules.len(), "masking document");
        walk(
            tree,
            &WalkMode::Mask {
                rules,
                cipher: self.cipher.as_ref(),
            },
        )
    }

    /// Serializes `value` and masks the result.
    pub fn mask<T: Serialize + ?Sized>(
        &self,
        value: &T,
        config: &FieldConfig,
    ) -> MaskingResult<Value> {
        self.mask_value(serde_json::to_value(value)?, config)
    }

    /// Masks raw JSON text.
    pub fn mask_str(&self, json: &str, config: &FieldConfig) -> MaskingResult<String> {
        let tree = serde_json::from_str(json)?;
        Ok(serde_json::to_string(&self.mask_value(tree, config)?)?)
    }

    pub fn unmask_value(&self, tree: Value, scope: &UnmaskScope) -> MaskingResult<Value> {
        debug!(everywhere = matches!(scope, UnmaskScope::Everywhere), "unmasking document");
        walk(
            tree,
            &WalkMode::Unmask {
                scope,
                decipher: self.decipher.as_ref(),
            },
        )
    }

    /// Serializes `value` and unmasks the result.
    pub fn unmask<T: Serialize + ?Sized>(
        &self,
        value: &T,
        scope: &UnmaskScope,
    ) -> MaskingResult<Value> {
        self.unmask_value(serde_json::to_value(value)?, scope)
    }

    /// Unmasks raw JSON text.
    pub fn unmask_str(&self, json: &str, scope: &UnmaskScope) -> MaskingResult<String> {
        let tree = serde_json::from_str(json)?;
        Ok(serde_json::to_string(&self.unmask_value(tree, scope)?)?)
    }

    /// Unmasks raw JSON text straight into `T`.
    pub fn unmask_into<T: DeserializeOwned>(
        &self,
        json: &str,
        scope: &UnmaskScope,
    ) -> MaskingResult<T> {
        let tree = serde_json::from_str(json)?;
        Ok(serde_json::from_value(self.unmask_value(tree, scope)?)?)
    }
}

/// Masks on write and unmasks on read using the rules a type declares
/// through [`MaskedModel`].
#[derive(Clone, Default)]
pub struct MaskingMapper {
    masker: DataMasker,
}

impl MaskingMapper {
    pub fn new(cipher: Arc<dyn DataCipher>, decipher: Arc<dyn DataDecipher>) -> Self {
        Self {
            masker: DataMasker::new(cipher, decipher),
        }
    }

    pub fn to_masked_value<T: Serialize + MaskedModel>(&self, value: &T) -> MaskingResult<Value> {
        let rules = rules_for::<T>();
        self.masker.mask_with_rules(serde_json::to_value(value)?, &rules)
    }

    pub fn to_masked_string<T: Serialize + MaskedModel>(&self, value: &T) -> MaskingResult<String> {
        Ok(serde_json::to_string(&self.to_masked_value(value)?)?)
    }

    pub fn from_masked_value<T: DeserializeOwned + MaskedModel>(
        &self,
        tree: Value,
    ) -> MaskingResult<T> {
        let scope = UnmaskScope::Fields(rules_for::<T>().field_set());
        Ok(serde_json::from_value(self.masker.unmask_value(tree, &scope)?)?)
    }

    pub fn from_masked_str<T: DeserializeOwned + MaskedModel>(
        &self,
        json: &str,
    ) -> MaskingResult<T> {
        self.from_masked_value(serde_json::from_str(json)?)
    }
}
