pub mod cipher;
pub mod cli;
pub mod config;
pub mod error;
pub mod masking;

pub use cipher::{DataCipher, DataDecipher, NoOpCipher, NoOpDecipher};
pub use error::{CipherError, MaskingError, MaskingResult};
pub use masking::{
    DataMasker, FieldConfig, FieldSet, MaskedModel, MaskingMapper, MaskingRule, Representation,
    RuleTable, UnmaskScope,
};
