//! Depth-first rewrite of matching fields in a JSON document.
//!
//! Object keys are checked against the active rules at every depth. A matched
//! field is rewritten (or left alone when its value has the wrong shape) and
//! never descended into; everything else is walked unchanged. Each field is
//! handled independently, so the outcome does not depend on traversal order.

use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::masker;
use super::rule::{FieldSet, RuleTable};
use super::unmasker;
use crate::cipher::{DataCipher, DataDecipher};
use crate::error::{MaskingError, MaskingResult};

/// Which fields an unmasking pass restores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnmaskScope {
    /// Only values under these keys.
    Fields(FieldSet),
    /// Every masked-encoded value in the document, whatever its key.
    Everywhere,
}

impl From<FieldSet> for UnmaskScope {
    fn from(fields: FieldSet) -> Self {
        UnmaskScope::Fields(fields)
    }
}

pub enum WalkMode<'a> {
    Mask {
        rules: &'a RuleTable,
        cipher: &'a dyn DataCipher,
    },
    Unmask {
        scope: &'a UnmaskScope,
        decipher: &'a dyn DataDecipher,
    },
}

impl WalkMode<'_> {
    fn name(&self) -> &'static str {
        match self {
            WalkMode::Mask { .. } => "mask",
            WalkMode::Unmask { .. } => "unmask",
        }
    }
}

enum Step {
    Done(Value),
    Descend(Value),
}

/// Rewrites every matching field of `tree` and returns the result.
pub fn walk(tree: Value, mode: &WalkMode<'_>) -> MaskingResult<Value> {
    let mut walker = Walker {
        mode,
        rewritten: 0,
    };
    let out = walker.visit(tree)?;
    debug!(mode = mode.name(), rewritten = walker.rewritten, "walk complete");
    Ok(out)
}

struct Walker<'m, 'a> {
    mode: &'m WalkMode<'a>,
    rewritten: usize,
}

impl Walker<'_, '_> {
    fn visit(&mut self, value: Value) -> MaskingResult<Value> {
        if let WalkMode::Unmask {
            scope: UnmaskScope::Everywhere,
            decipher,
        } = self.mode
        {
            if let Some(encoding) = unmasker::detect(&value) {
                let plain = unmasker::unmask(encoding, *decipher)?;
                self.rewritten += 1;
                return Ok(Value::String(plain));
            }
        }

        match value {
            Value::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, val) in map {
                    let rewritten = match self.step(&key, val)? {
                        Step::Done(v) => v,
                        Step::Descend(v) => self.visit(v)?,
                    };
                    out.insert(key, rewritten);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .into_iter()
                .map(|item| self.visit(item))
                .collect::<MaskingResult<Vec<_>>>()
                .map(Value::Array),
            other => Ok(other),
        }
    }

    fn step(&mut self, key: &str, value: Value) -> MaskingResult<Step> {
        match self.mode {
            WalkMode::Mask { rules, cipher } => {
                let Some(rule) = rules.get(key) else {
                    return Ok(Step::Descend(value));
                };
                match value {
                    Value::String(s) => {
                        let masked = masker::mask(&s, rule, *cipher)
                            .map_err(|e| MaskingError::from(e).in_field(key))?;
                        self.record(key);
                        Ok(Step::Done(masked.into_value()))
                    }
                    other => {
                        trace!(field = %key, "field is not a string, left unmasked");
                        Ok(Step::Done(other))
                    }
                }
            }
            WalkMode::Unmask {
                scope: UnmaskScope::Fields(fields),
                decipher,
            } => {
                if !fields.contains(key) {
                    return Ok(Step::Descend(value));
                }
                match unmasker::detect(&value) {
                    Some(encoding) => {
                        let plain = unmasker::unmask(encoding, *decipher)
                            .map_err(|e| e.in_field(key))?;
                        self.record(key);
                        Ok(Step::Done(Value::String(plain)))
                    }
                    None => {
                        trace!(field = %key, "field is not masked, left as-is");
                        Ok(Step::Done(value))
                    }
                }
            }
            WalkMode::Unmask {
                scope: UnmaskScope::Everywhere,
                decipher,
            } => match unmasker::detect(&value) {
                Some(encoding) => {
                    let plain =
                        unmasker::unmask(encoding, *decipher).map_err(|e| e.in_field(key))?;
                    self.record(key);
                    Ok(Step::Done(Value::String(plain)))
                }
                None => Ok(Step::Descend(value)),
            },
        }
    }

    fn record(&mut self, key: &str) {
        self.rewritten += 1;
        trace!(field = %key, mode = self.mode.name(), "field rewritten");
    }
}
