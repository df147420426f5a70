use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Value};
use std::iter;

use super::rule::{MaskingRule, Representation};
use super::{ENC_KEY, MASKED_KEY, MASKING_PREFIX, PAIR_SEPARATOR};
use crate::cipher::DataCipher;
use crate::error::CipherError;

const MASK_CHAR: char = '*';

/// Result of masking a single string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaskedValue {
    /// Display-only preview, or an inline `masked_pair=` string.
    Plain(String),
    /// Object form of a reversible value.
    Structured { masked: String, enc: String },
}

impl MaskedValue {
    pub fn into_value(self) -> Value {
        match self {
            MaskedValue::Plain(s) => Value::String(s),
            MaskedValue::Structured { masked, enc } => {
                let mut map = Map::with_capacity(2);
                map.insert(MASKED_KEY.to_string(), Value::String(masked));
                map.insert(ENC_KEY.to_string(), Value::String(enc));
                Value::Object(map)
            }
        }
    }
}

/// Masks `value` according to `rule`.
///
/// Reversible rules encrypt the untouched original, never the preview.
/// Empty input is returned as-is and the cipher is not called.
pub fn mask(
    value: &str,
    rule: &MaskingRule,
    cipher: &dyn DataCipher,
) -> Result<MaskedValue, CipherError> {
    if value.is_empty() {
        return Ok(MaskedValue::Plain(String::new()));
    }

    let preview = masked_preview(value, rule);
    if !rule.reversible() {
        return Ok(MaskedValue::Plain(preview));
    }

    let enc = STANDARD.encode(cipher.encrypt(value)?);
    Ok(match rule.representation() {
        Representation::InlinePair => MaskedValue::Plain(format!(
            "{}{}{}{}",
            MASKING_PREFIX, preview, PAIR_SEPARATOR, enc
        )),
        Representation::Object => MaskedValue::Structured {
            masked: preview,
            enc,
        },
    })
}

/// The partially starred display string for `value`.
pub fn masked_preview(value: &str, rule: &MaskingRule) -> String {
    let (target, domain) = if rule.email_aware() {
        split_email(value)
    } else {
        (value, None)
    };

    let mut preview = star_middle(target, rule.left_visible(), rule.right_visible());
    if let Some(domain) = domain {
        preview.push('@');
        preview.push_str(domain);
    }
    preview
}

/// Splits `local@domain` when the value holds exactly one `@`.
fn split_email(value: &str) -> (&str, Option<&str>) {
    match value.split_once('@') {
        Some((local, domain)) if !domain.contains('@') => (local, Some(domain)),
        _ => (value, None),
    }
}

fn star_middle(target: &str, left: usize, right: usize) -> String {
    let chars: Vec<char> = target.chars().collect();
    let len = chars.len();
    let hidden = len.saturating_sub(left.saturating_add(right));
    if hidden == 0 {
        return target.to_string();
    }

    chars[..left]
        .iter()
        .copied()
        .chain(iter::repeat(MASK_CHAR).take(hidden))
        .chain(chars[len - right..].iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::{FnCipher, NoOpCipher};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_default_rule_keeps_last_four() {
        let masked = mask("EllaCruickshank", &MaskingRule::default(), &NoOpCipher).unwrap();
        assert_eq!(masked, MaskedValue::Plain("***********hank".to_string()));
    }

    #[test]
    fn test_email_aware_masks_local_part_only() {
        let rule = MaskingRule::new(2, 1).with_email_aware(true);
        assert_eq!(
            masked_preview("jhon.doe12@somedomain.com", &rule),
            "jh*******2@somedomain.com"
        );
    }

    #[test]
    fn test_email_aware_without_single_at_masks_everything() {
        let rule = MaskingRule::new(0, 2).with_email_aware(true);
        assert_eq!(masked_preview("nodomain", &rule), "******in");
        assert_eq!(masked_preview("a@b@c", &rule), "***@c");
    }

    #[test]
    fn test_visible_counts_exceeding_length_reveal_value() {
        let rule = MaskingRule::new(3, 4);
        assert_eq!(masked_preview("short", &rule), "short");
        assert_eq!(masked_preview("1234567", &rule), "1234567");
    }

    #[test]
    fn test_preview_preserves_length() {
        let rule = MaskingRule::new(2, 3);
        for value in ["abcdef", "0123456789", "ñandú-çedilla"] {
            let preview = masked_preview(value, &rule);
            assert_eq!(preview.chars().count(), value.chars().count());
        }
    }

    #[test]
    fn test_multibyte_characters_counted_as_chars() {
        let rule = MaskingRule::new(1, 1);
        assert_eq!(masked_preview("ñøçå", &rule), "ñ**å");
    }

    #[test]
    fn test_reversible_inline_pair() {
        let rule = MaskingRule::new(2, 1)
            .with_email_aware(true)
            .with_reversible(true);
        let masked = mask("jhon.doe12@somedomain.com", &rule, &NoOpCipher).unwrap();
        assert_eq!(
            masked,
            MaskedValue::Plain(
                "masked_pair=jh*******2@somedomain.com|amhvbi5kb2UxMkBzb21lZG9tYWluLmNvbQ=="
                    .to_string()
            )
        );
    }

    #[test]
    fn test_reversible_object() {
        let rule = MaskingRule::new(3, 4)
            .with_reversible(true)
            .with_representation(Representation::Object);
        let masked = mask("9999888877776666", &rule, &NoOpCipher).unwrap();
        assert_eq!(
            masked.into_value(),
            serde_json::json!({"masked": "999*********6666", "enc": "OTk5OTg4ODg3Nzc3NjY2Ng=="})
        );
    }

    #[test]
    fn test_display_only_never_calls_cipher() {
        let calls = AtomicUsize::new(0);
        let cipher = FnCipher(|s: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, CipherError>(s.as_bytes().to_vec())
        });
        mask("4444555566667777", &MaskingRule::default(), &cipher).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_value_is_noop() {
        let calls = AtomicUsize::new(0);
        let cipher = FnCipher(|s: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, CipherError>(s.as_bytes().to_vec())
        });
        let rule = MaskingRule::default().with_reversible(true);
        assert_eq!(
            mask("", &rule, &cipher).unwrap(),
            MaskedValue::Plain(String::new())
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cipher_error_propagates() {
        let cipher = FnCipher(|_: &str| Err::<Vec<u8>, _>(CipherError::new("key unavailable")));
        let rule = MaskingRule::default().with_reversible(true);
        let error = mask("secret", &rule, &cipher).unwrap_err();
        assert_eq!(error.message(), "key unavailable");
    }
}
