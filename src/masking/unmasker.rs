use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;

use super::{ENC_KEY, MASKED_KEY, MASKING_PREFIX, PAIR_SEPARATOR};
use crate::cipher::DataDecipher;
use crate::error::MaskingResult;

/// A value recognised as reversibly masked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskedEncoding<'a> {
    InlinePair { preview: &'a str, enc: &'a str },
    Object { preview: &'a str, enc: &'a str },
}

impl<'a> MaskedEncoding<'a> {
    pub fn preview(&self) -> &'a str {
        match *self {
            MaskedEncoding::InlinePair { preview, .. } | MaskedEncoding::Object { preview, .. } => {
                preview
            }
        }
    }

    pub fn enc(&self) -> &'a str {
        match *self {
            MaskedEncoding::InlinePair { enc, .. } | MaskedEncoding::Object { enc, .. } => enc,
        }
    }
}

/// Recognises the inline and object encodings. Anything else is `None`.
pub fn detect(value: &Value) -> Option<MaskedEncoding<'_>> {
    match value {
        Value::String(s) => detect_inline(s),
        Value::Object(map) if map.len() == 2 => {
            let preview = map.get(MASKED_KEY)?.as_str()?;
            let enc = map.get(ENC_KEY)?.as_str()?;
            Some(MaskedEncoding::Object { preview, enc })
        }
        _ => None,
    }
}

/// The ciphertext segment never contains the separator, so the last one
/// delimits it even when the preview itself shows a `|`.
pub fn detect_inline(value: &str) -> Option<MaskedEncoding<'_>> {
    let body = value.strip_prefix(MASKING_PREFIX)?;
    let (preview, enc) = body.rsplit_once(PAIR_SEPARATOR)?;
    Some(MaskedEncoding::InlinePair { preview, enc })
}

/// Restores the original string. The preview is ignored.
pub fn unmask(encoding: MaskedEncoding<'_>, decipher: &dyn DataDecipher) -> MaskingResult<String> {
    let ciphertext = STANDARD.decode(encoding.enc())?;
    Ok(decipher.decrypt(&ciphertext)?)
}

/// Unmasks `value` if it is masked, otherwise hands it back untouched.
pub fn unmask_value(value: Value, decipher: &dyn DataDecipher) -> MaskingResult<Value> {
    match detect(&value) {
        Some(encoding) => unmask(encoding, decipher).map(Value::String),
        None => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::{FnDecipher, NoOpDecipher};
    use crate::error::{CipherError, MaskingError};
    use serde_json::json;

    #[test]
    fn test_detect_inline_pair() {
        let value =
            json!("masked_pair=jho******************.com|amhvbi5kb2UxMkBzb21lZG9tYWluLmNvbQ==");
        let encoding = detect(&value).unwrap();
        assert!(matches!(encoding, MaskedEncoding::InlinePair { .. }));
        assert_eq!(encoding.preview(), "jho******************.com");
        assert_eq!(encoding.enc(), "amhvbi5kb2UxMkBzb21lZG9tYWluLmNvbQ==");
    }

    #[test]
    fn test_detect_object() {
        let value = json!({"masked": "999*********6666", "enc": "OTk5OTg4ODg3Nzc3NjY2Ng=="});
        let encoding = detect(&value).unwrap();
        assert!(matches!(encoding, MaskedEncoding::Object { .. }));
        assert_eq!(encoding.enc(), "OTk5OTg4ODg3Nzc3NjY2Ng==");
    }

    #[test]
    fn test_detect_rejects_other_shapes() {
        for value in [
            json!("***********hank"),
            json!("masked_pair=no-separator"),
            json!({"masked": "x"}),
            json!({"masked": "x", "enc": "eA==", "extra": 1}),
            json!({"masked": "x", "enc": 5}),
            json!(42),
            json!(null),
        ] {
            assert_eq!(detect(&value), None, "{value}");
        }
    }

    #[test]
    fn test_unmask_inline_pair() {
        let value =
            json!("masked_pair=jho******************.com|amhvbi5kb2UxMkBzb21lZG9tYWluLmNvbQ==");
        assert_eq!(
            unmask_value(value, &NoOpDecipher).unwrap(),
            json!("jhon.doe12@somedomain.com")
        );
    }

    #[test]
    fn test_unmask_object() {
        let value = json!({"masked": "999*********6666", "enc": "OTk5OTg4ODg3Nzc3NjY2Ng=="});
        assert_eq!(
            unmask_value(value, &NoOpDecipher).unwrap(),
            json!("9999888877776666")
        );
    }

    #[test]
    fn test_preview_with_separator_still_unmasks() {
        // base64("a|b") == "YXxi"
        let value = json!("masked_pair=a|b|YXxi");
        assert_eq!(unmask_value(value, &NoOpDecipher).unwrap(), json!("a|b"));
    }

    #[test]
    fn test_extra_separators_belong_to_the_preview() {
        let encoding = detect_inline("masked_pair=a|b|c").unwrap();
        assert_eq!(encoding.preview(), "a|b");
        assert_eq!(encoding.enc(), "c");

        // "c" is not valid base64, so this is an error rather than a pass-through.
        let error = unmask_value(json!("masked_pair=a|b|c"), &NoOpDecipher).unwrap_err();
        assert!(matches!(error, MaskingError::Encoding(_)));
    }

    #[test]
    fn test_unmasked_value_passes_through() {
        let value = json!({"plain": "value"});
        assert_eq!(unmask_value(value.clone(), &NoOpDecipher).unwrap(), value);
    }

    #[test]
    fn test_invalid_base64_is_encoding_error() {
        let value = json!("masked_pair=****|not base64!");
        let error = unmask_value(value, &NoOpDecipher).unwrap_err();
        assert!(matches!(error, MaskingError::Encoding(_)));
    }

    #[test]
    fn test_decipher_failure_is_cipher_error() {
        let decipher = FnDecipher(|_: &[u8]| Err::<String, _>(CipherError::new("wrong key")));
        let value = json!("masked_pair=****|c2VjcmV0");
        let error = unmask_value(value, &decipher).unwrap_err();
        assert!(matches!(error, MaskingError::Cipher(_)));
    }
}
