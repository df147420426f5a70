//! Pluggable reversible transforms used by reversible masking.
//!
//! The engine never looks inside the ciphertext: it base64-encodes whatever
//! [`DataCipher::encrypt`] returns and hands the decoded bytes back to
//! [`DataDecipher::decrypt`]. Implementations must form a strict inverse pair.

use crate::error::CipherError;

pub trait DataCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>, CipherError>;

    /// Whether this cipher leaves the plaintext untouched. Bare field names
    /// only default to reversible masking when this is `false`.
    fn is_identity(&self) -> bool {
        false
    }
}

pub trait DataDecipher: Send + Sync {
    fn decrypt(&self, ciphertext: &[u8]) -> Result<String, CipherError>;
}

/// Identity cipher: the "ciphertext" is the UTF-8 encoding of the plaintext.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCipher;

impl DataCipher for NoOpCipher {
    fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>, CipherError> {
        Ok(plaintext.as_bytes().to_vec())
    }

    fn is_identity(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpDecipher;

impl DataDecipher for NoOpDecipher {
    fn decrypt(&self, ciphertext: &[u8]) -> Result<String, CipherError> {
        String::from_utf8(ciphertext.to_vec())
            .map_err(|e| CipherError::new(format!("plaintext is not valid UTF-8: {}", e)))
    }
}

/// Adapts a closure into a [`DataCipher`].
pub struct FnCipher<F>(pub F);

impl<F> DataCipher for FnCipher<F>
where
    F: Fn(&str) -> Result<Vec<u8>, CipherError> + Send + Sync,
{
    fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>, CipherError> {
        (self.0)(plaintext)
    }
}

/// Adapts a closure into a [`DataDecipher`].
pub struct FnDecipher<F>(pub F);

impl<F> DataDecipher for FnDecipher<F>
where
    F: Fn(&[u8]) -> Result<String, CipherError> + Send + Sync,
{
    fn decrypt(&self, ciphertext: &[u8]) -> Result<String, CipherError> {
        (self.0)(ciphertext)
    }
}
