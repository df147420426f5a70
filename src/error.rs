use thiserror::Error;

/// Failure raised by an injected cipher or decipher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CipherError {
    message: String,
}

impl CipherError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Error, Debug)]
pub enum MaskingError {
    #[error("Encoding error: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Cipher error: {0}")]
    Cipher(#[from] CipherError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<MaskingError>,
    },
}

impl MaskingError {
    pub(crate) fn in_field(self, field: &str) -> Self {
        MaskingError::Field {
            field: field.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any field context.
    pub fn root(&self) -> &MaskingError {
        match self {
            MaskingError::Field { source, .. } => source.root(),
            other => other,
        }
    }

    /// Name of the field the error was raised in, if known.
    pub fn field(&self) -> Option<&str> {
        match self {
            MaskingError::Field { field, .. } => Some(field),
            _ => None,
        }
    }
}

pub type MaskingResult<T> = Result<T, MaskingError>;
