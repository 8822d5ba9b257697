// Errors for the leaf value types: URIs and the binary codec

use std::any::Any;

use thiserror::Error;

use crate::WrapCoreError;

/// Convenient Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Input that could not be parsed into a URI
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    #[error("URI is malformed ({reason}): \"{input}\"")]
    Malformed { input: String, reason: String },
}

impl UriError {
    pub fn malformed(input: impl Into<String>, reason: impl Into<String>) -> Self {
        UriError::Malformed {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// The rejected input
    pub fn input(&self) -> &str {
        match self {
            UriError::Malformed { input, .. } => input,
        }
    }
}

impl WrapCoreError for UriError {
    fn error_code(&self) -> &'static str {
        "MALFORMED_URI"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Binary codec failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Decoding failed: {0}")]
    Decode(String),
}

impl WrapCoreError for CodecError {
    fn error_code(&self) -> &'static str {
        match self {
            CodecError::Encode(_) => "CODEC_ENCODE",
            CodecError::Decode(_) => "CODEC_DECODE",
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
