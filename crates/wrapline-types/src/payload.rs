// Invocation payloads: structured value or pre-encoded bytes

use serde_json::Value;
use wrapline_error::CodecResult;

use crate::codec;

/// Arguments, envs and results cross the module boundary either as a
/// structured value or as bytes already produced by the codec. The variant
/// is the "encoded" flag, so a payload is never ambiguous.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Value(Value),
    Bytes(Vec<u8>),
}

impl Payload {
    pub fn is_encoded(&self) -> bool {
        matches!(self, Payload::Bytes(_))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Payload::Value(value) => Some(value),
            Payload::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Value(_) => None,
            Payload::Bytes(bytes) => Some(bytes),
        }
    }

    /// Structured form, decoding if needed
    pub fn into_value(self) -> CodecResult<Value> {
        match self {
            Payload::Value(value) => Ok(value),
            Payload::Bytes(bytes) => codec::decode(&bytes),
        }
    }

    /// Encoded form, encoding if needed
    pub fn into_bytes(self) -> CodecResult<Vec<u8>> {
        match self {
            Payload::Value(value) => codec::encode(&value),
            Payload::Bytes(bytes) => Ok(bytes),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Value(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Bytes(bytes)
    }
}
