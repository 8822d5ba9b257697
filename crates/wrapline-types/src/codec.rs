// Symmetric binary codec for invocation arguments, envs and results.
//
// Values cross the module boundary either structured (`serde_json::Value`)
// or as CBOR bytes produced here.

use serde::de::DeserializeOwned;
use serde::Serialize;
use wrapline_error::{CodecError, CodecResult};

/// Encode any serializable value to bytes
pub fn encode<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    let mut buffer = Vec::new();
    ciborium::ser::into_writer(value, &mut buffer)
        .map_err(|e| CodecError::Encode(e.to_string()))?;
    Ok(buffer)
}

/// Decode bytes produced by [`encode`]
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    ciborium::de::from_reader(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}
