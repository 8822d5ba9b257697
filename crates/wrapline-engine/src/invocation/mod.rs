// Purpose: Invocation options and the batched/periodic invocation helpers

use wrapline_error::WrapResult;
use wrapline_types::{Env, Payload, Uri};

pub mod propagation;
pub mod query;
pub mod subscription;

/// Result of a single invocation
pub type InvokeResult = WrapResult<Payload>;

/// A single method call against a URI.
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeOptions {
    pub uri: Uri,
    pub method: String,
    pub args: Option<Payload>,
    /// Caller-supplied env; merged over any env registered for the URI
    pub env: Option<Payload>,
    /// Return the result encoded rather than as a structured value
    pub encode_result: bool,
}

impl InvokeOptions {
    pub fn new(uri: Uri, method: impl Into<String>) -> Self {
        InvokeOptions {
            uri,
            method: method.into(),
            args: None,
            env: None,
            encode_result: false,
        }
    }

    pub fn with_args(mut self, args: impl Into<Payload>) -> Self {
        self.args = Some(args.into());
        self
    }

    pub fn with_env(mut self, env: Env) -> Self {
        self.env = Some(Payload::Value(serde_json::Value::Object(env)));
        self
    }

    pub fn with_encoded_env(mut self, env: Vec<u8>) -> Self {
        self.env = Some(Payload::Bytes(env));
        self
    }

    pub fn with_encode_result(mut self, encode_result: bool) -> Self {
        self.encode_result = encode_result;
        self
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "module panicked".to_string()
    }
}
