// Structured error returned by every public engine operation

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{ResolutionError, UriError, WrapCoreError, WrapErrorCode};

/// Convenient Result type for engine operations
pub type WrapResult<T> = Result<T, WrapError>;

/// Error carrying a machine-readable kind, the originating URI and, when
/// resolution was involved, the rendered resolution stack.
#[derive(Debug, Clone)]
pub struct WrapError {
    code: WrapErrorCode,
    reason: String,
    uri: Option<String>,
    method: Option<String>,
    resolution_stack: Vec<String>,
    cause: Option<Arc<dyn StdError + Send + Sync>>,
}

impl WrapError {
    /// Create a new error with the given kind and reason
    pub fn new(code: WrapErrorCode, reason: impl Into<String>) -> Self {
        WrapError {
            code,
            reason: reason.into(),
            uri: None,
            method: None,
            resolution_stack: Vec::new(),
            cause: None,
        }
    }

    /// Attach the URI this error originated from
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Attach the invoked method
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Attach a rendered resolution stack
    pub fn with_resolution_stack(mut self, stack: Vec<String>) -> Self {
        self.resolution_stack = stack;
        self
    }

    /// Attach the underlying cause
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Build an error from a failed resolution. The kind follows the
    /// resolution failure: cycles and extension loading keep their own
    /// kinds, everything else is reported as a resolver error.
    pub fn from_resolution(
        error: ResolutionError,
        uri: impl Into<String>,
        resolution_stack: Vec<String>,
    ) -> Self {
        let reason = match &error {
            ResolutionError::Resolver { .. } => "A URI Resolver returned an error.".to_string(),
            other => other.to_string(),
        };
        WrapError::new(error.wrap_code(), reason)
            .with_uri(uri)
            .with_resolution_stack(resolution_stack)
            .with_cause(error)
    }

    pub fn code(&self) -> WrapErrorCode {
        self.code
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn resolution_stack(&self) -> &[String] {
        &self.resolution_stack
    }

    /// Downcast the cause to a concrete error type
    pub fn cause_as<E: StdError + 'static>(&self) -> Option<&E> {
        self.cause.as_ref().and_then(|cause| cause.downcast_ref::<E>())
    }

    /// Serializable snapshot of this error
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code.as_u32(),
            name: self.code,
            reason: self.reason.clone(),
            uri: self.uri.clone(),
            method: self.method.clone(),
            resolution_stack: self.resolution_stack.clone(),
            cause: self.cause.as_ref().map(|cause| cause.to_string()),
        }
    }
}

impl fmt::Display for WrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.reason)?;
        if let Some(uri) = &self.uri {
            write!(f, " [uri: {}]", uri)?;
        }
        if let Some(method) = &self.method {
            write!(f, " [method: {}]", method)?;
        }
        Ok(())
    }
}

impl StdError for WrapError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause.as_ref() as &(dyn StdError + 'static))
    }
}

impl WrapCoreError for WrapError {
    fn error_code(&self) -> &'static str {
        self.code.name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl From<UriError> for WrapError {
    fn from(err: UriError) -> Self {
        let input = err.input().to_string();
        WrapError::new(WrapErrorCode::MalformedUri, err.to_string())
            .with_uri(input)
            .with_cause(err)
    }
}

/// Standard error message format for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: u32,
    pub name: WrapErrorCode,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resolution_stack: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_resolution_keeps_cycle_kind() {
        let error = ResolutionError::InfiniteLoop {
            uri: "wrap://ens/a".to_string(),
            path: vec!["wrap://ens/a".to_string(), "wrap://ens/b".to_string()],
        };
        let wrapped = WrapError::from_resolution(error.clone(), "wrap://ens/a", vec!["step".into()]);

        assert_eq!(wrapped.code(), WrapErrorCode::InfiniteLoop);
        assert_eq!(wrapped.uri(), Some("wrap://ens/a"));
        assert_eq!(wrapped.resolution_stack(), ["step".to_string()]);
        assert_eq!(wrapped.cause_as::<ResolutionError>(), Some(&error));
        assert!(wrapped.source().is_some());
    }

    #[test]
    fn test_resolver_failure_reason() {
        let error = ResolutionError::Resolver {
            resolver: "wrap://ens/res".to_string(),
            uri: "wrap://ens/a".to_string(),
            message: "boom".to_string(),
        };
        let wrapped = WrapError::from_resolution(error, "wrap://ens/a", Vec::new());
        assert_eq!(wrapped.code(), WrapErrorCode::UriResolverError);
        assert_eq!(wrapped.reason(), "A URI Resolver returned an error.");
    }

    #[test]
    fn test_report_serialization() {
        let error = WrapError::new(WrapErrorCode::WrapperInvokeFail, "module raised")
            .with_uri("wrap://ens/w")
            .with_method("add");
        let json = serde_json::to_value(error.report()).unwrap();

        assert_eq!(json["code"], 203);
        assert_eq!(json["name"], "WRAPPER_INVOKE_FAIL");
        assert_eq!(json["method"], "add");
        assert!(json.get("resolution_stack").is_none());
        assert_eq!(error.error_code(), "WRAPPER_INVOKE_FAIL");
    }
}
