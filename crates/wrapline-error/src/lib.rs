// wrapline error handling framework
// Central location for error types, traits, and handling utilities

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;

// Re-export for crates that define their own error enums
pub use thiserror;

mod code;
mod config;
mod resolution;
mod types;
mod wrap;

pub use code::WrapErrorCode;
pub use config::{ConfigError, ConfigResult};
pub use resolution::{ResolutionError, ResolutionResult};
pub use types::{CodecError, CodecResult, UriError};
pub use wrap::{ErrorReport, WrapError, WrapResult};

/// Base trait for all errors raised by the engine.
pub trait WrapCoreError: StdError + fmt::Debug + fmt::Display + Send + Sync + Any + 'static {
    /// Returns a unique static string code for this error type.
    fn error_code(&self) -> &'static str;

    /// Returns this error as a `&dyn Any` to allow downcasting.
    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_downcast_through_trait_object() {
        let errors: Vec<Box<dyn WrapCoreError>> = vec![
            Box::new(UriError::malformed("wrap://", "missing path")),
            Box::new(CodecError::Decode("truncated".to_string())),
            Box::new(ConfigError::Parse("bad toml".to_string())),
        ];

        let codes: Vec<_> = errors.iter().map(|err| err.error_code()).collect();
        assert_eq!(codes, vec!["MALFORMED_URI", "CODEC_DECODE", "CONFIG_PARSE"]);

        let uri_error = errors[0]
            .as_any()
            .downcast_ref::<UriError>()
            .expect("first entry is a UriError");
        assert_eq!(uri_error.input(), "wrap://");
        assert!(errors[1].as_any().downcast_ref::<UriError>().is_none());
    }
}
