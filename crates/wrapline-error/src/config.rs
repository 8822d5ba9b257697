// Configuration-time errors. These are the only failures that abort
// client construction.

use std::any::Any;

use thiserror::Error;

use crate::{UriError, WrapCoreError};

/// Convenient Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Plugins registered under a URI that is also declared as an interface
    #[error("Plugins can't use interfaces for their URI. Invalid plugins: {}", .0.join(", "))]
    PluginUsesInterfaceUri(Vec<String>),

    #[error("Invalid URI in configuration: {0}")]
    InvalidUri(#[from] UriError),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Failed to read configuration: {0}")]
    Io(String),
}

impl WrapCoreError for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::PluginUsesInterfaceUri(_) => "CONFIG_PLUGIN_USES_INTERFACE_URI",
            ConfigError::InvalidUri(_) => "CONFIG_INVALID_URI",
            ConfigError::Parse(_) => "CONFIG_PARSE",
            ConfigError::Io(_) => "CONFIG_IO",
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
