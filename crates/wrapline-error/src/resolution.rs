// Errors raised inside the resolver chain

use std::any::Any;

use thiserror::Error;

use crate::{UriError, WrapCoreError, WrapErrorCode};

/// Convenient Result type for resolver operations
pub type ResolutionResult<T> = Result<T, ResolutionError>;

/// Failure reported by a resolver. Distinct from a miss, which is a
/// successful "no opinion" outcome.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    /// A URI already on the active resolution path was entered again
    #[error("Infinite loop while resolving URI \"{uri}\". Resolution path: {}", .path.join(" => "))]
    InfiniteLoop { uri: String, path: Vec<String> },

    /// Resolver extension modules that could not be loaded
    #[error("Could not load the following URI Resolver implementations: {}", .failed.join(", "))]
    LoadResolverExtensions { failed: Vec<String> },

    /// A resolver itself failed while handling a URI
    #[error("URI resolver {resolver} failed for {uri}: {message}")]
    Resolver {
        resolver: String,
        uri: String,
        message: String,
    },

    /// A resolver produced something that is not a valid URI
    #[error(transparent)]
    MalformedUri(#[from] UriError),

    /// Generic resolution failure
    #[error("Resolution failed: {0}")]
    Failed(String),
}

impl ResolutionError {
    /// Error kind reported to callers of the client
    pub fn wrap_code(&self) -> WrapErrorCode {
        match self {
            ResolutionError::InfiniteLoop { .. } => WrapErrorCode::InfiniteLoop,
            ResolutionError::LoadResolverExtensions { .. } => WrapErrorCode::LoadResolverExtensions,
            ResolutionError::Resolver { .. } => WrapErrorCode::UriResolverError,
            ResolutionError::MalformedUri(_) => WrapErrorCode::MalformedUri,
            ResolutionError::Failed(_) => WrapErrorCode::UriResolutionError,
        }
    }
}

impl WrapCoreError for ResolutionError {
    fn error_code(&self) -> &'static str {
        self.wrap_code().name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_every_uri() {
        let cycle = ResolutionError::InfiniteLoop {
            uri: "wrap://ens/a".to_string(),
            path: vec!["wrap://ens/a".to_string(), "wrap://ens/b".to_string()],
        };
        assert!(cycle.to_string().contains("wrap://ens/a => wrap://ens/b"));

        let load = ResolutionError::LoadResolverExtensions {
            failed: vec!["wrap://ens/r1".to_string(), "wrap://ens/r2".to_string()],
        };
        assert!(load.to_string().ends_with("wrap://ens/r1, wrap://ens/r2"));
        assert_eq!(load.error_code(), "LOAD_RESOLVER_EXTENSIONS");
    }
}
