// Machine-readable error kinds

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error kind attached to every [`crate::WrapError`].
///
/// Numeric codes are grouped in ranges: resolution (1-9), client (51-59)
/// and wrapper execution (201-209).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WrapErrorCode {
    /// Generic failure to resolve a URI
    UriResolutionError,
    /// A resolver in the chain returned an error
    UriResolverError,
    /// Resolution terminated on a bare URI
    UriNotFound,
    /// A redirect or resolver chain re-entered a URI already being resolved
    InfiniteLoop,
    /// One or more resolver extensions could not be loaded
    LoadResolverExtensions,
    /// The input could not be parsed as a URI
    MalformedUri,
    /// A package could not be instantiated into a wrapper
    ClientLoadWrapperError,
    /// A wrapper failed to provide a file
    ClientGetFileError,
    /// Interface implementations could not be computed
    ClientGetImplementationsError,
    /// A module raised during execution
    WrapperInvokeFail,
    /// Invocation arguments could not be decoded or have the wrong shape
    WrapperArgsMalformed,
}

impl WrapErrorCode {
    /// Stable numeric value of this code
    pub fn as_u32(self) -> u32 {
        match self {
            WrapErrorCode::UriResolutionError => 1,
            WrapErrorCode::UriResolverError => 2,
            WrapErrorCode::UriNotFound => 3,
            WrapErrorCode::InfiniteLoop => 4,
            WrapErrorCode::LoadResolverExtensions => 5,
            WrapErrorCode::MalformedUri => 6,
            WrapErrorCode::ClientLoadWrapperError => 51,
            WrapErrorCode::ClientGetFileError => 52,
            WrapErrorCode::ClientGetImplementationsError => 53,
            WrapErrorCode::WrapperInvokeFail => 203,
            WrapErrorCode::WrapperArgsMalformed => 207,
        }
    }

    /// Static name of this code, as used in logs and reports
    pub fn name(self) -> &'static str {
        match self {
            WrapErrorCode::UriResolutionError => "URI_RESOLUTION_ERROR",
            WrapErrorCode::UriResolverError => "URI_RESOLVER_ERROR",
            WrapErrorCode::UriNotFound => "URI_NOT_FOUND",
            WrapErrorCode::InfiniteLoop => "INFINITE_LOOP",
            WrapErrorCode::LoadResolverExtensions => "LOAD_RESOLVER_EXTENSIONS",
            WrapErrorCode::MalformedUri => "MALFORMED_URI",
            WrapErrorCode::ClientLoadWrapperError => "CLIENT_LOAD_WRAPPER_ERROR",
            WrapErrorCode::ClientGetFileError => "CLIENT_GET_FILE_ERROR",
            WrapErrorCode::ClientGetImplementationsError => "CLIENT_GET_IMPLEMENTATIONS_ERROR",
            WrapErrorCode::WrapperInvokeFail => "WRAPPER_INVOKE_FAIL",
            WrapErrorCode::WrapperArgsMalformed => "WRAPPER_ARGS_MALFORMED",
        }
    }

    /// Whether this code belongs to the resolution range
    pub fn is_resolution_error(self) -> bool {
        self.as_u32() < 50
    }
}

impl fmt::Display for WrapErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u32())
    }
}
