// Purpose: URI resolution chain, from a requested URI to a package or wrapper

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use wrapline_error::ResolutionResult;
use wrapline_types::Uri;

use crate::client::CoreClient;
use crate::wrapper::{WrapPackage, Wrapper};

pub mod aggregator;
pub mod context;
pub mod extendable;
pub mod history;
pub mod recursive;
pub mod static_resolver;
pub mod wrapper_adapter;

pub use aggregator::ResolverAggregator;
pub use context::{ResolutionContext, ResolutionStep};
pub use extendable::ExtendableResolver;
pub use history::build_clean_uri_history;
pub use recursive::RecursiveResolver;
pub use static_resolver::{StaticEntry, StaticResolver};
pub use wrapper_adapter::ResolverWrapperAdapter;

//-----------------------------------------------------------------------------
// Resolution Outcome
//-----------------------------------------------------------------------------

/// Result of a single resolution attempt.
///
/// A resolver that cannot handle a URI returns `Redirect` to the same URI;
/// there is no separate "not found" outcome.
#[derive(Clone)]
pub enum UriPackageOrWrapper {
    Redirect(Uri),
    Package {
        uri: Uri,
        package: Arc<dyn WrapPackage>,
    },
    Wrapper {
        uri: Uri,
        wrapper: Arc<dyn Wrapper>,
    },
}

impl UriPackageOrWrapper {
    /// The URI this outcome points at
    pub fn uri(&self) -> &Uri {
        match self {
            UriPackageOrWrapper::Redirect(uri) => uri,
            UriPackageOrWrapper::Package { uri, .. } => uri,
            UriPackageOrWrapper::Wrapper { uri, .. } => uri,
        }
    }

    /// True when this is the "no change" outcome for `requested`
    pub fn is_miss_for(&self, requested: &Uri) -> bool {
        matches!(self, UriPackageOrWrapper::Redirect(uri) if uri == requested)
    }

    pub fn is_package(&self) -> bool {
        matches!(self, UriPackageOrWrapper::Package { .. })
    }

    pub fn is_wrapper(&self) -> bool {
        matches!(self, UriPackageOrWrapper::Wrapper { .. })
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            UriPackageOrWrapper::Redirect(_) => "uri",
            UriPackageOrWrapper::Package { .. } => "package",
            UriPackageOrWrapper::Wrapper { .. } => "wrapper",
        }
    }
}

impl fmt::Debug for UriPackageOrWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.uri())
    }
}

//-----------------------------------------------------------------------------
// Resolver Trait
//-----------------------------------------------------------------------------

/// A strategy that maps a URI to a package, a wrapper, or a new URI.
#[async_trait]
pub trait UriResolver: Send + Sync {
    async fn try_resolve_uri(
        &self,
        uri: &Uri,
        client: &dyn CoreClient,
        context: &mut ResolutionContext,
    ) -> ResolutionResult<UriPackageOrWrapper>;
}
