// Follows redirects until a terminal outcome, detecting cycles

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use wrapline_error::{ResolutionError, ResolutionResult};
use wrapline_types::Uri;

use super::{ResolutionContext, ResolutionStep, UriPackageOrWrapper, UriResolver};
use crate::client::CoreClient;

/// Re-enters resolution whenever the inner resolver redirects to a new URI.
///
/// Entering a URI that is already being resolved fails with
/// [`ResolutionError::InfiniteLoop`]. A redirect to the same URI is a miss
/// and ends the walk.
#[derive(Clone)]
pub struct RecursiveResolver {
    inner: Arc<dyn UriResolver>,
}

impl RecursiveResolver {
    pub fn new(inner: Arc<dyn UriResolver>) -> Self {
        RecursiveResolver { inner }
    }
}

#[async_trait]
impl UriResolver for RecursiveResolver {
    async fn try_resolve_uri(
        &self,
        uri: &Uri,
        client: &dyn CoreClient,
        context: &mut ResolutionContext,
    ) -> ResolutionResult<UriPackageOrWrapper> {
        if context.is_resolving(uri) {
            let mut path: Vec<String> = context.active_path().iter().map(Uri::to_string).collect();
            path.push(uri.to_string());
            let err = ResolutionError::InfiniteLoop {
                uri: uri.to_string(),
                path,
            };
            debug!(%uri, "resolution loop detected");
            context.track_step(
                ResolutionStep::new(uri.clone(), Err(err.clone()))
                    .with_description("RecursiveResolver - Infinite loop"),
            );
            return Err(err);
        }

        context.start_resolving(uri);
        let outcome = match self.inner.try_resolve_uri(uri, client, context).await {
            Ok(UriPackageOrWrapper::Redirect(target)) if target != *uri => {
                self.try_resolve_uri(&target, client, context).await
            }
            other => other,
        };
        context.stop_resolving(uri);
        outcome
    }
}
