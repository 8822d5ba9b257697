// Ordered composition of resolvers

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;
use wrapline_error::ResolutionResult;
use wrapline_types::Uri;

use super::{ResolutionContext, ResolutionStep, UriPackageOrWrapper, UriResolver};
use crate::client::CoreClient;

/// Tries each resolver in order and returns the first outcome that is not a
/// miss.
///
/// By default a resolver error stops the walk. With `full_resolution` the
/// error is recorded in the history and the next resolver is tried instead.
#[derive(Clone)]
pub struct ResolverAggregator {
    resolvers: Vec<Arc<dyn UriResolver>>,
    full_resolution: bool,
}

impl ResolverAggregator {
    pub fn new(resolvers: Vec<Arc<dyn UriResolver>>) -> Self {
        ResolverAggregator {
            resolvers,
            full_resolution: false,
        }
    }

    pub fn with_full_resolution(mut self, full_resolution: bool) -> Self {
        self.full_resolution = full_resolution;
        self
    }

    pub fn resolvers(&self) -> &[Arc<dyn UriResolver>] {
        &self.resolvers
    }
}

#[async_trait]
impl UriResolver for ResolverAggregator {
    async fn try_resolve_uri(
        &self,
        uri: &Uri,
        client: &dyn CoreClient,
        context: &mut ResolutionContext,
    ) -> ResolutionResult<UriPackageOrWrapper> {
        resolve_with_resolvers(
            uri,
            client,
            context,
            &self.resolvers,
            self.full_resolution,
            "ResolverAggregator",
        )
        .await
    }
}

/// Shared walk used by every resolver that fans out over a list.
///
/// Sub-steps are recorded in a sub-history context and attached to a single
/// step named `description` on the caller's context.
pub(crate) async fn resolve_with_resolvers(
    uri: &Uri,
    client: &dyn CoreClient,
    context: &mut ResolutionContext,
    resolvers: &[Arc<dyn UriResolver>],
    full_resolution: bool,
    description: &str,
) -> ResolutionResult<UriPackageOrWrapper> {
    let mut sub_context = context.create_sub_history_context();
    let mut outcome = Ok(UriPackageOrWrapper::Redirect(uri.clone()));

    for resolver in resolvers {
        match resolver.try_resolve_uri(uri, client, &mut sub_context).await {
            Ok(found) if found.is_miss_for(uri) => continue,
            Ok(found) => {
                outcome = Ok(found);
                break;
            }
            Err(err) if full_resolution => {
                warn!(%uri, error = %err, "resolver failed, continuing with the next one");
                sub_context.track_step(
                    ResolutionStep::new(uri.clone(), Err(err))
                        .with_description(format!("{description} - skipped error")),
                );
            }
            Err(err) => {
                outcome = Err(err);
                break;
            }
        }
    }

    context.track_step(
        ResolutionStep::new(uri.clone(), outcome.clone())
            .with_description(description)
            .with_sub_history(sub_context.into_history()),
    );
    outcome
}
