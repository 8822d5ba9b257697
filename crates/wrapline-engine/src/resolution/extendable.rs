// Resolution through resolver extension modules registered on an interface

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use wrapline_error::{ResolutionError, ResolutionResult};
use wrapline_types::{uri_resolver_interface, Uri};

use super::aggregator::resolve_with_resolvers;
use super::{ResolutionContext, ResolutionStep, ResolverWrapperAdapter, UriPackageOrWrapper, UriResolver};
use crate::client::CoreClient;
use crate::wrapper::PackageLoader;

/// Loads every implementation of the resolver interface and aggregates over
/// them. The interface lookup applies the client's redirects unless turned
/// off with [`ExtendableResolver::with_apply_redirects`].
///
/// Implementations are loaded eagerly; if any of them cannot be loaded the
/// whole step fails with [`ResolutionError::LoadResolverExtensions`] naming
/// each failure. An implementation is never asked to resolve itself, and the
/// extension currently being loaded is skipped in nested resolutions so that
/// loading one extension cannot recurse into itself.
#[derive(Clone)]
pub struct ExtendableResolver {
    interface: Uri,
    apply_redirects: bool,
    full_resolution: bool,
    package_loader: Option<Arc<dyn PackageLoader>>,
}

impl Default for ExtendableResolver {
    fn default() -> Self {
        ExtendableResolver {
            interface: uri_resolver_interface(),
            apply_redirects: true,
            full_resolution: false,
            package_loader: None,
        }
    }
}

impl ExtendableResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interface(mut self, interface: Uri) -> Self {
        self.interface = interface;
        self
    }

    pub fn with_apply_redirects(mut self, apply_redirects: bool) -> Self {
        self.apply_redirects = apply_redirects;
        self
    }

    pub fn with_full_resolution(mut self, full_resolution: bool) -> Self {
        self.full_resolution = full_resolution;
        self
    }

    pub fn with_package_loader(mut self, loader: Arc<dyn PackageLoader>) -> Self {
        self.package_loader = Some(loader);
        self
    }

    pub fn interface(&self) -> &Uri {
        &self.interface
    }

    async fn load_extensions(
        &self,
        uri: &Uri,
        client: &dyn CoreClient,
        context: &mut ResolutionContext,
    ) -> ResolutionResult<Vec<Arc<dyn UriResolver>>> {
        let implementations = client
            .get_implementations(&self.interface, self.apply_redirects)
            .map_err(|err| ResolutionError::Failed(err.to_string()))?;

        let mut resolvers: Vec<Arc<dyn UriResolver>> = Vec::new();
        let mut failed = Vec::new();
        let mut load_history = Vec::new();

        for (index, implementation) in implementations
            .into_iter()
            .enumerate()
            .skip(context.extension_cursor())
        {
            if implementation == *uri || context.is_resolving(&implementation) {
                continue;
            }

            let mut sub_context = context.create_sub_context().with_extension_cursor(index + 1);
            let loaded = client.load_wrapper(&implementation, Some(&mut sub_context)).await;
            load_history.extend(sub_context.into_history());

            match loaded {
                Ok(wrapper) => {
                    debug!(extension = %implementation, "loaded resolver extension");
                    let adapter = ResolverWrapperAdapter::new(implementation, wrapper)
                        .with_package_loader(self.package_loader.clone());
                    resolvers.push(Arc::new(adapter));
                }
                Err(err) => {
                    warn!(extension = %implementation, error = %err, "failed to load resolver extension");
                    failed.push(implementation.to_string());
                }
            }
        }

        if !failed.is_empty() {
            let err = ResolutionError::LoadResolverExtensions { failed };
            context.track_step(
                ResolutionStep::new(uri.clone(), Err(err.clone()))
                    .with_description("ExtendableResolver - Load extensions")
                    .with_sub_history(load_history),
            );
            return Err(err);
        }

        Ok(resolvers)
    }
}

#[async_trait]
impl UriResolver for ExtendableResolver {
    async fn try_resolve_uri(
        &self,
        uri: &Uri,
        client: &dyn CoreClient,
        context: &mut ResolutionContext,
    ) -> ResolutionResult<UriPackageOrWrapper> {
        let resolvers = self.load_extensions(uri, client, context).await?;
        if resolvers.is_empty() {
            return Ok(UriPackageOrWrapper::Redirect(uri.clone()));
        }

        resolve_with_resolvers(
            uri,
            client,
            context,
            &resolvers,
            self.full_resolution,
            "ExtendableResolver",
        )
        .await
    }
}
