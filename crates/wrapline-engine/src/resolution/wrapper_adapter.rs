// Presents a loaded resolver extension module as a resolver

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use wrapline_error::{ResolutionError, ResolutionResult};
use wrapline_types::Uri;

use super::{ResolutionContext, ResolutionStep, UriPackageOrWrapper, UriResolver};
use crate::client::CoreClient;
use crate::invocation::InvokeOptions;
use crate::wrapper::{PackageLoader, Wrapper};

/// Method every resolver extension exposes
pub const TRY_RESOLVE_URI_METHOD: &str = "tryResolveUri";

#[derive(Debug, Deserialize)]
struct MaybeUriOrManifest {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    manifest: Option<Vec<u8>>,
}

pub struct ResolverWrapperAdapter {
    implementation_uri: Uri,
    wrapper: Arc<dyn Wrapper>,
    package_loader: Option<Arc<dyn PackageLoader>>,
}

impl ResolverWrapperAdapter {
    pub fn new(implementation_uri: Uri, wrapper: Arc<dyn Wrapper>) -> Self {
        ResolverWrapperAdapter {
            implementation_uri,
            wrapper,
            package_loader: None,
        }
    }

    pub fn with_package_loader(mut self, loader: Option<Arc<dyn PackageLoader>>) -> Self {
        self.package_loader = loader;
        self
    }

    pub fn implementation_uri(&self) -> &Uri {
        &self.implementation_uri
    }

    fn failure(&self, uri: &Uri, message: impl Into<String>) -> ResolutionError {
        ResolutionError::Resolver {
            resolver: self.implementation_uri.to_string(),
            uri: uri.to_string(),
            message: message.into(),
        }
    }

    async fn query_extension(
        &self,
        uri: &Uri,
        client: &dyn CoreClient,
    ) -> ResolutionResult<UriPackageOrWrapper> {
        let mut options = InvokeOptions::new(self.implementation_uri.clone(), TRY_RESOLVE_URI_METHOD)
            .with_args(json!({ "authority": uri.authority(), "path": uri.path() }));
        if let Some(env) = client.get_env_by_uri(&self.implementation_uri) {
            options = options.with_env(env.clone());
        }

        let payload = client
            .invoke_wrapper(Arc::clone(&self.wrapper), options)
            .await
            .map_err(|err| self.failure(uri, err.to_string()))?;
        let value = payload
            .into_value()
            .map_err(|err| self.failure(uri, err.to_string()))?;
        if value.is_null() {
            return Ok(UriPackageOrWrapper::Redirect(uri.clone()));
        }

        let result: MaybeUriOrManifest = serde_json::from_value::<MaybeUriOrManifest>(value)
            .map_err(|err| self.failure(uri, format!("unexpected result shape: {err}")))?;

        if let Some(manifest) = result.manifest {
            let loader = self
                .package_loader
                .as_ref()
                .ok_or_else(|| self.failure(uri, "returned a manifest but no package loader is configured"))?;
            let package = loader
                .load_package(uri, &manifest, &self.implementation_uri)
                .map_err(|err| self.failure(uri, err.to_string()))?;
            return Ok(UriPackageOrWrapper::Package {
                uri: uri.clone(),
                package,
            });
        }

        match result.uri {
            Some(target) => Ok(UriPackageOrWrapper::Redirect(Uri::parse(&target)?)),
            None => Ok(UriPackageOrWrapper::Redirect(uri.clone())),
        }
    }
}

#[async_trait]
impl UriResolver for ResolverWrapperAdapter {
    async fn try_resolve_uri(
        &self,
        uri: &Uri,
        client: &dyn CoreClient,
        context: &mut ResolutionContext,
    ) -> ResolutionResult<UriPackageOrWrapper> {
        let outcome = self.query_extension(uri, client).await;
        let description = match &outcome {
            Ok(found) if found.is_miss_for(uri) => {
                format!("ResolverExtension ({}) - Miss", self.implementation_uri)
            }
            _ => format!("ResolverExtension ({})", self.implementation_uri),
        };
        context.track_step(ResolutionStep::new(uri.clone(), outcome.clone()).with_description(description));
        outcome
    }
}

/// Args accepted by [`TRY_RESOLVE_URI_METHOD`], for extension authors
pub fn try_resolve_uri_args(value: &Value) -> Option<(String, String)> {
    let authority = value.get("authority")?.as_str()?.to_string();
    let path = value.get("path")?.as_str()?.to_string();
    Some((authority, path))
}
