// Purpose: The client, entry point for resolution and invocation

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, instrument};
use wrapline_error::{
    ConfigResult, ResolutionError, ResolutionResult, WrapError, WrapErrorCode, WrapResult,
};
use wrapline_types::{
    get_implementations, Env, EnvRegistration, InterfaceImplementations, Payload, Uri, UriRedirect,
    WrapManifest,
};

use crate::cache::WrapperCache;
use crate::config::{default_resolver, ClientConfig, ClientConfigBuilder};
use crate::invocation::propagation::{env_for_path, merge_env};
use crate::invocation::query::{JsonQueryParser, QueryParser};
use crate::invocation::{panic_message, InvokeOptions, InvokeResult};
use crate::plugin::PluginRegistration;
use crate::resolution::{build_clean_uri_history, ResolutionContext, UriPackageOrWrapper, UriResolver};
use crate::wrapper::{FileContent, GetFileOptions, Wrapper};

//-----------------------------------------------------------------------------
// Core Client Capability
//-----------------------------------------------------------------------------

/// The engine surface available to resolvers and modules.
///
/// Resolvers and wrappers receive this handle rather than the concrete
/// [`Client`], so that a module can call back into the engine (invoke other
/// URIs, load resolver extensions) without depending on its construction.
#[async_trait]
pub trait CoreClient: Send + Sync {
    async fn invoke(&self, options: InvokeOptions) -> InvokeResult;

    async fn invoke_wrapper(&self, wrapper: Arc<dyn Wrapper>, options: InvokeOptions) -> InvokeResult;

    async fn load_wrapper(
        &self,
        uri: &Uri,
        context: Option<&mut ResolutionContext>,
    ) -> WrapResult<Arc<dyn Wrapper>>;

    async fn try_resolve_uri(
        &self,
        uri: &Uri,
        context: Option<&mut ResolutionContext>,
    ) -> ResolutionResult<UriPackageOrWrapper>;

    fn get_implementations(&self, uri: &Uri, apply_redirects: bool) -> WrapResult<Vec<Uri>>;

    fn get_redirects(&self) -> &[UriRedirect];

    fn get_interfaces(&self) -> &[InterfaceImplementations];

    fn get_env_by_uri(&self, uri: &Uri) -> Option<&Env>;
}

//-----------------------------------------------------------------------------
// Client
//-----------------------------------------------------------------------------

/// Resolves URIs to modules and invokes them.
///
/// Every public operation reports failure as a [`WrapError`]; nothing
/// panics across this boundary, including panics raised by modules.
pub struct Client {
    config: ClientConfig,
    resolver: Arc<dyn UriResolver>,
    wrapper_cache: Arc<WrapperCache>,
    query_parser: Arc<dyn QueryParser>,
}

impl Client {
    /// Build a client from `config`, filling in the default resolver chain,
    /// cache and query parser where none were supplied.
    pub fn new(config: ClientConfig) -> ConfigResult<Self> {
        config.validate()?;

        let resolver = config
            .resolver
            .clone()
            .unwrap_or_else(|| default_resolver(&config));
        let wrapper_cache = config.wrapper_cache.clone().unwrap_or_default();
        let query_parser = config
            .query_parser
            .clone()
            .unwrap_or_else(|| Arc::new(JsonQueryParser));

        debug!(
            redirects = config.redirects.len(),
            plugins = config.plugins.len(),
            interfaces = config.interfaces.len(),
            envs = config.envs.len(),
            "client created"
        );

        Ok(Client {
            config,
            resolver,
            wrapper_cache,
            query_parser,
        })
    }

    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    //-------------------------------------------------------------------------
    // Configuration accessors
    //-------------------------------------------------------------------------

    pub fn get_config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn get_redirects(&self) -> &[UriRedirect] {
        &self.config.redirects
    }

    pub fn get_plugins(&self) -> &[PluginRegistration] {
        &self.config.plugins
    }

    pub fn get_plugin_by_uri(&self, uri: &Uri) -> Option<&PluginRegistration> {
        self.config.plugins.iter().find(|plugin| plugin.uri == *uri)
    }

    pub fn get_interfaces(&self) -> &[InterfaceImplementations] {
        &self.config.interfaces
    }

    pub fn get_envs(&self) -> &[EnvRegistration] {
        &self.config.envs
    }

    pub fn get_env_by_uri(&self, uri: &Uri) -> Option<&Env> {
        self.config
            .envs
            .iter()
            .find(|registration| registration.uri == *uri)
            .map(|registration| &registration.env)
    }

    pub fn get_resolver(&self) -> Arc<dyn UriResolver> {
        Arc::clone(&self.resolver)
    }

    pub fn get_wrapper_cache(&self) -> &Arc<WrapperCache> {
        &self.wrapper_cache
    }

    pub(crate) fn query_parser(&self) -> &dyn QueryParser {
        self.query_parser.as_ref()
    }

    //-------------------------------------------------------------------------
    // Resolution
    //-------------------------------------------------------------------------

    /// Run the resolver chain once for `uri`.
    #[instrument(skip_all, fields(uri = %uri))]
    pub async fn try_resolve_uri(
        &self,
        uri: &Uri,
        context: Option<&mut ResolutionContext>,
    ) -> ResolutionResult<UriPackageOrWrapper> {
        let mut owned = None;
        let context = match context {
            Some(context) => context,
            None => owned.insert(ResolutionContext::new()),
        };

        let resolution = AssertUnwindSafe(self.resolver.try_resolve_uri(uri, self, &mut *context))
            .catch_unwind()
            .await;
        let outcome = match resolution {
            Ok(outcome) => outcome,
            Err(panic) => Err(ResolutionError::Failed(format!(
                "resolver panicked: {}",
                panic_message(panic)
            ))),
        };
        debug!(
            outcome = ?outcome,
            history = ?build_clean_uri_history(context.history(), None),
            "uri resolved"
        );
        outcome
    }

    /// Resolve `uri` and return a live wrapper for it.
    ///
    /// Packages are instantiated at most once per package URI; later loads
    /// return the cached wrapper. Resolution itself always runs.
    #[instrument(skip_all, fields(uri = %uri))]
    pub async fn load_wrapper(
        &self,
        uri: &Uri,
        context: Option<&mut ResolutionContext>,
    ) -> WrapResult<Arc<dyn Wrapper>> {
        let mut owned = None;
        let context = match context {
            Some(context) => context,
            None => owned.insert(ResolutionContext::new()),
        };

        let outcome = match self.try_resolve_uri(uri, Some(&mut *context)).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let stack = build_clean_uri_history(context.history(), None);
                return Err(WrapError::from_resolution(err, uri.to_string(), stack));
            }
        };

        match outcome {
            UriPackageOrWrapper::Redirect(final_uri) => Err(WrapError::new(
                WrapErrorCode::UriNotFound,
                format!("Unable to find URI {final_uri}."),
            )
            .with_uri(uri.to_string())
            .with_resolution_stack(build_clean_uri_history(context.history(), None))),
            UriPackageOrWrapper::Package {
                uri: package_uri,
                package,
            } => self
                .wrapper_cache
                .get_or_load(&package_uri, || async move {
                    match AssertUnwindSafe(package.create_wrapper()).catch_unwind().await {
                        Ok(created) => created,
                        Err(panic) => Err(WrapError::new(
                            WrapErrorCode::ClientLoadWrapperError,
                            panic_message(panic),
                        )),
                    }
                })
                .await
                .map_err(|err| {
                    WrapError::new(
                        WrapErrorCode::ClientLoadWrapperError,
                        format!("Failed to create wrapper for {package_uri}: {}", err.reason()),
                    )
                    .with_uri(uri.to_string())
                    .with_cause(err)
                }),
            UriPackageOrWrapper::Wrapper { wrapper, .. } => Ok(wrapper),
        }
    }

    //-------------------------------------------------------------------------
    // Invocation
    //-------------------------------------------------------------------------

    /// Resolve `options.uri`, attach its env and invoke `options.method`.
    #[instrument(skip_all, fields(uri = %options.uri, method = %options.method))]
    pub async fn invoke(&self, options: InvokeOptions) -> InvokeResult {
        let mut context = ResolutionContext::new();
        self.invoke_in_context(options, &mut context).await
    }

    /// Same as [`Client::invoke`] but resolving within `context`, which is
    /// left holding the resolution history afterwards.
    pub async fn invoke_in_context(
        &self,
        mut options: InvokeOptions,
        context: &mut ResolutionContext,
    ) -> InvokeResult {
        let wrapper = self.load_wrapper(&options.uri, Some(&mut *context)).await?;

        let mut path = vec![options.uri.clone()];
        path.extend(context.resolution_path());
        let registered = env_for_path(&path, &self.config.envs);
        let env = merge_env(registered, options.env.take()).map_err(|err| {
            err.with_uri(options.uri.to_string())
                .with_method(&options.method)
        })?;
        options.env = env.map(|env| Payload::Value(serde_json::Value::Object(env)));

        self.invoke_wrapper(wrapper, options).await
    }

    /// Invoke an already loaded wrapper. The result is returned encoded when
    /// `options.encode_result` is set and decoded otherwise.
    #[instrument(skip_all, fields(uri = %options.uri, method = %options.method))]
    pub async fn invoke_wrapper(&self, wrapper: Arc<dyn Wrapper>, options: InvokeOptions) -> InvokeResult {
        let invocation = AssertUnwindSafe(wrapper.invoke(&options, self)).catch_unwind().await;
        let payload = match invocation {
            Ok(result) => result?,
            Err(panic) => {
                return Err(WrapError::new(WrapErrorCode::WrapperInvokeFail, panic_message(panic))
                    .with_uri(options.uri.to_string())
                    .with_method(&options.method))
            }
        };

        let codec_failure = |err: wrapline_error::CodecError| {
            WrapError::new(WrapErrorCode::WrapperInvokeFail, err.to_string())
                .with_uri(options.uri.to_string())
                .with_method(&options.method)
                .with_cause(err)
        };
        match (options.encode_result, payload) {
            (true, Payload::Value(value)) => Payload::Value(value)
                .into_bytes()
                .map(Payload::Bytes)
                .map_err(codec_failure),
            (false, Payload::Bytes(bytes)) => Payload::Bytes(bytes)
                .into_value()
                .map(Payload::Value)
                .map_err(codec_failure),
            (_, payload) => Ok(payload),
        }
    }

    //-------------------------------------------------------------------------
    // Module metadata
    //-------------------------------------------------------------------------

    pub async fn get_manifest(&self, uri: &Uri) -> WrapResult<WrapManifest> {
        let wrapper = self.load_wrapper(uri, None).await?;
        Ok(wrapper.get_manifest().clone())
    }

    pub async fn get_file(&self, uri: &Uri, options: &GetFileOptions) -> WrapResult<FileContent> {
        let wrapper = self.load_wrapper(uri, None).await?;
        wrapper.get_file(options).await.map_err(|err| {
            WrapError::new(WrapErrorCode::ClientGetFileError, err.reason().to_string())
                .with_uri(uri.to_string())
                .with_cause(err)
        })
    }

    /// Implementations registered for the interface `uri`, optionally
    /// following configured redirects on both sides.
    pub fn get_implementations(&self, uri: &Uri, apply_redirects: bool) -> WrapResult<Vec<Uri>> {
        let redirects = apply_redirects.then(|| self.config.redirects.as_slice());
        get_implementations(uri, &self.config.interfaces, redirects).map_err(|err| {
            WrapError::new(WrapErrorCode::ClientGetImplementationsError, err.to_string())
                .with_uri(uri.to_string())
                .with_cause(err)
        })
    }
}

#[async_trait]
impl CoreClient for Client {
    async fn invoke(&self, options: InvokeOptions) -> InvokeResult {
        Client::invoke(self, options).await
    }

    async fn invoke_wrapper(&self, wrapper: Arc<dyn Wrapper>, options: InvokeOptions) -> InvokeResult {
        Client::invoke_wrapper(self, wrapper, options).await
    }

    async fn load_wrapper(
        &self,
        uri: &Uri,
        context: Option<&mut ResolutionContext>,
    ) -> WrapResult<Arc<dyn Wrapper>> {
        Client::load_wrapper(self, uri, context).await
    }

    async fn try_resolve_uri(
        &self,
        uri: &Uri,
        context: Option<&mut ResolutionContext>,
    ) -> ResolutionResult<UriPackageOrWrapper> {
        Client::try_resolve_uri(self, uri, context).await
    }

    fn get_implementations(&self, uri: &Uri, apply_redirects: bool) -> WrapResult<Vec<Uri>> {
        Client::get_implementations(self, uri, apply_redirects)
    }

    fn get_redirects(&self) -> &[UriRedirect] {
        Client::get_redirects(self)
    }

    fn get_interfaces(&self) -> &[InterfaceImplementations] {
        Client::get_interfaces(self)
    }

    fn get_env_by_uri(&self, uri: &Uri) -> Option<&Env> {
        Client::get_env_by_uri(self, uri)
    }
}
