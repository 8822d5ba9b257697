// Native modules registered directly with the client

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use wrapline_error::{WrapError, WrapErrorCode, WrapResult};
use wrapline_types::{Env, Payload, Uri, WrapManifest};

use crate::client::CoreClient;
use crate::invocation::InvokeOptions;
use crate::wrapper::{FileContent, GetFileOptions, WrapPackage, Wrapper};

/// Method dispatch implemented by a native module.
///
/// `args` is always a JSON object (empty when the caller passed none).
#[async_trait]
pub trait PluginModule: Send + Sync {
    async fn call(
        &self,
        method: &str,
        args: Value,
        env: Option<&Env>,
        client: &dyn CoreClient,
    ) -> anyhow::Result<Value>;
}

type ModuleFactory = dyn Fn() -> Arc<dyn PluginModule> + Send + Sync;

/// Package that instantiates a plugin module on demand
#[derive(Clone)]
pub struct PluginPackage {
    manifest: WrapManifest,
    factory: Arc<ModuleFactory>,
}

impl PluginPackage {
    pub fn new<F>(manifest: WrapManifest, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn PluginModule> + Send + Sync + 'static,
    {
        PluginPackage {
            manifest,
            factory: Arc::new(factory),
        }
    }

    /// Package whose wrappers all share one module instance
    pub fn from_module(manifest: WrapManifest, module: Arc<dyn PluginModule>) -> Self {
        Self::new(manifest, move || Arc::clone(&module))
    }
}

impl fmt::Debug for PluginPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginPackage")
            .field("manifest", &self.manifest)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WrapPackage for PluginPackage {
    async fn create_wrapper(&self) -> WrapResult<Arc<dyn Wrapper>> {
        let module = (self.factory)();
        Ok(Arc::new(PluginWrapper::new(module, self.manifest.clone())))
    }

    fn get_manifest(&self) -> &WrapManifest {
        &self.manifest
    }
}

pub struct PluginWrapper {
    module: Arc<dyn PluginModule>,
    manifest: WrapManifest,
}

impl PluginWrapper {
    pub fn new(module: Arc<dyn PluginModule>, manifest: WrapManifest) -> Self {
        PluginWrapper { module, manifest }
    }
}

fn decode_args(args: Option<&Payload>) -> Result<Value, String> {
    let value = match args {
        None => return Ok(Value::Object(Map::new())),
        Some(payload) => payload.clone().into_value().map_err(|err| err.to_string())?,
    };
    match value {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Object(_) => Ok(value),
        other => Err(format!("args must be an object, got {other}")),
    }
}

fn decode_env(env: Option<&Payload>) -> Result<Option<Env>, String> {
    let Some(payload) = env else {
        return Ok(None);
    };
    match payload.clone().into_value().map_err(|err| err.to_string())? {
        Value::Object(env) => Ok(Some(env)),
        Value::Null => Ok(None),
        other => Err(format!("env must be an object, got {other}")),
    }
}

#[async_trait]
impl Wrapper for PluginWrapper {
    async fn invoke(&self, options: &InvokeOptions, invoker: &dyn CoreClient) -> WrapResult<Payload> {
        let malformed = |reason: String| {
            WrapError::new(WrapErrorCode::WrapperArgsMalformed, reason)
                .with_uri(options.uri.to_string())
                .with_method(&options.method)
        };
        let args = decode_args(options.args.as_ref()).map_err(malformed)?;
        let env = decode_env(options.env.as_ref()).map_err(malformed)?;

        let value = self
            .module
            .call(&options.method, args, env.as_ref(), invoker)
            .await
            .map_err(|err| {
                WrapError::new(WrapErrorCode::WrapperInvokeFail, format!("{err:#}"))
                    .with_uri(options.uri.to_string())
                    .with_method(&options.method)
            })?;
        Ok(Payload::Value(value))
    }

    async fn get_file(&self, options: &GetFileOptions) -> WrapResult<FileContent> {
        Err(WrapError::new(
            WrapErrorCode::ClientGetFileError,
            format!("plugin \"{}\" has no file \"{}\"", self.manifest.name, options.path),
        ))
    }

    fn get_manifest(&self) -> &WrapManifest {
        &self.manifest
    }
}

/// A plugin package bound to the URI it is served at
#[derive(Debug, Clone)]
pub struct PluginRegistration {
    pub uri: Uri,
    pub package: Arc<PluginPackage>,
}

impl PluginRegistration {
    pub fn new(uri: Uri, package: PluginPackage) -> Self {
        PluginRegistration {
            uri,
            package: Arc::new(package),
        }
    }
}
