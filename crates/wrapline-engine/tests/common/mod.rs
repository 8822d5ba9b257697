// Shared fixtures for engine integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde_json::{json, Value};
use wrapline_engine::resolution::wrapper_adapter::try_resolve_uri_args;
use wrapline_engine::{
    CoreClient, Env, FileContent, GetFileOptions, InvokeOptions, Payload, PluginModule,
    PluginPackage, PluginWrapper, Uri, WrapManifest, WrapPackage, WrapResult, Wrapper,
};

pub fn uri(s: &str) -> Uri {
    Uri::parse(s).expect("valid test uri")
}

pub fn env(value: Value) -> Env {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

//-----------------------------------------------------------------------------
// Plugin modules
//-----------------------------------------------------------------------------

/// Arithmetic plus a few methods that misbehave on purpose
#[derive(Default)]
pub struct MathModule {
    pub calls: AtomicUsize,
}

#[async_trait]
impl PluginModule for MathModule {
    async fn call(
        &self,
        method: &str,
        args: Value,
        env: Option<&Env>,
        _client: &dyn CoreClient,
    ) -> anyhow::Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match method {
            "add" => {
                let a = args["a"].as_i64().context("missing a")?;
                let b = args["b"].as_i64().context("missing b")?;
                Ok(json!(a + b))
            }
            "echo" => Ok(args),
            "env" => Ok(env.cloned().map(Value::Object).unwrap_or(Value::Null)),
            "info" => Ok(json!({ "name": "math", "version": { "major": 1, "minor": 2 }, "extra": true })),
            "fail" => bail!("requested failure"),
            "panic" => panic!("module exploded"),
            other => bail!("unknown method {other}"),
        }
    }
}

pub fn math_package() -> PluginPackage {
    PluginPackage::new(WrapManifest::plugin("math"), || Arc::new(MathModule::default()))
}

pub fn shared_math_package(module: Arc<MathModule>) -> PluginPackage {
    PluginPackage::from_module(WrapManifest::plugin("math"), module)
}

/// Resolver extension that redirects one authority to a fixed target, and
/// answers with a manifest for another.
pub struct RedirectExtension {
    pub authority: String,
    pub target: String,
    pub manifest_authority: Option<String>,
}

#[async_trait]
impl PluginModule for RedirectExtension {
    async fn call(
        &self,
        method: &str,
        args: Value,
        _env: Option<&Env>,
        _client: &dyn CoreClient,
    ) -> anyhow::Result<Value> {
        if method != "tryResolveUri" {
            bail!("unknown method {method}");
        }
        let (authority, _path) = try_resolve_uri_args(&args).context("malformed resolver args")?;
        if authority == self.authority {
            return Ok(json!({ "uri": self.target }));
        }
        if self.manifest_authority.as_deref() == Some(authority.as_str()) {
            return Ok(json!({ "manifest": [1, 2, 3] }));
        }
        Ok(Value::Null)
    }
}

pub fn extension_package(authority: &str, target: &str) -> PluginPackage {
    let module = Arc::new(RedirectExtension {
        authority: authority.to_string(),
        target: target.to_string(),
        manifest_authority: None,
    });
    PluginPackage::from_module(WrapManifest::plugin("redirect-extension"), module)
}

//-----------------------------------------------------------------------------
// Custom packages and wrappers
//-----------------------------------------------------------------------------

/// Package that takes a while to instantiate and counts instantiations
pub struct SlowPackage {
    pub manifest: WrapManifest,
    pub created: Arc<AtomicUsize>,
    pub delay: Duration,
}

impl SlowPackage {
    pub fn new(delay: Duration) -> Self {
        SlowPackage {
            manifest: WrapManifest::plugin("slow"),
            created: Arc::new(AtomicUsize::new(0)),
            delay,
        }
    }
}

#[async_trait]
impl WrapPackage for SlowPackage {
    async fn create_wrapper(&self) -> WrapResult<Arc<dyn Wrapper>> {
        tokio::time::sleep(self.delay).await;
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(PluginWrapper::new(
            Arc::new(MathModule::default()),
            self.manifest.clone(),
        )))
    }

    fn get_manifest(&self) -> &WrapManifest {
        &self.manifest
    }
}

/// Package whose instantiation panics
pub struct PanickingPackage {
    pub manifest: WrapManifest,
}

impl Default for PanickingPackage {
    fn default() -> Self {
        PanickingPackage {
            manifest: WrapManifest::plugin("panicking"),
        }
    }
}

#[async_trait]
impl WrapPackage for PanickingPackage {
    async fn create_wrapper(&self) -> WrapResult<Arc<dyn Wrapper>> {
        panic!("instantiation exploded")
    }

    fn get_manifest(&self) -> &WrapManifest {
        &self.manifest
    }
}

/// Wrapper that always answers with pre-encoded bytes
pub struct EncodedWrapper {
    pub manifest: WrapManifest,
    pub value: Value,
}

#[async_trait]
impl Wrapper for EncodedWrapper {
    async fn invoke(&self, _options: &InvokeOptions, _invoker: &dyn CoreClient) -> WrapResult<Payload> {
        let bytes = wrapline_types::encode(&self.value).expect("encodable test value");
        Ok(Payload::Bytes(bytes))
    }

    async fn get_file(&self, options: &GetFileOptions) -> WrapResult<FileContent> {
        match options.encoding {
            Some(_) => Ok(FileContent::Text(format!("contents of {}", options.path))),
            None => Ok(FileContent::Bytes(options.path.as_bytes().to_vec())),
        }
    }

    fn get_manifest(&self) -> &WrapManifest {
        &self.manifest
    }
}
