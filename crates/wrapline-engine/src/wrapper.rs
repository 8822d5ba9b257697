// Module and package capabilities implemented outside the engine

use std::sync::Arc;

use async_trait::async_trait;
use wrapline_error::WrapResult;
use wrapline_types::{Payload, Uri, WrapManifest};

use crate::client::CoreClient;
use crate::invocation::InvokeOptions;

/// Options for reading a file bundled with a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetFileOptions {
    pub path: String,
    /// When set, the file is returned as text in this encoding
    pub encoding: Option<String>,
}

impl GetFileOptions {
    pub fn new(path: impl Into<String>) -> Self {
        GetFileOptions {
            path: path.into(),
            encoding: None,
        }
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Bytes(Vec<u8>),
}

/// A loaded, invocable module.
#[async_trait]
pub trait Wrapper: Send + Sync {
    /// Execute `options.method`. The returned payload may be structured or
    /// already encoded; the client normalizes it for the caller.
    async fn invoke(&self, options: &InvokeOptions, invoker: &dyn CoreClient) -> WrapResult<Payload>;

    async fn get_file(&self, options: &GetFileOptions) -> WrapResult<FileContent>;

    fn get_manifest(&self) -> &WrapManifest;
}

/// A module that has been located but not yet instantiated.
#[async_trait]
pub trait WrapPackage: Send + Sync {
    async fn create_wrapper(&self) -> WrapResult<Arc<dyn Wrapper>>;

    fn get_manifest(&self) -> &WrapManifest;
}

/// Turns a manifest returned by a resolver extension into a package.
pub trait PackageLoader: Send + Sync {
    fn load_package(
        &self,
        uri: &Uri,
        manifest: &[u8],
        resolver: &Uri,
    ) -> WrapResult<Arc<dyn WrapPackage>>;
}
