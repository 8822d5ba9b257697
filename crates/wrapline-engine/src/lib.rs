//! URI resolution and module invocation engine.
//!
//! A [`Client`] resolves a `wrap://` URI through a chain of resolvers down to
//! a package or a live wrapper, instantiates (and caches) it, and performs
//! typed invocations against it. Batched invocation is offered by
//! [`Client::query`] and periodic invocation by [`Client::subscribe`].

pub mod cache;
pub mod client;
pub mod config;
pub mod invocation;
pub mod plugin;
pub mod resolution;
pub mod telemetry;
pub mod wrapper;

pub use cache::WrapperCache;
pub use client::{Client, CoreClient};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use invocation::query::{JsonQueryParser, QueryInvocation, QueryOptions, QueryParser, QueryResult};
pub use invocation::subscription::{SubscribeOptions, Subscription};
pub use invocation::{InvokeOptions, InvokeResult};
pub use plugin::{PluginModule, PluginPackage, PluginRegistration, PluginWrapper};
pub use resolution::{
    build_clean_uri_history, ExtendableResolver, RecursiveResolver, ResolutionContext,
    ResolutionStep, ResolverAggregator, ResolverWrapperAdapter, StaticEntry, StaticResolver,
    UriPackageOrWrapper, UriResolver,
};
pub use wrapper::{FileContent, GetFileOptions, PackageLoader, WrapPackage, Wrapper};

pub use wrapline_error::{
    ConfigError, ResolutionError, ResolutionResult, WrapCoreError, WrapError, WrapErrorCode, WrapResult,
};
pub use wrapline_types::{
    Env, EnvRegistration, Frequency, InterfaceImplementations, Payload, Uri, UriRedirect,
    WrapManifest,
};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
