// Configuration for the client
//
// A `ClientConfig` is a plain bag of registrations. `ClientConfigBuilder`
// folds several sources (code, TOML text, TOML files) into one config.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use wrapline_error::{ConfigError, ConfigResult};
use wrapline_types::{Env, EnvRegistration, InterfaceImplementations, Uri, UriRedirect};

use crate::cache::WrapperCache;
use crate::client::Client;
use crate::invocation::query::QueryParser;
use crate::plugin::{PluginPackage, PluginRegistration};
use crate::resolution::{
    ExtendableResolver, RecursiveResolver, ResolverAggregator, StaticEntry, StaticResolver,
    UriResolver,
};
use crate::wrapper::WrapPackage;

/// Everything a [`Client`] is built from. Unset components fall back to
/// the defaults chosen by [`Client::new`].
#[derive(Clone, Default)]
pub struct ClientConfig {
    pub redirects: Vec<UriRedirect>,
    pub plugins: Vec<PluginRegistration>,
    pub interfaces: Vec<InterfaceImplementations>,
    pub envs: Vec<EnvRegistration>,
    /// Replaces the default resolver chain entirely
    pub resolver: Option<Arc<dyn UriResolver>>,
    pub wrapper_cache: Option<Arc<WrapperCache>>,
    pub query_parser: Option<Arc<dyn QueryParser>>,
}

impl ClientConfig {
    /// Reject configurations a client cannot be built from
    pub fn validate(&self) -> ConfigResult<()> {
        let interface_uris: HashSet<&Uri> = self.interfaces.iter().map(|entry| &entry.interface).collect();
        let offending: Vec<String> = self
            .plugins
            .iter()
            .filter(|plugin| interface_uris.contains(&plugin.uri))
            .map(|plugin| plugin.uri.to_string())
            .collect();

        if offending.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::PluginUsesInterfaceUri(offending))
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("redirects", &self.redirects)
            .field("plugins", &self.plugins)
            .field("interfaces", &self.interfaces)
            .field("envs", &self.envs)
            .field("custom_resolver", &self.resolver.is_some())
            .field("custom_wrapper_cache", &self.wrapper_cache.is_some())
            .field("custom_query_parser", &self.query_parser.is_some())
            .finish()
    }
}

/// Resolver chain used when the config does not supply one:
/// static redirects and plugins first, then resolver extensions, with
/// redirects followed recursively.
pub fn default_resolver(config: &ClientConfig) -> Arc<dyn UriResolver> {
    let mut entries: Vec<StaticEntry> = config
        .redirects
        .iter()
        .cloned()
        .map(StaticEntry::Redirect)
        .collect();
    for plugin in &config.plugins {
        let package: Arc<dyn WrapPackage> = plugin.package.clone();
        entries.push(StaticEntry::Package {
            uri: plugin.uri.clone(),
            package,
        });
    }

    let aggregator = ResolverAggregator::new(vec![
        Arc::new(StaticResolver::from_entries(entries)),
        Arc::new(ExtendableResolver::new()),
    ]);
    Arc::new(RecursiveResolver::new(Arc::new(aggregator)))
}

//-----------------------------------------------------------------------------
// Builder
//-----------------------------------------------------------------------------

/// Accumulates configuration from several sources.
///
/// Folding rules: a later redirect or plugin for the same URI replaces the
/// earlier one, interface implementations are unioned in registration
/// order, and envs for the same URI are shallow-merged with later keys
/// winning.
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_redirect(mut self, from: Uri, to: Uri) -> Self {
        self.config.redirects.retain(|redirect| redirect.from != from);
        self.config.redirects.push(UriRedirect::new(from, to));
        self
    }

    pub fn add_plugin(mut self, uri: Uri, package: PluginPackage) -> Self {
        self.push_plugin(PluginRegistration::new(uri, package));
        self
    }

    pub fn add_interface_implementations(
        mut self,
        interface: Uri,
        implementations: impl IntoIterator<Item = Uri>,
    ) -> Self {
        self.push_implementations(interface, implementations);
        self
    }

    pub fn add_env(mut self, uri: Uri, env: Env) -> Self {
        self.push_env(uri, env);
        self
    }

    pub fn set_resolver(mut self, resolver: Arc<dyn UriResolver>) -> Self {
        self.config.resolver = Some(resolver);
        self
    }

    pub fn set_wrapper_cache(mut self, cache: Arc<WrapperCache>) -> Self {
        self.config.wrapper_cache = Some(cache);
        self
    }

    pub fn set_query_parser(mut self, parser: Arc<dyn QueryParser>) -> Self {
        self.config.query_parser = Some(parser);
        self
    }

    /// Fold another config into this one
    pub fn add(mut self, other: ClientConfig) -> Self {
        for redirect in other.redirects {
            self = self.add_redirect(redirect.from, redirect.to);
        }
        for plugin in other.plugins {
            self.push_plugin(plugin);
        }
        for entry in other.interfaces {
            self.push_implementations(entry.interface, entry.implementations);
        }
        for registration in other.envs {
            self.push_env(registration.uri, registration.env);
        }
        if other.resolver.is_some() {
            self.config.resolver = other.resolver;
        }
        if other.wrapper_cache.is_some() {
            self.config.wrapper_cache = other.wrapper_cache;
        }
        if other.query_parser.is_some() {
            self.config.query_parser = other.query_parser;
        }
        self
    }

    /// Fold registrations from TOML text.
    ///
    /// ```toml
    /// [[redirects]]
    /// from = "wrap://ens/old"
    /// to = "wrap://ens/new"
    ///
    /// [[interfaces]]
    /// interface = "wrap://ens/uri-resolver.core.polywrap.eth"
    /// implementations = ["wrap://ens/my-resolver"]
    ///
    /// [[envs]]
    /// uri = "wrap://ens/new"
    /// env = { key = "value" }
    /// ```
    pub fn add_toml(mut self, content: &str) -> ConfigResult<Self> {
        let file: ConfigFile = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;

        for redirect in file.redirects {
            self = self.add_redirect(Uri::parse(&redirect.from)?, Uri::parse(&redirect.to)?);
        }
        for entry in file.interfaces {
            let implementations = entry
                .implementations
                .iter()
                .map(|uri| Uri::parse(uri))
                .collect::<Result<Vec<_>, _>>()?;
            self.push_implementations(Uri::parse(&entry.interface)?, implementations);
        }
        for entry in file.envs {
            let env = match serde_json::to_value(&entry.env) {
                Ok(Value::Object(env)) => env,
                Ok(_) => return Err(ConfigError::Parse(format!("env for {} must be a table", entry.uri))),
                Err(err) => return Err(ConfigError::Parse(err.to_string())),
            };
            self.push_env(Uri::parse(&entry.uri)?, env);
        }
        Ok(self)
    }

    pub fn add_toml_file(self, path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        self.add_toml(&content)
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }

    pub fn build_client(self) -> ConfigResult<Client> {
        Client::new(self.config)
    }

    fn push_plugin(&mut self, plugin: PluginRegistration) {
        self.config.plugins.retain(|existing| existing.uri != plugin.uri);
        self.config.plugins.push(plugin);
    }

    fn push_implementations(&mut self, interface: Uri, implementations: impl IntoIterator<Item = Uri>) {
        let position = self
            .config
            .interfaces
            .iter()
            .position(|entry| entry.interface == interface);
        let entry = match position {
            Some(index) => &mut self.config.interfaces[index],
            None => {
                self.config
                    .interfaces
                    .push(InterfaceImplementations::new(interface, Vec::new()));
                let last = self.config.interfaces.len() - 1;
                &mut self.config.interfaces[last]
            }
        };
        for implementation in implementations {
            if !entry.implementations.contains(&implementation) {
                entry.implementations.push(implementation);
            }
        }
    }

    fn push_env(&mut self, uri: Uri, env: Env) {
        match self.config.envs.iter_mut().find(|registration| registration.uri == uri) {
            Some(registration) => registration.env.extend(env),
            None => self.config.envs.push(EnvRegistration::new(uri, env)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    redirects: Vec<RedirectEntry>,
    #[serde(default)]
    interfaces: Vec<InterfaceEntry>,
    #[serde(default)]
    envs: Vec<EnvEntry>,
}

#[derive(Debug, Deserialize)]
struct RedirectEntry {
    from: String,
    to: String,
}

#[derive(Debug, Deserialize)]
struct InterfaceEntry {
    interface: String,
    #[serde(default)]
    implementations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EnvEntry {
    uri: String,
    #[serde(default)]
    env: toml::value::Table,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use wrapline_types::WrapManifest;

    use crate::plugin::PluginModule;

    fn uri(s: &str) -> Uri {
        Uri::parse(s).unwrap()
    }

    fn env(value: Value) -> Env {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    struct Noop;

    #[async_trait::async_trait]
    impl PluginModule for Noop {
        async fn call(
            &self,
            _method: &str,
            _args: Value,
            _env: Option<&Env>,
            _client: &dyn crate::client::CoreClient,
        ) -> anyhow::Result<Value> {
            Ok(Value::Null)
        }
    }

    fn noop_package() -> PluginPackage {
        PluginPackage::from_module(WrapManifest::plugin("noop"), Arc::new(Noop))
    }

    #[test]
    fn test_folding_rules() {
        let config = ClientConfigBuilder::new()
            .add_redirect(uri("ens/a"), uri("ens/b"))
            .add_redirect(uri("ens/a"), uri("ens/c"))
            .add_interface_implementations(uri("ens/iface"), vec![uri("ens/i1"), uri("ens/i2")])
            .add_interface_implementations(uri("ens/iface"), vec![uri("ens/i2"), uri("ens/i3")])
            .add_env(uri("ens/a"), env(json!({ "x": 1, "y": 1 })))
            .add_env(uri("ens/a"), env(json!({ "y": 2 })))
            .build();

        assert_eq!(config.redirects, vec![UriRedirect::new(uri("ens/a"), uri("ens/c"))]);
        assert_eq!(config.interfaces.len(), 1);
        assert_eq!(
            config.interfaces[0].implementations,
            vec![uri("ens/i1"), uri("ens/i2"), uri("ens/i3")]
        );
        assert_eq!(config.envs.len(), 1);
        assert_eq!(Value::Object(config.envs[0].env.clone()), json!({ "x": 1, "y": 2 }));
    }

    #[test]
    fn test_plugin_on_interface_uri_is_rejected() {
        let config = ClientConfigBuilder::new()
            .add_plugin(uri("ens/iface"), noop_package())
            .add_interface_implementations(uri("ens/iface"), vec![uri("ens/impl")])
            .build();

        let err = config.validate().unwrap_err();
        assert_eq!(err, ConfigError::PluginUsesInterfaceUri(vec!["wrap://ens/iface".to_string()]));
    }

    #[test]
    fn test_later_plugin_replaces_earlier() {
        let config = ClientConfigBuilder::new()
            .add_plugin(uri("ens/p"), noop_package())
            .add_plugin(uri("ens/p"), noop_package())
            .build();
        assert_eq!(config.plugins.len(), 1);
    }

    #[test]
    fn test_add_toml() {
        let content = r#"
            [[redirects]]
            from = "wrap://ens/old"
            to = "wrap://ens/new"

            [[interfaces]]
            interface = "ens/iface"
            implementations = ["ens/impl1", "ens/impl2"]

            [[envs]]
            uri = "ens/new"
            env = { key = "value", nested = { n = 3 } }
        "#;

        let config = ClientConfigBuilder::new().add_toml(content).unwrap().build();
        assert_eq!(config.redirects[0].to, uri("ens/new"));
        assert_eq!(config.interfaces[0].implementations.len(), 2);
        assert_eq!(config.envs[0].env["key"], "value");
        assert_eq!(config.envs[0].env["nested"]["n"], 3);
    }

    #[test]
    fn test_add_toml_errors() {
        let bad_syntax = ClientConfigBuilder::new().add_toml("[[redirects]\nfrom =");
        assert!(matches!(bad_syntax, Err(ConfigError::Parse(_))));

        let bad_uri = ClientConfigBuilder::new().add_toml("[[redirects]]\nfrom = \"\"\nto = \"ens/b\"\n");
        assert!(matches!(bad_uri, Err(ConfigError::InvalidUri(_))));

        let missing = ClientConfigBuilder::new().add_toml_file("/definitely/not/here.toml");
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_add_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[redirects]]\nfrom = \"ens/a\"\nto = \"ens/b\"").unwrap();

        let config = ClientConfigBuilder::new().add_toml_file(file.path()).unwrap().build();
        assert_eq!(config.redirects.len(), 1);
    }
}
