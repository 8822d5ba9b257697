//! Leaf value types shared by the wrapline engine: canonical URIs, the
//! binary codec, invocation payloads and the static configuration entries
//! (redirects, interface implementations, envs).

pub mod codec;
pub mod frequency;
pub mod implementations;
pub mod manifest;
pub mod payload;
pub mod registration;
pub mod uri;

pub use codec::{decode, encode};
pub use frequency::{Frequency, DEFAULT_FREQUENCY_MS};
pub use implementations::{apply_redirects, get_implementations};
pub use manifest::{ManifestKind, WrapManifest};
pub use payload::Payload;
pub use registration::{Env, EnvRegistration, InterfaceImplementations, UriRedirect};
pub use uri::{uri_resolver_interface, Uri, URI_RESOLVER_INTERFACE};
