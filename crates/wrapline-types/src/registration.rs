// Static configuration entries consumed by the client

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Uri;

/// Environment object handed to a module on invocation
pub type Env = Map<String, Value>;

/// A configured `from -> to` mapping
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UriRedirect {
    pub from: Uri,
    pub to: Uri,
}

impl UriRedirect {
    pub fn new(from: Uri, to: Uri) -> Self {
        UriRedirect { from, to }
    }
}

/// Implementations registered for an interface URI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceImplementations {
    pub interface: Uri,
    pub implementations: Vec<Uri>,
}

impl InterfaceImplementations {
    pub fn new(interface: Uri, implementations: Vec<Uri>) -> Self {
        InterfaceImplementations {
            interface,
            implementations,
        }
    }
}

/// Env registered for a URI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvRegistration {
    pub uri: Uri,
    pub env: Env,
}

impl EnvRegistration {
    pub fn new(uri: Uri, env: Env) -> Self {
        EnvRegistration { uri, env }
    }
}
