// Module manifest

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Uri;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestKind {
    Plugin,
    Wasm,
    Interface,
}

/// Description of a loaded module. The abi is opaque to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrapManifest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ManifestKind,
    pub version: String,
    #[serde(default)]
    pub implements: Vec<Uri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<Value>,
}

impl WrapManifest {
    pub fn new(name: impl Into<String>, kind: ManifestKind) -> Self {
        WrapManifest {
            name: name.into(),
            kind,
            version: "0.1".to_string(),
            implements: Vec::new(),
            abi: None,
        }
    }

    pub fn plugin(name: impl Into<String>) -> Self {
        WrapManifest::new(name, ManifestKind::Plugin)
    }

    pub fn with_implements(mut self, interface: Uri) -> Self {
        self.implements.push(interface);
        self
    }

    pub fn with_abi(mut self, abi: Value) -> Self {
        self.abi = Some(abi);
        self
    }
}
