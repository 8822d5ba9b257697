// Canonical module address

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use wrapline_error::UriError;

/// The only scheme understood by the engine
pub const WRAP_SCHEME: &str = "wrap";

/// Interface implemented by every resolver extension module
pub const URI_RESOLVER_INTERFACE: &str = "wrap://ens/uri-resolver.core.polywrap.eth";

/// A parsed and normalized `wrap://authority/path` address.
///
/// Two URIs are equal iff their normalized string forms are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uri {
    uri: String,
    authority: String,
    path: String,
}

impl Uri {
    /// Parse and normalize an input string.
    ///
    /// Leading slashes are dropped and a missing scheme defaults to `wrap://`,
    /// so `ens/foo.eth`, `//ens/foo.eth` and `wrap://ens/foo.eth` are the same URI.
    pub fn parse(input: &str) -> Result<Self, UriError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(UriError::malformed(input, "empty input"));
        }

        let processed = trimmed.trim_start_matches('/');
        let rest = match processed.find("://") {
            Some(idx) => {
                let scheme = &processed[..idx];
                if scheme != WRAP_SCHEME {
                    return Err(UriError::malformed(
                        input,
                        format!("unsupported scheme \"{}\", expected \"{}\"", scheme, WRAP_SCHEME),
                    ));
                }
                &processed[idx + 3..]
            }
            None => processed,
        };

        let (authority, path) = rest
            .split_once('/')
            .ok_or_else(|| UriError::malformed(input, "missing path after authority"))?;

        if !is_valid_authority(authority) {
            return Err(UriError::malformed(
                input,
                format!("invalid authority \"{}\"", authority),
            ));
        }
        if path.is_empty() {
            return Err(UriError::malformed(input, "empty path"));
        }

        Ok(Uri {
            uri: format!("{}://{}/{}", WRAP_SCHEME, authority, path),
            authority: authority.to_string(),
            path: path.to_string(),
        })
    }

    /// Whether the input parses as a URI
    pub fn is_valid(input: &str) -> bool {
        Uri::parse(input).is_ok()
    }

    pub fn scheme(&self) -> &str {
        WRAP_SCHEME
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Normalized string form
    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

/// Authority: a lowercase letter followed by one or more of `[a-z0-9-_]`
fn is_valid_authority(authority: &str) -> bool {
    let mut chars = authority.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }
    let rest = chars.as_str();
    !rest.is_empty()
        && rest
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

/// The well-known resolver extension interface.
pub fn uri_resolver_interface() -> Uri {
    Uri {
        uri: URI_RESOLVER_INTERFACE.to_string(),
        authority: "ens".to_string(),
        path: "uri-resolver.core.polywrap.eth".to_string(),
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

impl AsRef<str> for Uri {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

impl FromStr for Uri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uri::parse(s)
    }
}

impl TryFrom<&str> for Uri {
    type Error = UriError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Uri::parse(value)
    }
}

impl TryFrom<String> for Uri {
    type Error = UriError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Uri::parse(&value)
    }
}

impl Serialize for Uri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.uri)
    }
}

impl<'de> Deserialize<'de> for Uri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Uri::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_forms_are_equal() {
        let full = Uri::parse("wrap://ens/foo.eth").unwrap();
        let bare = Uri::parse("ens/foo.eth").unwrap();
        let slashed = Uri::parse("//ens/foo.eth").unwrap();
        let padded = Uri::parse("  wrap://ens/foo.eth ").unwrap();

        assert_eq!(full, bare);
        assert_eq!(full, slashed);
        assert_eq!(full, padded);
        assert_eq!(full.as_str(), "wrap://ens/foo.eth");
        assert_eq!(full.authority(), "ens");
        assert_eq!(full.path(), "foo.eth");
    }

    #[test]
    fn test_path_keeps_inner_slashes() {
        let uri = Uri::parse("wrap://fs/some/nested/path").unwrap();
        assert_eq!(uri.authority(), "fs");
        assert_eq!(uri.path(), "some/nested/path");
    }

    #[test]
    fn test_malformed_inputs() {
        for input in [
            "",
            "   ",
            "wrap://",
            "wrap://ens",
            "wrap://ens/",
            "wrap://E/foo",
            "wrap://1ns/foo",
            "wrap://e/foo",
            "ipfs://QmHash/foo",
        ] {
            assert!(Uri::parse(input).is_err(), "expected {:?} to be rejected", input);
        }
    }

    #[test]
    fn test_resolver_interface_constant_is_normalized() {
        assert_eq!(
            uri_resolver_interface(),
            Uri::parse(URI_RESOLVER_INTERFACE).unwrap()
        );
    }

    #[test]
    fn test_serde_as_string() {
        let uri = Uri::parse("ens/foo.eth").unwrap();
        let json = serde_json::to_string(&uri).unwrap();
        assert_eq!(json, "\"wrap://ens/foo.eth\"");

        let back: Uri = serde_json::from_str(&json).unwrap();
        assert_eq!(back, uri);
        assert!(serde_json::from_str::<Uri>("\"not a uri\"").is_err());
    }
}
