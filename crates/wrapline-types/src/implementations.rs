// Redirect application and interface implementation lookup

use std::collections::HashMap;

use wrapline_error::{ResolutionError, ResolutionResult};

use crate::{InterfaceImplementations, Uri, UriRedirect};

/// Follow configured redirects from `uri` until none applies.
///
/// A later redirect for the same `from` overrides an earlier one. A redirect
/// to itself stops the walk; revisiting any other URI is a cycle.
pub fn apply_redirects(uri: &Uri, redirects: &[UriRedirect]) -> ResolutionResult<Uri> {
    let mut table: HashMap<&Uri, &Uri> = HashMap::new();
    for redirect in redirects {
        table.insert(&redirect.from, &redirect.to);
    }

    let mut visited = vec![uri.clone()];
    let mut current = uri.clone();

    while let Some(&next) = table.get(&current) {
        if *next == current {
            break;
        }
        if visited.contains(next) {
            let mut path: Vec<String> = visited.iter().map(|u| u.to_string()).collect();
            path.push(next.to_string());
            return Err(ResolutionError::InfiniteLoop {
                uri: uri.to_string(),
                path,
            });
        }
        visited.push(next.clone());
        current = next.clone();
    }

    Ok(current)
}

/// All implementations registered for `interface`, in registration order and
/// without duplicates. When `redirects` is given, both the queried interface
/// and every registered interface URI are redirect-expanded before matching.
pub fn get_implementations(
    interface: &Uri,
    interfaces: &[InterfaceImplementations],
    redirects: Option<&[UriRedirect]>,
) -> ResolutionResult<Vec<Uri>> {
    let target = match redirects {
        Some(redirects) => apply_redirects(interface, redirects)?,
        None => interface.clone(),
    };

    let mut result: Vec<Uri> = Vec::new();
    for entry in interfaces {
        let entry_uri = match redirects {
            Some(redirects) => apply_redirects(&entry.interface, redirects)?,
            None => entry.interface.clone(),
        };
        if entry_uri != target {
            continue;
        }
        for implementation in &entry.implementations {
            if !result.contains(implementation) {
                result.push(implementation.clone());
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Uri {
        Uri::parse(s).unwrap()
    }

    fn redirect(from: &str, to: &str) -> UriRedirect {
        UriRedirect::new(uri(from), uri(to))
    }

    #[test]
    fn test_redirect_chain_and_override() {
        let redirects = vec![
            redirect("ens/a", "ens/b"),
            redirect("ens/b", "ens/c"),
            redirect("ens/a", "ens/d"),
        ];
        assert_eq!(apply_redirects(&uri("ens/a"), &redirects).unwrap(), uri("ens/d"));
        assert_eq!(apply_redirects(&uri("ens/b"), &redirects).unwrap(), uri("ens/c"));
        assert_eq!(apply_redirects(&uri("ens/x"), &redirects).unwrap(), uri("ens/x"));
    }

    #[test]
    fn test_redirect_cycle_detected() {
        let redirects = vec![redirect("ens/a", "ens/b"), redirect("ens/b", "ens/a")];
        let err = apply_redirects(&uri("ens/a"), &redirects).unwrap_err();
        match err {
            ResolutionError::InfiniteLoop { uri, path } => {
                assert_eq!(uri, "wrap://ens/a");
                assert_eq!(path, vec!["wrap://ens/a", "wrap://ens/b", "wrap://ens/a"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_self_redirect_is_noop() {
        let redirects = vec![redirect("ens/a", "ens/a")];
        assert_eq!(apply_redirects(&uri("ens/a"), &redirects).unwrap(), uri("ens/a"));
    }

    #[test]
    fn test_implementations_unique_and_ordered() {
        let interfaces = vec![
            InterfaceImplementations::new(uri("ens/iface"), vec![uri("ens/impl1"), uri("ens/impl2")]),
            InterfaceImplementations::new(uri("ens/other"), vec![uri("ens/impl3")]),
            InterfaceImplementations::new(uri("ens/iface"), vec![uri("ens/impl2"), uri("ens/impl4")]),
        ];

        let impls = get_implementations(&uri("ens/iface"), &interfaces, None).unwrap();
        assert_eq!(impls, vec![uri("ens/impl1"), uri("ens/impl2"), uri("ens/impl4")]);
    }

    #[test]
    fn test_implementations_through_redirects() {
        let interfaces = vec![
            InterfaceImplementations::new(uri("ens/old-iface"), vec![uri("ens/impl1")]),
            InterfaceImplementations::new(uri("ens/new-iface"), vec![uri("ens/impl2")]),
        ];
        let redirects = vec![redirect("ens/old-iface", "ens/new-iface")];

        let without = get_implementations(&uri("ens/new-iface"), &interfaces, None).unwrap();
        assert_eq!(without, vec![uri("ens/impl2")]);

        let with = get_implementations(&uri("ens/old-iface"), &interfaces, Some(&redirects)).unwrap();
        assert_eq!(with, vec![uri("ens/impl1"), uri("ens/impl2")]);
    }
}
