// Resolver backed by a fixed table of redirects, packages and wrappers

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;
use wrapline_error::ResolutionResult;
use wrapline_types::{Uri, UriRedirect};

use super::{ResolutionContext, ResolutionStep, UriPackageOrWrapper, UriResolver};
use crate::client::CoreClient;
use crate::wrapper::{WrapPackage, Wrapper};

/// A registration accepted by [`StaticResolver::from_entries`]
#[derive(Clone)]
pub enum StaticEntry {
    Redirect(UriRedirect),
    Package {
        uri: Uri,
        package: Arc<dyn WrapPackage>,
    },
    Wrapper {
        uri: Uri,
        wrapper: Arc<dyn Wrapper>,
    },
    /// Entries flattened in place, at any depth
    Group(Vec<StaticEntry>),
}

impl From<UriRedirect> for StaticEntry {
    fn from(redirect: UriRedirect) -> Self {
        StaticEntry::Redirect(redirect)
    }
}

#[derive(Default, Clone)]
pub struct StaticResolver {
    uri_map: HashMap<Uri, UriPackageOrWrapper>,
}

impl StaticResolver {
    pub fn new(uri_map: HashMap<Uri, UriPackageOrWrapper>) -> Self {
        StaticResolver { uri_map }
    }

    /// Build the lookup table. When two entries share a source URI the later
    /// one wins.
    pub fn from_entries(entries: impl IntoIterator<Item = StaticEntry>) -> Self {
        let mut uri_map = HashMap::new();
        for entry in entries {
            insert_entry(&mut uri_map, entry);
        }
        StaticResolver { uri_map }
    }

    pub fn len(&self) -> usize {
        self.uri_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uri_map.is_empty()
    }
}

fn insert_entry(uri_map: &mut HashMap<Uri, UriPackageOrWrapper>, entry: StaticEntry) {
    match entry {
        StaticEntry::Redirect(redirect) => {
            uri_map.insert(redirect.from, UriPackageOrWrapper::Redirect(redirect.to));
        }
        StaticEntry::Package { uri, package } => {
            uri_map.insert(uri.clone(), UriPackageOrWrapper::Package { uri, package });
        }
        StaticEntry::Wrapper { uri, wrapper } => {
            uri_map.insert(uri.clone(), UriPackageOrWrapper::Wrapper { uri, wrapper });
        }
        StaticEntry::Group(entries) => {
            for entry in entries {
                insert_entry(uri_map, entry);
            }
        }
    }
}

#[async_trait]
impl UriResolver for StaticResolver {
    async fn try_resolve_uri(
        &self,
        uri: &Uri,
        _client: &dyn CoreClient,
        context: &mut ResolutionContext,
    ) -> ResolutionResult<UriPackageOrWrapper> {
        let (outcome, description) = match self.uri_map.get(uri) {
            Some(UriPackageOrWrapper::Redirect(target)) => (
                UriPackageOrWrapper::Redirect(target.clone()),
                format!("StaticResolver - Redirect ({uri} - {target})"),
            ),
            Some(found @ UriPackageOrWrapper::Package { .. }) => {
                (found.clone(), format!("StaticResolver - Package ({uri})"))
            }
            Some(found @ UriPackageOrWrapper::Wrapper { .. }) => {
                (found.clone(), format!("StaticResolver - Wrapper ({uri})"))
            }
            None => (
                UriPackageOrWrapper::Redirect(uri.clone()),
                "StaticResolver - Miss".to_string(),
            ),
        };

        trace!(%uri, outcome = ?outcome, "static lookup");
        context.track_step(
            ResolutionStep::new(uri.clone(), Ok(outcome.clone())).with_description(description),
        );
        Ok(outcome)
    }
}
