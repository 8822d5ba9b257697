// Per-URI cache of instantiated wrappers

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use wrapline_error::WrapResult;
use wrapline_types::Uri;

use crate::wrapper::Wrapper;

type Slot = Arc<OnceCell<Arc<dyn Wrapper>>>;

/// Wrappers keyed by the URI of the package they were created from.
///
/// Concurrent loads of the same URI are serialized: the first caller runs
/// the loader and every other caller waits for and shares its result. A
/// failed load caches nothing, so a later call can retry.
#[derive(Default)]
pub struct WrapperCache {
    slots: Mutex<HashMap<Uri, Slot>>,
}

impl WrapperCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uri: &Uri) -> Option<Arc<dyn Wrapper>> {
        self.slots.lock().get(uri).and_then(|slot| slot.get().cloned())
    }

    pub fn set(&self, uri: Uri, wrapper: Arc<dyn Wrapper>) {
        let slot = Arc::new(OnceCell::new_with(Some(wrapper)));
        self.slots.lock().insert(uri, slot);
    }

    pub fn contains(&self, uri: &Uri) -> bool {
        self.get(uri).is_some()
    }

    pub fn remove(&self, uri: &Uri) -> Option<Arc<dyn Wrapper>> {
        self.slots.lock().remove(uri).and_then(|slot| slot.get().cloned())
    }

    /// Number of wrappers currently cached
    pub fn len(&self) -> usize {
        self.slots.lock().values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached wrapper for `uri`, running `load` if there is none.
    pub async fn get_or_load<F, Fut>(&self, uri: &Uri, load: F) -> WrapResult<Arc<dyn Wrapper>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = WrapResult<Arc<dyn Wrapper>>>,
    {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(uri.clone()).or_default())
        };
        let loaded = slot.get_or_try_init(load).await.cloned();
        if loaded.is_err() {
            self.discard_empty_slot(uri, &slot);
        }
        loaded
    }

    /// Drop a slot left empty by a failed load, unless another caller still
    /// holds it.
    fn discard_empty_slot(&self, uri: &Uri, slot: &Slot) {
        let mut slots = self.slots.lock();
        let unused = slots.get(uri).map_or(false, |current| {
            Arc::ptr_eq(current, slot) && !current.initialized() && Arc::strong_count(current) == 2
        });
        if unused {
            slots.remove(uri);
        }
    }
}

impl fmt::Debug for WrapperCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapperCache").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CoreClient;
    use crate::plugin::{PluginModule, PluginWrapper};
    use async_trait::async_trait;
    use serde_json::Value;
    use wrapline_error::{WrapError, WrapErrorCode};
    use wrapline_types::{Env, WrapManifest};

    struct Idle;

    #[async_trait]
    impl PluginModule for Idle {
        async fn call(&self, _: &str, _: Value, _: Option<&Env>, _: &dyn CoreClient) -> anyhow::Result<Value> {
            Ok(Value::Null)
        }
    }

    fn wrapper() -> Arc<dyn Wrapper> {
        Arc::new(PluginWrapper::new(Arc::new(Idle), WrapManifest::plugin("idle")))
    }

    #[tokio::test]
    async fn test_failed_load_can_be_retried() {
        let cache = WrapperCache::new();
        let uri = Uri::parse("wrap://test/flaky").unwrap();

        let failed = cache
            .get_or_load(&uri, || async {
                Err(WrapError::new(WrapErrorCode::ClientLoadWrapperError, "not yet"))
            })
            .await;
        assert!(failed.is_err());
        assert!(!cache.contains(&uri));
        assert!(cache.slots.lock().is_empty());

        let loaded = cache.get_or_load(&uri, || async { Ok(wrapper()) }).await.unwrap();
        let again = cache
            .get_or_load(&uri, || async {
                Err(WrapError::new(WrapErrorCode::ClientLoadWrapperError, "loader ran twice"))
            })
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&loaded, &again));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_loads_do_not_accumulate_slots() {
        let cache = WrapperCache::new();
        for index in 0..16 {
            let uri = Uri::parse(&format!("wrap://test/missing-{index}")).unwrap();
            let failed = cache
                .get_or_load(&uri, || async {
                    Err(WrapError::new(WrapErrorCode::ClientLoadWrapperError, "unavailable"))
                })
                .await;
            assert!(failed.is_err());
        }
        assert!(cache.slots.lock().is_empty());

        let uri = Uri::parse("wrap://test/present").unwrap();
        cache.get_or_load(&uri, || async { Ok(wrapper()) }).await.unwrap();
        assert_eq!(cache.slots.lock().len(), 1);
    }

    #[test]
    fn test_set_and_remove() {
        let cache = WrapperCache::new();
        let uri = Uri::parse("wrap://test/manual").unwrap();
        cache.set(uri.clone(), wrapper());
        assert!(cache.get(&uri).is_some());
        assert!(cache.remove(&uri).is_some());
        assert!(cache.is_empty());
    }
}
