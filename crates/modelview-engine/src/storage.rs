//! Session-scoped key/value persistence.
//!
//! The viewer remembers the last displayed locator so a page reload can
//! show the same model again. Web builds back this with `sessionStorage`;
//! native hosts and tests use the in-memory store.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store. Clones share the same map, so a host can keep a handle
/// to inspect what the viewer persisted.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        store
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

/// `window.sessionStorage`. Storage failures (quota, privacy mode) are
/// logged and otherwise ignored.
#[cfg(target_arch = "wasm32")]
pub struct WebSessionStore {
    storage: Option<web_sys::Storage>,
}

#[cfg(target_arch = "wasm32")]
impl WebSessionStore {
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|w| w.session_storage().ok().flatten());
        if storage.is_none() {
            tracing::warn!("sessionStorage unavailable; last model will not persist");
        }
        Self { storage }
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for WebSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
impl SessionStore for WebSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.set_item(key, value) {
                tracing::warn!("sessionStorage write failed: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_shared_between_clones() {
        let handle = MemoryStore::new();
        let mut store = handle.clone();

        assert_eq!(handle.get("k"), None);
        store.set("k", "v1");
        store.set("k", "v2");
        assert_eq!(handle.get("k").as_deref(), Some("v2"));
    }
}
