//! Transient URL-addressable caption resources
//!
//! A [`BlobStore`] hands out `blob:streamtv/<uuid>` URLs for converted
//! caption documents. Each URL is owned by exactly one [`BlobHandle`];
//! dropping the handle revokes the URL, so a resource is released exactly
//! once on every path (supersession, teardown, stale results, errors).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

const URL_PREFIX: &str = "blob:streamtv/";

#[derive(Debug, Default)]
struct Inner {
    entries: Mutex<HashMap<String, Arc<str>>>,
    created: AtomicUsize,
    revoked: AtomicUsize,
}

/// Shared registry of live transient resources
#[derive(Debug, Clone, Default)]
pub struct BlobStore {
    inner: Arc<Inner>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register content and return the owning handle
    pub fn create(&self, content: impl Into<Arc<str>>) -> BlobHandle {
        let url = format!("{}{}", URL_PREFIX, Uuid::new_v4());
        if let Ok(mut entries) = self.inner.entries.lock() {
            entries.insert(url.clone(), content.into());
        }
        self.inner.created.fetch_add(1, Ordering::Relaxed);
        BlobHandle {
            url,
            store: self.clone(),
        }
    }

    /// Content behind a live URL
    pub fn read(&self, url: &str) -> Option<Arc<str>> {
        self.inner.entries.lock().ok()?.get(url).cloned()
    }

    /// Number of URLs currently allocated
    pub fn live_count(&self) -> usize {
        self.inner.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Total URLs ever created
    pub fn created_count(&self) -> usize {
        self.inner.created.load(Ordering::Relaxed)
    }

    /// Total URLs ever revoked
    pub fn revoked_count(&self) -> usize {
        self.inner.revoked.load(Ordering::Relaxed)
    }

    fn revoke(&self, url: &str) {
        let removed = self
            .inner
            .entries
            .lock()
            .map(|mut e| e.remove(url).is_some())
            .unwrap_or(false);
        if removed {
            self.inner.revoked.fetch_add(1, Ordering::Relaxed);
            debug!(url, "revoked caption resource");
        }
    }
}

/// Exclusive owner of one transient URL
#[derive(Debug)]
pub struct BlobHandle {
    url: String,
    store: BlobStore,
}

impl BlobHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Content behind this handle
    pub fn content(&self) -> Option<Arc<str>> {
        self.store.read(&self.url)
    }
}

impl Drop for BlobHandle {
    fn drop(&mut self) {
        self.store.revoke(&self.url);
    }
}
