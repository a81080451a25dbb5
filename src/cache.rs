//! Response cache.
//!
//! A process-lifetime key/value store of prior responses, keyed by the
//! **literal request URL string**. Method and headers do not vary the key, so
//! a `GET` and a `POST` to the same URL share one slot.
//!
//! Which requests read or write the cache is decided by the request's
//! [`CacheMode`](crate::net::CacheMode):
//!
//! | mode             | read              | write on success |
//! |------------------|-------------------|------------------|
//! | `only-if-cached` | yes, miss = error | no               |
//! | `force-cache`    | yes               | yes              |
//! | `reload`         | no                | yes              |
//! | `no-cache`       | no                | yes              |
//! | `no-store`       | no                | no               |
//! | `default`        | no                | no               |
//!
//! Entries are never evicted automatically; use [`ResponseCache::remove`] or
//! [`ResponseCache::clear`].
//!
//! # Concurrency model
//! The store is internally synchronized with a `RwLock`, but no lock spans a
//! whole fetch. Two concurrent fetches of the same URL both dispatch and the
//! last one to finish wins the slot.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;

use crate::net::response::{Response, ResponseInit};

/// Shared handle to a response cache.
pub type ResponseCacheHandle = Arc<ResponseCache>;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("header {0} has a non-textual value and cannot be snapshotted")]
    HeaderValue(String),
}

/// Snapshot of a response, as stored in the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub status: u16,
    pub status_text: String,
    /// Header pairs in the order they were received.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl CacheEntry {
    /// Snapshots `response`. Fails when a header value is not visible ASCII.
    pub fn from_response(response: &Response) -> Result<Self, CacheError> {
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                v.to_str()
                    .map(|v| (k.as_str().to_string(), v.to_string()))
                    .map_err(|_| CacheError::HeaderValue(k.as_str().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            status: response.status(),
            status_text: response.status_text().to_string(),
            headers,
            body: response.bytes(),
        })
    }

    /// Rebuilds a response from the snapshot. The body is copied, so the
    /// caller never shares a buffer with the cache.
    pub fn to_response(&self) -> Response {
        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (k, v) in &self.headers {
            if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(k.as_bytes()), HeaderValue::from_str(v)) {
                headers.append(name, value);
            }
        }
        Response::new(
            Bytes::copy_from_slice(&self.body),
            ResponseInit {
                status: self.status,
                status_text: self.status_text.clone(),
                headers,
            },
        )
    }
}

/// In-memory response cache.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cache wrapped in a shareable handle.
    pub fn handle() -> ResponseCacheHandle {
        Arc::new(Self::new())
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Stores `entry` under `key`, replacing any previous entry.
    pub fn put(&self, key: impl Into<String>, entry: CacheEntry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), entry);
    }

    /// Snapshots and stores `response`. Best-effort: a failed snapshot is
    /// logged and leaves the previous entry in place.
    pub fn store_response(&self, key: &str, response: &Response) -> bool {
        match CacheEntry::from_response(response) {
            Ok(entry) => {
                self.put(key, entry);
                true
            }
            Err(e) => {
                log::warn!("not caching response for {key}: {e}");
                false
            }
        }
    }

    pub fn remove(&self, key: &str) -> Option<CacheEntry> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
