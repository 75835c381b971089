//! Cache store abstraction and the in-memory implementation.
//!
//! The controller never talks to a concrete store directly; it goes through
//! [`CacheStorage`], a durable key-value service keyed by request URL and
//! namespaced by generation name. This keeps the caching policy testable
//! without a real browser cache.

use async_trait::async_trait;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use scout_common::Result;

use crate::fetch::FetchResponse;

/// A cached request/response pair.
///
/// Entries are overwritten wholesale on update, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Request URL.
    pub url: String,

    /// Request method.
    pub method: String,

    /// Response status.
    pub status: u16,

    /// Response status text.
    pub status_text: String,

    /// Response headers.
    pub headers: HashMap<String, String>,

    /// Response body.
    pub body: Vec<u8>,

    /// Cached at timestamp (ms since epoch).
    pub cached_at: u64,
}

impl CacheEntry {
    /// Snapshot a response for storage. Only GET responses are ever cached.
    pub fn from_response(url: &str, response: &FetchResponse) -> Self {
        Self {
            url: url.to_string(),
            method: "GET".to_string(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers.clone(),
            body: response.body.clone(),
            cached_at: now_ms(),
        }
    }

    /// Rehydrate the stored snapshot as a response.
    pub fn into_response(self) -> FetchResponse {
        FetchResponse {
            status: self.status,
            status_text: self.status_text,
            headers: self.headers,
            body: self.body,
            from_cache: true,
        }
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Durable cache store, namespaced by generation name.
///
/// Put/get are atomic per key; the controller never needs stronger isolation
/// (concurrent writes to one URL are last-writer-wins full replacements).
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open (create if missing) a generation.
    async fn open(&self, name: &str) -> Result<()>;

    /// Look up a stored entry by URL within a generation.
    async fn match_entry(&self, name: &str, url: &str) -> Result<Option<CacheEntry>>;

    /// Store an entry, replacing any prior entry for the same URL.
    async fn put(&self, name: &str, entry: CacheEntry) -> Result<()>;

    /// Delete a whole generation. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// List all generation names.
    async fn keys(&self) -> Result<Vec<String>>;

    /// List the entry URLs stored in a generation.
    async fn entries(&self, name: &str) -> Result<Vec<String>>;
}

/// In-memory cache store.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    caches: RwLock<HashMap<String, HashMap<String, CacheEntry>>>,
}

impl MemoryCacheStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<()> {
        let mut caches = self.caches.write().await;
        caches.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn match_entry(&self, name: &str, url: &str) -> Result<Option<CacheEntry>> {
        let caches = self.caches.read().await;
        Ok(caches.get(name).and_then(|cache| cache.get(url)).cloned())
    }

    async fn put(&self, name: &str, entry: CacheEntry) -> Result<()> {
        let mut caches = self.caches.write().await;
        caches
            .entry(name.to_string())
            .or_default()
            .insert(entry.url.clone(), entry);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let mut caches = self.caches.write().await;
        Ok(caches.remove(name).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let caches = self.caches.read().await;
        Ok(caches.keys().cloned().collect())
    }

    async fn entries(&self, name: &str) -> Result<Vec<String>> {
        let caches = self.caches.read().await;
        Ok(caches
            .get(name)
            .map(|cache| cache.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str, body: &[u8]) -> CacheEntry {
        CacheEntry::from_response(url, &FetchResponse::ok(body.to_vec()))
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let store = MemoryCacheStorage::new();
        store.open("v1").await.unwrap();
        store
            .put("v1", entry("https://example.com/app.css", b"body{}"))
            .await
            .unwrap();

        let found = store
            .match_entry("v1", "https://example.com/app.css")
            .await
            .unwrap();
        assert_eq!(found.unwrap().body, b"body{}");

        let missing = store
            .match_entry("v1", "https://example.com/other.css")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_wholesale() {
        let store = MemoryCacheStorage::new();
        store
            .put("v1", entry("https://example.com/a", b"old"))
            .await
            .unwrap();
        store
            .put("v1", entry("https://example.com/a", b"new"))
            .await
            .unwrap();

        let found = store
            .match_entry("v1", "https://example.com/a")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.body, b"new");

        let urls = store.entries("v1").await.unwrap();
        assert_eq!(urls.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_generation() {
        let store = MemoryCacheStorage::new();
        store.open("v1").await.unwrap();
        store.open("v2").await.unwrap();

        assert!(store.delete("v1").await.unwrap());
        assert!(!store.delete("v1").await.unwrap());

        let keys = store.keys().await.unwrap();
        assert_eq!(keys, vec!["v2".to_string()]);
    }

    #[tokio::test]
    async fn test_match_in_missing_generation() {
        let store = MemoryCacheStorage::new();
        let found = store
            .match_entry("v9", "https://example.com/a")
            .await
            .unwrap();
        assert!(found.is_none());
        assert!(store.entries("v9").await.unwrap().is_empty());
    }

    #[test]
    fn test_entry_round_trip() {
        let response = FetchResponse::ok(b"<html></html>".to_vec());
        let entry = CacheEntry::from_response("https://example.com/", &response);
        assert_eq!(entry.method, "GET");

        let rehydrated = entry.into_response();
        assert_eq!(rehydrated.status, 200);
        assert!(rehydrated.from_cache);
        assert_eq!(rehydrated.body, b"<html></html>");
    }
}
