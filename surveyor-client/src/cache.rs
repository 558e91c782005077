//! Query result cache keyed by adapter, method, scope, type and query.
use std::{
    collections::HashMap,
    fmt,
    time::{Duration, Instant},
};

use parking_lot::RwLock;
use surveyor_core::{Item, QueryMethod};

/// How long results live unless an adapter overrides it.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Canonical identity of one cached query result.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Adapter that ran the query
    pub adapter: String,
    /// Query method
    pub method: QueryMethod,
    /// Scope the query ran in
    pub scope: String,
    /// Item type string
    pub item_type: String,
    /// The query term; empty for LIST
    pub query: String,
}

impl CacheKey {
    /// Build a key from its parts.
    pub fn new(
        adapter: impl Into<String>,
        method: QueryMethod,
        scope: impl Into<String>,
        item_type: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            adapter: adapter.into(),
            method,
            scope: scope.into(),
            item_type: item_type.into(),
            query: query.into(),
        }
    }
}

struct Entry {
    items: Vec<Item>,
    expires_at: Instant,
}

/// Concurrent TTL cache for query results.
///
/// Stored on success only; a lookup that bypasses the cache still yields the
/// canonical key so the fresh result can be stored under it. Expired entries
/// are evicted lazily on lookup.
#[derive(Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<CacheKey, Entry>>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("len", &self.entries.read().len())
            .finish()
    }
}

impl QueryCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the cached items for `key`, unless expired or bypassed.
    pub fn lookup(&self, key: &CacheKey, ignore_cache: bool) -> Option<Vec<Item>> {
        if ignore_cache {
            tracing::trace!(adapter = %key.adapter, method = %key.method, "cache bypassed");
            return None;
        }
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => {
                    tracing::trace!(adapter = %key.adapter, method = %key.method, "cache hit");
                    return Some(entry.items.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Expired; evict under the write lock, re-checking in case a
        // concurrent store refreshed it.
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|e| e.expires_at <= now) {
            entries.remove(key);
        }
        None
    }

    /// Store a successful result under `key`.
    pub fn store(&self, key: CacheKey, items: Vec<Item>, ttl: Duration) {
        let entry = Entry {
            items,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().insert(key, entry);
    }

    /// Number of live entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::Map;
    use surveyor_core::Item;

    fn item(name: &str) -> Item {
        let mut attributes = Map::new();
        attributes.insert("name".into(), name.into());
        Item::new("gcp-compute-network", "name", attributes, "proj")
    }

    fn key(query: &str) -> CacheKey {
        CacheKey::new(
            "gcp-compute-network",
            QueryMethod::Get,
            "proj",
            "gcp-compute-network",
            query,
        )
    }

    #[test]
    fn store_then_hit() {
        let cache = QueryCache::new();
        cache.store(key("net1"), vec![item("net1")], DEFAULT_CACHE_TTL);
        let items = cache.lookup(&key("net1"), false).expect("cache hit");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unique_attribute_value(), Some("net1"));
        assert!(cache.lookup(&key("net2"), false).is_none());
    }

    #[test]
    fn ignore_cache_misses_but_key_remains_canonical() {
        let cache = QueryCache::new();
        cache.store(key("net1"), vec![item("net1")], DEFAULT_CACHE_TTL);
        assert!(cache.lookup(&key("net1"), true).is_none());
        // the entry itself is untouched
        assert!(cache.lookup(&key("net1"), false).is_some());
    }

    #[test]
    fn expired_entries_are_evicted() {
        let cache = QueryCache::new();
        cache.store(key("net1"), vec![item("net1")], Duration::from_secs(0));
        assert!(cache.lookup(&key("net1"), false).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn distinct_methods_do_not_collide() {
        let cache = QueryCache::new();
        cache.store(key("net1"), vec![item("net1")], DEFAULT_CACHE_TTL);
        let mut list_key = key("net1");
        list_key.method = QueryMethod::List;
        assert!(cache.lookup(&list_key, false).is_none());
    }
}
