//! Read-through TTL cache for the public list path
//!
//! Fronts `list_public_rows` only; the authenticated CRUD path never reads
//! it. Entries are keyed by table id + sorted filter set + pagination window
//! and expire by TTL alone; there is no write-through invalidation, so
//! public readers may observe up to one TTL of staleness after a write.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// DJB2 hash, used to keep cache keys short
fn djb2_hash(s: &str) -> u32 {
    let mut hash: u32 = 5381;
    for c in s.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(c as u32);
    }
    hash
}

fn short_hash(s: &str) -> String {
    format!("{:x}", djb2_hash(s))
}

/// Build the cache key for one list query
pub fn query_cache_key(
    table_id: &str,
    filters: &BTreeMap<String, String>,
    page: u32,
    limit: u32,
) -> String {
    let where_hash = if filters.is_empty() {
        "none".to_string()
    } else {
        // BTreeMap iteration is already sorted, so equal filter sets hash
        // equally regardless of insertion order
        let joined = filters
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        short_hash(&joined)
    };

    format!(
        "query:{}:{}:{}:{}",
        short_hash(table_id),
        where_hash,
        page,
        limit
    )
}

/// In-process TTL cache
pub struct QueryCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, V)>>,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a live entry, dropping it if expired
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Store an entry, sweeping any expired ones while the lock is held
    pub fn insert(&self, key: String, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(key) {
            Some((inserted, value)) => {
                if now.duration_since(*inserted) < self.ttl {
                    return Some(value.clone());
                }
            }
            None => return None,
        }
        entries.remove(key);
        None
    }

    fn insert_at(&self, key: String, value: V, now: Instant) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.retain(|_, (inserted, _)| now.duration_since(*inserted) < self.ttl);
        entries.insert(key, (now, value));
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stable_across_filter_order() {
        let mut a = BTreeMap::new();
        a.insert("color".to_string(), "red".to_string());
        a.insert("size".to_string(), "xl".to_string());

        let mut b = BTreeMap::new();
        b.insert("size".to_string(), "xl".to_string());
        b.insert("color".to_string(), "red".to_string());

        assert_eq!(
            query_cache_key("tbl-1", &a, 1, 50),
            query_cache_key("tbl-1", &b, 1, 50)
        );
    }

    #[test]
    fn test_key_varies_by_window_and_table() {
        let filters = BTreeMap::new();
        let base = query_cache_key("tbl-1", &filters, 1, 50);
        assert_ne!(base, query_cache_key("tbl-1", &filters, 2, 50));
        assert_ne!(base, query_cache_key("tbl-1", &filters, 1, 25));
        assert_ne!(base, query_cache_key("tbl-2", &filters, 1, 50));
    }

    #[test]
    fn test_empty_filters_key_marker() {
        let key = query_cache_key("tbl-1", &BTreeMap::new(), 1, 50);
        assert!(key.contains(":none:"));
    }

    #[test]
    fn test_get_within_ttl() {
        let cache: QueryCache<i32> = QueryCache::new(Duration::from_secs(60));
        let now = Instant::now();
        cache.insert_at("k".to_string(), 7, now);
        assert_eq!(cache.get_at("k", now + Duration::from_secs(59)), Some(7));
    }

    #[test]
    fn test_get_after_ttl_expires() {
        let cache: QueryCache<i32> = QueryCache::new(Duration::from_secs(60));
        let now = Instant::now();
        cache.insert_at("k".to_string(), 7, now);
        assert_eq!(cache.get_at("k", now + Duration::from_secs(60)), None);
        // expired entry was dropped on read
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_insert_sweeps_expired_entries() {
        let cache: QueryCache<i32> = QueryCache::new(Duration::from_secs(60));
        let now = Instant::now();
        cache.insert_at("old".to_string(), 1, now);
        cache.insert_at("new".to_string(), 2, now + Duration::from_secs(120));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at("new", now + Duration::from_secs(121)), Some(2));
    }

    #[test]
    fn test_djb2_matches_reference_vector() {
        // djb2("") == 5381 by definition
        assert_eq!(djb2_hash(""), 5381);
        assert_eq!(short_hash(""), "1505");
    }
}
