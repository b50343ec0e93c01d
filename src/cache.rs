//! Memoized schemas keyed by `namespace:file-or-all:type`.
//!
//! Entries never expire on their own. The eviction primitives below exist so a
//! host can layer its own policy (hot reload, per-tenant bounds) on top.
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::schema::Schema;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub namespace: String,
    pub file: Option<String>,
    pub type_name: String,
}

impl CacheKey {
    pub fn new(namespace: &str, file: Option<&str>, type_name: &str) -> Self {
        CacheKey {
            namespace: namespace.to_string(),
            file: file.map(str::to_string),
            type_name: type_name.to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = self.file.as_deref().unwrap_or("all");
        write!(f, "{}:{}:{}", self.namespace, file, self.type_name)
    }
}

#[derive(Clone, Debug, Default)]
pub struct SchemaCache {
    entries: IndexMap<CacheKey, Arc<Schema>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&Arc<Schema>> {
        self.entries.get(key)
    }

    /// Insert unless the key is already present; returns the cached entry.
    pub fn insert(&mut self, key: CacheKey, schema: Arc<Schema>) -> Arc<Schema> {
        self.entries.entry(key).or_insert(schema).clone()
    }

    /// Drop everything.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Keys in insertion order (oldest first).
    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.entries.keys()
    }

    pub fn remove(&mut self, key: &CacheKey) -> Option<Arc<Schema>> {
        self.entries.shift_remove(key)
    }

    /// Remove the oldest entry.
    pub fn pop_oldest(&mut self) -> Option<(CacheKey, Arc<Schema>)> {
        self.entries.shift_remove_index(0)
    }

    /// Remove every entry under `namespace`; returns how many were dropped.
    pub fn remove_namespace(&mut self, namespace: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.namespace != namespace);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(name: &str) -> Arc<Schema> {
        Arc::new(Schema::enumeration(name, vec!["x".into()], false))
    }

    #[test]
    fn key_display() {
        assert_eq!(CacheKey::new("ns", None, "User").to_string(), "ns:all:User");
        assert_eq!(CacheKey::new("ns", Some("a.ts"), "User[]").to_string(), "ns:a.ts:User[]");
    }

    #[test]
    fn insert_keeps_first_entry() {
        let mut cache = SchemaCache::new();
        let key = CacheKey::new("ns", None, "A");
        cache.insert(key.clone(), schema("first"));
        let kept = cache.insert(key.clone(), schema("second"));
        assert_eq!(kept.name, "first");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn eviction_primitives() {
        let mut cache = SchemaCache::new();
        cache.insert(CacheKey::new("a", None, "X"), schema("X"));
        cache.insert(CacheKey::new("b", None, "Y"), schema("Y"));
        cache.insert(CacheKey::new("a", Some("f.ts"), "Z"), schema("Z"));

        let order: Vec<_> = cache.keys().map(|k| k.to_string()).collect();
        assert_eq!(order, ["a:all:X", "b:all:Y", "a:f.ts:Z"]);

        let (oldest, _) = cache.pop_oldest().unwrap();
        assert_eq!(oldest.type_name, "X");

        assert_eq!(cache.remove_namespace("a"), 1);
        assert!(cache.remove(&CacheKey::new("b", None, "Y")).is_some());
        assert!(cache.is_empty());

        cache.insert(CacheKey::new("c", None, "W"), schema("W"));
        cache.reset();
        assert!(cache.is_empty());
    }
}
