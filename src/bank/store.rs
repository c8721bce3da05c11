//! Fixed-bucket keyed store with chained collision resolution.
use std::hash::{DefaultHasher, Hash, Hasher};

/// Associates string keys with a single owned value.
///
/// The bucket count is fixed at construction; each bucket is a short list of
/// `(key, value)` pairs scanned linearly. Entries are never removed.
#[derive(Debug, Clone)]
pub struct KeyedStore<V> {
    buckets: Vec<Vec<(String, V)>>,
    len: usize,
}

impl<V> KeyedStore<V> {
    /// Creates a store with `bucket_count` buckets (at least one).
    pub fn new(bucket_count: usize) -> Self {
        let bucket_count = bucket_count.max(1);
        KeyedStore {
            buckets: (0..bucket_count).map(|_| Vec::new()).collect(),
            len: 0,
        }
    }

    fn bucket_of(&self, key: &str) -> usize {
        // `DefaultHasher::new()` uses fixed keys, so placement is deterministic.
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.buckets.len() as u64) as usize
    }

    /// Binds `value` to `key`, overwriting in place if the key is already present.
    /// Returns the previous value, if any.
    pub fn put(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        let index = self.bucket_of(&key);
        let bucket = &mut self.buckets[index];
        if let Some((_, slot)) = bucket.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(slot, value));
        }
        bucket.push((key, value));
        self.len += 1;
        None
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.buckets[self.bucket_of(key)]
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let index = self.bucket_of(key);
        self.buckets[index]
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries across all buckets.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates every entry, bucket by bucket.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.iter().map(|(k, v)| (k.as_str(), v)))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::KeyedStore;

    #[test]
    fn test_put_then_get() {
        let mut store = KeyedStore::new(10);
        assert!(store.put("CUST0001", 1).is_none());
        assert_eq!(store.get("CUST0001"), Some(&1));
        assert_eq!(store.get("CUST0002"), None);
    }

    #[test]
    fn test_put_overwrites() {
        let mut store = KeyedStore::new(10);
        store.put("ACC000001", "first");
        assert_eq!(store.put("ACC000001", "second"), Some("first"));
        assert_eq!(store.get("ACC000001"), Some(&"second"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_single_bucket_chains_everything() {
        let mut store = KeyedStore::new(1);
        for i in 0..50 {
            store.put(format!("key{i}"), i);
        }
        assert_eq!(store.len(), 50);
        for i in 0..50 {
            assert_eq!(store.get(&format!("key{i}")), Some(&i));
        }
    }

    #[test]
    fn test_zero_buckets_is_clamped() {
        let mut store = KeyedStore::new(0);
        store.put("a", 1);
        assert_eq!(store.get("a"), Some(&1));
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut store = KeyedStore::new(4);
        store.put("a", 1);
        if let Some(v) = store.get_mut("a") {
            *v += 41;
        }
        assert_eq!(store.get("a"), Some(&42));
    }

    #[test]
    fn test_iter_visits_every_entry() {
        let mut store = KeyedStore::new(3);
        for i in 0..20 {
            store.put(format!("k{i}"), i);
        }
        let mut values: Vec<_> = store.values().copied().collect();
        values.sort();
        assert_eq!(values, (0..20).collect::<Vec<_>>());
        assert!(!store.is_empty());
    }
}
