use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// A process-local map whose entries expire `ttl` after they were inserted.
///
/// Expired entries are not evicted eagerly; they are treated as missing and
/// overwritten by the next insert.
///
/// Every invalidation bumps a generation counter. A value computed from
/// data read before an invalidation is refused by [`TtlCache::insert_if_current`].
pub struct TtlCache<K, V> {
    ttl: Duration,
    inner: RwLock<Inner<K, V>>,
}

struct Inner<K, V> {
    generation: u64,
    entries: HashMap<K, (Instant, V)>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: RwLock::new(Inner {
                generation: 0,
                entries: HashMap::new(),
            }),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let inner = self.inner.read().await;
        inner
            .entries
            .get(key)
            .filter(|(inserted, _)| inserted.elapsed() < self.ttl)
            .map(|(_, value)| value.clone())
    }

    /// Read before loading a value that will go through [`TtlCache::insert_if_current`].
    pub async fn generation(&self) -> u64 {
        self.inner.read().await.generation
    }

    pub async fn insert(&self, key: K, value: V) {
        self.inner.write().await.entries.insert(key, (Instant::now(), value));
    }

    /// Inserts only if nothing was invalidated since `generation` was read.
    /// Returns whether the value was stored.
    pub async fn insert_if_current(&self, key: K, value: V, generation: u64) -> bool {
        let mut inner = self.inner.write().await;
        if inner.generation != generation {
            return false;
        }
        inner.entries.insert(key, (Instant::now(), value));
        true
    }

    pub async fn invalidate(&self, key: &K) {
        let mut inner = self.inner.write().await;
        inner.entries.remove(key);
        inner.generation += 1;
    }

    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_the_ttl() {
        let cache = TtlCache::new(Duration::from_secs(300));
        cache.insert(1, "a").await;

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get(&1).await, Some("a"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(&1).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn reinserting_restarts_the_clock() {
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.insert("k", 1).await;
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.insert("k", 2).await;
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get(&"k").await, Some(2));
    }

    #[tokio::test]
    async fn loads_that_race_an_invalidation_are_not_stored() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let generation = cache.generation().await;

        // Another request changes the entry while the load is in flight.
        cache.invalidate(&7).await;

        assert!(!cache.insert_if_current(7, "stale", generation).await);
        assert_eq!(cache.get(&7).await, None);

        let generation = cache.generation().await;
        assert!(cache.insert_if_current(7, "fresh", generation).await);
        assert_eq!(cache.get(&7).await, Some("fresh"));
    }

    #[tokio::test]
    async fn invalidate_and_clear_remove_entries() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert(1, "a").await;
        cache.insert(2, "b").await;

        cache.invalidate(&1).await;
        assert_eq!(cache.get(&1).await, None);
        assert_eq!(cache.get(&2).await, Some("b"));

        cache.clear().await;
        assert_eq!(cache.get(&2).await, None);
    }
}
