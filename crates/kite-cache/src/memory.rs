use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Why an entry left a [`MemoryCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalCause {
    /// Removed by `invalidate` / `invalidate_all`.
    Explicit,
    /// Overwritten by a newer value for the same key.
    Replaced,
    /// Evicted to stay within `max_entries`.
    Size,
    /// Not accessed within `expire_after_access`.
    Expired,
}

impl RemovalCause {
    /// Whether the cache dropped the entry on its own.
    pub fn was_evicted(self) -> bool {
        matches!(self, RemovalCause::Size | RemovalCause::Expired)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryCachePolicy {
    pub max_entries: usize,
    /// `None` disables time-based expiry.
    pub expire_after_access: Option<Duration>,
}

impl Default for MemoryCachePolicy {
    fn default() -> Self {
        Self {
            max_entries: 1024,
            expire_after_access: Some(Duration::from_secs(30 * 60)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub loads: u64,
    pub evictions: u64,
    pub entries: usize,
}

type RemovalListener<K, V> = Box<dyn Fn(&K, &Arc<V>, RemovalCause) + Send + Sync>;

struct Entry<V> {
    value: Arc<V>,
    last_access: Instant,
    tick: u64,
}

struct Inner<K, V> {
    map: HashMap<K, Entry<V>>,
    // Access tick -> key, oldest first. Ticks are unique and increase with
    // time, so expired entries are always at the front.
    order: BTreeMap<u64, K>,
    next_tick: u64,
}

impl<K: Clone + Eq + Hash, V> Inner<K, V> {
    fn touch(&mut self, key: &K, now: Instant) -> Option<Arc<V>> {
        let tick = self.next_tick;
        let entry = self.map.get_mut(key)?;
        self.order.remove(&entry.tick);
        entry.tick = tick;
        entry.last_access = now;
        self.order.insert(tick, key.clone());
        self.next_tick += 1;
        Some(Arc::clone(&entry.value))
    }

    fn remove(&mut self, key: &K) -> Option<Arc<V>> {
        let entry = self.map.remove(key)?;
        self.order.remove(&entry.tick);
        Some(entry.value)
    }

    fn pop_oldest(&mut self) -> Option<(K, Arc<V>)> {
        let (_, key) = self.order.pop_first()?;
        let entry = self.map.remove(&key)?;
        Some((key, entry.value))
    }

    fn oldest_access(&self) -> Option<Instant> {
        let (_, key) = self.order.first_key_value()?;
        self.map.get(key).map(|entry| entry.last_access)
    }
}

/// A bounded, access-expiring in-memory cache with a removal hook.
///
/// Values are shared as `Arc<V>`. The removal listener runs synchronously
/// with the operation that removed the entry, after the internal lock has
/// been released, so it may call back into the cache.
///
/// Concurrent misses for one key are de-duplicated by
/// [`MemoryCache::get_or_try_insert_with`]: one caller loads, the others wait
/// for its result.
pub struct MemoryCache<K, V> {
    name: &'static str,
    policy: MemoryCachePolicy,
    inner: Mutex<Inner<K, V>>,
    loading: Mutex<HashMap<K, Arc<Mutex<()>>>>,
    listener: Option<RemovalListener<K, V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    evictions: AtomicU64,
}

impl<K, V> fmt::Debug for MemoryCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCache")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<K, V> MemoryCache<K, V>
where
    K: Clone + Eq + Hash,
{
    pub fn new(name: &'static str, policy: MemoryCachePolicy) -> Self {
        Self {
            name,
            policy,
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                order: BTreeMap::new(),
                next_tick: 0,
            }),
            loading: Mutex::new(HashMap::new()),
            listener: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            loads: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Install the removal hook. Must be called before the cache is shared.
    pub fn on_removal(
        mut self,
        listener: impl Fn(&K, &Arc<V>, RemovalCause) + Send + Sync + 'static,
    ) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn policy(&self) -> MemoryCachePolicy {
        self.policy
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let now = Instant::now();
        let mut removed = Vec::new();
        let value = {
            let mut inner = self.inner.lock();
            self.expire_locked(&mut inner, now, &mut removed);
            inner.touch(key, now)
        };
        self.notify(removed);

        match &value {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        value
    }

    /// Look up `key` without counting a hit/miss or refreshing its access time.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.inner
            .lock()
            .map
            .get(key)
            .map(|entry| Arc::clone(&entry.value))
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.lock().map.contains_key(key)
    }

    pub fn insert(&self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.insert_arc(key, Arc::clone(&value));
        value
    }

    pub fn insert_arc(&self, key: K, value: Arc<V>) {
        let now = Instant::now();
        let mut removed = Vec::new();
        {
            let mut inner = self.inner.lock();
            self.expire_locked(&mut inner, now, &mut removed);

            if let Some(previous) = inner.remove(&key) {
                removed.push((key.clone(), previous, RemovalCause::Replaced));
            }

            let tick = inner.next_tick;
            inner.next_tick += 1;
            inner.order.insert(tick, key.clone());
            inner.map.insert(
                key,
                Entry {
                    value,
                    last_access: now,
                    tick,
                },
            );

            while inner.map.len() > self.policy.max_entries {
                match inner.pop_oldest() {
                    Some((key, value)) => removed.push((key, value, RemovalCause::Size)),
                    None => break,
                }
            }
        }
        self.notify(removed);
    }

    /// Read-through lookup.
    ///
    /// On a miss `load` runs at most once per key at a time; concurrent callers
    /// for the same key block until it finishes and then observe its result.
    /// `Ok(None)` from `load` means "absent" and is not cached.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &K,
        load: impl FnOnce() -> Result<Option<V>, E>,
    ) -> Result<Option<Arc<V>>, E> {
        if let Some(value) = self.get(key) {
            return Ok(Some(value));
        }

        let key_lock = {
            let mut loading = self.loading.lock();
            Arc::clone(
                loading
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        let result = {
            let _guard = key_lock.lock();
            match self.peek(key) {
                Some(value) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    // Refresh recency for the winner's value.
                    let _ = self.touch_only(key);
                    Ok(Some(value))
                }
                None => {
                    self.loads.fetch_add(1, Ordering::Relaxed);
                    match load() {
                        Ok(Some(value)) => {
                            let value = Arc::new(value);
                            self.insert_arc(key.clone(), Arc::clone(&value));
                            Ok(Some(value))
                        }
                        Ok(None) => Ok(None),
                        Err(err) => Err(err),
                    }
                }
            }
        };

        // Clones of a key lock are only taken and dropped under `loading`, so
        // a count of one means nobody else is waiting on it.
        let mut loading = self.loading.lock();
        drop(key_lock);
        if loading
            .get(key)
            .is_some_and(|current| Arc::strong_count(current) == 1)
        {
            loading.remove(key);
        }

        result
    }

    fn touch_only(&self, key: &K) -> Option<Arc<V>> {
        self.inner.lock().touch(key, Instant::now())
    }

    /// Remove `key`, running the hook with [`RemovalCause::Explicit`].
    pub fn invalidate(&self, key: &K) -> Option<Arc<V>> {
        let removed = self.inner.lock().remove(key);
        if let Some(value) = &removed {
            self.notify(vec![(key.clone(), Arc::clone(value), RemovalCause::Explicit)]);
        }
        removed
    }

    /// Remove every entry, running the hook for each.
    pub fn invalidate_all(&self) {
        let drained = self.drain();
        self.notify(
            drained
                .into_iter()
                .map(|(key, value)| (key, value, RemovalCause::Explicit))
                .collect(),
        );
    }

    /// Remove `key` without running the hook.
    pub fn discard(&self, key: &K) -> Option<Arc<V>> {
        self.inner.lock().remove(key)
    }

    /// Remove every entry without running the hook.
    pub fn discard_all(&self) {
        let drained = self.drain();
        tracing::debug!(
            target = "kite.cache",
            cache = self.name,
            discarded = drained.len(),
            "discarded in-memory cache"
        );
    }

    fn drain(&self) -> Vec<(K, Arc<V>)> {
        let mut inner = self.inner.lock();
        inner.order.clear();
        inner
            .map
            .drain()
            .map(|(key, entry)| (key, entry.value))
            .collect()
    }

    /// Evict every expired entry now.
    pub fn run_pending_tasks(&self) {
        let mut removed = Vec::new();
        {
            let mut inner = self.inner.lock();
            self.expire_locked(&mut inner, Instant::now(), &mut removed);
        }
        self.notify(removed);
    }

    /// Snapshot of all live entries, oldest access first.
    pub fn entries(&self) -> Vec<(K, Arc<V>)> {
        let inner = self.inner.lock();
        inner
            .order
            .values()
            .filter_map(|key| {
                inner
                    .map
                    .get(key)
                    .map(|entry| (key.clone(), Arc::clone(&entry.value)))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn expire_locked(
        &self,
        inner: &mut Inner<K, V>,
        now: Instant,
        removed: &mut Vec<(K, Arc<V>, RemovalCause)>,
    ) {
        let Some(ttl) = self.policy.expire_after_access else {
            return;
        };
        while let Some(last_access) = inner.oldest_access() {
            if now.saturating_duration_since(last_access) < ttl {
                break;
            }
            match inner.pop_oldest() {
                Some((key, value)) => removed.push((key, value, RemovalCause::Expired)),
                None => break,
            }
        }
    }

    fn notify(&self, removed: Vec<(K, Arc<V>, RemovalCause)>) {
        if removed.is_empty() {
            return;
        }
        let evicted = removed.iter().filter(|(_, _, cause)| cause.was_evicted()).count();
        if evicted > 0 {
            self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
            tracing::trace!(
                target = "kite.cache",
                cache = self.name,
                evicted,
                "evicted cache entries"
            );
        }
        if let Some(listener) = &self.listener {
            for (key, value, cause) in &removed {
                listener(key, value, *cause);
            }
        }
    }
}
