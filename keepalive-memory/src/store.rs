// Copyright 2026 keepalive Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{
    collections::{hash_map::Entry, HashMap, HashSet},
    fmt::Debug,
    hash::BuildHasher,
    ops::Deref,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use ahash::RandomState;
use itertools::Itertools;
use keepalive_common::{
    code::{Key, Value},
    error::{Error, Result},
    event::{Event, EventListener},
    metrics::Metrics,
};
use parking_lot::RwLock;

/// Default name used for metrics labels and logs.
pub const DEFAULT_NAME: &str = "keepalive";

struct EntryInner<K, V> {
    key: K,
    instance: Arc<V>,
    id: u64,
    created_at: u64,
    last_activated_at: AtomicU64,
}

/// A cached view instance and its bookkeeping.
///
/// [`CacheEntry`] is a cheap shared handle. Two handles compare equal only if they refer to the same entry identity,
/// an entry created again after eviction is a different identity even for the same key.
pub struct CacheEntry<K, V> {
    inner: Arc<EntryInner<K, V>>,
}

impl<K, V> Clone for CacheEntry<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> Debug for CacheEntry<K, V>
where
    K: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.inner.key)
            .field("id", &self.inner.id)
            .field("created_at", &self.inner.created_at)
            .field("last_activated_at", &self.last_activated_at())
            .finish()
    }
}

impl<K, V> PartialEq for CacheEntry<K, V> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<K, V> Eq for CacheEntry<K, V> {}

impl<K, V> Deref for CacheEntry<K, V> {
    type Target = V;

    fn deref(&self) -> &Self::Target {
        &self.inner.instance
    }
}

impl<K, V> CacheEntry<K, V> {
    fn new(key: K, value: V, id: u64, tick: u64) -> Self {
        Self {
            inner: Arc::new(EntryInner {
                key,
                instance: Arc::new(value),
                id,
                created_at: tick,
                last_activated_at: AtomicU64::new(tick),
            }),
        }
    }

    /// Key of the entry.
    pub fn key(&self) -> &K {
        &self.inner.key
    }

    /// Shared handle of the rendered instance.
    pub fn instance(&self) -> &Arc<V> {
        &self.inner.instance
    }

    /// Unique identity of the entry within its store.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Logical time at which the entry was created.
    pub fn created_at(&self) -> u64 {
        self.inner.created_at
    }

    /// Logical time of the latest lookup that activated the entry.
    pub fn last_activated_at(&self) -> u64 {
        self.inner.last_activated_at.load(Ordering::Relaxed)
    }

    fn touch(&self, tick: u64) {
        self.inner.last_activated_at.fetch_max(tick, Ordering::Relaxed);
    }
}

/// Where the instance returned by [`ViewCacheStore::get_or_create`] comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The factory was invoked and a new entry was stored.
    Created,
    /// An existing entry was returned, the factory was not invoked.
    Retained,
}

struct Inner<K, V> {
    name: String,
    entries: RwLock<HashMap<K, CacheEntry<K, V>, RandomState>>,
    clock: AtomicU64,
    next_id: AtomicU64,
    event_listener: Option<Arc<dyn EventListener<Key = K, Value = V>>>,
    metrics: Arc<Metrics>,
}

/// Keyed store of previously rendered view instances.
///
/// The store owns creation, retention and eviction of the cached views. For each key it holds at most one instance,
/// and the instance of a live entry is never recreated.
///
/// [`ViewCacheStore`] is a shared handle, cloning it gives another handle of the same store.
pub struct ViewCacheStore<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for ViewCacheStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> Debug for ViewCacheStore<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewCacheStore")
            .field("name", &self.inner.name)
            .field("entries", &self.inner.entries.read().len())
            .finish()
    }
}

impl<K, V> Default for ViewCacheStore<K, V>
where
    K: Key,
    V: Value,
{
    fn default() -> Self {
        ViewCacheStoreBuilder::new().build()
    }
}

impl<K, V> ViewCacheStore<K, V>
where
    K: Key,
    V: Value,
{
    /// Name of the store.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Metrics of the store.
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.inner.metrics
    }

    /// Return the instance cached for `key`, or invoke `factory` exactly once to materialize and store a new one.
    ///
    /// If the factory fails, nothing is stored and an [`ErrorKind::Creation`] error is returned, so the creation can
    /// be retried by the next activation without side effects.
    ///
    /// [`ErrorKind::Creation`]: keepalive_common::error::ErrorKind::Creation
    pub fn get_or_create<F, E>(&self, key: &K, factory: F) -> Result<(CacheEntry<K, V>, Origin)>
    where
        F: FnOnce() -> std::result::Result<V, E>,
        E: Into<anyhow::Error>,
    {
        if let Some(entry) = self.get(key) {
            entry.touch(self.tick());
            self.inner.metrics.store_hit.increment(1);
            tracing::trace!("[view cache]: retained entry {:?} (id = {})", key, entry.id());
            return Ok((entry, Origin::Retained));
        }

        // The factory runs without holding the lock, it may probe the store.
        let value = match factory() {
            Ok(value) => value,
            Err(e) => {
                self.inner.metrics.store_create_failed.increment(1);
                let e = Error::creation(key, e);
                tracing::warn!("[view cache]: creation failed, no entry is stored: {e}");
                return Err(e);
            }
        };

        let tick = self.tick();
        let entry = CacheEntry::new(key.clone(), value, self.inner.next_id.fetch_add(1, Ordering::Relaxed), tick);

        let (existing, len) = {
            let mut entries = self.inner.entries.write();
            let existing = match entries.entry(key.clone()) {
                Entry::Occupied(o) => Some(o.get().clone()),
                Entry::Vacant(v) => {
                    v.insert(entry.clone());
                    None
                }
            };
            (existing, entries.len())
        };

        if let Some(existing) = existing {
            // Another creation for the same key won, keep its instance.
            existing.touch(tick);
            self.inner.metrics.store_hit.increment(1);
            tracing::debug!(
                "[view cache]: entry {:?} was stored concurrently, drop the new instance",
                key
            );
            return Ok((existing, Origin::Retained));
        }

        self.inner.metrics.store_create.increment(1);
        self.inner.metrics.store_entries.set(len as f64);
        tracing::debug!("[view cache]: created entry {:?} (id = {})", key, entry.id());
        self.notify(Event::Create, &entry);

        Ok((entry, Origin::Created))
    }

    /// Get the cached entry of `key` without activating it.
    pub fn get(&self, key: &K) -> Option<CacheEntry<K, V>> {
        self.inner.entries.read().get(key).cloned()
    }

    /// Membership probe, no side effects.
    pub fn has(&self, key: &K) -> bool {
        self.inner.entries.read().contains_key(key)
    }

    /// Remove every entry whose key is not in `live_keys`.
    ///
    /// Returns the evicted entries in creation order.
    pub fn evict_except<S>(&self, live_keys: &HashSet<K, S>) -> Vec<CacheEntry<K, V>>
    where
        S: BuildHasher,
    {
        let (evicted, len) = {
            let mut entries = self.inner.entries.write();
            let keys = entries.keys().filter(|key| !live_keys.contains(*key)).cloned().collect_vec();
            let evicted = keys
                .iter()
                .filter_map(|key| entries.remove(key))
                .sorted_by_key(|entry| entry.id())
                .collect_vec();
            (evicted, entries.len())
        };

        if evicted.is_empty() {
            return evicted;
        }

        self.inner.metrics.store_evict.increment(evicted.len() as u64);
        self.inner.metrics.store_entries.set(len as f64);
        tracing::debug!(
            "[view cache]: evicted {:?}",
            evicted.iter().map(|entry| entry.key()).collect_vec()
        );
        for entry in evicted.iter() {
            self.notify(Event::Evict, entry);
        }

        evicted
    }

    /// Remove the entry of `key` for manual invalidation.
    ///
    /// Removing an absent key is a no-op and returns `None`.
    pub fn remove(&self, key: &K) -> Option<CacheEntry<K, V>> {
        let (entry, len) = {
            let mut entries = self.inner.entries.write();
            let entry = entries.remove(key);
            (entry, entries.len())
        };

        let Some(entry) = entry else {
            tracing::trace!("[view cache]: remove absent entry {:?}, skip", key);
            return None;
        };

        self.inner.metrics.store_remove.increment(1);
        self.inner.metrics.store_entries.set(len as f64);
        tracing::debug!("[view cache]: removed entry {:?} (id = {})", key, entry.id());
        self.notify(Event::Remove, &entry);

        Some(entry)
    }

    /// Remove every entry unconditionally.
    ///
    /// Returns the removed entries in creation order.
    pub fn clear_all(&self) -> Vec<CacheEntry<K, V>> {
        let cleared = {
            let mut entries = self.inner.entries.write();
            entries
                .drain()
                .map(|(_, entry)| entry)
                .sorted_by_key(|entry| entry.id())
                .collect_vec()
        };

        self.inner.metrics.store_clear.increment(cleared.len() as u64);
        self.inner.metrics.store_entries.set(0.0);
        tracing::debug!("[view cache]: cleared {} entries", cleared.len());
        for entry in cleared.iter() {
            self.notify(Event::Clear, entry);
        }

        cleared
    }

    /// Keys of all cached entries in creation order.
    pub fn keys(&self) -> Vec<K> {
        self.inner
            .entries
            .read()
            .values()
            .sorted_by_key(|entry| entry.id())
            .map(|entry| entry.key().clone())
            .collect_vec()
    }

    /// Count of cached entries.
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().is_empty()
    }

    fn tick(&self) -> u64 {
        self.inner.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn notify(&self, event: Event, entry: &CacheEntry<K, V>) {
        if let Some(listener) = self.inner.event_listener.as_ref() {
            listener.on_event(event, entry.key(), entry.instance());
        }
    }
}

/// Builder for [`ViewCacheStore`].
pub struct ViewCacheStoreBuilder<K, V> {
    name: String,
    event_listener: Option<Arc<dyn EventListener<Key = K, Value = V>>>,
    metrics: Option<Arc<Metrics>>,
}

impl<K, V> Default for ViewCacheStoreBuilder<K, V>
where
    K: Key,
    V: Value,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ViewCacheStoreBuilder<K, V>
where
    K: Key,
    V: Value,
{
    /// Create a builder with the default name and no event listener.
    pub fn new() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            event_listener: None,
            metrics: None,
        }
    }

    /// Set the name of the store. The name is used as the metrics label.
    ///
    /// The default value is `"keepalive"`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the event listener notified on creation and removal of entries.
    pub fn with_event_listener(mut self, event_listener: Arc<dyn EventListener<Key = K, Value = V>>) -> Self {
        self.event_listener = Some(event_listener);
        self
    }

    /// Share already registered metrics instead of registering new ones under the store name.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the store.
    pub fn build(self) -> ViewCacheStore<K, V> {
        let metrics = self.metrics.unwrap_or_else(|| Arc::new(Metrics::new(&self.name)));
        ViewCacheStore {
            inner: Arc::new(Inner {
                name: self.name,
                entries: RwLock::new(HashMap::with_hasher(RandomState::default())),
                clock: AtomicU64::new(0),
                next_id: AtomicU64::new(0),
                event_listener: self.event_listener,
                metrics,
            }),
        }
    }
}
