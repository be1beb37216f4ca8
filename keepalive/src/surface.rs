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

use std::sync::Arc;

use keepalive_common::{
    code::{Key, Value},
    event::{Event, EventListener},
    metrics::Metrics,
};
use keepalive_memory::CacheEntry;

/// The single physical render region.
///
/// At most one cached view is attached at a time. Detaching only releases the surface's reference, the instance stays
/// alive as long as the view cache store retains its entry.
pub struct CompositionSurface<K, V> {
    attached: Option<CacheEntry<K, V>>,
    event_listener: Option<Arc<dyn EventListener<Key = K, Value = V>>>,
    metrics: Arc<Metrics>,
}

impl<K, V> std::fmt::Debug for CompositionSurface<K, V>
where
    K: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositionSurface")
            .field("attached", &self.attached)
            .finish()
    }
}

impl<K, V> CompositionSurface<K, V>
where
    K: Key,
    V: Value,
{
    /// Create an empty surface.
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            attached: None,
            event_listener: None,
            metrics,
        }
    }

    /// Set the event listener notified on attachment changes.
    pub fn with_event_listener(mut self, event_listener: Arc<dyn EventListener<Key = K, Value = V>>) -> Self {
        self.event_listener = Some(event_listener);
        self
    }

    /// Attach `entry`, detaching the previously attached one.
    ///
    /// Returns the detached entry. Attaching the entry that is already attached changes nothing.
    pub fn attach(&mut self, entry: CacheEntry<K, V>) -> Option<CacheEntry<K, V>> {
        if self.attached.as_ref() == Some(&entry) {
            return None;
        }
        let detached = self.detach();

        self.metrics.surface_attach.increment(1);
        tracing::trace!("[surface]: attach {:?} (id = {})", entry.key(), entry.id());
        self.notify(Event::Attach, &entry);
        self.attached = Some(entry);

        detached
    }

    /// Detach the attached entry, if any.
    pub fn detach(&mut self) -> Option<CacheEntry<K, V>> {
        let detached = self.attached.take()?;

        self.metrics.surface_detach.increment(1);
        tracing::trace!("[surface]: detach {:?} (id = {})", detached.key(), detached.id());
        self.notify(Event::Detach, &detached);

        Some(detached)
    }

    /// The attached entry.
    pub fn attached(&self) -> Option<&CacheEntry<K, V>> {
        self.attached.as_ref()
    }

    /// Key of the attached entry.
    pub fn attached_key(&self) -> Option<&K> {
        self.attached.as_ref().map(|entry| entry.key())
    }

    /// Returns true if the view of `key` is visible.
    pub fn is_attached(&self, key: &K) -> bool {
        self.attached_key() == Some(key)
    }

    fn notify(&self, event: Event, entry: &CacheEntry<K, V>) {
        if let Some(listener) = self.event_listener.as_ref() {
            listener.on_event(event, entry.key(), entry.instance());
        }
    }
}
