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
    collections::{BTreeSet, HashSet},
    sync::Arc,
};

use keepalive_common::{code::Value, error::Result, metrics::Metrics};
use keepalive_memory::{CacheEntry, Origin, ViewCacheStore};

use crate::surface::CompositionSurface;

/// A cached view that wants to know when it becomes visible or hidden.
///
/// Hooks take `&self`, views keep their mutable state behind interior mutability. Releasing resources belongs to
/// `Drop`, which runs once the last handle of an evicted instance goes away.
pub trait View: Value {
    /// Called when the view becomes the visible one.
    ///
    /// `first` is true on the first activation of this instance, and false when a retained instance is resumed.
    #[expect(unused_variables)]
    fn on_activate(&self, first: bool) {}

    /// Called when the view stops being the visible one.
    ///
    /// `last` is true when the instance is about to be destroyed, and false for a transient hide.
    #[expect(unused_variables)]
    fn on_deactivate(&self, last: bool) {}
}

/// Lifecycle state of a path key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Never activated.
    Unvisited,
    /// Visible on the surface.
    Active,
    /// Alive in the store, hidden.
    Retained,
    /// Destroyed after it lived. Navigating to it again creates a new instance.
    Evicted,
}

/// Outcome of a navigation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A new instance was created and attached.
    Created,
    /// A retained instance was attached again.
    Resumed,
    /// The path was already active and attached.
    Unchanged,
    /// The path has no open tab, nothing changed.
    Rejected,
    /// The path is excluded from keep-alive, nothing changed.
    Ignored,
}

/// Which path is visible and which are retained off-surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationState {
    active_key: Option<String>,
    retained_keys: BTreeSet<String>,
}

impl ActivationState {
    /// Currently visible path.
    pub fn active_key(&self) -> Option<&str> {
        self.active_key.as_deref()
    }

    /// Paths currently retained. Contains the active key when there is one.
    pub fn retained_keys(&self) -> &BTreeSet<String> {
        &self.retained_keys
    }
}

/// Decides on every navigation event which cached view becomes visible and which become hidden-but-retained.
#[derive(Debug)]
pub struct ActivationController<V> {
    store: ViewCacheStore<String, V>,
    surface: CompositionSurface<String, V>,
    state: ActivationState,
    live_keys: HashSet<String>,
    visited: HashSet<String>,
    metrics: Arc<Metrics>,
}

impl<V> ActivationController<V>
where
    V: View,
{
    /// Create a controller over the given store and surface. No path is live until the first tab set change.
    pub fn new(store: ViewCacheStore<String, V>, surface: CompositionSurface<String, V>) -> Self {
        let metrics = store.metrics().clone();
        Self {
            store,
            surface,
            state: ActivationState::default(),
            live_keys: HashSet::new(),
            visited: HashSet::new(),
            metrics,
        }
    }

    /// Handle a navigation event to `path`.
    ///
    /// The instance is looked up or created first. If the creation fails, the error is returned and no state changes:
    /// the previous view stays active and attached. Then the previous view is deactivated, the new one activated and
    /// attached.
    ///
    /// A path without an open tab is rejected as a no-op.
    pub fn navigate<F, E>(&mut self, path: &str, factory: F) -> Result<Transition>
    where
        F: FnOnce() -> std::result::Result<V, E>,
        E: Into<anyhow::Error>,
    {
        if !self.live_keys.contains(path) {
            self.metrics.activation_reject.increment(1);
            tracing::warn!("[activation]: path {path:?} has no open tab, skip activation");
            return Ok(Transition::Rejected);
        }

        let key = path.to_string();
        if self.state.active_key.as_deref() == Some(path) && self.surface.is_attached(&key) {
            return Ok(Transition::Unchanged);
        }

        let (entry, origin) = self.store.get_or_create(&key, factory)?;

        if let Some(previous) = self.surface.attached() {
            if previous != &entry {
                previous.on_deactivate(!self.live_keys.contains(previous.key()));
            }
        }

        // A previous key whose view was dropped and never recreated is no longer retained.
        if let Some(previous) = self.state.active_key.as_deref() {
            if previous != path && !self.store.has(&previous.to_string()) {
                self.state.retained_keys.remove(previous);
            }
        }

        tracing::debug!(
            "[activation]: {:?} -> {path:?} ({origin:?})",
            self.state.active_key
        );
        self.state.active_key = Some(key.clone());
        self.state.retained_keys.insert(key.clone());
        self.visited.insert(key);

        let first = origin == Origin::Created;
        entry.on_activate(first);
        self.surface.attach(entry);

        Ok(if first { Transition::Created } else { Transition::Resumed })
    }

    /// Handle a tab set change.
    ///
    /// Every entry outside `live_keys` is evicted. If the active path lost its tab, its view receives its last
    /// deactivation and no path stays active. Returns the evicted entries.
    pub fn tab_set_changed(&mut self, live_keys: HashSet<String>) -> Vec<CacheEntry<String, V>> {
        self.live_keys = live_keys;

        if let Some(active) = self.state.active_key.as_ref() {
            if !self.live_keys.contains(active) {
                if let Some(detached) = self.surface.detach() {
                    detached.on_deactivate(true);
                }
                self.state.active_key = None;
            }
        }

        let evicted = self.store.evict_except(&self.live_keys);
        self.state.retained_keys.retain(|key| self.live_keys.contains(key));

        evicted
    }

    /// Handle a refresh signal.
    ///
    /// The whole store is cleared and only the active path stays retained, so its view is created from scratch on the
    /// next render pass. Returns the cleared entries.
    pub fn refresh(&mut self) -> Vec<CacheEntry<String, V>> {
        if let Some(detached) = self.surface.detach() {
            detached.on_deactivate(true);
        }
        let cleared = self.store.clear_all();
        self.state.retained_keys = self.state.active_key.iter().cloned().collect();

        tracing::debug!(
            "[activation]: refreshed, {} entries cleared, active: {:?}",
            cleared.len(),
            self.state.active_key
        );
        cleared
    }

    /// Manually invalidate the cached view of `path`.
    ///
    /// Evicting an absent path is a no-op. If the path is active it stays active, and its view is created again on the
    /// next render pass.
    pub fn evict(&mut self, path: &str) -> Option<CacheEntry<String, V>> {
        let key = path.to_string();
        let removed = self.store.remove(&key)?;

        if self.surface.is_attached(&key) {
            if let Some(detached) = self.surface.detach() {
                detached.on_deactivate(true);
            }
        }
        if self.state.active_key.as_deref() != Some(path) {
            self.state.retained_keys.remove(path);
        }

        Some(removed)
    }

    /// Make sure the active path has an attached instance, creating it if it was cleared, and return that instance.
    pub fn render<F, E>(&mut self, factory: F) -> Result<Option<Arc<V>>>
    where
        F: FnOnce() -> std::result::Result<V, E>,
        E: Into<anyhow::Error>,
    {
        if let Some(active) = self.state.active_key.clone() {
            self.navigate(&active, factory)?;
        }
        Ok(self.render_active())
    }

    /// The instance currently attached to the surface.
    pub fn render_active(&self) -> Option<Arc<V>> {
        self.surface.attached().map(|entry| entry.instance().clone())
    }

    /// Returns true if a view of `path` is cached.
    pub fn is_cached(&self, path: &str) -> bool {
        self.store.has(&path.to_string())
    }

    /// Lifecycle state of `path`.
    pub fn view_state(&self, path: &str) -> ViewState {
        let key = path.to_string();
        if self.store.has(&key) {
            if self.surface.is_attached(&key) {
                ViewState::Active
            } else {
                ViewState::Retained
            }
        } else if self.visited.contains(path) {
            ViewState::Evicted
        } else {
            ViewState::Unvisited
        }
    }

    /// Drop every view and forget all state.
    pub fn teardown(&mut self) -> Vec<CacheEntry<String, V>> {
        if let Some(detached) = self.surface.detach() {
            detached.on_deactivate(true);
        }
        let cleared = self.store.clear_all();
        self.state = ActivationState::default();
        self.live_keys.clear();
        self.visited.clear();
        cleared
    }

    /// Current activation state.
    pub fn state(&self) -> &ActivationState {
        &self.state
    }

    /// Paths with an open tab as last reported.
    pub fn live_keys(&self) -> &HashSet<String> {
        &self.live_keys
    }

    /// The view cache store.
    pub fn store(&self) -> &ViewCacheStore<String, V> {
        &self.store
    }

    /// The composition surface.
    pub fn surface(&self) -> &CompositionSurface<String, V> {
        &self.surface
    }
}
