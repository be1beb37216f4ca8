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

use std::collections::HashSet;

use itertools::{Either, Itertools};
use keepalive_common::error::{Error, ErrorKind, Result};
use serde::{Deserialize, Serialize};

/// A user-visible reference to a navigable path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    /// Unique and stable identifier, the path the tab was opened for.
    pub key: String,
    /// Display title.
    pub label: String,
    /// Navigable path.
    pub path: String,
    /// Pinned tabs cannot be closed.
    #[serde(default)]
    pub pinned: bool,
}

impl Tab {
    /// Create an unpinned tab for `path`, keyed and labelled by the path.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            key: path.clone(),
            label: path.clone(),
            path,
            pinned: false,
        }
    }

    /// Set the display title.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set whether the tab is pinned.
    pub fn with_pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }
}

/// The outcome of a registry operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use]
pub struct TabChange {
    /// Tabs removed by the operation, in their original order.
    pub removed: Vec<Tab>,
    /// Key of the tab appended by the operation.
    pub added: Option<String>,
    /// Active key before the operation.
    pub previous_active: Option<String>,
    /// Active key after the operation.
    pub active: Option<String>,
}

impl TabChange {
    fn unchanged(active: Option<String>) -> Self {
        Self {
            previous_active: active.clone(),
            active,
            ..Default::default()
        }
    }

    /// Returns true if the tab set shrank, which requires an eviction pass.
    pub fn is_shrink(&self) -> bool {
        !self.removed.is_empty()
    }

    /// Returns true if the active key changed.
    pub fn active_changed(&self) -> bool {
        self.previous_active != self.active
    }
}

/// Persistable state of a [`TabRegistry`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabSnapshot {
    /// Open tabs in display order.
    pub tabs: Vec<Tab>,
    /// Active tab key.
    #[serde(default)]
    pub active: Option<String>,
}

/// Ordered collection of open tabs.
///
/// The registry is the single source of truth for which paths may keep a cached view. A pinned home tab always exists
/// and always occupies the first position.
#[derive(Debug, Clone)]
pub struct TabRegistry {
    tabs: Vec<Tab>,
    active: Option<String>,
    home: String,
}

impl TabRegistry {
    /// Create a registry holding only the given home tab, which is pinned regardless of its flag.
    pub fn new(home: Tab) -> Self {
        let home = home.with_pinned(true);
        Self {
            home: home.key.clone(),
            tabs: vec![home],
            active: None,
        }
    }

    /// Restore a registry from a snapshot.
    ///
    /// The home tab is inserted if the snapshot lacks it, and is always pinned at the first position. An active key
    /// without a tab is dropped.
    pub fn restore(home: Tab, snapshot: TabSnapshot) -> Result<Self> {
        let mut seen = HashSet::with_capacity(snapshot.tabs.len());
        for tab in snapshot.tabs.iter() {
            if !seen.insert(tab.key.as_str()) {
                return Err(Error::new(ErrorKind::Restore, "duplicate tab key").with_context("key", &tab.key));
            }
        }

        let mut registry = Self::new(home);
        let mut tabs = snapshot.tabs;
        match tabs.iter_mut().find(|tab| tab.key == registry.home) {
            Some(tab) => tab.pinned = true,
            None => tabs.insert(0, registry.tabs[0].clone()),
        }
        registry.tabs = tabs;
        registry.pin_home();
        registry.active = snapshot.active.filter(|key| registry.contains(key));

        tracing::debug!(
            "[tabs]: restored {} tabs, active: {:?}",
            registry.tabs.len(),
            registry.active
        );
        Ok(registry)
    }

    /// Capture the persistable state.
    pub fn snapshot(&self) -> TabSnapshot {
        TabSnapshot {
            tabs: self.tabs.clone(),
            active: self.active.clone(),
        }
    }

    /// Key of the home tab.
    pub fn home(&self) -> &str {
        &self.home
    }

    /// Open tabs in display order.
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    /// Get the tab of `key`.
    pub fn get(&self, key: &str) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.key == key)
    }

    /// Returns true if a tab of `key` is open.
    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Index of the tab of `key`.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.key == key)
    }

    /// Active tab key.
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Keys of all open tabs.
    pub fn live_keys(&self) -> HashSet<String> {
        self.tabs.iter().map(|tab| tab.key.clone()).collect()
    }

    /// Count of open tabs.
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    /// Always false, the home tab cannot be closed.
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Insert the tab if its key is absent, otherwise merge its fields into the existing tab. The tab becomes active.
    ///
    /// A new tab is appended at the end. Merging never unpins a tab.
    pub fn upsert(&mut self, tab: Tab) -> TabChange {
        let previous_active = self.active.clone();
        let key = tab.key.clone();

        let added = match self.position(&key) {
            Some(index) => {
                let existing = &mut self.tabs[index];
                existing.label = tab.label;
                existing.path = tab.path;
                existing.pinned |= tab.pinned;
                None
            }
            None => {
                let pinned = tab.pinned || key == self.home;
                self.tabs.push(tab.with_pinned(pinned));
                Some(key.clone())
            }
        };
        self.pin_home();
        self.active = Some(key);

        TabChange {
            removed: vec![],
            added,
            previous_active,
            active: self.active.clone(),
        }
    }

    /// Close the tab of `key`. Pinned or absent tabs are left untouched.
    ///
    /// If the closed tab was active, the next active tab is the one now occupying the closed tab's index, else the one
    /// before that index, else the last one.
    pub fn close(&mut self, key: &str) -> TabChange {
        match self.get(key) {
            None => {
                tracing::trace!("[tabs]: close absent tab {key:?}, skip");
                return TabChange::unchanged(self.active.clone());
            }
            Some(tab) if tab.pinned => {
                tracing::trace!("[tabs]: close pinned tab {key:?}, skip");
                return TabChange::unchanged(self.active.clone());
            }
            Some(_) => {}
        }
        self.remove_where(|_, tab| tab.key == key)
    }

    /// Close every tab except the tab of `key` and the pinned ones. The tab of `key` becomes active.
    ///
    /// Nothing happens if `key` is absent.
    pub fn close_others(&mut self, key: &str) -> TabChange {
        if !self.contains(key) {
            return TabChange::unchanged(self.active.clone());
        }
        let mut change = self.remove_where(|_, tab| tab.key != key);
        self.active = Some(key.to_string());
        change.active = self.active.clone();
        change
    }

    /// Close every unpinned tab on the right of the tab of `key`.
    ///
    /// Nothing happens if `key` is absent.
    pub fn close_right(&mut self, key: &str) -> TabChange {
        let Some(position) = self.position(key) else {
            return TabChange::unchanged(self.active.clone());
        };
        self.remove_where(|index, _| index > position)
    }

    /// Close every unpinned tab.
    pub fn close_all(&mut self) -> TabChange {
        self.remove_where(|_, _| true)
    }

    /// Close every unpinned tab whose key is not in `live_keys`. Keys without a tab are ignored.
    pub fn retain(&mut self, live_keys: &HashSet<String>) -> TabChange {
        self.remove_where(|_, tab| !live_keys.contains(&tab.key))
    }

    /// Set the active tab. Returns false and changes nothing if no tab of `key` is open.
    pub fn set_active(&mut self, key: &str) -> bool {
        if !self.contains(key) {
            return false;
        }
        self.active = Some(key.to_string());
        true
    }

    /// Pin or unpin the tab of `key`. The home tab cannot be unpinned.
    pub fn set_pinned(&mut self, key: &str, pinned: bool) -> bool {
        if key == self.home && !pinned {
            return false;
        }
        match self.tabs.iter_mut().find(|tab| tab.key == key) {
            Some(tab) => {
                tab.pinned = pinned;
                true
            }
            None => false,
        }
    }

    /// Drop every tab but home and clear the active key.
    pub fn reset(&mut self) -> TabChange {
        let previous_active = self.active.take();
        let (home, removed): (Vec<_>, Vec<_>) = std::mem::take(&mut self.tabs)
            .into_iter()
            .partition(|tab| tab.key == self.home);
        self.tabs = home;
        TabChange {
            removed,
            added: None,
            previous_active,
            active: None,
        }
    }

    /// Remove unpinned tabs matching the predicate and reselect the active tab if it was removed.
    fn remove_where(&mut self, remove: impl Fn(usize, &Tab) -> bool) -> TabChange {
        let previous_active = self.active.clone();
        let active_index = previous_active.as_deref().and_then(|key| self.position(key));

        let (removed, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.tabs)
                .into_iter()
                .enumerate()
                .partition_map(|(index, tab)| {
                    if !tab.pinned && remove(index, &tab) {
                        Either::Left(tab)
                    } else {
                        Either::Right(tab)
                    }
                });
        self.tabs = kept;
        self.pin_home();

        if let (Some(active), Some(index)) = (previous_active.as_deref(), active_index) {
            if !self.contains(active) {
                self.active = Self::next_active(index, &self.tabs);
            }
        }

        if !removed.is_empty() {
            tracing::debug!(
                "[tabs]: closed {:?}, active: {:?} -> {:?}",
                removed.iter().map(|tab| tab.key.as_str()).collect_vec(),
                previous_active,
                self.active
            );
        }

        TabChange {
            removed,
            added: None,
            previous_active,
            active: self.active.clone(),
        }
    }

    /// Pick the replacement of a removed active tab from the post-removal list.
    fn next_active(index: usize, tabs: &[Tab]) -> Option<String> {
        tabs.get(index)
            .or_else(|| index.checked_sub(1).and_then(|i| tabs.get(i)))
            .or_else(|| tabs.last())
            .map(|tab| tab.key.clone())
    }

    fn pin_home(&mut self) {
        if let Some(index) = self.position(&self.home) {
            if index != 0 {
                let home = self.tabs.remove(index);
                self.tabs.insert(0, home);
            }
        }
    }
}
