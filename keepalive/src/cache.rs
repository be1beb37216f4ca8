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

use std::{collections::HashSet, fmt::Debug, sync::Arc};

use keepalive_common::{
    error::{Error, Result},
    event::EventListener,
    metrics::Metrics,
};
use keepalive_memory::{ViewCacheStoreBuilder, DEFAULT_NAME};

use crate::{
    activation::{ActivationController, Transition, View},
    surface::CompositionSurface,
    tab::{Tab, TabChange, TabRegistry, TabSnapshot},
    title::TitleResolver,
};

/// Paths that never get a tab or a cached view by default.
pub const DEFAULT_IGNORED_PATHS: &[&str] = &["/login", "/404", "/403"];

/// Materializes the view of a routed path.
pub trait ViewFactory<V>: Send + Sync + 'static {
    /// Create a new view instance for `path`.
    fn create(&self, path: &str) -> anyhow::Result<V>;
}

impl<V, F> ViewFactory<V> for F
where
    F: Fn(&str) -> anyhow::Result<V> + Send + Sync + 'static,
{
    fn create(&self, path: &str) -> anyhow::Result<V> {
        self(path)
    }
}

/// Builder for [`KeepAlive`].
pub struct KeepAliveBuilder<V> {
    name: String,
    home: String,
    home_label: Option<String>,
    titles: TitleResolver,
    ignored_paths: HashSet<String>,
    event_listener: Option<Arc<dyn EventListener<Key = String, Value = V>>>,
    snapshot: Option<TabSnapshot>,
}

impl<V> Debug for KeepAliveBuilder<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeepAliveBuilder")
            .field("name", &self.name)
            .field("home", &self.home)
            .field("home_label", &self.home_label)
            .field("titles", &self.titles)
            .field("ignored_paths", &self.ignored_paths)
            .field("snapshot", &self.snapshot)
            .finish()
    }
}

impl<V> KeepAliveBuilder<V>
where
    V: View,
{
    /// Create a builder whose pinned home tab opens `home`.
    pub fn new(home: impl Into<String>) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            home: home.into(),
            home_label: None,
            titles: TitleResolver::default(),
            ignored_paths: DEFAULT_IGNORED_PATHS.iter().map(|p| p.to_string()).collect(),
            event_listener: None,
            snapshot: None,
        }
    }

    /// Set the name used as the metrics label.
    ///
    /// The default value is `"keepalive"`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the label of the home tab. Defaults to the title resolved for the home path.
    pub fn with_home_label(mut self, label: impl Into<String>) -> Self {
        self.home_label = Some(label.into());
        self
    }

    /// Register the tab title of a path.
    pub fn with_title(mut self, path: impl Into<String>, label: impl Into<String>) -> Self {
        self.titles.insert(path, label);
        self
    }

    /// Replace the paths that never get a tab or a cached view.
    ///
    /// The default value is [`DEFAULT_IGNORED_PATHS`].
    pub fn with_ignored_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Set the event listener notified on store and surface changes.
    pub fn with_event_listener(mut self, event_listener: Arc<dyn EventListener<Key = String, Value = V>>) -> Self {
        self.event_listener = Some(event_listener);
        self
    }

    /// Restore the open tabs from a persisted snapshot.
    pub fn with_snapshot(mut self, snapshot: TabSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Build the keep-alive cache with the given view factory.
    pub fn build(self, factory: impl ViewFactory<V>) -> Result<KeepAlive<V>> {
        if !self.home.starts_with('/') {
            return Err(Error::config("home path must start with '/'").with_context("home", &self.home));
        }
        if self.ignored_paths.contains(&self.home) {
            return Err(Error::config("home path cannot be ignored").with_context("home", &self.home));
        }

        tracing::info!("[keepalive]: open with config: \n{:#?}", self);

        let metrics = Arc::new(Metrics::new(&self.name));

        let mut store = ViewCacheStoreBuilder::new()
            .with_name(self.name.clone())
            .with_metrics(metrics.clone());
        let mut surface = CompositionSurface::new(metrics);
        if let Some(listener) = self.event_listener {
            store = store.with_event_listener(listener.clone());
            surface = surface.with_event_listener(listener);
        }

        let home_label = self.home_label.unwrap_or_else(|| self.titles.resolve(&self.home));
        let home = Tab::new(self.home).with_label(home_label).with_pinned(true);
        let registry = match self.snapshot {
            Some(snapshot) => TabRegistry::restore(home, snapshot)?,
            None => TabRegistry::new(home),
        };

        let mut controller = ActivationController::new(store.build(), surface);
        let _ = controller.tab_set_changed(registry.live_keys());

        Ok(KeepAlive {
            name: self.name,
            registry,
            controller,
            factory: Arc::new(factory),
            titles: self.titles,
            ignored_paths: self.ignored_paths,
        })
    }
}

/// Keep-alive tab and view cache.
///
/// [`KeepAlive`] wires the [`TabRegistry`] to the [`ActivationController`]. Each input event is handled to completion
/// before the next one: the registry is updated first, then the controller transitions, looks up or creates the view
/// and re-attaches the surface.
pub struct KeepAlive<V> {
    name: String,
    registry: TabRegistry,
    controller: ActivationController<V>,
    factory: Arc<dyn ViewFactory<V>>,
    titles: TitleResolver,
    ignored_paths: HashSet<String>,
}

impl<V> Debug for KeepAlive<V>
where
    V: View,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeepAlive")
            .field("name", &self.name)
            .field("registry", &self.registry)
            .field("active", &self.controller.state().active_key())
            .finish()
    }
}

impl<V> KeepAlive<V>
where
    V: View,
{
    /// Handle a route change to `path`.
    ///
    /// Ignored paths change nothing. Otherwise the tab of `path` is opened or updated and its view activated.
    pub fn path_changed(&mut self, path: &str) -> Result<Transition> {
        if self.ignored_paths.contains(path) {
            tracing::trace!("[keepalive]: path {path:?} is ignored");
            return Ok(Transition::Ignored);
        }

        let label = match self.registry.get(path) {
            Some(tab) if tab.pinned => tab.label.clone(),
            _ => self.titles.resolve(path),
        };
        let tab = Tab::new(path).with_label(label).with_pinned(path == self.registry.home());
        let _ = self.registry.upsert(tab);

        self.activate(path)
    }

    /// Handle a tab set change reported by the tab management surface.
    ///
    /// Unpinned tabs missing from `live_keys` are closed, then every view without a tab is evicted. If the active tab
    /// was closed, its replacement is activated. Returns the evicted keys.
    pub fn tab_set_changed(&mut self, live_keys: HashSet<String>) -> Result<Vec<String>> {
        let change = self.registry.retain(&live_keys);
        let evicted = self
            .controller
            .tab_set_changed(self.registry.live_keys())
            .into_iter()
            .map(|entry| entry.key().clone())
            .collect();

        if change.active_changed() {
            if let Some(active) = change.active.as_deref() {
                self.activate(active)?;
            }
        }

        Ok(evicted)
    }

    /// Handle a refresh signal: every cached view is dropped and the active one is created again.
    ///
    /// Returns the fresh active instance.
    pub fn refresh_requested(&mut self) -> Result<Option<Arc<V>>> {
        let _ = self.controller.refresh();
        self.render()
    }

    /// Returns true if a view of `path` is cached.
    pub fn is_cached(&self, path: &str) -> bool {
        self.controller.is_cached(path)
    }

    /// The instance currently attached to the surface.
    pub fn render_active(&self) -> Option<Arc<V>> {
        self.controller.render_active()
    }

    /// Render pass: make sure the active view is attached, creating it again if it was invalidated.
    pub fn render(&mut self) -> Result<Option<Arc<V>>> {
        let Some(active) = self.controller.state().active_key().map(str::to_string) else {
            return Ok(None);
        };
        let factory = self.factory.clone();
        self.controller.render(|| factory.create(&active))
    }

    /// Manually invalidate the cached view of `path`. Returns false if nothing was cached.
    pub fn evict(&mut self, path: &str) -> bool {
        self.controller.evict(path).is_some()
    }

    /// Switch to the open tab of `key`.
    pub fn select_tab(&mut self, key: &str) -> Result<Transition> {
        if !self.registry.set_active(key) {
            tracing::warn!("[keepalive]: select absent tab {key:?}, skip");
            return Ok(Transition::Rejected);
        }
        self.activate(key)
    }

    /// Close the tab of `key`. Pinned tabs stay open.
    pub fn close_tab(&mut self, key: &str) -> Result<TabChange> {
        let change = self.registry.close(key);
        self.apply(change)
    }

    /// Close every unpinned tab except the tab of `key`.
    pub fn close_others(&mut self, key: &str) -> Result<TabChange> {
        let change = self.registry.close_others(key);
        self.apply(change)
    }

    /// Close every unpinned tab on the right of the tab of `key`.
    pub fn close_right(&mut self, key: &str) -> Result<TabChange> {
        let change = self.registry.close_right(key);
        self.apply(change)
    }

    /// Close every unpinned tab.
    pub fn close_all(&mut self) -> Result<TabChange> {
        let change = self.registry.close_all();
        self.apply(change)
    }

    /// Pin or unpin the tab of `key`.
    pub fn set_pinned(&mut self, key: &str, pinned: bool) -> bool {
        self.registry.set_pinned(key, pinned)
    }

    /// Drop every cached view and every tab but home, used on logout.
    pub fn teardown(&mut self) {
        let cleared = self.controller.teardown();
        let _ = self.registry.reset();
        let _ = self.controller.tab_set_changed(self.registry.live_keys());
        tracing::info!("[keepalive]: teardown, {} views dropped", cleared.len());
    }

    /// Capture the persistable tab state.
    pub fn snapshot(&self) -> TabSnapshot {
        self.registry.snapshot()
    }

    /// The tab registry.
    pub fn registry(&self) -> &TabRegistry {
        &self.registry
    }

    /// The activation controller.
    pub fn controller(&self) -> &ActivationController<V> {
        &self.controller
    }

    /// Currently visible path.
    pub fn active_key(&self) -> Option<&str> {
        self.controller.state().active_key()
    }

    /// Keys of all cached views in creation order.
    pub fn cached_keys(&self) -> Vec<String> {
        self.controller.store().keys()
    }

    fn activate(&mut self, path: &str) -> Result<Transition> {
        if self.registry.contains(path) && !self.controller.live_keys().contains(path) {
            let _ = self.controller.tab_set_changed(self.registry.live_keys());
        }
        let factory = self.factory.clone();
        self.controller.navigate(path, || factory.create(path))
    }

    fn apply(&mut self, change: TabChange) -> Result<TabChange> {
        if change.is_shrink() {
            let _ = self.controller.tab_set_changed(self.registry.live_keys());
        }
        if let Some(active) = change.active.as_deref() {
            if change.active_changed() || self.controller.state().active_key() != Some(active) {
                self.activate(active)?;
            }
        }
        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use keepalive_common::error::ErrorKind;
    use keepalive_memory::test_utils::RecordingListener;
    use parking_lot::Mutex;

    use super::*;
    use crate::activation::{
        tests::{Hook, TestView},
        ViewState,
    };

    fn factory(created: Arc<AtomicU64>) -> impl ViewFactory<TestView> {
        move |path: &str| {
            if path.starts_with("/broken") {
                anyhow::bail!("no route for {path}");
            }
            Ok(TestView {
                path: path.to_string(),
                serial: created.fetch_add(1, Ordering::Relaxed),
                hooks: Mutex::new(vec![]),
            })
        }
    }

    fn keep_alive() -> (KeepAlive<TestView>, Arc<AtomicU64>) {
        let created = Arc::new(AtomicU64::new(0));
        let keep_alive = KeepAliveBuilder::new("/home")
            .with_title("/home", "Home")
            .with_title("/system/user", "Users")
            .build(factory(created.clone()))
            .unwrap();
        (keep_alive, created)
    }

    fn tab_keys(keep_alive: &KeepAlive<TestView>) -> Vec<&str> {
        keep_alive.registry().tabs().iter().map(|tab| tab.key.as_str()).collect()
    }

    fn assert_cached_within_tabs(keep_alive: &KeepAlive<TestView>) {
        for key in keep_alive.cached_keys() {
            assert!(keep_alive.registry().contains(&key), "{key} is cached without a tab");
        }
    }

    fn live(keys: &[&str]) -> HashSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test_log::test]
    fn test_debug() {
        let (mut keep_alive, _) = keep_alive();
        keep_alive.path_changed("/a").unwrap();

        let s = format!("{keep_alive:?}");
        assert!(s.starts_with("KeepAlive"));
        assert!(s.contains(r#"active: Some("/a")"#));
    }

    #[test_log::test]
    fn test_tab_set_change_closes_missing_tabs() {
        let (mut keep_alive, created) = keep_alive();
        keep_alive.path_changed("/a").unwrap();
        keep_alive.path_changed("/b").unwrap();

        let evicted = keep_alive.tab_set_changed(live(&["/home", "/b"])).unwrap();
        assert_eq!(evicted, vec!["/a".to_string()]);
        assert_eq!(tab_keys(&keep_alive), vec!["/home", "/b"]);
        assert_eq!(keep_alive.active_key(), Some("/b"));
        assert_cached_within_tabs(&keep_alive);

        // The closed path opens a new tab with a new view.
        assert_eq!(keep_alive.path_changed("/a").unwrap(), Transition::Created);
        assert_eq!(keep_alive.registry().active(), Some("/a"));
        assert_eq!(keep_alive.active_key(), Some("/a"));
        assert_eq!(created.load(Ordering::Relaxed), 3);
        assert_cached_within_tabs(&keep_alive);
    }

    #[test_log::test]
    fn test_tab_set_change_closes_active_tab() {
        let (mut keep_alive, _) = keep_alive();
        keep_alive.path_changed("/a").unwrap();
        keep_alive.path_changed("/b").unwrap();
        let a = keep_alive.controller().store().get(&"/a".to_string()).unwrap();

        let evicted = keep_alive.tab_set_changed(live(&["/a"])).unwrap();
        assert_eq!(evicted, vec!["/b".to_string()]);
        assert_eq!(tab_keys(&keep_alive), vec!["/home", "/a"]);
        assert_eq!(keep_alive.registry().active(), Some("/a"));
        assert_eq!(keep_alive.active_key(), Some("/a"));
        assert!(Arc::ptr_eq(a.instance(), &keep_alive.render_active().unwrap()));
        assert_cached_within_tabs(&keep_alive);
    }

    #[test_log::test]
    fn test_builder_validation() {
        let created = Arc::new(AtomicU64::new(0));

        let e = KeepAliveBuilder::<TestView>::new("home").build(factory(created.clone())).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Config);

        let e = KeepAliveBuilder::<TestView>::new("/login").build(factory(created.clone())).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Config);

        let keep_alive = KeepAliveBuilder::<TestView>::new("/login")
            .with_ignored_paths(["/404"])
            .build(factory(created))
            .unwrap();
        assert_eq!(keep_alive.registry().tabs()[0].label, "Login");
    }

    #[test_log::test]
    fn test_navigation_scenario() {
        let (mut keep_alive, created) = keep_alive();

        assert_eq!(keep_alive.path_changed("/a").unwrap(), Transition::Created);
        let a = keep_alive.render_active().unwrap();
        assert_eq!(keep_alive.path_changed("/b").unwrap(), Transition::Created);
        assert_eq!(keep_alive.path_changed("/a").unwrap(), Transition::Resumed);

        assert_eq!(created.load(Ordering::Relaxed), 2);
        assert!(Arc::ptr_eq(&a, &keep_alive.render_active().unwrap()));
        assert!(keep_alive.is_cached("/b"));
        assert_eq!(tab_keys(&keep_alive), vec!["/home", "/a", "/b"]);
        assert_eq!(keep_alive.registry().active(), Some("/a"));
        assert_eq!(keep_alive.active_key(), Some("/a"));
    }

    #[test_log::test]
    fn test_tab_labels_and_home_pinning() {
        let (mut keep_alive, _) = keep_alive();

        keep_alive.path_changed("/system/user/42").unwrap();
        keep_alive.path_changed("/reports").unwrap();
        keep_alive.path_changed("/home").unwrap();

        let tabs = keep_alive.registry().tabs();
        assert_eq!(tab_keys(&keep_alive), vec!["/home", "/system/user/42", "/reports"]);
        assert_eq!(tabs[0].label, "Home");
        assert!(tabs[0].pinned);
        assert_eq!(tabs[1].label, "Users");
        assert_eq!(tabs[2].label, "Reports");
    }

    #[test_log::test]
    fn test_pinned_label_is_kept() {
        let created = Arc::new(AtomicU64::new(0));
        let mut keep_alive = KeepAliveBuilder::new("/home")
            .with_home_label("Dashboard")
            .build(factory(created))
            .unwrap();

        keep_alive.path_changed("/home").unwrap();
        assert_eq!(keep_alive.registry().tabs()[0].label, "Dashboard");
    }

    #[test_log::test]
    fn test_ignored_paths() {
        let (mut keep_alive, created) = keep_alive();
        keep_alive.path_changed("/a").unwrap();

        assert_eq!(keep_alive.path_changed("/login").unwrap(), Transition::Ignored);
        assert_eq!(tab_keys(&keep_alive), vec!["/home", "/a"]);
        assert_eq!(keep_alive.active_key(), Some("/a"));
        assert_eq!(created.load(Ordering::Relaxed), 1);
    }

    #[test_log::test]
    fn test_close_active_tab_navigates_to_neighbour() {
        let (mut keep_alive, _) = keep_alive();
        for path in ["/a", "/b", "/c"] {
            keep_alive.path_changed(path).unwrap();
        }
        keep_alive.select_tab("/b").unwrap();
        let b = keep_alive.render_active().unwrap();

        let change = keep_alive.close_tab("/b").unwrap();
        assert_eq!(change.active.as_deref(), Some("/c"));
        assert_eq!(keep_alive.active_key(), Some("/c"));
        assert_eq!(keep_alive.render_active().unwrap().path, "/c");
        assert!(!keep_alive.is_cached("/b"));
        assert_eq!(keep_alive.controller().view_state("/b"), ViewState::Evicted);
        assert_eq!(
            b.hooks(),
            vec![
                Hook::Activate(true),
                Hook::Deactivate(false),
                Hook::Activate(false),
                Hook::Deactivate(true)
            ]
        );
    }

    #[test_log::test]
    fn test_close_inactive_tab_keeps_view() {
        let (mut keep_alive, _) = keep_alive();
        for path in ["/a", "/b"] {
            keep_alive.path_changed(path).unwrap();
        }
        let b = keep_alive.render_active().unwrap();

        keep_alive.close_tab("/a").unwrap();
        assert!(!keep_alive.is_cached("/a"));
        assert!(Arc::ptr_eq(&b, &keep_alive.render_active().unwrap()));
        assert_eq!(b.hooks(), vec![Hook::Activate(true)]);
    }

    #[test_log::test]
    fn test_close_pinned_is_noop() {
        let (mut keep_alive, _) = keep_alive();
        keep_alive.path_changed("/home").unwrap();

        let change = keep_alive.close_tab("/home").unwrap();
        assert!(!change.is_shrink());
        assert!(keep_alive.is_cached("/home"));
        assert_eq!(keep_alive.active_key(), Some("/home"));
    }

    #[test_log::test]
    fn test_close_all_and_others() {
        let (mut keep_alive, _) = keep_alive();
        for path in ["/home", "/a", "/b", "/c"] {
            keep_alive.path_changed(path).unwrap();
        }

        keep_alive.close_others("/b").unwrap();
        assert_eq!(tab_keys(&keep_alive), vec!["/home", "/b"]);
        assert_eq!(keep_alive.active_key(), Some("/b"));
        assert_eq!(keep_alive.cached_keys(), vec!["/home".to_string(), "/b".to_string()]);

        keep_alive.close_all().unwrap();
        assert_eq!(tab_keys(&keep_alive), vec!["/home"]);
        assert_eq!(keep_alive.active_key(), Some("/home"));
        assert_eq!(keep_alive.cached_keys(), vec!["/home".to_string()]);
        assert_cached_within_tabs(&keep_alive);
    }

    #[test_log::test]
    fn test_close_right() {
        let (mut keep_alive, _) = keep_alive();
        for path in ["/a", "/b", "/c"] {
            keep_alive.path_changed(path).unwrap();
        }

        keep_alive.close_right("/a").unwrap();
        assert_eq!(tab_keys(&keep_alive), vec!["/home", "/a"]);
        assert_eq!(keep_alive.active_key(), Some("/a"));
        assert_eq!(keep_alive.cached_keys(), vec!["/a".to_string()]);
    }

    #[test_log::test]
    fn test_select_absent_tab_is_rejected() {
        let (mut keep_alive, _) = keep_alive();
        keep_alive.path_changed("/a").unwrap();

        assert_eq!(keep_alive.select_tab("/missing").unwrap(), Transition::Rejected);
        assert_eq!(keep_alive.active_key(), Some("/a"));
    }

    #[test_log::test]
    fn test_refresh_recreates_active() {
        let (mut keep_alive, created) = keep_alive();
        keep_alive.path_changed("/a").unwrap();
        keep_alive.path_changed("/b").unwrap();
        let b = keep_alive.render_active().unwrap();

        let fresh = keep_alive.refresh_requested().unwrap().unwrap();
        assert!(!Arc::ptr_eq(&b, &fresh));
        assert_eq!(fresh.path, "/b");
        assert!(!keep_alive.is_cached("/a"));
        assert_eq!(created.load(Ordering::Relaxed), 3);

        // Going back to "/a" creates it again.
        assert_eq!(keep_alive.path_changed("/a").unwrap(), Transition::Created);
    }

    #[test_log::test]
    fn test_creation_failure_is_surfaced_and_retried() {
        let (mut keep_alive, _) = keep_alive();
        keep_alive.path_changed("/a").unwrap();

        let e = keep_alive.path_changed("/broken").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Creation);
        assert!(!keep_alive.is_cached("/broken"));
        // The tab is open, the previous view stays visible.
        assert!(keep_alive.registry().contains("/broken"));
        assert_eq!(keep_alive.render_active().unwrap().path, "/a");

        assert!(keep_alive.path_changed("/broken").is_err());
    }

    #[test_log::test]
    fn test_manual_evict_recreates_on_render() {
        let (mut keep_alive, _) = keep_alive();
        keep_alive.path_changed("/a").unwrap();
        let a = keep_alive.render_active().unwrap();

        assert!(keep_alive.evict("/a"));
        assert!(!keep_alive.evict("/a"));
        assert!(keep_alive.render_active().is_none());

        let a2 = keep_alive.render().unwrap().unwrap();
        assert!(!Arc::ptr_eq(&a, &a2));
    }

    #[test_log::test]
    fn test_teardown_and_snapshot() {
        let (mut keep_alive, _) = keep_alive();
        for path in ["/a", "/b"] {
            keep_alive.path_changed(path).unwrap();
        }
        let snapshot = keep_alive.snapshot();

        keep_alive.teardown();
        assert_eq!(tab_keys(&keep_alive), vec!["/home"]);
        assert!(keep_alive.cached_keys().is_empty());
        assert!(keep_alive.render_active().is_none());

        let created = Arc::new(AtomicU64::new(0));
        let mut restored = KeepAliveBuilder::new("/home")
            .with_snapshot(snapshot)
            .build(factory(created.clone()))
            .unwrap();
        assert_eq!(tab_keys(&restored), vec!["/home", "/a", "/b"]);
        assert_eq!(restored.registry().active(), Some("/b"));
        // Views are never persisted.
        assert!(restored.cached_keys().is_empty());
        assert_eq!(restored.select_tab("/b").unwrap(), Transition::Created);
    }

    #[test_log::test]
    fn test_events() {
        let listener = RecordingListener::<String, TestView>::default();
        let created = Arc::new(AtomicU64::new(0));
        let mut keep_alive = KeepAliveBuilder::<TestView>::new("/home")
            .with_event_listener(Arc::new(listener.clone()))
            .build(factory(created))
            .unwrap();

        keep_alive.path_changed("/a").unwrap();
        keep_alive.path_changed("/b").unwrap();
        keep_alive.path_changed("/a").unwrap();
        keep_alive.close_tab("/b").unwrap();

        let events = listener
            .take()
            .into_iter()
            .map(|(event, key)| format!("{event:?} {key}"))
            .collect::<Vec<_>>();
        assert_eq!(
            events,
            vec![
                "Create /a",
                "Attach /a",
                "Create /b",
                "Detach /a",
                "Attach /b",
                "Detach /b",
                "Attach /a",
                "Evict /b",
            ]
        );
    }
}
