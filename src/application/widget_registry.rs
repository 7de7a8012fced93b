// Widget registry - Ordered widget list, its persistence and structural commands
use crate::application::memo::Memo;
use crate::application::ports::StateStorage;
use crate::domain::dashboard::DashboardState;
use crate::domain::widget::{
    ConfigPatch, NewWidget, Widget, compact_order, default_widgets, visible_in_order,
};
use crate::error::DashboardError;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RegistrySettings {
    /// Storage key the snapshot is written under
    pub key: String,
    /// Schema version written into, and accepted from, persisted state
    pub version: u32,
}

#[derive(Debug, Clone)]
pub struct WidgetSnapshot {
    pub revision: u64,
    pub widgets: Arc<Vec<Widget>>,
}

pub struct WidgetRegistry {
    storage: Arc<dyn StateStorage>,
    settings: RegistrySettings,
    state: watch::Sender<WidgetSnapshot>,
    visible: Memo<u64, Vec<Widget>>,
}

impl WidgetRegistry {
    /// Restores persisted state, or seeds and persists the defaults when it is
    /// missing or unreadable.
    pub fn initialize(storage: Arc<dyn StateStorage>, settings: RegistrySettings) -> Self {
        let restored = Self::restore(storage.as_ref(), &settings);
        let (state, _) = watch::channel(WidgetSnapshot {
            revision: 0,
            widgets: Arc::new(Vec::new()),
        });

        let registry = Self {
            storage,
            settings,
            state,
            visible: Memo::new(),
        };

        match restored {
            Some(widgets) => {
                registry.state.send_modify(|s| s.widgets = Arc::new(widgets));
            }
            None => {
                let widgets = default_widgets();
                registry.persist(&widgets);
                registry.state.send_modify(|s| s.widgets = Arc::new(widgets));
                tracing::info!("Initialized dashboard with default widgets");
            }
        }

        registry
    }

    fn restore(storage: &dyn StateStorage, settings: &RegistrySettings) -> Option<Vec<Widget>> {
        let payload = match storage.read(&settings.key) {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                tracing::debug!(key = %settings.key, "No persisted dashboard state");
                return None;
            }
            Err(e) => {
                tracing::warn!(key = %settings.key, error = %e, "Failed to read dashboard state");
                return None;
            }
        };

        match DashboardState::parse(&payload, settings.version) {
            Ok(state) => {
                tracing::info!(
                    widgets = state.widgets.len(),
                    last_updated = %state.last_updated,
                    "Dashboard state restored"
                );
                Some(state.widgets)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding persisted dashboard state");
                None
            }
        }
    }

    fn persist(&self, widgets: &[Widget]) {
        let state = DashboardState::snapshot(widgets.to_vec(), self.settings.version);
        let result = state
            .to_json()
            .and_then(|payload| self.storage.write(&self.settings.key, &payload));

        match result {
            Ok(()) => tracing::debug!(widgets = widgets.len(), "Dashboard state saved"),
            Err(e) => tracing::error!(error = %e, "Failed to save dashboard state"),
        }
    }

    /// Runs `mutation` against a working copy. A `Some` result commits the
    /// copy, persists it and notifies subscribers; `None` leaves everything as is.
    fn mutate<R>(&self, mutation: impl FnOnce(&mut Vec<Widget>) -> Option<R>) -> Option<R> {
        let mut outcome = None;
        self.state.send_if_modified(|snapshot| {
            let mut widgets = snapshot.widgets.as_ref().clone();
            match mutation(&mut widgets) {
                Some(result) => {
                    self.persist(&widgets);
                    snapshot.revision += 1;
                    snapshot.widgets = Arc::new(widgets);
                    outcome = Some(result);
                    true
                }
                None => false,
            }
        });
        outcome
    }

    pub fn snapshot(&self) -> WidgetSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WidgetSnapshot> {
        self.state.subscribe()
    }

    /// Every widget, hidden ones included, in array order.
    pub fn all_widgets(&self) -> Arc<Vec<Widget>> {
        self.state.borrow().widgets.clone()
    }

    pub fn widget(&self, id: &str) -> Option<Widget> {
        self.state.borrow().widgets.iter().find(|w| w.id == id).cloned()
    }

    /// Visible widgets sorted ascending by `order`.
    pub fn visible_widgets(&self) -> Arc<Vec<Widget>> {
        let snapshot = self.snapshot();
        self.visible
            .get_or_compute(snapshot.revision, || visible_in_order(&snapshot.widgets))
    }

    /// Assigns `order = index` to the visible widgets listed in `ordered_ids`.
    ///
    /// The list must contain exactly the currently visible widget ids; any
    /// other input is rejected and nothing changes. Repeating the current
    /// order is a no-op.
    pub fn reorder(&self, ordered_ids: &[String]) -> Result<(), DashboardError> {
        let mut rejected = None;

        self.mutate(|widgets| {
            if let Err(e) = validate_reorder(widgets, ordered_ids) {
                rejected = Some(e);
                return None;
            }
            let mut changed = false;
            for widget in widgets.iter_mut() {
                if let Some(index) = ordered_ids.iter().position(|id| *id == widget.id) {
                    changed |= widget.order != index as u32;
                    widget.order = index as u32;
                }
            }
            changed.then_some(())
        });

        match rejected {
            Some(e) => {
                tracing::warn!(error = %e, "Reorder rejected");
                Err(e)
            }
            None => Ok(()),
        }
    }

    /// Returns `false` for an unknown id.
    pub fn set_visibility(&self, id: &str, visible: bool) -> bool {
        let mut found = false;
        self.mutate(|widgets| {
            let widget = widgets.iter_mut().find(|w| w.id == id)?;
            found = true;
            if widget.visible == visible {
                return None;
            }
            widget.visible = visible;
            Some(())
        });
        found
    }

    /// Flips visibility and returns the new value, `None` for an unknown id.
    pub fn toggle_visibility(&self, id: &str) -> Option<bool> {
        self.mutate(|widgets| {
            let widget = widgets.iter_mut().find(|w| w.id == id)?;
            widget.visible = !widget.visible;
            Some(widget.visible)
        })
    }

    /// Appends a visible widget with a fresh id and `order` equal to the
    /// total widget count.
    pub fn add(&self, new_widget: NewWidget) -> Widget {
        let id = format!("widget-{}", Uuid::new_v4().simple());
        let mut widget = new_widget.into_widget(id, 0);
        self.mutate(|widgets| {
            widget.order = widgets.len() as u32;
            widgets.push(widget.clone());
            Some(())
        });
        tracing::info!(id = %widget.id, widget_type = ?widget.widget_type(), "Widget added");
        widget
    }

    /// Deletes the widget and renumbers every remaining widget by array index.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.mutate(|widgets| {
            let index = widgets.iter().position(|w| w.id == id)?;
            widgets.remove(index);
            compact_order(widgets);
            Some(())
        });
        removed.is_some()
    }

    /// Shallow-merges `patch` into the widget's config. Returns the widget as
    /// it is afterwards, `None` for an unknown id.
    pub fn update_config(&self, id: &str, patch: &ConfigPatch) -> Option<Widget> {
        let mut current = None;
        let updated = self.mutate(|widgets| {
            let widget = widgets.iter_mut().find(|w| w.id == id)?;
            let applied = widget.config.merge(patch);
            current = Some(widget.clone());
            if !applied {
                tracing::debug!(id, "Config patch had no keys for this widget type");
                return None;
            }
            Some(widget.clone())
        });
        updated.or(current)
    }

    pub fn reset_to_default(&self) {
        self.mutate(|widgets| {
            *widgets = default_widgets();
            Some(())
        });
        tracing::info!("Dashboard reset to default widgets");
    }

    /// Erases the persisted snapshot. In-memory state is untouched.
    pub fn clear_persisted(&self) {
        match self.storage.remove(&self.settings.key) {
            Ok(()) => tracing::info!(key = %self.settings.key, "Dashboard state cleared"),
            Err(e) => tracing::error!(error = %e, "Failed to clear dashboard state"),
        }
    }
}

fn validate_reorder(widgets: &[Widget], ordered_ids: &[String]) -> Result<(), DashboardError> {
    let visible: HashSet<&str> = widgets
        .iter()
        .filter(|w| w.visible)
        .map(|w| w.id.as_str())
        .collect();

    let mut seen = HashSet::new();
    for id in ordered_ids {
        if !visible.contains(id.as_str()) {
            return Err(DashboardError::InvalidReorder(format!(
                "{} is not a visible widget",
                id
            )));
        }
        if !seen.insert(id.as_str()) {
            return Err(DashboardError::InvalidReorder(format!("{} listed twice", id)));
        }
    }

    if seen.len() != visible.len() {
        return Err(DashboardError::InvalidReorder(format!(
            "expected {} visible widgets, got {}",
            visible.len(),
            seen.len()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project::ProjectStatus;
    use crate::domain::widget::{ChartType, WidgetConfig, WidgetFilters, WidgetType};
    use crate::infrastructure::state_storage::MemoryStateStorage;
    use serde_json::json;

    const KEY: &str = "dashboard_state";

    fn settings() -> RegistrySettings {
        RegistrySettings {
            key: KEY.to_string(),
            version: 1,
        }
    }

    fn registry() -> (Arc<MemoryStateStorage>, WidgetRegistry) {
        let storage = Arc::new(MemoryStateStorage::new());
        let registry = WidgetRegistry::initialize(storage.clone(), settings());
        (storage, registry)
    }

    fn ids(widgets: &[Widget]) -> Vec<String> {
        widgets.iter().map(|w| w.id.clone()).collect()
    }

    fn persisted(storage: &MemoryStateStorage) -> DashboardState {
        let payload = storage.read(KEY).unwrap().expect("state persisted");
        DashboardState::parse(&payload, 1).unwrap()
    }

    #[test]
    fn test_first_run_seeds_and_persists_defaults() {
        let (storage, registry) = registry();
        assert_eq!(registry.all_widgets().len(), 5);
        assert_eq!(persisted(&storage).widgets, *registry.all_widgets());
    }

    #[test]
    fn test_corrupt_state_self_heals() {
        let storage = Arc::new(MemoryStateStorage::new());
        storage.write(KEY, "{\"widgets\": oops").unwrap();

        let registry = WidgetRegistry::initialize(storage.clone(), settings());
        assert_eq!(*registry.all_widgets(), default_widgets());
        assert_eq!(persisted(&storage).widgets, default_widgets());
    }

    #[test]
    fn test_newer_state_version_self_heals() {
        let storage = Arc::new(MemoryStateStorage::new());
        let mut widgets = default_widgets();
        widgets.truncate(2);
        let newer = DashboardState::snapshot(widgets, 2).to_json().unwrap();
        storage.write(KEY, &newer).unwrap();

        let registry = WidgetRegistry::initialize(storage.clone(), settings());
        assert_eq!(*registry.all_widgets(), default_widgets());

        let healed = persisted(&storage);
        assert_eq!(healed.version, Some(1));
        assert_eq!(healed.widgets, default_widgets());
    }

    #[test]
    fn test_unknown_filter_status_keeps_layout() {
        let storage = Arc::new(MemoryStateStorage::new());
        let mut state = serde_json::to_value(DashboardState::snapshot(default_widgets(), 1)).unwrap();
        state["widgets"][2]["config"]["filters"]["status"] = json!(["Archived"]);
        state["widgets"][0]["visible"] = json!(false);
        storage.write(KEY, &state.to_string()).unwrap();

        let registry = WidgetRegistry::initialize(storage, settings());
        assert!(!registry.widget("widget-1").unwrap().visible);
        assert_eq!(registry.all_widgets().len(), 5);
    }

    #[test]
    fn test_restores_persisted_state() {
        let (storage, registry) = registry();
        registry.set_visibility("widget-2", false);
        let added = registry.add(NewWidget::new(WidgetType::Timeline, "Later"));

        let restored = WidgetRegistry::initialize(storage, settings());
        assert_eq!(*restored.all_widgets(), *registry.all_widgets());
        assert!(restored.widget(&added.id).is_some());
    }

    #[test]
    fn test_hide_widget_three() {
        let (_, registry) = registry();
        assert!(registry.set_visibility("widget-3", false));

        let visible = registry.visible_widgets();
        assert_eq!(visible.len(), 4);
        assert!(visible.iter().all(|w| w.id != "widget-3"));
        let orders: Vec<u32> = visible.iter().map(|w| w.order).collect();
        assert_eq!(orders, vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_visible_widgets_never_hidden() {
        let (_, registry) = registry();
        let sequence = ["widget-1", "widget-4", "widget-1", "widget-5", "widget-4", "widget-2"];
        for id in sequence {
            registry.toggle_visibility(id);
            let visible = registry.visible_widgets();
            assert!(visible.iter().all(|w| w.visible));
            let hidden = registry.all_widgets().iter().filter(|w| !w.visible).count();
            assert_eq!(visible.len() + hidden, 5);
        }
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let (_, registry) = registry();
        let revision = registry.snapshot().revision;
        assert!(!registry.set_visibility("nope", false));
        assert_eq!(registry.toggle_visibility("nope"), None);
        assert!(!registry.remove("nope"));
        assert!(registry.update_config("nope", &ConfigPatch::default()).is_none());
        assert_eq!(registry.snapshot().revision, revision);
    }

    #[test]
    fn test_reorder_assigns_index_and_is_idempotent() {
        let (storage, registry) = registry();
        registry.set_visibility("widget-2", false);

        let order: Vec<String> = ["widget-5", "widget-1", "widget-4", "widget-3"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        registry.reorder(&order).unwrap();
        let first = registry.all_widgets();
        assert_eq!(ids(&registry.visible_widgets()), order);
        // the hidden widget keeps its old order value
        assert_eq!(registry.widget("widget-2").unwrap().order, 1);

        let revision = registry.snapshot().revision;
        registry.reorder(&order).unwrap();
        assert_eq!(*registry.all_widgets(), *first);
        assert_eq!(persisted(&storage).widgets, *first);
        // same order again: nothing to persist or announce
        assert_eq!(registry.snapshot().revision, revision);
    }

    #[tokio::test]
    async fn test_same_order_reorder_is_silent() {
        let (storage, registry) = registry();
        let current = ids(&registry.visible_widgets());
        storage.remove(KEY).unwrap();
        let mut rx = registry.subscribe();
        rx.borrow_and_update();

        registry.reorder(&current).unwrap();
        assert!(!rx.has_changed().unwrap());
        assert!(storage.read(KEY).unwrap().is_none());
    }

    #[test]
    fn test_reorder_rejects_partial_or_foreign_input() {
        let (_, registry) = registry();
        registry.set_visibility("widget-2", false);
        let before = registry.all_widgets();

        let subset = vec!["widget-1".to_string(), "widget-3".to_string()];
        assert!(matches!(
            registry.reorder(&subset),
            Err(DashboardError::InvalidReorder(_))
        ));

        let with_hidden: Vec<String> = ["widget-1", "widget-2", "widget-3", "widget-4", "widget-5"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(registry.reorder(&with_hidden).is_err());

        let duplicated: Vec<String> = ["widget-1", "widget-1", "widget-3", "widget-4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(registry.reorder(&duplicated).is_err());

        assert_eq!(*registry.all_widgets(), *before);
    }

    #[test]
    fn test_add_appends_with_total_count_order() {
        let (_, registry) = registry();
        registry.set_visibility("widget-1", false);
        registry.set_visibility("widget-2", false);

        let widget = registry.add(NewWidget::new(WidgetType::ProjectList, "Everything"));
        assert!(widget.id.starts_with("widget-"));
        assert_eq!(widget.order, 5);
        assert!(widget.visible);
        assert_eq!(
            widget.config,
            WidgetConfig::ProjectList {
                filters: Some(WidgetFilters::by_status(&[]))
            }
        );
        assert_eq!(registry.visible_widgets().last().unwrap().id, widget.id);

        let other = registry.add(NewWidget::new(WidgetType::ProjectList, "Again"));
        assert_ne!(other.id, widget.id);
    }

    #[test]
    fn test_add_survives_persistence_roundtrip() {
        let (storage, registry) = registry();
        registry.set_visibility("widget-4", false);
        let added = registry.add(NewWidget::new(WidgetType::ProgressChart, "Chart"));
        let position = registry
            .visible_widgets()
            .iter()
            .position(|w| w.id == added.id)
            .unwrap();

        let restored = WidgetRegistry::initialize(storage, settings());
        let restored_position = restored
            .visible_widgets()
            .iter()
            .position(|w| w.id == added.id)
            .unwrap();
        assert_eq!(position, restored_position);
    }

    #[test]
    fn test_remove_compacts_all_orders() {
        let (_, registry) = registry();
        let order: Vec<String> = ["widget-5", "widget-4", "widget-3", "widget-2", "widget-1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        registry.reorder(&order).unwrap();

        assert!(registry.remove("widget-3"));
        let widgets = registry.all_widgets();
        assert_eq!(widgets.len(), 4);
        let mut orders: Vec<u32> = widgets.iter().map(|w| w.order).collect();
        // array order, not the previous visible order
        assert_eq!(orders, vec![0, 1, 2, 3]);
        orders.dedup();
        assert_eq!(orders.len(), 4);
        assert_eq!(ids(&widgets), vec!["widget-1", "widget-2", "widget-4", "widget-5"]);
    }

    #[test]
    fn test_update_config_merges() {
        let (storage, registry) = registry();
        let patch = ConfigPatch {
            chart_type: Some(ChartType::Doughnut),
            ..Default::default()
        };
        let widget = registry.update_config("widget-4", &patch).unwrap();
        assert_eq!(
            widget.config,
            WidgetConfig::ProgressChart {
                chart_type: Some(ChartType::Doughnut),
                show_legend: Some(true)
            }
        );
        assert_eq!(persisted(&storage).widgets[3].config, widget.config);

        let patch = ConfigPatch {
            filters: Some(WidgetFilters::by_status(&[ProjectStatus::Completed])),
            ..Default::default()
        };
        let widget = registry.update_config("widget-3", &patch).unwrap();
        assert_eq!(widget.config.filters(), patch.filters.as_ref());
    }

    #[test]
    fn test_reset_and_clear() {
        let (storage, registry) = registry();
        registry.remove("widget-1");
        registry.add(NewWidget::new(WidgetType::Timeline, "Extra"));

        registry.clear_persisted();
        assert!(storage.read(KEY).unwrap().is_none());
        // memory untouched
        assert_eq!(registry.all_widgets().len(), 5);
        assert!(registry.widget("widget-1").is_none());

        registry.reset_to_default();
        assert_eq!(*registry.all_widgets(), default_widgets());
        assert_eq!(persisted(&storage).widgets, default_widgets());
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let storage = Arc::new(MemoryStateStorage::new());
        let registry = WidgetRegistry::initialize(storage.clone(), settings());

        storage.fail_writes(true);
        assert!(registry.remove("widget-2"));
        assert_eq!(registry.all_widgets().len(), 4);
        assert_eq!(persisted(&storage).widgets.len(), 5);

        storage.fail_writes(false);
        registry.toggle_visibility("widget-1");
        assert_eq!(persisted(&storage).widgets.len(), 4);
    }

    #[tokio::test]
    async fn test_subscribers_notified_on_change() {
        let (_, registry) = registry();
        let mut rx = registry.subscribe();
        rx.borrow_and_update();

        registry.set_visibility("widget-1", true);
        assert!(!rx.has_changed().unwrap());

        registry.set_visibility("widget-1", false);
        rx.changed().await.unwrap();
        assert!(!rx.borrow().widgets[0].visible);
    }
}
