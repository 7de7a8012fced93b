// Projection layer - Derived views over the project store and widget registry
use crate::application::memo::{KeyedMemo, Memo};
use crate::application::project_store::{ProjectSnapshot, ProjectStore};
use crate::application::widget_registry::{WidgetRegistry, WidgetSnapshot};
use crate::domain::project::{Project, ProjectStats};
use crate::domain::views::{ProgressChartData, TimelineEvent, timeline_events};
use crate::domain::widget::{Widget, visible_in_order};
use crate::error::DashboardError;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;

/// (project revision, widget registry revision)
type Revisions = (u64, u64);

pub struct DashboardProjection {
    projects: Arc<ProjectStore>,
    widgets: Arc<WidgetRegistry>,
    filtered: KeyedMemo<String, Revisions, Vec<Project>>,
    charts: KeyedMemo<String, Revisions, ProgressChartData>,
    timeline: Memo<u64, Vec<TimelineEvent>>,
    /// Registry revision the keyed caches were last pruned against
    pruned_at: Mutex<u64>,
}

impl DashboardProjection {
    pub fn new(projects: Arc<ProjectStore>, widgets: Arc<WidgetRegistry>) -> Self {
        Self {
            projects,
            widgets,
            filtered: KeyedMemo::new(),
            charts: KeyedMemo::new(),
            timeline: Memo::new(),
            pruned_at: Mutex::new(0),
        }
    }

    /// Finds the widget and pins both revisions from the same reads.
    fn lookup(
        &self,
        widget_id: &str,
    ) -> Result<(Widget, ProjectSnapshot, Revisions), DashboardError> {
        let registry = self.widgets.snapshot();
        self.prune(&registry);
        let Some(widget) = registry.widgets.iter().find(|w| w.id == widget_id).cloned() else {
            return Err(DashboardError::UnknownWidget(widget_id.to_string()));
        };
        let projects = self.projects.snapshot();
        let revisions = (projects.revision, registry.revision);
        Ok((widget, projects, revisions))
    }

    /// Forgets cached views of widgets that no longer exist.
    fn prune(&self, registry: &WidgetSnapshot) {
        let mut pruned_at = self.pruned_at.lock();
        if *pruned_at == registry.revision {
            return;
        }
        let live: HashSet<&str> = registry.widgets.iter().map(|w| w.id.as_str()).collect();
        self.filtered.retain(|id| live.contains(id.as_str()));
        self.charts.retain(|id| live.contains(id.as_str()));
        *pruned_at = registry.revision;
    }

    pub fn visible_widgets(&self) -> Arc<Vec<Widget>> {
        self.widgets.visible_widgets()
    }

    pub fn stats(&self) -> ProjectStats {
        self.projects.stats()
    }

    /// Projects shown by a widget. Only list widgets filter; every other
    /// widget type sees the whole collection.
    pub fn widget_projects(&self, widget_id: &str) -> Result<Arc<Vec<Project>>, DashboardError> {
        let (widget, snapshot, revisions) = self.lookup(widget_id)?;
        let projects = snapshot.projects;

        Ok(self
            .filtered
            .get_or_compute(widget.id.clone(), revisions, || {
                tracing::debug!(widget = %widget.id, "Recomputing filtered projects");
                match widget.config.filters() {
                    Some(filters) => projects
                        .iter()
                        .filter(|p| filters.matches(p))
                        .cloned()
                        .collect(),
                    None => projects.as_ref().clone(),
                }
            }))
    }

    pub fn progress_chart(
        &self,
        widget_id: &str,
    ) -> Result<Arc<ProgressChartData>, DashboardError> {
        let (widget, snapshot, revisions) = self.lookup(widget_id)?;
        let projects = snapshot.projects;

        Ok(self.charts.get_or_compute(widget.id.clone(), revisions, || {
            ProgressChartData::build(&projects, &widget.config)
        }))
    }

    pub fn timeline(&self) -> Arc<Vec<TimelineEvent>> {
        let snapshot = self.projects.snapshot();
        self.timeline
            .get_or_compute(snapshot.revision, || timeline_events(&snapshot.projects))
    }

    /// Current stats, then a fresh value every time the collection changes.
    pub fn watch_stats(&self) -> impl Stream<Item = ProjectStats> + Send + 'static + use<> {
        WatchStream::new(self.projects.subscribe())
            .map(|snapshot| ProjectStats::from_projects(&snapshot.projects))
    }

    /// Current visible widgets, then again after every structural change.
    pub fn watch_visible_widgets(
        &self,
    ) -> impl Stream<Item = Vec<Widget>> + Send + 'static + use<> {
        WatchStream::new(self.widgets.subscribe())
            .map(|snapshot| visible_in_order(&snapshot.widgets))
    }
}
