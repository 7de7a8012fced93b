// Dashboard core - Wires the stores together and owns their lifecycle
use crate::application::live_feed::LiveFeed;
use crate::application::ports::{ProjectSource, StateStorage};
use crate::application::project_store::ProjectStore;
use crate::application::projection::DashboardProjection;
use crate::application::update_stream::{ProgressJitter, ProjectTick, RandomJitter};
use crate::application::widget_registry::{RegistrySettings, WidgetRegistry};
use crate::domain::project::ProjectStats;
use crate::domain::views::RecentUpdate;
use crate::domain::widget::Widget;
use crate::error::DashboardError;
use crate::infrastructure::config::AppConfig;
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub struct DashboardCore {
    pub projects: Arc<ProjectStore>,
    pub widgets: Arc<WidgetRegistry>,
    pub projection: DashboardProjection,
    tick_period: Duration,
    live_feed: Mutex<Option<LiveFeed>>,
    /// Flipped to `true` by `teardown`; every outbound stream ends on it
    shutdown: watch::Sender<bool>,
}

impl DashboardCore {
    /// Builds the stores and restores widget state. Projects are not fetched
    /// until [`DashboardCore::load_projects`] is called.
    pub fn initialize(
        config: &AppConfig,
        storage: Arc<dyn StateStorage>,
        source: Arc<dyn ProjectSource>,
    ) -> Self {
        let projects = Arc::new(ProjectStore::new(source));
        let widgets = Arc::new(WidgetRegistry::initialize(
            storage,
            RegistrySettings {
                key: config.storage.key.clone(),
                version: config.storage.version,
            },
        ));
        let projection = DashboardProjection::new(projects.clone(), widgets.clone());

        Self {
            projects,
            widgets,
            projection,
            tick_period: Duration::from_millis(config.refresh.projects_ms),
            live_feed: Mutex::new(None),
            shutdown: watch::channel(false).0,
        }
    }

    pub async fn load_projects(&self) -> Result<usize, DashboardError> {
        self.projects.load().await
    }

    /// Resolves once `teardown` has run, or the core is gone.
    fn closed(&self) -> impl Future<Output = ()> + Send + 'static + use<> {
        let mut shutdown = self.shutdown.subscribe();
        async move {
            let _ = shutdown.wait_for(|closed| *closed).await;
        }
    }

    /// A fresh ticker owned by the caller. Dropping the stream cancels the
    /// ticker; teardown ends it.
    pub fn stream_updates(&self) -> impl Stream<Item = ProjectTick> + Send + 'static + use<> {
        self.projects
            .stream_updates(self.tick_period, Box::new(RandomJitter::new()))
            .take_until(self.closed())
    }

    pub fn watch_stats(&self) -> impl Stream<Item = ProjectStats> + Send + 'static + use<> {
        self.projection.watch_stats().take_until(self.closed())
    }

    pub fn watch_visible_widgets(
        &self,
    ) -> impl Stream<Item = Vec<Widget>> + Send + 'static + use<> {
        self.projection
            .watch_visible_widgets()
            .take_until(self.closed())
    }

    pub fn start_live_feed(&self) {
        self.start_live_feed_with(Box::new(RandomJitter::new()));
    }

    /// Starts applying ticks to the store. A running feed is left alone.
    pub fn start_live_feed_with(&self, jitter: Box<dyn ProgressJitter>) {
        let mut feed = self.live_feed.lock();
        if feed.is_some() {
            return;
        }
        let subscription = self.projects.stream_updates(self.tick_period, jitter);
        *feed = Some(LiveFeed::start(self.projects.clone(), subscription));
        tracing::info!(period_ms = self.tick_period.as_millis() as u64, "Live feed started");
    }

    pub fn is_live(&self) -> bool {
        self.live_feed.lock().is_some()
    }

    pub fn recent_updates(&self) -> Vec<RecentUpdate> {
        self.live_feed
            .lock()
            .as_ref()
            .map(|feed| feed.recent_updates())
            .unwrap_or_default()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.live_feed.lock().as_ref().and_then(|feed| feed.last_update())
    }

    /// Wipes persisted state and re-seeds the default widgets.
    pub fn reset_dashboard(&self) {
        self.widgets.clear_persisted();
        self.widgets.reset_to_default();
    }

    /// Ends every outbound stream and stops the live feed. Idempotent.
    pub fn teardown(&self) {
        if !self.shutdown.send_replace(true) {
            tracing::info!("Closing update streams");
        }
        if let Some(feed) = self.live_feed.lock().take() {
            feed.stop();
            tracing::info!("Live feed stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::update_stream::FixedJitter;
    use crate::domain::widget::default_widgets;
    use crate::infrastructure::mock_projects::MockProjectSource;
    use crate::infrastructure::state_storage::MemoryStateStorage;

    fn core() -> DashboardCore {
        DashboardCore::initialize(
            &AppConfig::default(),
            Arc::new(MemoryStateStorage::new()),
            Arc::new(MockProjectSource::instant()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_feed_lifecycle() {
        let core = core();
        assert_eq!(core.load_projects().await.unwrap(), 6);
        assert!(core.recent_updates().is_empty());

        core.start_live_feed_with(Box::new(FixedJitter(2)));
        core.start_live_feed_with(Box::new(FixedJitter(2)));
        assert!(core.is_live());

        tokio::time::sleep(Duration::from_millis(5001)).await;
        let first = core.projects.projects();
        assert_eq!(first[0].progress, 77);
        assert_eq!(first[0].tasks_completed, 46);
        assert_eq!(core.recent_updates().len(), 3);
        assert!(core.last_update().is_some());

        core.teardown();
        assert!(!core.is_live());
        tokio::time::sleep(Duration::from_millis(20000)).await;
        assert_eq!(core.projects.projects()[0].progress, 77);
    }

    #[tokio::test]
    async fn test_teardown_ends_open_streams() {
        let core = core();
        core.load_projects().await.unwrap();
        assert_eq!(core.projection.stats().total_projects, 6);

        let mut updates = Box::pin(core.stream_updates());
        let mut stats = Box::pin(core.watch_stats());
        let mut widgets = Box::pin(core.watch_visible_widgets());
        assert_eq!(stats.next().await.unwrap().total_projects, 6);
        assert_eq!(widgets.next().await.unwrap().len(), 5);

        core.teardown();
        core.teardown();
        assert!(updates.next().await.is_none());
        assert!(stats.next().await.is_none());
        assert!(widgets.next().await.is_none());

        // streams opened after teardown end immediately
        assert!(Box::pin(core.stream_updates()).next().await.is_none());
    }

    #[test]
    fn test_reset_dashboard() {
        let core = core();
        core.widgets.remove("widget-2");
        core.reset_dashboard();
        assert_eq!(*core.widgets.all_widgets(), default_widgets());
    }
}
