// Live feed - Applies update ticks to the project store and keeps recent activity
use crate::application::project_store::ProjectStore;
use crate::application::update_stream::UpdateSubscription;
use crate::domain::project::ProjectStatus;
use crate::domain::views::RecentUpdate;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub const RECENT_UPDATES_LIMIT: usize = 5;

#[derive(Default)]
struct FeedState {
    recent: VecDeque<RecentUpdate>,
    last_update: Option<DateTime<Utc>>,
}

/// Background consumer of an [`UpdateSubscription`]. Stopping or dropping
/// the feed drops the subscription, which cancels its ticker.
pub struct LiveFeed {
    state: Arc<Mutex<FeedState>>,
    task: JoinHandle<()>,
}

impl LiveFeed {
    pub fn start(store: Arc<ProjectStore>, mut subscription: UpdateSubscription) -> Self {
        let state = Arc::new(Mutex::new(FeedState::default()));
        let feed_state = state.clone();

        let task = tokio::spawn(async move {
            while let Some(tick) = subscription.next().await {
                let updates: Vec<RecentUpdate> = tick
                    .projects
                    .iter()
                    .filter(|p| p.status == ProjectStatus::Active)
                    .map(|project| RecentUpdate {
                        project: project.clone(),
                        timestamp: tick.emitted_at,
                    })
                    .collect();

                if !store.apply_tick(tick.base_revision, tick.projects) {
                    tracing::debug!(sequence = tick.sequence, "Dropped stale project tick");
                    continue;
                }

                let mut state = feed_state.lock();
                state.last_update = Some(tick.emitted_at);
                for update in updates.into_iter().rev() {
                    state.recent.push_front(update);
                }
                state.recent.truncate(RECENT_UPDATES_LIMIT);
                tracing::debug!(sequence = tick.sequence, "Applied project tick");
            }
        });

        Self { state, task }
    }

    /// Newest first, at most [`RECENT_UPDATES_LIMIT`] entries.
    pub fn recent_updates(&self) -> Vec<RecentUpdate> {
        self.state.lock().recent.iter().cloned().collect()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.state.lock().last_update
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::project_store::LoadState;
    use crate::application::project_store::test_support::ScriptedSource;
    use crate::application::update_stream::FixedJitter;
    use crate::domain::project::sample_project;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_feed_applies_ticks_and_keeps_five_newest() {
        let store = Arc::new(ProjectStore::new(Arc::new(ScriptedSource::new(vec![Ok(
            Vec::new(),
        )]))));
        store.replace_all(vec![
            sample_project("1", ProjectStatus::Active, 10),
            sample_project("2", ProjectStatus::Active, 20),
            sample_project("3", ProjectStatus::OnHold, 30),
        ]);

        let subscription =
            store.stream_updates(Duration::from_millis(5000), Box::new(FixedJitter(2)));
        let feed = LiveFeed::start(store.clone(), subscription);
        assert!(feed.last_update().is_none());

        tokio::time::sleep(Duration::from_millis(5001)).await;
        let projects = store.projects();
        assert_eq!(projects[0].progress, 12);
        assert_eq!(projects[1].progress, 22);
        assert_eq!(projects[2].progress, 30);
        let recent = feed.recent_updates();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].project.id, "1");

        tokio::time::sleep(Duration::from_millis(10000)).await;
        assert_eq!(store.projects()[0].progress, 16);
        let recent = feed.recent_updates();
        assert_eq!(recent.len(), RECENT_UPDATES_LIMIT);
        assert_eq!(recent[0].project.progress, 16);
        assert!(feed.last_update().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_reload_stays_failed() {
        let store = Arc::new(ProjectStore::new(Arc::new(ScriptedSource::new(vec![
            Ok(vec![sample_project("1", ProjectStatus::Active, 10)]),
            Err("offline".to_string()),
        ]))));
        store.load().await.unwrap();

        let subscription = store.stream_updates(Duration::from_millis(100), Box::new(FixedJitter(1)));
        let feed = LiveFeed::start(store.clone(), subscription);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(store.projects()[0].progress, 11);

        store.load().await.unwrap_err();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(store.load_state(), LoadState::Failed);
        assert_eq!(store.projects()[0].progress, 11);
        assert_eq!(feed.recent_updates().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_updates() {
        let store = Arc::new(ProjectStore::new(Arc::new(ScriptedSource::new(vec![Ok(
            Vec::new(),
        )]))));
        store.replace_all(vec![sample_project("1", ProjectStatus::Active, 10)]);

        let subscription = store.stream_updates(Duration::from_millis(100), Box::new(FixedJitter(1)));
        let feed = LiveFeed::start(store.clone(), subscription);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(store.projects()[0].progress, 11);

        feed.stop();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(store.projects()[0].progress, 11);
    }
}
