// Project store - Canonical project collection and its derived statistics
use crate::application::memo::Memo;
use crate::application::ports::ProjectSource;
use crate::application::update_stream::{ProgressJitter, UpdateSubscription};
use crate::domain::project::{Project, ProjectStats, StatusBreakdown};
use crate::error::DashboardError;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Idle,
    Ready,
    Failed,
}

/// Immutable view of the collection at one revision.
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    pub revision: u64,
    pub load_state: LoadState,
    pub projects: Arc<Vec<Project>>,
}

pub struct ProjectStore {
    source: Arc<dyn ProjectSource>,
    snapshot: watch::Sender<ProjectSnapshot>,
    stats: Memo<u64, ProjectStats>,
    breakdown: Memo<u64, StatusBreakdown>,
}

impl ProjectStore {
    pub fn new(source: Arc<dyn ProjectSource>) -> Self {
        let (snapshot, _) = watch::channel(ProjectSnapshot {
            revision: 0,
            load_state: LoadState::Idle,
            projects: Arc::new(Vec::new()),
        });
        Self {
            source,
            snapshot,
            stats: Memo::new(),
            breakdown: Memo::new(),
        }
    }

    /// Fetches from the source and replaces the collection.
    ///
    /// On failure the previous collection is kept but the store is marked
    /// `Failed`, which pauses the update stream until a later load succeeds.
    pub async fn load(&self) -> Result<usize, DashboardError> {
        match self.source.fetch_projects().await {
            Ok(projects) => {
                let count = projects.len();
                self.replace_all(projects);
                tracing::info!(count, "Projects loaded");
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Project load failed");
                self.snapshot.send_modify(|snapshot| {
                    snapshot.revision += 1;
                    snapshot.load_state = LoadState::Failed;
                });
                Err(e)
            }
        }
    }

    /// Atomically swaps in a new collection and notifies subscribers.
    pub fn replace_all(&self, projects: Vec<Project>) {
        self.snapshot.send_modify(|snapshot| {
            snapshot.revision += 1;
            snapshot.load_state = LoadState::Ready;
            snapshot.projects = Arc::new(projects);
        });
    }

    /// Applies a tick computed from `base_revision`. A tick is dropped when
    /// the collection moved on since, or while the store is not `Ready`, so a
    /// failed reload cannot be undone by a tick that was already in flight.
    pub fn apply_tick(&self, base_revision: u64, projects: Vec<Project>) -> bool {
        self.snapshot.send_if_modified(|snapshot| {
            if snapshot.revision != base_revision || snapshot.load_state != LoadState::Ready {
                return false;
            }
            snapshot.revision += 1;
            snapshot.projects = Arc::new(projects);
            true
        })
    }

    pub fn snapshot(&self) -> ProjectSnapshot {
        self.snapshot.borrow().clone()
    }

    #[cfg(test)]
    pub fn projects(&self) -> Arc<Vec<Project>> {
        self.snapshot.borrow().projects.clone()
    }

    #[cfg(test)]
    pub fn load_state(&self) -> LoadState {
        self.snapshot.borrow().load_state
    }

    pub fn stats(&self) -> ProjectStats {
        let snapshot = self.snapshot();
        *self
            .stats
            .get_or_compute(snapshot.revision, || ProjectStats::from_projects(&snapshot.projects))
    }

    pub fn status_breakdown(&self) -> StatusBreakdown {
        let snapshot = self.snapshot();
        *self.breakdown.get_or_compute(snapshot.revision, || {
            StatusBreakdown::from_projects(&snapshot.projects)
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<ProjectSnapshot> {
        self.snapshot.subscribe()
    }

    /// Starts a ticker that emits candidate collections every `period`.
    ///
    /// The store itself is never modified by the ticker; apply a tick with
    /// [`ProjectStore::apply_tick`] or [`ProjectStore::replace_all`].
    pub fn stream_updates(
        &self,
        period: Duration,
        jitter: Box<dyn ProgressJitter>,
    ) -> UpdateSubscription {
        UpdateSubscription::spawn(self.subscribe(), period, jitter)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Source returning a scripted sequence of results, then repeating the last.
    pub struct ScriptedSource {
        results: Mutex<Vec<Result<Vec<Project>, String>>>,
    }

    impl ScriptedSource {
        pub fn new(results: Vec<Result<Vec<Project>, String>>) -> Self {
            Self {
                results: Mutex::new(results),
            }
        }
    }

    #[async_trait]
    impl ProjectSource for ScriptedSource {
        async fn fetch_projects(&self) -> Result<Vec<Project>, DashboardError> {
            let mut results = self.results.lock();
            let next = if results.len() > 1 {
                results.remove(0)
            } else {
                results[0].clone()
            };
            next.map_err(DashboardError::SourceUnavailable)
        }
    }
}
