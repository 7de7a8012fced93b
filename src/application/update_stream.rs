// Update stream - Simulated live progress ticks over the project collection
use crate::application::project_store::{LoadState, ProjectSnapshot};
use crate::domain::project::Project;
use chrono::{DateTime, Utc};
use futures::Stream;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Largest progress step a single tick may draw, inclusive.
pub const MAX_TICK_STEP: u32 = 2;

const TICK_BUFFER: usize = 16;

/// Source of per-project progress steps.
pub trait ProgressJitter: Send + 'static {
    fn next_step(&mut self) -> u32;
}

pub struct RandomJitter {
    rng: StdRng,
}

impl RandomJitter {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for RandomJitter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressJitter for RandomJitter {
    fn next_step(&mut self) -> u32 {
        self.rng.gen_range(0..=MAX_TICK_STEP)
    }
}

/// Always draws the same step.
#[cfg(test)]
pub struct FixedJitter(pub u32);

#[cfg(test)]
impl ProgressJitter for FixedJitter {
    fn next_step(&mut self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTick {
    pub sequence: u64,
    /// Store revision the candidate was computed from
    pub base_revision: u64,
    pub emitted_at: DateTime<Utc>,
    pub projects: Vec<Project>,
}

/// Computes the next candidate collection. Only advancing projects draw a step.
pub fn advance_projects(projects: &[Project], jitter: &mut dyn ProgressJitter) -> Vec<Project> {
    projects
        .iter()
        .map(|project| {
            if project.is_advancing() {
                project.advanced_by(jitter.next_step())
            } else {
                project.clone()
            }
        })
        .collect()
}

/// Handle to a running ticker. Dropping it cancels the ticker.
pub struct UpdateSubscription {
    rx: mpsc::Receiver<ProjectTick>,
    task: JoinHandle<()>,
}

impl UpdateSubscription {
    pub fn spawn(
        mut source: watch::Receiver<ProjectSnapshot>,
        period: Duration,
        mut jitter: Box<dyn ProgressJitter>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(TICK_BUFFER);

        let task = tokio::spawn(async move {
            // First tick lands one full period after subscribing
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut sequence = 0u64;

            loop {
                ticker.tick().await;

                let snapshot = source.borrow_and_update().clone();
                if snapshot.load_state != LoadState::Ready {
                    tracing::debug!(state = ?snapshot.load_state, "Skipping tick, projects not available");
                    continue;
                }

                sequence += 1;
                let projects = advance_projects(&snapshot.projects, jitter.as_mut());
                let tick = ProjectTick {
                    sequence,
                    base_revision: snapshot.revision,
                    emitted_at: Utc::now(),
                    projects,
                };

                tracing::debug!(sequence, "Emitting project tick");
                if tx.send(tick).await.is_err() {
                    tracing::debug!("Tick subscriber gone, stopping ticker");
                    break;
                }
            }
        });

        Self { rx, task }
    }

    pub async fn next(&mut self) -> Option<ProjectTick> {
        self.rx.recv().await
    }
}

impl Drop for UpdateSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl Stream for UpdateSubscription {
    type Item = ProjectTick;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
