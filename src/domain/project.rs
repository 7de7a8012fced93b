// Project domain model
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const MAX_PROGRESS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectStatus {
    Active,
    Pending,
    Completed,
    #[serde(rename = "On Hold")]
    OnHold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub status: ProjectStatus,
    pub progress: u32,
    pub tasks_completed: u32,
    pub tasks_total: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Vec<String>>,
}

impl Project {
    /// Whether a live-update tick may still move this project forward.
    pub fn is_advancing(&self) -> bool {
        self.status == ProjectStatus::Active && self.progress < MAX_PROGRESS
    }

    /// Applies one tick worth of progress.
    ///
    /// `step` is the raw draw; the result never exceeds 100% progress and
    /// `tasks_completed` only moves by the whole-task share of the actual
    /// progress delta, capped at `tasks_total`.
    pub fn advanced_by(&self, step: u32) -> Project {
        if !self.is_advancing() {
            return self.clone();
        }

        let progress = (self.progress + step).min(MAX_PROGRESS);
        let delta = progress - self.progress;
        let gained = (delta * self.tasks_total) / MAX_PROGRESS;
        let tasks_completed = (self.tasks_completed + gained).min(self.tasks_total);

        Project {
            progress,
            tasks_completed,
            ..self.clone()
        }
    }

    /// Days from `today` until the end date, rounded up. Negative once overdue.
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.end_date - today).num_days()
    }

    /// Inclusive overlap test between the project's lifetime and a date window.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total_projects: usize,
    pub active_projects: usize,
    pub completed_projects: usize,
    pub average_progress: u32,
}

impl ProjectStats {
    pub fn from_projects(projects: &[Project]) -> Self {
        let mut stats = ProjectStats {
            total_projects: projects.len(),
            ..Default::default()
        };
        let mut progress_sum: u64 = 0;

        for project in projects {
            match project.status {
                ProjectStatus::Active => stats.active_projects += 1,
                ProjectStatus::Completed => stats.completed_projects += 1,
                _ => {}
            }
            progress_sum += u64::from(project.progress);
        }

        if !projects.is_empty() {
            let mean = progress_sum as f64 / projects.len() as f64;
            stats.average_progress = mean.round() as u32;
        }

        stats
    }
}

/// Counts for the statuses the headline stats leave out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    pub pending_projects: usize,
    pub on_hold_projects: usize,
}

impl StatusBreakdown {
    pub fn from_projects(projects: &[Project]) -> Self {
        projects.iter().fold(Self::default(), |mut acc, p| {
            match p.status {
                ProjectStatus::Pending => acc.pending_projects += 1,
                ProjectStatus::OnHold => acc.on_hold_projects += 1,
                _ => {}
            }
            acc
        })
    }
}

#[cfg(test)]
pub(crate) fn sample_project(id: &str, status: ProjectStatus, progress: u32) -> Project {
    Project {
        id: id.to_string(),
        name: format!("Project {}", id),
        status,
        progress,
        tasks_completed: 0,
        tasks_total: 10,
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        description: None,
        team: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_average_rounds_to_nearest() {
        let projects = vec![
            sample_project("1", ProjectStatus::Active, 75),
            sample_project("2", ProjectStatus::Completed, 100),
            sample_project("3", ProjectStatus::Pending, 30),
            sample_project("4", ProjectStatus::Active, 60),
        ];
        // 265 / 4 = 66.25
        let stats = ProjectStats::from_projects(&projects);
        assert_eq!(stats.total_projects, 4);
        assert_eq!(stats.active_projects, 2);
        assert_eq!(stats.completed_projects, 1);
        assert_eq!(stats.average_progress, 66);

        let projects = vec![
            sample_project("1", ProjectStatus::Active, 1),
            sample_project("2", ProjectStatus::Active, 2),
        ];
        assert_eq!(ProjectStats::from_projects(&projects).average_progress, 2);
    }

    #[test]
    fn test_stats_empty_collection() {
        let stats = ProjectStats::from_projects(&[]);
        assert_eq!(stats, ProjectStats::default());
        assert_eq!(stats.average_progress, 0);
    }

    #[test]
    fn test_advance_matches_whole_task_share() {
        let project = Project {
            progress: 75,
            tasks_completed: 45,
            tasks_total: 60,
            ..sample_project("1", ProjectStatus::Active, 75)
        };
        let next = project.advanced_by(2);
        assert_eq!(next.progress, 77);
        // floor(2 / 100 * 60) = 1
        assert_eq!(next.tasks_completed, 46);
    }

    #[test]
    fn test_advance_clamps_progress_and_tasks() {
        let project = Project {
            progress: 99,
            tasks_completed: 10,
            tasks_total: 10,
            ..sample_project("1", ProjectStatus::Active, 99)
        };
        let next = project.advanced_by(2);
        assert_eq!(next.progress, 100);
        assert_eq!(next.tasks_completed, 10);

        let done = next.advanced_by(2);
        assert_eq!(done, next);
    }

    #[test]
    fn test_advance_skips_inactive_projects() {
        let project = sample_project("1", ProjectStatus::OnHold, 45);
        assert_eq!(project.advanced_by(2), project);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ProjectStatus::OnHold).unwrap();
        assert_eq!(json, "\"On Hold\"");
        let status: ProjectStatus = serde_json::from_str("\"Active\"").unwrap();
        assert_eq!(status, ProjectStatus::Active);
    }

    #[test]
    fn test_days_remaining_and_overlap() {
        let project = sample_project("1", ProjectStatus::Active, 10);
        let today = NaiveDate::from_ymd_opt(2024, 12, 29).unwrap();
        assert_eq!(project.days_remaining(today), 2);
        let later = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(project.days_remaining(later), -2);

        let start = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(project.overlaps(start, end));
        assert!(!project.overlaps(later, end));
    }

    #[test]
    fn test_status_breakdown() {
        let projects = vec![
            sample_project("1", ProjectStatus::Pending, 0),
            sample_project("2", ProjectStatus::OnHold, 0),
            sample_project("3", ProjectStatus::OnHold, 0),
            sample_project("4", ProjectStatus::Active, 0),
        ];
        let breakdown = StatusBreakdown::from_projects(&projects);
        assert_eq!(breakdown.pending_projects, 1);
        assert_eq!(breakdown.on_hold_projects, 2);
    }
}
