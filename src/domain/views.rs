// Derived view models rendered by the dashboard widgets
use super::project::{Project, ProjectStatus};
use super::widget::{ChartType, WidgetConfig};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineEventKind {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub project_id: String,
    pub project_name: String,
    pub date: NaiveDate,
    pub kind: TimelineEventKind,
    pub label: &'static str,
}

/// Start and end events for every project, oldest first.
pub fn timeline_events(projects: &[Project]) -> Vec<TimelineEvent> {
    let mut events = Vec::with_capacity(projects.len() * 2);

    for project in projects {
        events.push(TimelineEvent {
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            date: project.start_date,
            kind: TimelineEventKind::Start,
            label: "Started",
        });
        events.push(TimelineEvent {
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            date: project.end_date,
            kind: TimelineEventKind::End,
            label: if project.status == ProjectStatus::Completed {
                "Completed"
            } else {
                "Deadline"
            },
        });
    }

    events.sort_by_key(|e| e.date);
    events
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressChartData {
    pub chart_type: ChartType,
    pub show_legend: bool,
    pub points: Vec<ChartPoint>,
}

impl ProgressChartData {
    /// Chart kind falls back to bar and the legend is shown unless turned off.
    pub fn build(projects: &[Project], config: &WidgetConfig) -> Self {
        let (chart_type, show_legend) = match config {
            WidgetConfig::ProgressChart {
                chart_type,
                show_legend,
            } => (chart_type.unwrap_or_default(), show_legend.unwrap_or(true)),
            _ => (ChartType::default(), true),
        };

        let points = projects
            .iter()
            .map(|p| ChartPoint {
                label: p.name.clone(),
                value: p.progress,
            })
            .collect();

        Self {
            chart_type,
            show_legend,
            points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentUpdate {
    pub project: Project,
    pub timestamp: DateTime<Utc>,
}
