// Widget domain model
use super::project::{Project, ProjectStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetType {
    ProjectList,
    ProjectStats,
    ProgressChart,
    Timeline,
    RealTimeUpdates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Doughnut,
    Pie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One entry of a status filter. Strings that name no known status are kept
/// as written and never match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusFilter {
    Known(ProjectStatus),
    Unknown(String),
}

impl StatusFilter {
    fn matches(&self, status: ProjectStatus) -> bool {
        matches!(self, StatusFilter::Known(known) if *known == status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Vec<StatusFilter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

impl WidgetFilters {
    pub fn by_status(statuses: &[ProjectStatus]) -> Self {
        Self {
            status: Some(statuses.iter().copied().map(StatusFilter::Known).collect()),
            date_range: None,
        }
    }

    /// An empty or missing status list lets every status through.
    pub fn matches(&self, project: &Project) -> bool {
        let status_ok = match &self.status {
            Some(statuses) if !statuses.is_empty() => {
                statuses.iter().any(|s| s.matches(project.status))
            }
            _ => true,
        };
        let range_ok = self
            .date_range
            .map(|r| project.overlaps(r.start, r.end))
            .unwrap_or(true);
        status_ok && range_ok
    }
}

/// Loose configuration bag as it appears on the wire and in persisted state.
///
/// Doubles as the partial update accepted by `update_config`: every key that
/// is present overwrites, every key that is absent is left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<WidgetFilters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<ChartType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_legend: Option<bool>,
}

/// Per-type widget configuration. Each variant only carries the keys its
/// widget type understands.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetConfig {
    ProjectList {
        filters: Option<WidgetFilters>,
    },
    ProjectStats,
    ProgressChart {
        chart_type: Option<ChartType>,
        show_legend: Option<bool>,
    },
    Timeline,
    RealTimeUpdates {
        refresh_interval: Option<u64>,
    },
}

impl WidgetConfig {
    /// Configuration a freshly added widget of `widget_type` starts with.
    pub fn default_for(widget_type: WidgetType) -> Self {
        match widget_type {
            WidgetType::ProjectList => WidgetConfig::ProjectList {
                filters: Some(WidgetFilters::by_status(&[])),
            },
            WidgetType::ProjectStats => WidgetConfig::ProjectStats,
            WidgetType::ProgressChart => WidgetConfig::ProgressChart {
                chart_type: Some(ChartType::Bar),
                show_legend: Some(true),
            },
            WidgetType::Timeline => WidgetConfig::Timeline,
            WidgetType::RealTimeUpdates => WidgetConfig::RealTimeUpdates {
                refresh_interval: Some(DEFAULT_REFRESH_INTERVAL_MS),
            },
        }
    }

    /// Builds the typed config for `widget_type`, dropping keys it does not use.
    pub fn from_patch(widget_type: WidgetType, patch: &ConfigPatch) -> Self {
        let mut config = match widget_type {
            WidgetType::ProjectList => WidgetConfig::ProjectList { filters: None },
            WidgetType::ProjectStats => WidgetConfig::ProjectStats,
            WidgetType::ProgressChart => WidgetConfig::ProgressChart {
                chart_type: None,
                show_legend: None,
            },
            WidgetType::Timeline => WidgetConfig::Timeline,
            WidgetType::RealTimeUpdates => WidgetConfig::RealTimeUpdates {
                refresh_interval: None,
            },
        };
        config.merge(patch);
        config
    }

    pub fn widget_type(&self) -> WidgetType {
        match self {
            WidgetConfig::ProjectList { .. } => WidgetType::ProjectList,
            WidgetConfig::ProjectStats => WidgetType::ProjectStats,
            WidgetConfig::ProgressChart { .. } => WidgetType::ProgressChart,
            WidgetConfig::Timeline => WidgetType::Timeline,
            WidgetConfig::RealTimeUpdates { .. } => WidgetType::RealTimeUpdates,
        }
    }

    /// Shallow merge. Nested values such as `filters` are replaced whole.
    /// Returns `true` if any key applied to this widget type.
    pub fn merge(&mut self, patch: &ConfigPatch) -> bool {
        let mut applied = false;
        match self {
            WidgetConfig::ProjectList { filters } => {
                if let Some(f) = &patch.filters {
                    *filters = Some(f.clone());
                    applied = true;
                }
            }
            WidgetConfig::ProgressChart {
                chart_type,
                show_legend,
            } => {
                if let Some(kind) = patch.chart_type {
                    *chart_type = Some(kind);
                    applied = true;
                }
                if let Some(legend) = patch.show_legend {
                    *show_legend = Some(legend);
                    applied = true;
                }
            }
            WidgetConfig::RealTimeUpdates { refresh_interval } => {
                if let Some(interval) = patch.refresh_interval {
                    *refresh_interval = Some(interval);
                    applied = true;
                }
            }
            WidgetConfig::ProjectStats | WidgetConfig::Timeline => {}
        }
        applied
    }

    pub fn to_patch(&self) -> ConfigPatch {
        match self {
            WidgetConfig::ProjectList { filters } => ConfigPatch {
                filters: filters.clone(),
                ..Default::default()
            },
            WidgetConfig::ProgressChart {
                chart_type,
                show_legend,
            } => ConfigPatch {
                chart_type: *chart_type,
                show_legend: *show_legend,
                ..Default::default()
            },
            WidgetConfig::RealTimeUpdates { refresh_interval } => ConfigPatch {
                refresh_interval: *refresh_interval,
                ..Default::default()
            },
            WidgetConfig::ProjectStats | WidgetConfig::Timeline => ConfigPatch::default(),
        }
    }

    pub fn filters(&self) -> Option<&WidgetFilters> {
        match self {
            WidgetConfig::ProjectList { filters } => filters.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WidgetRecord", into = "WidgetRecord")]
pub struct Widget {
    pub id: String,
    pub title: String,
    pub order: u32,
    pub visible: bool,
    pub config: WidgetConfig,
}

impl Widget {
    pub fn widget_type(&self) -> WidgetType {
        self.config.widget_type()
    }
}

// Flat wire shape: `type` and a loose `config` bag side by side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WidgetRecord {
    id: String,
    #[serde(rename = "type")]
    widget_type: WidgetType,
    title: String,
    order: u32,
    visible: bool,
    #[serde(default)]
    config: Option<ConfigPatch>,
}

impl From<WidgetRecord> for Widget {
    fn from(record: WidgetRecord) -> Self {
        let patch = record.config.unwrap_or_default();
        Widget {
            id: record.id,
            title: record.title,
            order: record.order,
            visible: record.visible,
            config: WidgetConfig::from_patch(record.widget_type, &patch),
        }
    }
}

impl From<Widget> for WidgetRecord {
    fn from(widget: Widget) -> Self {
        WidgetRecord {
            widget_type: widget.widget_type(),
            config: Some(widget.config.to_patch()),
            id: widget.id,
            title: widget.title,
            order: widget.order,
            visible: widget.visible,
        }
    }
}

/// A widget as requested by the caller, before the registry assigns identity
/// and position.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWidget {
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    pub title: String,
    #[serde(default)]
    pub config: Option<ConfigPatch>,
}

impl NewWidget {
    #[cfg(test)]
    pub fn new(widget_type: WidgetType, title: impl Into<String>) -> Self {
        Self {
            widget_type,
            title: title.into(),
            config: None,
        }
    }

    pub fn into_widget(self, id: String, order: u32) -> Widget {
        let config = match &self.config {
            Some(patch) => WidgetConfig::from_patch(self.widget_type, patch),
            None => WidgetConfig::default_for(self.widget_type),
        };
        Widget {
            id,
            title: self.title,
            order,
            visible: true,
            config,
        }
    }
}

/// The five widgets a fresh dashboard starts with.
pub fn default_widgets() -> Vec<Widget> {
    let seed = [
        ("Project Statistics", WidgetConfig::ProjectStats),
        (
            "Real-Time Updates",
            WidgetConfig::RealTimeUpdates {
                refresh_interval: Some(DEFAULT_REFRESH_INTERVAL_MS),
            },
        ),
        (
            "Active Projects",
            WidgetConfig::ProjectList {
                filters: Some(WidgetFilters::by_status(&[ProjectStatus::Active])),
            },
        ),
        (
            "Progress Overview",
            WidgetConfig::ProgressChart {
                chart_type: Some(ChartType::Bar),
                show_legend: Some(true),
            },
        ),
        ("Project Timeline", WidgetConfig::Timeline),
    ];

    seed.into_iter()
        .enumerate()
        .map(|(index, (title, config))| Widget {
            id: format!("widget-{}", index + 1),
            title: title.to_string(),
            order: index as u32,
            visible: true,
            config,
        })
        .collect()
}

/// Visible widgets sorted by `order`. Ties keep their array order.
pub fn visible_in_order(widgets: &[Widget]) -> Vec<Widget> {
    let mut visible: Vec<Widget> = widgets.iter().filter(|w| w.visible).cloned().collect();
    visible.sort_by_key(|w| w.order);
    visible
}

/// Rewrites every `order` to its array index.
pub fn compact_order(widgets: &mut [Widget]) {
    for (index, widget) in widgets.iter_mut().enumerate() {
        widget.order = index as u32;
    }
}
