// HTTP request handlers
use crate::application::project_store::LoadState;
use crate::domain::project::{Project, ProjectStats, StatusBreakdown};
use crate::domain::views::{ProgressChartData, RecentUpdate, TimelineEvent};
use crate::domain::widget::{ConfigPatch, NewWidget, Widget};
use crate::error::DashboardError;
use crate::infrastructure::http_response::ApiError;
use crate::infrastructure::ndjson_stream::stream_response;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectsResponse {
    pub load_state: LoadState,
    pub projects: Vec<ProjectRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRow {
    #[serde(flatten)]
    pub project: Project,
    pub days_remaining: i64,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: ProjectStats,
    #[serde(flatten)]
    pub breakdown: StatusBreakdown,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub visible: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub live: bool,
    pub last_update: Option<DateTime<Utc>>,
    pub updates: Vec<RecentUpdate>,
}

fn unknown(id: &str) -> ApiError {
    ApiError(DashboardError::UnknownWidget(id.to_string()))
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_projects(State(state): State<Arc<AppState>>) -> Json<ProjectsResponse> {
    let snapshot = state.core.projects.snapshot();
    let today = Utc::now().date_naive();
    Json(ProjectsResponse {
        load_state: snapshot.load_state,
        projects: snapshot
            .projects
            .iter()
            .map(|project| ProjectRow {
                days_remaining: project.days_remaining(today),
                project: project.clone(),
            })
            .collect(),
    })
}

/// Re-fetch projects from the source
pub async fn reload_projects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReloadResponse>, ApiError> {
    let count = state.core.load_projects().await?;
    Ok(Json(ReloadResponse { count }))
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        stats: state.core.projection.stats(),
        breakdown: state.core.projects.status_breakdown(),
    })
}

/// Visible widgets in display order
pub async fn visible_widgets(State(state): State<Arc<AppState>>) -> Json<Vec<Widget>> {
    Json(state.core.projection.visible_widgets().as_ref().clone())
}

pub async fn all_widgets(State(state): State<Arc<AppState>>) -> Json<Vec<Widget>> {
    Json(state.core.widgets.all_widgets().as_ref().clone())
}

pub async fn add_widget(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewWidget>,
) -> Result<(StatusCode, Json<Widget>), ApiError> {
    if request.title.trim().is_empty() {
        return Err(ApiError(DashboardError::InvalidWidget(
            "title must not be blank".to_string(),
        )));
    }
    let widget = state.core.widgets.add(request);
    Ok((StatusCode::CREATED, Json(widget)))
}

pub async fn remove_widget(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    if state.core.widgets.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(unknown(&id))
    }
}

pub async fn set_visibility(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<VisibilityRequest>,
) -> Result<Json<Widget>, ApiError> {
    let widgets = &state.core.widgets;
    if !widgets.set_visibility(&id, request.visible) {
        return Err(unknown(&id));
    }
    widgets.widget(&id).map(Json).ok_or_else(|| unknown(&id))
}

pub async fn toggle_visibility(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Widget>, ApiError> {
    let widgets = &state.core.widgets;
    widgets.toggle_visibility(&id).ok_or_else(|| unknown(&id))?;
    widgets.widget(&id).map(Json).ok_or_else(|| unknown(&id))
}

pub async fn update_config(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(patch): Json<ConfigPatch>,
) -> Result<Json<Widget>, ApiError> {
    state
        .core
        .widgets
        .update_config(&id, &patch)
        .map(Json)
        .ok_or_else(|| unknown(&id))
}

pub async fn reorder_widgets(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<Vec<Widget>>, ApiError> {
    state.core.widgets.reorder(&request.ids)?;
    Ok(Json(state.core.projection.visible_widgets().as_ref().clone()))
}

/// Clear persisted state and restore the default widgets
pub async fn reset_dashboard(State(state): State<Arc<AppState>>) -> Json<Vec<Widget>> {
    state.core.reset_dashboard();
    Json(state.core.projection.visible_widgets().as_ref().clone())
}

pub async fn widget_projects(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let projects = state.core.projection.widget_projects(&id)?;
    Ok(Json(projects.as_ref().clone()))
}

pub async fn widget_chart(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProgressChartData>, ApiError> {
    let chart = state.core.projection.progress_chart(&id)?;
    Ok(Json(chart.as_ref().clone()))
}

pub async fn timeline(State(state): State<Arc<AppState>>) -> Json<Vec<TimelineEvent>> {
    Json(state.core.projection.timeline().as_ref().clone())
}

pub async fn live_feed(State(state): State<Arc<AppState>>) -> Json<FeedResponse> {
    Json(FeedResponse {
        live: state.core.is_live(),
        last_update: state.core.last_update(),
        updates: state.core.recent_updates(),
    })
}

/// Stream update ticks as NDJSON until the client disconnects
pub async fn stream_updates(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    stream_response(state.core.stream_updates())
}

/// Stream stats whenever the project collection changes
pub async fn stream_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    stream_response(state.core.watch_stats())
}

/// Stream the visible widget list after every structural change
pub async fn stream_widgets(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    stream_response(state.core.watch_visible_widgets())
}
