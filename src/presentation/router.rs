// HTTP routes and shutdown wiring
use crate::application::dashboard_core::DashboardCore;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    add_widget, all_widgets, get_stats, health_check, list_projects, live_feed, reload_projects,
    remove_widget, reorder_widgets, reset_dashboard, set_visibility, stream_stats, stream_updates,
    stream_widgets, timeline, toggle_visibility, update_config, visible_widgets, widget_chart,
    widget_projects,
};
use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/projects", get(list_projects))
        .route("/projects/reload", post(reload_projects))
        .route("/stats", get(get_stats))
        .route("/stats/stream", get(stream_stats))
        .route("/widgets", get(visible_widgets).post(add_widget))
        .route("/widgets/all", get(all_widgets))
        .route("/widgets/stream", get(stream_widgets))
        .route("/widgets/order", put(reorder_widgets))
        .route("/widgets/:id", delete(remove_widget))
        .route("/widgets/:id/visibility", put(set_visibility))
        .route("/widgets/:id/toggle", post(toggle_visibility))
        .route("/widgets/:id/config", patch(update_config))
        .route("/widgets/:id/projects", get(widget_projects))
        .route("/widgets/:id/chart", get(widget_chart))
        .route("/timeline", get(timeline))
        .route("/feed", get(live_feed))
        .route("/updates", get(stream_updates))
        .route("/dashboard/reset", post(reset_dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Waits for `signal`, then tears the core down. Streaming responses only
/// finish once the core is closed, so this has to run before graceful
/// shutdown starts waiting on open connections.
pub async fn shutdown_after(signal: impl Future<Output = ()>, core: Arc<DashboardCore>) {
    signal.await;
    tracing::info!("Shutting down");
    core.teardown();
}
