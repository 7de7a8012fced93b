// Application state for HTTP handlers
use crate::application::dashboard_core::DashboardCore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub core: Arc<DashboardCore>,
}
