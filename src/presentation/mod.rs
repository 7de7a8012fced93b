// Presentation layer - HTTP boundary over the dashboard core
pub mod app_state;
pub mod handlers;
pub mod router;
