// Application layer - Stores, derived views and the ports they depend on
pub mod dashboard_core;
pub mod live_feed;
pub mod memo;
pub mod ports;
pub mod project_store;
pub mod projection;
pub mod update_stream;
pub mod widget_registry;
