// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod http_response;
pub mod mock_projects;
pub mod ndjson_stream;
pub mod state_storage;
