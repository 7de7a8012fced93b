// Dashboard error types
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// Persisted payload is present but cannot be parsed or fails validation
    #[error("persisted dashboard state is unreadable: {0}")]
    CorruptState(String),

    /// Persisted payload was written by a newer schema
    #[error("persisted state version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The project source could not deliver data
    #[error("project source unavailable: {0}")]
    SourceUnavailable(String),

    /// Reorder input was not exactly the current visible set
    #[error("invalid reorder: {0}")]
    InvalidReorder(String),

    #[error("unknown widget: {0}")]
    UnknownWidget(String),

    #[error("invalid widget: {0}")]
    InvalidWidget(String),
}

impl From<serde_json::Error> for DashboardError {
    fn from(e: serde_json::Error) -> Self {
        DashboardError::Serialization(e.to_string())
    }
}
