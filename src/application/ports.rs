// Ports for project data and dashboard persistence
use crate::domain::project::Project;
use crate::error::DashboardError;
use async_trait::async_trait;

#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// Fetch the full project collection
    async fn fetch_projects(&self) -> Result<Vec<Project>, DashboardError>;
}

/// Synchronous key/value store for the serialized dashboard state.
///
/// A missing key is `Ok(None)`, not an error. Writes are all-or-nothing.
pub trait StateStorage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, DashboardError>;

    fn write(&self, key: &str, payload: &str) -> Result<(), DashboardError>;

    /// Removing a missing key succeeds
    fn remove(&self, key: &str) -> Result<(), DashboardError>;
}
