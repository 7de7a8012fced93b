// HTTP response utilities for JSON errors
use crate::error::DashboardError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Maps core errors onto HTTP status codes with a JSON body.
#[derive(Debug)]
pub struct ApiError(pub DashboardError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DashboardError::UnknownWidget(_) => StatusCode::NOT_FOUND,
            DashboardError::InvalidReorder(_) | DashboardError::InvalidWidget(_) => {
                StatusCode::BAD_REQUEST
            }
            DashboardError::SourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DashboardError::CorruptState(_)
            | DashboardError::UnsupportedVersion { .. }
            | DashboardError::Io(_)
            | DashboardError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DashboardError> for ApiError {
    fn from(e: DashboardError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
