use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::ReportError;

/// A [`ReportError`] on its way out as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    Report(ReportError),
    /// Failure inside the generation flow; server-side errors get a prefix.
    Generation(ReportError),
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        ApiError::Report(err)
    }
}

fn status_for(err: &ReportError) -> StatusCode {
    match err {
        ReportError::NotFound { .. } => StatusCode::NOT_FOUND,
        ReportError::AccessDenied(_) => StatusCode::FORBIDDEN,
        ReportError::Unauthenticated => StatusCode::UNAUTHORIZED,
        ReportError::InvalidFilters(_) | ReportError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (err, generating) = match self {
            ApiError::Report(err) => (err, false),
            ApiError::Generation(err) => (err, true),
        };

        let status = status_for(&err);
        let message = if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
            if generating {
                format!("Error generating report: {err}")
            } else {
                err.to_string()
            }
        } else {
            err.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
