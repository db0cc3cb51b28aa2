use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use super::error::ApiError;
use super::identity::CurrentUser;
use super::server::AppState;

/// GET /media/{*path} - Serve a stored artifact
pub async fn serve_media(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state.service.artifacts().open(&path)?;
    let mime = mime_guess::from_path(&path).first_or_octet_stream();

    Ok(([(header::CONTENT_TYPE, mime.as_ref().to_string())], bytes).into_response())
}
