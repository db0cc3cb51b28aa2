use axum::{extract::FromRequestParts, http::request::Parts};

use super::error::ApiError;
use super::server::AppState;
use crate::model::User;

/// Header carrying the authenticated username.
pub const REMOTE_USER_HEADER: &str = "x-remote-user";

/// The active user behind a request. Rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let username = parts
            .headers
            .get(REMOTE_USER_HEADER)
            .and_then(|v| v.to_str().ok());
        let user = state.service.authenticate(username)?;
        Ok(CurrentUser(user))
    }
}
