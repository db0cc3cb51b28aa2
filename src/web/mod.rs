//! HTTP surface for campfire-reports.
//!
//! A thin axum layer over [`crate::service::ReportService`]. Identity is
//! taken from the `X-Remote-User` header set by an upstream proxy.

mod error;
mod identity;
mod media;
mod reports;
mod server;

pub use error::ApiError;
pub use identity::{CurrentUser, REMOTE_USER_HEADER};
pub use server::{router, serve, AppState};
