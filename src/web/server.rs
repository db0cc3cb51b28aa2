//! Axum web server for campfire-reports
//!
//! Wires the report handlers and media serving onto a router and runs it.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::artifacts::ArtifactStore;
use crate::config::Settings;
use crate::registry::ReportRegistry;
use crate::service::ReportService;
use crate::store::ReportStore;

use super::{media, reports};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReportService>,
}

impl AppState {
    pub fn new(service: ReportService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Build the axum router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Report templates
        .route(
            "/api/templates",
            get(reports::list_templates).post(reports::create_template),
        )
        .route(
            "/api/templates/{id}",
            get(reports::get_template).put(reports::update_template),
        )
        .route("/api/templates/{id}/generate", post(reports::generate))
        .route("/api/generated", get(reports::list_generated))
        // Built-in reports
        .route("/api/builtin", get(reports::builtin_index))
        .route("/api/builtin/{slug}", get(reports::builtin_detail))
        .route("/api/builtin/{slug}/export", get(reports::builtin_export))
        .route(
            "/api/builtin/{slug}/export/{fmt}",
            get(reports::builtin_export_as),
        )
        // Generated files
        .route("/media/{*path}", get(media::serve_media))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the web server
pub async fn serve(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let store = ReportStore::open(settings.database_path()?)?;
    let artifacts = ArtifactStore::new(settings.media_root()?, &settings.media.url);
    let service = ReportService::new(Arc::new(store), ReportRegistry::builtin(), artifacts);
    let app = router(AppState::new(service));

    let addr = settings.server.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        %addr,
        database = %settings.database.path,
        media = %settings.media.root,
        "campfire-reports listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
