//! Template and built-in report handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::error::ApiError;
use super::identity::CurrentUser;
use super::server::AppState;
use crate::export::{Export, ExportFormat};
use crate::filters::FilterParams;
use crate::model::{
    GeneratedReport, Id, NewReportTemplate, ReportTemplate, TemplateUpdate, User,
};
use crate::registry::ReportInfo;
use crate::error::ReportError;
use crate::service::{BuiltinDetail, GenerateRequest, GenerateResponse, INVALID_FILTERS_MESSAGE};

// ============================================================================
// Templates
// ============================================================================

/// GET /api/templates - Templates owned by or shared with the user
pub async fn list_templates(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ReportTemplate>>, ApiError> {
    Ok(Json(state.service.list_templates_for(&user)?))
}

/// POST /api/templates - Create a template owned by the user
pub async fn create_template(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(new): Json<NewReportTemplate>,
) -> Result<(StatusCode, Json<ReportTemplate>), ApiError> {
    let template = state.service.create_template(&user, &new)?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// GET /api/templates/{id}
pub async fn get_template(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Id>,
) -> Result<Json<ReportTemplate>, ApiError> {
    Ok(Json(state.service.get_template_for(&user, id)?))
}

/// PUT /api/templates/{id}
pub async fn update_template(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Id>,
    Json(update): Json<TemplateUpdate>,
) -> Result<Json<ReportTemplate>, ApiError> {
    Ok(Json(state.service.update_template(&user, id, &update)?))
}

/// POST /api/templates/{id}/generate - Render and store an output file
pub async fn generate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Id>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected generation body");
        ApiError::Generation(ReportError::InvalidFilters(
            INVALID_FILTERS_MESSAGE.to_string(),
        ))
    })?;
    state
        .service
        .generate_from_template(&user, id, &request)
        .map(Json)
        .map_err(ApiError::Generation)
}

/// GET /api/generated - Generation log for accessible templates
pub async fn list_generated(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<GeneratedReport>>, ApiError> {
    Ok(Json(state.service.list_generated_for(&user)?))
}

// ============================================================================
// Built-in reports
// ============================================================================

/// GET /api/builtin - Reports available to the user
pub async fn builtin_index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Json<Vec<ReportInfo>> {
    Json(state.service.builtin_index(&user))
}

/// GET /api/builtin/{slug}
pub async fn builtin_detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
    Query(params): Query<FilterParams>,
) -> Result<Json<BuiltinDetail>, ApiError> {
    let filters = params.parse()?;
    Ok(Json(state.service.builtin_detail(&user, &slug, filters)?))
}

/// GET /api/builtin/{slug}/export - CSV download
pub async fn builtin_export(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
    Query(params): Query<FilterParams>,
) -> Result<Response, ApiError> {
    export(&state, &user, &slug, params, ExportFormat::Csv)
}

/// GET /api/builtin/{slug}/export/{fmt} - CSV or tab-delimited download
pub async fn builtin_export_as(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((slug, fmt)): Path<(String, String)>,
    Query(params): Query<FilterParams>,
) -> Result<Response, ApiError> {
    export(&state, &user, &slug, params, ExportFormat::from_segment(&fmt))
}

fn export(
    state: &AppState,
    user: &User,
    slug: &str,
    params: FilterParams,
    format: ExportFormat,
) -> Result<Response, ApiError> {
    let filters = params.parse()?;
    let export = state.service.builtin_export(user, slug, &filters, format)?;
    Ok(attachment(export))
}

fn attachment(export: Export) -> Response {
    (
        [
            (header::CONTENT_TYPE, export.content_type.to_string()),
            (header::CONTENT_DISPOSITION, export.content_disposition()),
        ],
        export.body,
    )
        .into_response()
}
