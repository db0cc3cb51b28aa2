//! Report flows, independent of any transport.
//!
//! [`ReportService`] owns the store, the registry and the artifact store and
//! exposes one method per user-facing action. The HTTP layer and the CLI
//! both go through it, so access rules live in exactly one place.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::access::{ensure_template_access, NO_ACCESS_MESSAGE};
use crate::artifacts::ArtifactStore;
use crate::error::{Entity, ReportError, ReportResult};
use crate::export::{export_builtin, generate_report_output, Export, ExportFormat};
use crate::filters::ReportFilters;
use crate::model::{
    GeneratedReport, Id, NewGeneratedReport, NewReportTemplate, ReportTemplate, TemplateUpdate,
    User,
};
use crate::projection::{Row, Value};
use crate::registry::{ReportInfo, ReportRegistry};
use crate::store::ReportStore;

/// Message returned after a successful generation.
pub const GENERATED_MESSAGE: &str = "Report generated successfully";

/// Error message for a filters payload that is not JSON.
pub const INVALID_FILTERS_MESSAGE: &str = "Filters must be valid JSON.";

/// Filters as submitted: JSON text from a form field, or an embedded document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FilterPayload {
    Text(String),
    Document(JsonValue),
}

impl FilterPayload {
    /// The filters document; blank text means `{}`.
    pub fn to_json(&self) -> ReportResult<JsonValue> {
        match self {
            FilterPayload::Text(text) => parse_filters(Some(text)),
            FilterPayload::Document(doc) => Ok(doc.clone()),
        }
    }
}

impl From<&str> for FilterPayload {
    fn from(text: &str) -> Self {
        FilterPayload::Text(text.to_string())
    }
}

impl From<String> for FilterPayload {
    fn from(text: String) -> Self {
        FilterPayload::Text(text)
    }
}

/// A generation request: filters and the requested format.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub filters: Option<FilterPayload>,
    #[serde(default)]
    pub output_format: Option<String>,
}

impl GenerateRequest {
    pub fn filters_json(&self) -> ReportResult<JsonValue> {
        match &self.filters {
            Some(payload) => payload.to_json(),
            None => parse_filters(None),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub message: String,
    pub file_url: String,
    #[serde(skip)]
    pub report: Option<GeneratedReport>,
}

/// A built-in report run, shaped for display.
#[derive(Debug, Clone, Serialize)]
pub struct BuiltinDetail {
    pub report: ReportInfo,
    pub filters: ReportFilters,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Row values in column order.
    pub table_rows: Vec<Vec<Value>>,
}

pub struct ReportService {
    store: Arc<ReportStore>,
    registry: ReportRegistry,
    artifacts: ArtifactStore,
}

impl ReportService {
    pub fn new(store: Arc<ReportStore>, registry: ReportRegistry, artifacts: ArtifactStore) -> Self {
        Self {
            store,
            registry,
            artifacts,
        }
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    pub fn registry(&self) -> &ReportRegistry {
        &self.registry
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Resolve a username to an active user.
    pub fn authenticate(&self, username: Option<&str>) -> ReportResult<User> {
        let username = username
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ReportError::Unauthenticated)?;

        match self.store.get_user_by_username(username)? {
            Some(user) if user.is_authenticated() => Ok(user),
            _ => {
                tracing::debug!(%username, "rejected unknown or inactive user");
                Err(ReportError::Unauthenticated)
            }
        }
    }

    // ===== Templates =====

    /// Templates the user created or was given access to.
    pub fn list_templates_for(&self, user: &User) -> ReportResult<Vec<ReportTemplate>> {
        self.store.list_templates_accessible_to(user.id)
    }

    pub fn create_template(
        &self,
        user: &User,
        new: &NewReportTemplate,
    ) -> ReportResult<ReportTemplate> {
        self.store.create_template(user.id, new)
    }

    pub fn get_template_for(&self, user: &User, id: Id) -> ReportResult<ReportTemplate> {
        let template = self.load_template(id)?;
        ensure_template_access(&template, Some(user))?;
        Ok(template)
    }

    pub fn update_template(
        &self,
        user: &User,
        id: Id,
        update: &TemplateUpdate,
    ) -> ReportResult<ReportTemplate> {
        self.get_template_for(user, id)?;
        self.store
            .update_template(id, update)?
            .ok_or_else(|| ReportError::not_found(Entity::Template, id))
    }

    /// Render a template and record the generation.
    ///
    /// Nothing is written unless the user may use the template and the
    /// filters parse; the log record is only inserted after the artifact
    /// has been stored.
    pub fn generate_from_template(
        &self,
        user: &User,
        id: Id,
        request: &GenerateRequest,
    ) -> ReportResult<GenerateResponse> {
        let template = self.load_template(id)?;
        if !template.is_accessible_by(Some(user)) {
            tracing::warn!(template_id = id, user = %user.username, "generation denied");
            return Err(ReportError::AccessDenied("Access denied".to_string()));
        }

        let filters = request.filters_json()?;
        let output = generate_report_output(
            &template,
            Some(&filters),
            request.output_format.as_deref(),
        )?;
        let artifact = self.artifacts.save(&output.filename, &output.content)?;

        let record = NewGeneratedReport {
            name: template.name.clone(),
            template_id: template.id,
            generated_by: user.id,
            filters_applied: filters,
            output_file: artifact.name.clone(),
        };
        let generated = match self.store.record_generated_report(&record) {
            Ok(generated) => generated,
            Err(e) => {
                if let Err(cleanup) = self.artifacts.remove(&artifact.name) {
                    tracing::error!(name = %artifact.name, error = %cleanup, "failed to remove orphaned artifact");
                }
                return Err(e);
            }
        };

        tracing::info!(
            template_id = id,
            generated_id = generated.id,
            user = %user.username,
            file = %artifact.name,
            "generated report"
        );
        Ok(GenerateResponse {
            message: GENERATED_MESSAGE.to_string(),
            file_url: artifact.url,
            report: Some(generated),
        })
    }

    /// Generation log over the templates the user can access, newest first.
    pub fn list_generated_for(&self, user: &User) -> ReportResult<Vec<GeneratedReport>> {
        self.store.list_generated_reports_for(user.id)
    }

    fn load_template(&self, id: Id) -> ReportResult<ReportTemplate> {
        self.store
            .get_template(id)?
            .ok_or_else(|| ReportError::not_found(Entity::Template, id))
    }

    // ===== Built-in reports =====

    pub fn builtin_index(&self, user: &User) -> Vec<ReportInfo> {
        self.registry
            .available_reports_for(Some(user))
            .into_iter()
            .map(|r| r.info())
            .collect()
    }

    pub fn builtin_detail(
        &self,
        user: &User,
        slug: &str,
        filters: ReportFilters,
    ) -> ReportResult<BuiltinDetail> {
        let report = self.registry.get_report(slug)?;
        if !report.is_available_to(Some(user)) {
            return Err(ReportError::AccessDenied(
                NO_ACCESS_MESSAGE.to_string(),
            ));
        }

        let rows: Vec<Row> = report.get_rows(&self.store, Some(user), &filters)?.collect();
        let columns: Vec<String> = report.labels().into_iter().map(String::from).collect();
        let table_rows = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Ok(BuiltinDetail {
            report: report.info(),
            filters,
            columns,
            rows,
            table_rows,
        })
    }

    pub fn builtin_export(
        &self,
        user: &User,
        slug: &str,
        filters: &ReportFilters,
        format: ExportFormat,
    ) -> ReportResult<Export> {
        let report = self.registry.get_report(slug)?;
        if !report.is_available_to(Some(user)) {
            return Err(ReportError::AccessDenied(
                NO_ACCESS_MESSAGE.to_string(),
            ));
        }

        let rows = report.get_rows(&self.store, Some(user), filters)?;
        let export = export_builtin(report.slug(), &report.labels(), rows, format)?;
        tracing::info!(report = slug, user = %user.username, file = %export.filename, "exported report");
        Ok(export)
    }
}

/// Parse a filters payload; blank text is an empty object.
pub fn parse_filters(raw: Option<&str>) -> ReportResult<JsonValue> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(JsonValue::Object(Default::default())),
        Some(text) => serde_json::from_str(text)
            .map_err(|_| ReportError::InvalidFilters(INVALID_FILTERS_MESSAGE.to_string())),
    }
}
