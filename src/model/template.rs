// src/model/template.rs
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::user::Id;

/// A user-created, persisted report definition with sharing controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTemplate {
    pub id: Id,
    pub name: String,
    pub description: String,
    /// Default filters stored with the template.
    pub filters: JsonValue,
    /// Query descriptor; opaque to the report layer.
    pub query: String,
    pub output_formats: BTreeSet<String>,
    pub created_by: Id,
    /// Users the owner shared the template with.
    pub available_to: BTreeSet<Id>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating a template. The owner comes from the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewReportTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "empty_object")]
    pub filters: JsonValue,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub output_formats: BTreeSet<String>,
    #[serde(default)]
    pub available_to: BTreeSet<Id>,
}

/// A partial edit; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub filters: Option<JsonValue>,
    pub query: Option<String>,
    pub output_formats: Option<BTreeSet<String>>,
    pub available_to: Option<BTreeSet<Id>>,
}

fn empty_object() -> JsonValue {
    JsonValue::Object(Default::default())
}

/// An immutable record of one report generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedReport {
    pub id: Id,
    pub name: String,
    pub template_id: Id,
    pub generated_by: Id,
    pub filters_applied: JsonValue,
    /// Stored artifact name, relative to the media root.
    pub output_file: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGeneratedReport {
    pub name: String,
    pub template_id: Id,
    pub generated_by: Id,
    pub filters_applied: JsonValue,
    pub output_file: String,
}
