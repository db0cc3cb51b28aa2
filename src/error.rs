//! Error type shared by the report core, the store and the service layer.

use std::fmt;

/// Result type for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// What kind of record a [`ReportError::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    BuiltinReport,
    Template,
    User,
    Artifact,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::BuiltinReport => "Report",
            Entity::Template => "Report template",
            Entity::User => "User",
            Entity::Artifact => "File",
        };
        f.write_str(name)
    }
}

/// Errors produced while resolving, generating or storing reports.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: Entity, key: String },

    #[error("{0}")]
    AccessDenied(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    InvalidFilters(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Rows must be a list of objects: {0}")]
    InvalidRows(String),

    #[error("Report '{report}' cannot be scoped by {key}")]
    UnsupportedScope { report: String, key: String },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("SQLite error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database schema version {found} does not match expected {expected}")]
    SchemaVersion { found: i32, expected: i32 },
}

impl ReportError {
    pub fn not_found(entity: Entity, key: impl fmt::Display) -> Self {
        ReportError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// True for errors caused by the caller rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ReportError::NotFound { .. }
                | ReportError::AccessDenied(_)
                | ReportError::Unauthenticated
                | ReportError::InvalidFilters(_)
                | ReportError::Validation(_)
        )
    }
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::Encoding(err.to_string())
    }
}
