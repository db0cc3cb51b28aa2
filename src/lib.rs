//! # campfire-reports
//!
//! Scoped, permissioned reports over Campfire enrollment data.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Request (web handler / CLI command)              │
//! │        user + report slug or template + filters         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [registry]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Base query + caller filters                      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [scope]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Query restricted to what the user may see        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [store + projection]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Ordered rows (label -> value)                    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [export]
//! ┌─────────────────────────────────────────────────────────┐
//! │        CSV / tab-delimited / plain-text payload         │
//! │        -> HTTP response or stored artifact              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Stored templates skip the first three stages: their rows come from the
//! template's filters document, gated by [`access`].

pub mod access;
pub mod artifacts;
pub mod config;
pub mod error;
pub mod export;
pub mod filters;
pub mod logging;
pub mod model;
pub mod projection;
pub mod query;
pub mod registry;
pub mod scope;
pub mod service;
pub mod store;

#[cfg(feature = "server")]
pub mod web;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::error::{ReportError, ReportResult};
    pub use crate::export::{generate_report_output, ExportFormat, OutputFormat};
    pub use crate::filters::ReportFilters;
    pub use crate::model::{NamedReport, ReportTemplate, User};
    pub use crate::projection::{Row, Value};
    pub use crate::registry::{BuiltinReport, ReportRegistry};
    pub use crate::scope::{user_can_unscope, user_scope_filters, ScopeKey, ScopeTarget};
    pub use crate::service::ReportService;
    pub use crate::store::ReportStore;
}

pub use error::{ReportError, ReportResult};
pub use registry::ReportRegistry;
pub use service::ReportService;
pub use store::ReportStore;
