//! Built-in reports.
//!
//! A built-in report is a statically defined, viewer-scoped listing. Each
//! one declares its columns, its base query and how scope keys map onto
//! that query; [`BuiltinReport::get_rows`] composes the three:
//!
//! ```text
//! base_query(filters)  ->  apply_scope(user, filters)  ->  store  ->  project rows
//! ```
//!
//! The [`ReportRegistry`] is built once at startup and handed to whoever
//! serves reports; it is never mutated afterwards.

mod facility_directory;
mod faction_enrollments;

pub use facility_directory::FacilityDirectoryReport;
pub use faction_enrollments::FactionEnrollmentReport;

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{Entity, ReportError, ReportResult};
use crate::filters::ReportFilters;
use crate::model::{Id, NamedReport, User};
use crate::projection::Row;
use crate::query::{Condition, SelectQuery};
use crate::scope::{user_can_unscope, user_scope_filters, ScopeKey, ScopeTarget};
use crate::store::ReportStore;

/// Rows of a report run, produced lazily.
pub type RowIter<'a> = Box<dyn Iterator<Item = Row> + 'a>;

/// A column as listed to clients: field path and header label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub path: &'static str,
    pub label: &'static str,
}

/// A statically defined report that scopes itself to the viewer.
pub trait BuiltinReport: NamedReport + Send + Sync {
    /// Unique key used in URLs.
    fn slug(&self) -> &str;

    fn description(&self) -> &str;

    /// Whether admins may ask for an unscoped view of this report.
    fn allow_unscoped(&self) -> bool {
        false
    }

    fn scope_target(&self) -> ScopeTarget {
        ScopeTarget::Faction
    }

    fn columns(&self) -> Vec<ColumnDef>;

    /// Header labels in column order.
    fn labels(&self) -> Vec<&'static str> {
        self.columns().into_iter().map(|c| c.label).collect()
    }

    fn is_available_to(&self, user: Option<&User>) -> bool {
        user.is_some_and(User::is_authenticated)
    }

    /// Unscoped query with the caller's optional predicates applied.
    fn base_query(&self, filters: &ReportFilters) -> SelectQuery;

    /// Translate one scope restriction into a predicate on the base query.
    ///
    /// `None` means the report cannot express that restriction.
    fn scope_condition(&self, key: ScopeKey, id: Id) -> Option<Condition>;

    /// Execute `query` and project the records into rows.
    fn fetch<'a>(&'a self, store: &ReportStore, query: &SelectQuery) -> ReportResult<RowIter<'a>>;

    /// Restrict `query` to what `user` may see, unless an eligible user
    /// asked for an unscoped view of an unscopable report.
    fn apply_scope(
        &self,
        query: SelectQuery,
        user: Option<&User>,
        filters: &ReportFilters,
    ) -> ReportResult<SelectQuery> {
        if self.allow_unscoped() && filters.unscoped && user_can_unscope(user) {
            tracing::debug!(report = self.slug(), "serving unscoped view");
            return Ok(query);
        }

        let scope = user_scope_filters(user, self.scope_target());
        let mut query = query;
        for (key, id) in scope.iter() {
            let condition =
                self.scope_condition(key, id)
                    .ok_or_else(|| ReportError::UnsupportedScope {
                        report: self.slug().to_string(),
                        key: key.to_string(),
                    })?;
            query = query.filter(condition);
        }
        Ok(query)
    }

    /// Run the report for `user`.
    fn get_rows<'a>(
        &'a self,
        store: &ReportStore,
        user: Option<&User>,
        filters: &ReportFilters,
    ) -> ReportResult<RowIter<'a>> {
        let query = self.base_query(filters);
        let query = self.apply_scope(query, user, filters)?;
        self.fetch(store, &query)
    }

    /// Serializable summary for index pages.
    fn info(&self) -> ReportInfo {
        ReportInfo {
            slug: self.slug().to_string(),
            name: self.name().to_string(),
            description: self.description().to_string(),
            allow_unscoped: self.allow_unscoped(),
            columns: self.columns(),
        }
    }
}

/// Summary of a built-in report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportInfo {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub allow_unscoped: bool,
    pub columns: Vec<ColumnDef>,
}

/// Immutable table of built-in reports, looked up by slug.
pub struct ReportRegistry {
    reports: Vec<Box<dyn BuiltinReport>>,
}

impl ReportRegistry {
    /// Build a registry, refusing duplicate slugs.
    pub fn new(reports: Vec<Box<dyn BuiltinReport>>) -> ReportResult<Self> {
        let mut seen = HashSet::new();
        for report in &reports {
            if !seen.insert(report.slug().to_string()) {
                return Err(ReportError::Validation(format!(
                    "duplicate report slug '{}'",
                    report.slug()
                )));
            }
        }
        Ok(Self { reports })
    }

    /// The reports shipped with the application.
    pub fn builtin() -> Self {
        Self {
            reports: vec![
                Box::new(FactionEnrollmentReport::new()),
                Box::new(FacilityDirectoryReport::new()),
            ],
        }
    }

    pub fn get_report(&self, slug: &str) -> ReportResult<&dyn BuiltinReport> {
        self.reports
            .iter()
            .find(|r| r.slug() == slug)
            .map(|r| r.as_ref())
            .ok_or_else(|| ReportError::not_found(Entity::BuiltinReport, slug))
    }

    pub fn available_reports_for(&self, user: Option<&User>) -> Vec<&dyn BuiltinReport> {
        self.reports
            .iter()
            .filter(|r| r.is_available_to(user))
            .map(|r| r.as_ref())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn BuiltinReport> {
        self.reports.iter().map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

impl Default for ReportRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
