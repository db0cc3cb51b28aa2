//! Caller-supplied filters for built-in reports.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, ReportResult};

/// Optional predicates a viewer can add to a built-in report.
///
/// Every field is independent; `None` imposes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportFilters {
    pub facility_slug: Option<String>,
    pub faction_slug: Option<String>,
    /// Lower bound (inclusive) on the report's start date.
    pub start: Option<NaiveDate>,
    /// Upper bound (inclusive) on the report's end date.
    pub end: Option<NaiveDate>,
    /// Ask to skip scoping. Honoured only for eligible users and reports.
    pub unscoped: bool,
}

impl ReportFilters {
    pub fn with_facility(mut self, slug: &str) -> Self {
        self.facility_slug = Some(slug.to_string());
        self
    }

    pub fn with_faction(mut self, slug: &str) -> Self {
        self.faction_slug = Some(slug.to_string());
        self
    }

    pub fn with_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn unscoped(mut self) -> Self {
        self.unscoped = true;
        self
    }
}

/// Raw query-string parameters, as they arrive from a request or the CLI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    pub facility_slug: Option<String>,
    pub faction_slug: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub unscoped: Option<String>,
}

impl FilterParams {
    /// Normalise into [`ReportFilters`].
    ///
    /// Empty values count as absent; anything else is taken as sent. Only
    /// `unscoped=1` turns scoping off.
    pub fn parse(self) -> ReportResult<ReportFilters> {
        Ok(ReportFilters {
            facility_slug: non_empty(self.facility_slug),
            faction_slug: non_empty(self.faction_slug),
            start: parse_date("start", self.start)?,
            end: parse_date("end", self.end)?,
            unscoped: self.unscoped.as_deref() == Some("1"),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_date(field: &str, value: Option<String>) -> ReportResult<Option<NaiveDate>> {
    match non_empty(value) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                ReportError::InvalidFilters(format!(
                    "'{field}' must be a date in YYYY-MM-DD format, got '{raw}'"
                ))
            }),
    }
}
