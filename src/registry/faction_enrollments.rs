use super::{BuiltinReport, ColumnDef, RowIter};
use crate::error::ReportResult;
use crate::filters::ReportFilters;
use crate::model::{FactionEnrollmentRecord, Id, NamedReport};
use crate::projection::{project_rows, Column, Value};
use crate::query::{Condition, SelectQuery};
use crate::scope::ScopeKey;
use crate::store::{faction_enrollment_query, ReportStore};

/// Which faction is at which facility, in which week and quarters.
pub struct FactionEnrollmentReport {
    columns: Vec<Column<FactionEnrollmentRecord>>,
}

impl FactionEnrollmentReport {
    pub fn new() -> Self {
        Self {
            columns: vec![
                Column::new("faction__name", "Faction", |r| Value::text(&r.faction.name)),
                Column::new("week__facility_enrollment__facility__name", "Facility", |r| {
                    Value::text(&r.facility.name)
                }),
                Column::new("week__name", "Week", |r| Value::text(&r.week)),
                Column::new("quarters__name", "Quarters", |r| r.quarters.clone().into()),
                Column::new("start", "Start", |r| r.start.into()),
                Column::new("end", "End", |r| r.end.into()),
            ],
        }
    }
}

impl Default for FactionEnrollmentReport {
    fn default() -> Self {
        Self::new()
    }
}

impl NamedReport for FactionEnrollmentReport {
    fn name(&self) -> &str {
        "Faction Enrollments"
    }
}

impl BuiltinReport for FactionEnrollmentReport {
    fn slug(&self) -> &str {
        "faction-enrollments"
    }

    fn description(&self) -> &str {
        "Faction enrollments by facility, week and quarters."
    }

    fn columns(&self) -> Vec<ColumnDef> {
        self.columns
            .iter()
            .map(|c| ColumnDef {
                path: c.path,
                label: c.label,
            })
            .collect()
    }

    fn base_query(&self, filters: &ReportFilters) -> SelectQuery {
        faction_enrollment_query()
            .filter_opt(filters.faction_slug.as_deref(), |slug| {
                Condition::eq("f.slug", slug)
            })
            .filter_opt(filters.facility_slug.as_deref(), |slug| {
                Condition::eq("fac.slug", slug)
            })
            .filter_opt(filters.start, |start| Condition::gte("fe.start_date", start))
            .filter_opt(filters.end, |end| Condition::lte("fe.end_date", end))
    }

    fn scope_condition(&self, key: ScopeKey, id: Id) -> Option<Condition> {
        match key {
            ScopeKey::Faction => Some(Condition::eq("fe.faction_id", id)),
            ScopeKey::WeekFacility => Some(Condition::eq("fen.facility_id", id)),
            ScopeKey::FactionOrganization => Some(Condition::eq("f.organization_id", id)),
            ScopeKey::Facility | ScopeKey::Organization => None,
        }
    }

    fn fetch<'a>(&'a self, store: &ReportStore, query: &SelectQuery) -> ReportResult<RowIter<'a>> {
        let records = store.query_faction_enrollments(query)?;
        Ok(Box::new(project_rows(records, &self.columns)))
    }
}
