use super::{BuiltinReport, ColumnDef, RowIter};
use crate::error::ReportResult;
use crate::filters::ReportFilters;
use crate::model::{FacilityRecord, Id, NamedReport};
use crate::projection::{project_rows, Column, Value};
use crate::query::{Condition, SelectQuery};
use crate::scope::{ScopeKey, ScopeTarget};
use crate::store::{facility_query, ReportStore};

/// Facilities visible to a faction: the ones it has enrolled at.
const FACILITIES_OF_FACTION: &str = "fac.id IN (\
     SELECT fen.facility_id FROM facility_enrollments fen \
     JOIN weeks w ON w.facility_enrollment_id = fen.id \
     JOIN faction_enrollments fe ON fe.week_id = w.id \
     WHERE fe.faction_id = ?)";

const FACILITIES_OF_FACTION_SLUG: &str = "fac.id IN (\
     SELECT fen.facility_id FROM facility_enrollments fen \
     JOIN weeks w ON w.facility_enrollment_id = fen.id \
     JOIN faction_enrollments fe ON fe.week_id = w.id \
     JOIN factions f ON f.id = fe.faction_id \
     WHERE f.slug = ?)";

/// Facility directory. Admins may view it across organizations.
pub struct FacilityDirectoryReport {
    columns: Vec<Column<FacilityRecord>>,
}

impl FacilityDirectoryReport {
    pub fn new() -> Self {
        Self {
            columns: vec![
                Column::new("name", "Facility", |r| Value::text(&r.name)),
                Column::new("slug", "Slug", |r| Value::text(&r.slug)),
                Column::new("organization__name", "Organization", |r| {
                    r.organization.clone().into()
                }),
            ],
        }
    }
}

impl Default for FacilityDirectoryReport {
    fn default() -> Self {
        Self::new()
    }
}

impl NamedReport for FacilityDirectoryReport {
    fn name(&self) -> &str {
        "Facility Directory"
    }
}

impl BuiltinReport for FacilityDirectoryReport {
    fn slug(&self) -> &str {
        "facility-directory"
    }

    fn description(&self) -> &str {
        "Facilities and the organizations that run them."
    }

    fn allow_unscoped(&self) -> bool {
        true
    }

    fn scope_target(&self) -> ScopeTarget {
        ScopeTarget::Facility
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

    // Facilities carry no dates, so the range filters do not apply here.
    fn base_query(&self, filters: &ReportFilters) -> SelectQuery {
        facility_query()
            .filter_opt(filters.facility_slug.as_deref(), |slug| {
                Condition::eq("fac.slug", slug)
            })
            .filter_opt(filters.faction_slug.as_deref(), |slug| {
                Condition::raw(FACILITIES_OF_FACTION_SLUG, vec![slug.into()])
            })
    }

    fn scope_condition(&self, key: ScopeKey, id: Id) -> Option<Condition> {
        match key {
            ScopeKey::Facility => Some(Condition::eq("fac.id", id)),
            ScopeKey::Organization => Some(Condition::eq("fac.organization_id", id)),
            ScopeKey::Faction => Some(Condition::raw(FACILITIES_OF_FACTION, vec![id.into()])),
            ScopeKey::WeekFacility | ScopeKey::FactionOrganization => None,
        }
    }

    fn fetch<'a>(&'a self, store: &ReportStore, query: &SelectQuery) -> ReportResult<RowIter<'a>> {
        let records = store.query_facilities(query)?;
        Ok(Box::new(project_rows(records, &self.columns)))
    }
}
