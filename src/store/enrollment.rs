use rusqlite::{params, params_from_iter, Row};

use super::ReportStore;
use crate::error::ReportResult;
use crate::model::{
    Faction, FactionEnrollment, FactionEnrollmentRecord, Facility, FacilityEnrollment,
    FacilityRecord, NamedRef, Organization, Quarters, Week,
};
use crate::query::SelectQuery;

/// Base query for faction enrollments joined through week and facility.
///
/// Aliases available to conditions: `fe` (faction_enrollments), `f`
/// (factions), `w` (weeks), `fen` (facility_enrollments), `fac`
/// (facilities), `q` (quarters).
pub fn faction_enrollment_query() -> SelectQuery {
    SelectQuery::from("faction_enrollments fe")
        .select(&[
            "fe.id",
            "f.id",
            "f.name",
            "f.slug",
            "fac.id",
            "fac.name",
            "fac.slug",
            "w.name",
            "q.name",
            "fe.start_date",
            "fe.end_date",
        ])
        .join("factions f", "f.id = fe.faction_id")
        .join("weeks w", "w.id = fe.week_id")
        .join("facility_enrollments fen", "fen.id = w.facility_enrollment_id")
        .join("facilities fac", "fac.id = fen.facility_id")
        .left_join("quarters q", "q.id = fe.quarters_id")
        .order_by("fe.id")
}

/// Base query for facilities. Aliases: `fac` (facilities), `o` (organizations).
pub fn facility_query() -> SelectQuery {
    SelectQuery::from("facilities fac")
        .select(&["fac.id", "fac.name", "fac.slug", "o.name"])
        .left_join("organizations o", "o.id = fac.organization_id")
        .order_by("fac.name")
        .order_by("fac.id")
}

fn to_faction_enrollment(row: &Row<'_>) -> rusqlite::Result<FactionEnrollmentRecord> {
    Ok(FactionEnrollmentRecord {
        id: row.get(0)?,
        faction: NamedRef {
            id: row.get(1)?,
            name: row.get(2)?,
            slug: row.get(3)?,
        },
        facility: NamedRef {
            id: row.get(4)?,
            name: row.get(5)?,
            slug: row.get(6)?,
        },
        week: row.get(7)?,
        quarters: row.get(8)?,
        start: row.get(9)?,
        end: row.get(10)?,
    })
}

fn to_facility(row: &Row<'_>) -> rusqlite::Result<FacilityRecord> {
    Ok(FacilityRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        organization: row.get(3)?,
    })
}

impl ReportStore {
    fn run_query<T>(
        &self,
        query: &SelectQuery,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> ReportResult<Vec<T>> {
        let (sql, params) = query.to_sql();
        tracing::debug!(%sql, params = params.len(), "running report query");

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), map)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Run a query built from [`faction_enrollment_query`].
    pub fn query_faction_enrollments(
        &self,
        query: &SelectQuery,
    ) -> ReportResult<Vec<FactionEnrollmentRecord>> {
        self.run_query(query, to_faction_enrollment)
    }

    /// Run a query built from [`facility_query`].
    pub fn query_facilities(&self, query: &SelectQuery) -> ReportResult<Vec<FacilityRecord>> {
        self.run_query(query, to_facility)
    }

    // ===== Reference data =====

    pub fn insert_organization(&self, org: &Organization) -> ReportResult<()> {
        self.conn().execute(
            "INSERT INTO organizations (id, name, slug) VALUES (?, ?, ?)",
            params![org.id, org.name, org.slug],
        )?;
        Ok(())
    }

    pub fn insert_facility(&self, facility: &Facility) -> ReportResult<()> {
        self.conn().execute(
            "INSERT INTO facilities (id, name, slug, organization_id) VALUES (?, ?, ?, ?)",
            params![
                facility.id,
                facility.name,
                facility.slug,
                facility.organization_id
            ],
        )?;
        Ok(())
    }

    pub fn insert_faction(&self, faction: &Faction) -> ReportResult<()> {
        self.conn().execute(
            "INSERT INTO factions (id, name, slug, organization_id) VALUES (?, ?, ?, ?)",
            params![
                faction.id,
                faction.name,
                faction.slug,
                faction.organization_id
            ],
        )?;
        Ok(())
    }

    pub fn insert_facility_enrollment(&self, enrollment: &FacilityEnrollment) -> ReportResult<()> {
        self.conn().execute(
            "INSERT INTO facility_enrollments (id, name, facility_id) VALUES (?, ?, ?)",
            params![enrollment.id, enrollment.name, enrollment.facility_id],
        )?;
        Ok(())
    }

    pub fn insert_week(&self, week: &Week) -> ReportResult<()> {
        self.conn().execute(
            "INSERT INTO weeks (id, name, facility_enrollment_id) VALUES (?, ?, ?)",
            params![week.id, week.name, week.facility_enrollment_id],
        )?;
        Ok(())
    }

    pub fn insert_quarters(&self, quarters: &Quarters) -> ReportResult<()> {
        self.conn().execute(
            "INSERT INTO quarters (id, name) VALUES (?, ?)",
            params![quarters.id, quarters.name],
        )?;
        Ok(())
    }

    pub fn insert_faction_enrollment(&self, enrollment: &FactionEnrollment) -> ReportResult<()> {
        self.conn().execute(
            "INSERT INTO faction_enrollments (id, faction_id, week_id, quarters_id, start_date, end_date) \
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                enrollment.id,
                enrollment.faction_id,
                enrollment.week_id,
                enrollment.quarters_id,
                enrollment.start,
                enrollment.end,
            ],
        )?;
        Ok(())
    }
}
