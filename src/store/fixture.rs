//! JSON fixtures for seeding a database.
//!
//! ```json
//! {
//!   "organizations": [{"id": 1, "name": "North Council", "slug": "north"}],
//!   "facilities": [{"id": 1, "name": "Lakeside", "slug": "lakeside", "organization_id": 1}],
//!   "factions": [{"id": 1, "name": "Troop 12", "slug": "troop-12", "organization_id": 1}],
//!   "facility_enrollments": [{"id": 1, "name": "Summer", "facility_id": 1}],
//!   "weeks": [{"id": 1, "name": "Week 1", "facility_enrollment_id": 1}],
//!   "quarters": [{"id": 1, "name": "Cabin A"}],
//!   "faction_enrollments": [{"id": 1, "faction_id": 1, "week_id": 1, "quarters_id": 1,
//!                            "start": "2024-06-02", "end": "2024-06-08"}],
//!   "users": [{"id": 1, "username": "director", "is_staff": true}]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::ReportStore;
use crate::error::ReportResult;
use crate::model::{
    Faction, FactionEnrollment, Facility, FacilityEnrollment, Organization, Quarters, User, Week,
};

/// A full seed document. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub organizations: Vec<Organization>,
    pub facilities: Vec<Facility>,
    pub factions: Vec<Faction>,
    pub facility_enrollments: Vec<FacilityEnrollment>,
    pub weeks: Vec<Week>,
    pub quarters: Vec<Quarters>,
    pub faction_enrollments: Vec<FactionEnrollment>,
    pub users: Vec<User>,
}

impl Fixture {
    pub fn from_file<P: AsRef<Path>>(path: P) -> ReportResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Total number of records in the document.
    pub fn len(&self) -> usize {
        self.organizations.len()
            + self.facilities.len()
            + self.factions.len()
            + self.facility_enrollments.len()
            + self.weeks.len()
            + self.quarters.len()
            + self.faction_enrollments.len()
            + self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReportStore {
    /// Insert every record of `fixture`, parents before children.
    pub fn load_fixture(&self, fixture: &Fixture) -> ReportResult<usize> {
        for org in &fixture.organizations {
            self.insert_organization(org)?;
        }
        for facility in &fixture.facilities {
            self.insert_facility(facility)?;
        }
        for faction in &fixture.factions {
            self.insert_faction(faction)?;
        }
        for enrollment in &fixture.facility_enrollments {
            self.insert_facility_enrollment(enrollment)?;
        }
        for week in &fixture.weeks {
            self.insert_week(week)?;
        }
        for quarters in &fixture.quarters {
            self.insert_quarters(quarters)?;
        }
        for enrollment in &fixture.faction_enrollments {
            self.insert_faction_enrollment(enrollment)?;
        }
        for user in &fixture.users {
            self.insert_user(user)?;
        }

        tracing::info!(records = fixture.len(), "loaded fixture");
        Ok(fixture.len())
    }
}
