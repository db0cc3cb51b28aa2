// src/model/enrollment.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::user::Id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Id,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: Id,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub organization_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub id: Id,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub organization_id: Option<Id>,
}

/// A facility's enrollment for a season; weeks hang off it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityEnrollment {
    pub id: Id,
    pub name: String,
    pub facility_id: Id,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Week {
    pub id: Id,
    pub name: String,
    pub facility_enrollment_id: Id,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quarters {
    pub id: Id,
    pub name: String,
}

/// A faction attending a facility week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionEnrollment {
    pub id: Id,
    pub faction_id: Id,
    pub week_id: Id,
    #[serde(default)]
    pub quarters_id: Option<Id>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Id, name and slug of a related row, as loaded by a report query.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRef {
    pub id: Id,
    pub name: String,
    pub slug: String,
}

/// A faction enrollment joined with everything the enrollment report shows.
#[derive(Debug, Clone, PartialEq)]
pub struct FactionEnrollmentRecord {
    pub id: Id,
    pub faction: NamedRef,
    pub facility: NamedRef,
    pub week: String,
    pub quarters: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A facility joined with its (optional) organization.
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityRecord {
    pub id: Id,
    pub name: String,
    pub slug: String,
    pub organization: Option<String>,
}
