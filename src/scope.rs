//! Viewer scoping.
//!
//! Every built-in report is narrowed to the records the requesting user is
//! allowed to see. The restriction is derived from the user's role and
//! profile and expressed as a small mapping of [`ScopeKey`] to row id which
//! the report translates into predicates on its own query.
//!
//! Resolution order (first match wins):
//!
//! ```text
//! anonymous / inactive        -> {}            (caller denies upstream)
//! staff / superuser           -> {}            (unrestricted)
//! leader with faction F       -> {faction: F}
//! faculty with facility X     -> {facility: X} or {week__facility_enrollment__facility: X}
//! attendee with faction F     -> {faction: F}
//! member of organization O    -> {organization: O} or {faction__organization: O}
//! otherwise                   -> {}
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::model::{Id, User};

/// The kind of record a report lists, which decides how faculty and
/// organization scopes are expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScopeTarget {
    #[default]
    Faction,
    Facility,
}

/// A field a scope restriction applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScopeKey {
    Faction,
    Facility,
    WeekFacility,
    Organization,
    FactionOrganization,
}

impl ScopeKey {
    /// Lookup path of the field, relative to the report's base record.
    pub fn path(&self) -> &'static str {
        match self {
            ScopeKey::Faction => "faction",
            ScopeKey::Facility => "facility",
            ScopeKey::WeekFacility => "week__facility_enrollment__facility",
            ScopeKey::Organization => "organization",
            ScopeKey::FactionOrganization => "faction__organization",
        }
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl Serialize for ScopeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.path())
    }
}

/// Restrictions to intersect with a base query. Empty means unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScopeFilters(BTreeMap<ScopeKey, Id>);

impl ScopeFilters {
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn only(key: ScopeKey, id: Id) -> Self {
        Self(BTreeMap::from([(key, id)]))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: ScopeKey) -> Option<Id> {
        self.0.get(&key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScopeKey, Id)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

/// Derive the scope restriction for `user` when listing `target` records.
pub fn user_scope_filters(user: Option<&User>, target: ScopeTarget) -> ScopeFilters {
    let Some(user) = user.filter(|u| u.is_authenticated()) else {
        return ScopeFilters::unrestricted();
    };

    if user.is_privileged() {
        return ScopeFilters::unrestricted();
    }

    if let Some(faction_id) = user.leader.and_then(|p| p.faction_id) {
        return ScopeFilters::only(ScopeKey::Faction, faction_id);
    }

    if let Some(facility_id) = user.faculty.and_then(|p| p.facility_id) {
        let key = match target {
            ScopeTarget::Facility => ScopeKey::Facility,
            ScopeTarget::Faction => ScopeKey::WeekFacility,
        };
        return ScopeFilters::only(key, facility_id);
    }

    if let Some(faction_id) = user.attendee.and_then(|p| p.faction_id) {
        return ScopeFilters::only(ScopeKey::Faction, faction_id);
    }

    if let Some(organization_id) = user.organization_id {
        let key = match target {
            ScopeTarget::Facility => ScopeKey::Organization,
            ScopeTarget::Faction => ScopeKey::FactionOrganization,
        };
        return ScopeFilters::only(key, organization_id);
    }

    ScopeFilters::unrestricted()
}

/// Whether the user holds any role that may ask for an unscoped view.
pub fn user_can_unscope(user: Option<&User>) -> bool {
    user.filter(|u| u.is_authenticated())
        .is_some_and(|u| u.is_privileged() || u.admin.any())
}
