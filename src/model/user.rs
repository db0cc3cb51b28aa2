// src/model/user.rs
use serde::{Deserialize, Serialize};

/// Database id of a row.
pub type Id = i64;

/// A user as seen by the report layer.
///
/// Authentication happens upstream; a user loaded from the store is
/// authenticated unless the account is inactive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub admin: AdminCapabilities,
    #[serde(default)]
    pub organization_id: Option<Id>,
    #[serde(default)]
    pub leader: Option<LeaderProfile>,
    #[serde(default)]
    pub faculty: Option<FacultyProfile>,
    #[serde(default)]
    pub attendee: Option<AttendeeProfile>,
}

fn default_true() -> bool {
    true
}

/// Administrative roles that can request unscoped views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminCapabilities {
    pub leader_admin: bool,
    pub faculty_admin: bool,
    pub department_admin: bool,
}

impl AdminCapabilities {
    pub fn any(&self) -> bool {
        self.leader_admin || self.faculty_admin || self.department_admin
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderProfile {
    pub faction_id: Option<Id>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyProfile {
    pub facility_id: Option<Id>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeProfile {
    pub faction_id: Option<Id>,
}

impl User {
    /// A plain active user with no profile or privileges.
    pub fn new(id: Id, username: &str) -> Self {
        Self {
            id,
            username: username.to_string(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            admin: AdminCapabilities::default(),
            organization_id: None,
            leader: None,
            faculty: None,
            attendee: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_active
    }

    /// Staff and superusers see every record.
    pub fn is_privileged(&self) -> bool {
        self.is_staff || self.is_superuser
    }

    pub fn with_staff(mut self) -> Self {
        self.is_staff = true;
        self
    }

    pub fn with_superuser(mut self) -> Self {
        self.is_superuser = true;
        self
    }

    pub fn with_organization(mut self, organization_id: Id) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    pub fn with_leader(mut self, faction_id: Option<Id>) -> Self {
        self.leader = Some(LeaderProfile { faction_id });
        self
    }

    pub fn with_faculty(mut self, facility_id: Option<Id>) -> Self {
        self.faculty = Some(FacultyProfile { facility_id });
        self
    }

    pub fn with_attendee(mut self, faction_id: Option<Id>) -> Self {
        self.attendee = Some(AttendeeProfile { faction_id });
        self
    }

    pub fn with_admin(mut self, admin: AdminCapabilities) -> Self {
        self.admin = admin;
        self
    }
}
