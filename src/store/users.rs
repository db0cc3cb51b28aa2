use rusqlite::{params, OptionalExtension, Row};

use super::ReportStore;
use crate::error::ReportResult;
use crate::model::{
    AdminCapabilities, AttendeeProfile, FacultyProfile, Id, LeaderProfile, User,
};

const USER_COLUMNS: &str = "u.id, u.username, u.is_active, u.is_staff, u.is_superuser, \
     u.is_leader_admin, u.is_faculty_admin, u.is_department_admin, u.organization_id, \
     lp.user_id, lp.faction_id, fp.user_id, fp.facility_id, ap.user_id, ap.faction_id";

const USER_JOINS: &str = "FROM users u \
     LEFT JOIN leader_profiles lp ON lp.user_id = u.id \
     LEFT JOIN faculty_profiles fp ON fp.user_id = u.id \
     LEFT JOIN attendee_profiles ap ON ap.user_id = u.id";

fn to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let leader: Option<Id> = row.get(9)?;
    let faculty: Option<Id> = row.get(11)?;
    let attendee: Option<Id> = row.get(13)?;

    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        is_active: row.get(2)?,
        is_staff: row.get(3)?,
        is_superuser: row.get(4)?,
        admin: AdminCapabilities {
            leader_admin: row.get(5)?,
            faculty_admin: row.get(6)?,
            department_admin: row.get(7)?,
        },
        organization_id: row.get(8)?,
        leader: match leader {
            Some(_) => Some(LeaderProfile {
                faction_id: row.get(10)?,
            }),
            None => None,
        },
        faculty: match faculty {
            Some(_) => Some(FacultyProfile {
                facility_id: row.get(12)?,
            }),
            None => None,
        },
        attendee: match attendee {
            Some(_) => Some(AttendeeProfile {
                faction_id: row.get(14)?,
            }),
            None => None,
        },
    })
}

impl ReportStore {
    /// Insert a user together with whichever profiles it carries.
    pub fn insert_user(&self, user: &User) -> ReportResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO users (id, username, is_active, is_staff, is_superuser, \
             is_leader_admin, is_faculty_admin, is_department_admin, organization_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                user.id,
                user.username,
                user.is_active,
                user.is_staff,
                user.is_superuser,
                user.admin.leader_admin,
                user.admin.faculty_admin,
                user.admin.department_admin,
                user.organization_id,
            ],
        )?;

        if let Some(profile) = user.leader {
            tx.execute(
                "INSERT INTO leader_profiles (user_id, faction_id) VALUES (?, ?)",
                params![user.id, profile.faction_id],
            )?;
        }
        if let Some(profile) = user.faculty {
            tx.execute(
                "INSERT INTO faculty_profiles (user_id, facility_id) VALUES (?, ?)",
                params![user.id, profile.facility_id],
            )?;
        }
        if let Some(profile) = user.attendee {
            tx.execute(
                "INSERT INTO attendee_profiles (user_id, faction_id) VALUES (?, ?)",
                params![user.id, profile.faction_id],
            )?;
        }

        tx.commit()?;
        tracing::debug!(user_id = user.id, username = %user.username, "inserted user");
        Ok(())
    }

    pub fn get_user(&self, id: Id) -> ReportResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} {USER_JOINS} WHERE u.id = ?");
        let user = self
            .conn()
            .query_row(&sql, params![id], to_user)
            .optional()?;
        Ok(user)
    }

    pub fn get_user_by_username(&self, username: &str) -> ReportResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} {USER_JOINS} WHERE u.username = ?");
        let user = self
            .conn()
            .query_row(&sql, params![username], to_user)
            .optional()?;
        Ok(user)
    }

    pub fn user_exists(&self, id: Id) -> ReportResult<bool> {
        let found: Option<i64> = self
            .conn()
            .query_row("SELECT 1 FROM users WHERE id = ?", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }
}
