//! SQLite-backed persistence.
//!
//! Holds the enrollment tables the built-in reports read, the users and
//! profiles used for scoping, and the report templates and generation log.
//!
//! # Design
//!
//! - One connection behind a mutex; every method takes `&self`
//! - Schema created on open, versioned in the `meta` table
//! - A version mismatch is an error; data is never dropped automatically
//!
//! # Tables
//!
//! ```text
//! organizations, facilities, factions          reference data
//! facility_enrollments -> weeks                facility calendar
//! faction_enrollments                          faction x week (+ quarters)
//! users, *_profiles                            scoping inputs
//! report_templates, report_template_access     templates + sharing
//! generated_reports                            append-only generation log
//! ```

mod enrollment;
mod fixture;
mod templates;
mod users;

pub use enrollment::{facility_query, faction_enrollment_query};
pub use fixture::Fixture;

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{ReportError, ReportResult};

/// Current schema version. Bump this when the table layout changes.
const SCHEMA_VERSION: i32 = 1;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS organizations (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS facilities (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        organization_id INTEGER REFERENCES organizations(id)
    );

    CREATE TABLE IF NOT EXISTS factions (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        organization_id INTEGER REFERENCES organizations(id)
    );

    CREATE TABLE IF NOT EXISTS facility_enrollments (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        facility_id INTEGER NOT NULL REFERENCES facilities(id)
    );

    CREATE TABLE IF NOT EXISTS weeks (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        facility_enrollment_id INTEGER NOT NULL REFERENCES facility_enrollments(id)
    );

    CREATE TABLE IF NOT EXISTS quarters (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS faction_enrollments (
        id INTEGER PRIMARY KEY,
        faction_id INTEGER NOT NULL REFERENCES factions(id),
        week_id INTEGER NOT NULL REFERENCES weeks(id),
        quarters_id INTEGER REFERENCES quarters(id),
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        is_active INTEGER NOT NULL DEFAULT 1,
        is_staff INTEGER NOT NULL DEFAULT 0,
        is_superuser INTEGER NOT NULL DEFAULT 0,
        is_leader_admin INTEGER NOT NULL DEFAULT 0,
        is_faculty_admin INTEGER NOT NULL DEFAULT 0,
        is_department_admin INTEGER NOT NULL DEFAULT 0,
        organization_id INTEGER REFERENCES organizations(id)
    );

    CREATE TABLE IF NOT EXISTS leader_profiles (
        user_id INTEGER PRIMARY KEY REFERENCES users(id),
        faction_id INTEGER REFERENCES factions(id)
    );

    CREATE TABLE IF NOT EXISTS faculty_profiles (
        user_id INTEGER PRIMARY KEY REFERENCES users(id),
        facility_id INTEGER REFERENCES facilities(id)
    );

    CREATE TABLE IF NOT EXISTS attendee_profiles (
        user_id INTEGER PRIMARY KEY REFERENCES users(id),
        faction_id INTEGER REFERENCES factions(id)
    );

    CREATE TABLE IF NOT EXISTS report_templates (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        filters TEXT NOT NULL DEFAULT '{}',
        query TEXT NOT NULL DEFAULT '',
        output_formats TEXT NOT NULL DEFAULT '[]',
        created_by INTEGER NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS report_template_access (
        template_id INTEGER NOT NULL REFERENCES report_templates(id),
        user_id INTEGER NOT NULL REFERENCES users(id),
        PRIMARY KEY (template_id, user_id)
    );

    CREATE TABLE IF NOT EXISTS generated_reports (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        template_id INTEGER NOT NULL REFERENCES report_templates(id),
        generated_by INTEGER NOT NULL REFERENCES users(id),
        filters_applied TEXT NOT NULL,
        output_file TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
";

/// Report database handle.
pub struct ReportStore {
    conn: Mutex<Connection>,
}

impl ReportStore {
    /// Open or create the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> ReportResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        tracing::debug!(path = %path.display(), "opening report database");
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> ReportResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> ReportResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;

        let stored_version: Option<i32> = conn
            .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
                let s: String = row.get(0)?;
                Ok(s.parse().unwrap_or(0))
            })
            .optional()?;

        match stored_version {
            Some(v) if v == SCHEMA_VERSION => {}
            Some(found) => {
                return Err(ReportError::SchemaVersion {
                    found,
                    expected: SCHEMA_VERSION,
                });
            }
            None => {
                conn.execute(
                    "INSERT INTO meta (key, value) VALUES ('version', ?)",
                    params![SCHEMA_VERSION.to_string()],
                )?;
            }
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lock the connection. A panic in another holder does not corrupt
    /// SQLite state, so a poisoned lock is recovered.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
