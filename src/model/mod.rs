//! Domain records: users and their profiles, the enrollment tables the
//! built-in reports read, and persisted report templates.

mod enrollment;
mod template;
mod user;

pub use enrollment::{
    Faction, FactionEnrollment, FactionEnrollmentRecord, Facility, FacilityEnrollment,
    FacilityRecord, NamedRef, Organization, Quarters, Week,
};
pub use template::{
    GeneratedReport, NewGeneratedReport, NewReportTemplate, ReportTemplate, TemplateUpdate,
};
pub use user::{AdminCapabilities, AttendeeProfile, FacultyProfile, Id, LeaderProfile, User};

/// Anything that can be rendered to an output file needs a display name.
///
/// Implemented by both built-in reports and stored templates.
pub trait NamedReport {
    fn name(&self) -> &str;
}

impl NamedReport for ReportTemplate {
    fn name(&self) -> &str {
        &self.name
    }
}
