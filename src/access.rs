//! Template access control: owners and explicitly shared users only.

use crate::error::{ReportError, ReportResult};
use crate::model::{ReportTemplate, User};

/// Message returned when a read or edit is refused.
pub const NO_ACCESS_MESSAGE: &str = "You do not have access to this report.";

impl ReportTemplate {
    /// True iff `user` created the template or it was shared with them.
    pub fn is_accessible_by(&self, user: Option<&User>) -> bool {
        match user {
            Some(user) => user.id == self.created_by || self.available_to.contains(&user.id),
            None => false,
        }
    }
}

/// Refuse with [`ReportError::AccessDenied`] unless `user` may use `template`.
pub fn ensure_template_access(template: &ReportTemplate, user: Option<&User>) -> ReportResult<()> {
    if template.is_accessible_by(user) {
        Ok(())
    } else {
        tracing::warn!(
            template_id = template.id,
            user = user.map(|u| u.username.as_str()).unwrap_or("<anonymous>"),
            "template access denied"
        );
        Err(ReportError::AccessDenied(NO_ACCESS_MESSAGE.to_string()))
    }
}
