use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::ReportStore;
use crate::error::{ReportError, ReportResult};
use crate::model::{
    GeneratedReport, Id, NewGeneratedReport, NewReportTemplate, ReportTemplate, TemplateUpdate,
};

/// Templates owned by or shared with `?1`.
const ACCESSIBLE_TEMPLATE_IDS: &str = "SELECT DISTINCT t.id FROM report_templates t \
     LEFT JOIN report_template_access a ON a.template_id = t.id \
     WHERE t.created_by = ?1 OR a.user_id = ?1";

struct TemplateRow {
    id: Id,
    name: String,
    description: String,
    filters: String,
    query: String,
    output_formats: String,
    created_by: Id,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn load_template(conn: &Connection, id: Id) -> ReportResult<Option<ReportTemplate>> {
    let raw = conn
        .query_row(
            "SELECT id, name, description, filters, query, output_formats, created_by, \
             created_at, updated_at FROM report_templates WHERE id = ?",
            params![id],
            |row| {
                Ok(TemplateRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    filters: row.get(3)?,
                    query: row.get(4)?,
                    output_formats: row.get(5)?,
                    created_by: row.get(6)?,
                    created_at: row.get(7)?,
                    updated_at: row.get(8)?,
                })
            },
        )
        .optional()?;

    let Some(raw) = raw else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT user_id FROM report_template_access WHERE template_id = ? ORDER BY user_id",
    )?;
    let available_to = stmt
        .query_map(params![id], |row| row.get(0))?
        .collect::<Result<BTreeSet<Id>, _>>()?;

    Ok(Some(ReportTemplate {
        id: raw.id,
        name: raw.name,
        description: raw.description,
        filters: serde_json::from_str(&raw.filters)?,
        query: raw.query,
        output_formats: serde_json::from_str(&raw.output_formats)?,
        created_by: raw.created_by,
        available_to,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
    }))
}

fn validate_users(conn: &Connection, ids: &BTreeSet<Id>) -> ReportResult<()> {
    for id in ids {
        let found: Option<i64> = conn
            .query_row("SELECT 1 FROM users WHERE id = ?", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        if found.is_none() {
            return Err(ReportError::Validation(format!("unknown user id {id}")));
        }
    }
    Ok(())
}

fn replace_access(conn: &Connection, template_id: Id, users: &BTreeSet<Id>) -> ReportResult<()> {
    conn.execute(
        "DELETE FROM report_template_access WHERE template_id = ?",
        params![template_id],
    )?;
    for user_id in users {
        conn.execute(
            "INSERT INTO report_template_access (template_id, user_id) VALUES (?, ?)",
            params![template_id, user_id],
        )?;
    }
    Ok(())
}

fn require_name(name: &str) -> ReportResult<()> {
    if name.trim().is_empty() {
        return Err(ReportError::Validation("name must not be empty".to_string()));
    }
    Ok(())
}

impl ReportStore {
    /// Create a template owned by `owner`.
    pub fn create_template(
        &self,
        owner: Id,
        new: &NewReportTemplate,
    ) -> ReportResult<ReportTemplate> {
        require_name(&new.name)?;

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        validate_users(&tx, &new.available_to)?;

        let now = Utc::now();
        tx.execute(
            "INSERT INTO report_templates (name, description, filters, query, output_formats, \
             created_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                new.name,
                new.description,
                serde_json::to_string(&new.filters)?,
                new.query,
                serde_json::to_string(&new.output_formats)?,
                owner,
                now,
                now,
            ],
        )?;
        let id = tx.last_insert_rowid();
        replace_access(&tx, id, &new.available_to)?;

        let template = load_template(&tx, id)?.ok_or_else(|| {
            ReportError::Validation(format!("template {id} vanished during creation"))
        })?;
        tx.commit()?;

        tracing::info!(template_id = id, owner, name = %template.name, "created report template");
        Ok(template)
    }

    pub fn get_template(&self, id: Id) -> ReportResult<Option<ReportTemplate>> {
        load_template(&self.conn(), id)
    }

    /// Apply `update` to an existing template. Access is checked by the caller.
    pub fn update_template(
        &self,
        id: Id,
        update: &TemplateUpdate,
    ) -> ReportResult<Option<ReportTemplate>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let Some(mut template) = load_template(&tx, id)? else {
            return Ok(None);
        };

        if let Some(name) = &update.name {
            require_name(name)?;
            template.name = name.clone();
        }
        if let Some(description) = &update.description {
            template.description = description.clone();
        }
        if let Some(filters) = &update.filters {
            template.filters = filters.clone();
        }
        if let Some(query) = &update.query {
            template.query = query.clone();
        }
        if let Some(formats) = &update.output_formats {
            template.output_formats = formats.clone();
        }
        if let Some(users) = &update.available_to {
            validate_users(&tx, users)?;
            replace_access(&tx, id, users)?;
            template.available_to = users.clone();
        }
        template.updated_at = Utc::now();

        tx.execute(
            "UPDATE report_templates SET name = ?, description = ?, filters = ?, query = ?, \
             output_formats = ?, updated_at = ? WHERE id = ?",
            params![
                template.name,
                template.description,
                serde_json::to_string(&template.filters)?,
                template.query,
                serde_json::to_string(&template.output_formats)?,
                template.updated_at,
                id,
            ],
        )?;
        tx.commit()?;

        tracing::info!(template_id = id, "updated report template");
        Ok(Some(template))
    }

    /// Templates the user owns or that were shared with them, each once, by id.
    pub fn list_templates_accessible_to(&self, user_id: Id) -> ReportResult<Vec<ReportTemplate>> {
        let conn = self.conn();
        let sql = format!("{ACCESSIBLE_TEMPLATE_IDS} ORDER BY t.id");
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params![user_id], |row| row.get::<_, Id>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut templates = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(template) = load_template(&conn, id)? {
                templates.push(template);
            }
        }
        Ok(templates)
    }

    // ===== Generation log =====

    /// Append a generation record.
    pub fn record_generated_report(&self, new: &NewGeneratedReport) -> ReportResult<GeneratedReport> {
        let conn = self.conn();
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO generated_reports (name, template_id, generated_by, filters_applied, \
             output_file, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                new.name,
                new.template_id,
                new.generated_by,
                serde_json::to_string(&new.filters_applied)?,
                new.output_file,
                created_at,
            ],
        )?;

        Ok(GeneratedReport {
            id: conn.last_insert_rowid(),
            name: new.name.clone(),
            template_id: new.template_id,
            generated_by: new.generated_by,
            filters_applied: new.filters_applied.clone(),
            output_file: new.output_file.clone(),
            created_at,
        })
    }

    /// Generation records of templates accessible to the user, newest first.
    pub fn list_generated_reports_for(&self, user_id: Id) -> ReportResult<Vec<GeneratedReport>> {
        let conn = self.conn();
        let sql = format!(
            "SELECT id, name, template_id, generated_by, filters_applied, output_file, created_at \
             FROM generated_reports WHERE template_id IN ({ACCESSIBLE_TEMPLATE_IDS}) \
             ORDER BY created_at DESC, id DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params![user_id], |row| {
                Ok((
                    row.get::<_, Id>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Id>(2)?,
                    row.get::<_, Id>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, DateTime<Utc>>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(
                |(id, name, template_id, generated_by, filters, output_file, created_at)| {
                    Ok(GeneratedReport {
                        id,
                        name,
                        template_id,
                        generated_by,
                        filters_applied: serde_json::from_str(&filters)?,
                        output_file,
                        created_at,
                    })
                },
            )
            .collect()
    }

    pub fn count_generated_reports(&self) -> ReportResult<usize> {
        let count: i64 =
            self.conn()
                .query_row("SELECT COUNT(*) FROM generated_reports", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
