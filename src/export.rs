//! Output encoders.
//!
//! Two entry points:
//!
//! - [`generate_report_output`] renders a stored template's rows to a named
//!   file (CSV, tab-delimited "Excel" or the plain-text "PDF" placeholder).
//! - [`export_builtin`] streams a built-in report as CSV or tab-delimited
//!   text with a download filename.
//!
//! The "Excel" flavour is tab-separated text carrying an `.xlsx`
//! extension, not a spreadsheet binary.
//!
//! Every format renders cells through [`Value`]'s `Display`: a null cell is
//! empty (the placeholder writes `value=`, not `value=None`), booleans are
//! lowercase `true`/`false`, and JSON numbers keep their source spelling.
//!
//! [`Value`]: crate::projection::Value

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::error::{ReportError, ReportResult};
use crate::model::NamedReport;
use crate::projection::Row;

/// First line of every PDF placeholder.
pub const PDF_TITLE: &str = "Campfire Connections Report";

/// Content type of both built-in export flavours.
pub const EXPORT_CONTENT_TYPE: &str = "text/csv";

// =============================================================================
// Formats
// =============================================================================

/// Output format of a generated template report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Excel,
    Pdf,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Csv, OutputFormat::Pdf, OutputFormat::Excel];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Excel => "excel",
            OutputFormat::Pdf => "pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Excel => "xlsx",
            OutputFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "excel" => Ok(OutputFormat::Excel),
            "pdf" => Ok(OutputFormat::Pdf),
            other => Err(ReportError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Generated reports
// =============================================================================

/// A rendered file ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutput {
    pub filename: String,
    pub content: Vec<u8>,
}

/// Render `report` in `output_format` (default `csv`, case-insensitive).
///
/// Rows come from a non-empty `rows` list in `filters`; without one a
/// single `{name, value: 1}` row stands in.
pub fn generate_report_output(
    report: &dyn NamedReport,
    filters: Option<&JsonValue>,
    output_format: Option<&str>,
) -> ReportResult<ReportOutput> {
    let format = match output_format.map(str::trim).filter(|f| !f.is_empty()) {
        Some(raw) => raw.parse::<OutputFormat>()?,
        None => OutputFormat::Csv,
    };
    let rows = rows_from_filters(report.name(), filters)?;

    let content = match format {
        OutputFormat::Csv => serialize_rows(&rows, b',')?,
        OutputFormat::Excel => serialize_rows(&rows, b'\t')?,
        OutputFormat::Pdf => pdf_placeholder(&rows),
    };

    Ok(ReportOutput {
        filename: format!("{}.{}", slug_or_default(report.name()), format.extension()),
        content,
    })
}

fn rows_from_filters(report_name: &str, filters: Option<&JsonValue>) -> ReportResult<Vec<Row>> {
    let supplied = filters
        .and_then(JsonValue::as_object)
        .and_then(|f| f.get("rows"))
        .filter(|rows| is_truthy(rows));

    match supplied {
        None => Ok(vec![Row::new().with("name", report_name).with("value", 1i64)]),
        Some(JsonValue::Array(items)) => items.iter().map(Row::from_json).collect(),
        Some(other) => Err(ReportError::InvalidRows(other.to_string())),
    }
}

fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(a) => !a.is_empty(),
        JsonValue::Object(o) => !o.is_empty(),
    }
}

/// Delimited text with a header taken from the first row's keys.
///
/// No rows means an empty payload, not even a header.
pub fn serialize_rows(rows: &[Row], delimiter: u8) -> ReportResult<Vec<u8>> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    let header: Vec<&str> = first.keys().collect();
    write_delimited(&header, rows.iter().cloned(), delimiter)
}

/// Plain-text listing: title line, then `key=value` pairs per row.
pub fn pdf_placeholder(rows: &[Row]) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(PDF_TITLE);
    out.push('\n');
    for row in rows {
        let line: Vec<String> = row.iter().map(|(k, v)| format!("{k}={v}")).collect();
        out.push_str(&line.join(", "));
        out.push('\n');
    }
    out.into_bytes()
}

fn write_delimited(
    header: &[&str],
    rows: impl Iterator<Item = Row>,
    delimiter: u8,
) -> ReportResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(header)?;
    for row in rows {
        if let Some(extra) = row.keys().find(|k| !header.contains(k)) {
            return Err(ReportError::Encoding(format!(
                "row contains field '{extra}' which is not in the header"
            )));
        }
        let record: Vec<String> = header
            .iter()
            .map(|h| row.get(h).map(ToString::to_string).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| ReportError::Encoding(e.to_string()))
}

// =============================================================================
// Built-in exports
// =============================================================================

/// Download flavour of a built-in report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Excel,
}

impl ExportFormat {
    /// Anything other than `excel` exports CSV.
    pub fn from_segment(segment: &str) -> Self {
        if segment.eq_ignore_ascii_case("excel") {
            ExportFormat::Excel
        } else {
            ExportFormat::Csv
        }
    }

    fn delimiter(&self) -> u8 {
        match self {
            ExportFormat::Csv => b',',
            ExportFormat::Excel => b'\t',
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
        }
    }
}

/// An export response body with its download name.
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub filename: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Export {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Write `rows` under a header of column `labels`, which is always emitted.
pub fn export_builtin(
    slug: &str,
    labels: &[&str],
    rows: impl Iterator<Item = Row>,
    format: ExportFormat,
) -> ReportResult<Export> {
    let body = write_delimited(labels, rows, format.delimiter())?;
    Ok(Export {
        filename: format!("{}.{}", slug, format.extension()),
        content_type: EXPORT_CONTENT_TYPE,
        body,
    })
}

// =============================================================================
// Slugs
// =============================================================================

static STRIP_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid regex"));
static DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").expect("valid regex"));

/// Lowercase ASCII slug: drops non-ASCII and punctuation, joins words with `-`.
pub fn slugify(value: &str) -> String {
    let ascii: String = value.chars().filter(char::is_ascii).collect();
    let lowered = ascii.to_lowercase();
    let stripped = STRIP_CHARS.replace_all(&lowered, "");
    DASHES
        .replace_all(&stripped, "-")
        .trim_matches(|c| c == '-' || c == '_')
        .to_string()
}

fn slug_or_default(name: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        "report".to_string()
    } else {
        slug
    }
}
