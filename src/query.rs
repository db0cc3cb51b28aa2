//! Query builder - construct parameterised SQLite `SELECT`s with a fluent API.
//!
//! Report definitions describe their base query with [`SelectQuery`] and add
//! caller and scope predicates as [`Condition`]s. Values never reach the SQL
//! text; they are collected as [`SqlParam`]s and bound by the store.

use chrono::NaiveDate;
use rusqlite::types::{ToSql, ToSqlOutput};

// =============================================================================
// Parameters
// =============================================================================

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
    Date(NaiveDate),
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            SqlParam::Int(v) => v.to_sql(),
            SqlParam::Text(v) => v.to_sql(),
            SqlParam::Date(v) => Ok(ToSqlOutput::from(v.format("%Y-%m-%d").to_string())),
        }
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<NaiveDate> for SqlParam {
    fn from(v: NaiveDate) -> Self {
        SqlParam::Date(v)
    }
}

// =============================================================================
// Conditions
// =============================================================================

/// A boolean SQL fragment with its bound parameters, ANDed into `WHERE`.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "conditions have no effect until added to a query"]
pub struct Condition {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl Condition {
    /// A raw fragment; `sql` must contain one `?` per parameter.
    pub fn raw(sql: &str, params: Vec<SqlParam>) -> Self {
        debug_assert_eq!(sql.matches('?').count(), params.len());
        Self {
            sql: sql.to_string(),
            params,
        }
    }

    pub fn eq(column: &str, value: impl Into<SqlParam>) -> Self {
        Self::compare(column, "=", value)
    }

    pub fn gte(column: &str, value: impl Into<SqlParam>) -> Self {
        Self::compare(column, ">=", value)
    }

    pub fn lte(column: &str, value: impl Into<SqlParam>) -> Self {
        Self::compare(column, "<=", value)
    }

    fn compare(column: &str, op: &str, value: impl Into<SqlParam>) -> Self {
        Self {
            sql: format!("{column} {op} ?"),
            params: vec![value.into()],
        }
    }
}

// =============================================================================
// Joins
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    /// Table with alias, e.g. `factions f`.
    pub table: String,
    pub on: String,
}

// =============================================================================
// Select
// =============================================================================

/// A `SELECT ... FROM ... [JOIN ...] [WHERE ...] [ORDER BY ...]` statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct SelectQuery {
    pub columns: Vec<String>,
    pub from: String,
    pub joins: Vec<Join>,
    pub conditions: Vec<Condition>,
    pub order_by: Vec<String>,
}

impl SelectQuery {
    /// Start a query over `from` (table with optional alias).
    pub fn from(from: &str) -> Self {
        Self {
            columns: Vec::new(),
            from: from.to_string(),
            joins: Vec::new(),
            conditions: Vec::new(),
            order_by: Vec::new(),
        }
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns.extend(columns.iter().map(|c| c.to_string()));
        self
    }

    pub fn join(mut self, table: &str, on: &str) -> Self {
        self.joins.push(Join {
            join_type: JoinType::Inner,
            table: table.to_string(),
            on: on.to_string(),
        });
        self
    }

    pub fn left_join(mut self, table: &str, on: &str) -> Self {
        self.joins.push(Join {
            join_type: JoinType::Left,
            table: table.to_string(),
            on: on.to_string(),
        });
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add a condition only when `value` is present.
    pub fn filter_opt<T>(self, value: Option<T>, build: impl FnOnce(T) -> Condition) -> Self {
        match value {
            Some(v) => self.filter(build(v)),
            None => self,
        }
    }

    pub fn order_by(mut self, expr: &str) -> Self {
        self.order_by.push(expr.to_string());
        self
    }

    /// Render the SQL text and the parameters in placeholder order.
    pub fn to_sql(&self) -> (String, Vec<SqlParam>) {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };
        let mut sql = format!("SELECT {} FROM {}", columns, self.from);

        for join in &self.joins {
            let keyword = match join.join_type {
                JoinType::Inner => "JOIN",
                JoinType::Left => "LEFT JOIN",
            };
            sql.push_str(&format!(" {} {} ON {}", keyword, join.table, join.on));
        }

        let mut params = Vec::new();
        if !self.conditions.is_empty() {
            let clauses: Vec<String> = self
                .conditions
                .iter()
                .map(|c| format!("({})", c.sql))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
            for condition in &self.conditions {
                params.extend(condition.params.iter().cloned());
            }
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }

        (sql, params)
    }
}
