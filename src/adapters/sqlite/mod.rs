//! SQLite adapter: Implementation of ReportStore.
//!
//! Provides local, append-only persistence of report records. The table
//! layout keeps the columns of the historical `reports` table (owner, date,
//! comma-joined symptoms, prediction, confidence, recommendations JSON) so
//! existing history databases stay readable. Confidence is written as text
//! in the `62.0%` form those databases use; numeric values are also accepted
//! on read.
//!
//! # Concurrency
//!
//! The connection is protected by a `Mutex`. Appends from different owners
//! are serialized through it and SQLite assigns each row its id inside the
//! insert, so no two calls can observe or reuse the same id.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{NaiveDateTime, SubsecRound};
use rusqlite::types::{FromSqlError, Type, ValueRef};
use rusqlite::{params, Connection, Row};

use crate::domain::{AdvisoryRecord, NewReport, ReportRecord, SymptomSet};
use crate::ports::{ReportPage, ReportStore};

/// Format of the `date` column.
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SELECT_COLUMNS: &str =
    "id, username, date, symptoms, prediction, confidence, recommendations";

/// Parse a stored confidence such as `62.0%` or `62.0`.
fn parse_confidence(text: &str) -> Option<f64> {
    let text = text.trim();
    let number = text.strip_suffix('%').unwrap_or(text).trim();
    number.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// SQLite report store.
pub struct SqliteReportStore {
    conn: Mutex<Connection>,
}

impl SqliteReportStore {
    /// Open (or create) a report database at `path`.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::with_connection(conn)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                date TEXT NOT NULL,
                symptoms TEXT NOT NULL,
                prediction TEXT NOT NULL,
                confidence TEXT NOT NULL,
                recommendations TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_reports_owner
                ON reports(username, id DESC);
            ",
        )?;

        Ok(())
    }

    fn confidence_from_sql(value: ValueRef<'_>) -> Result<f64, FromSqlError> {
        match value {
            ValueRef::Real(v) => Ok(v),
            ValueRef::Integer(v) => Ok(v as f64),
            ValueRef::Text(bytes) => {
                let text =
                    std::str::from_utf8(bytes).map_err(|e| FromSqlError::Other(Box::new(e)))?;
                parse_confidence(text).ok_or(FromSqlError::InvalidType)
            }
            _ => Err(FromSqlError::InvalidType),
        }
    }

    fn row_to_report(row: &Row<'_>) -> rusqlite::Result<ReportRecord> {
        let date: String = row.get(2)?;
        let created_at = NaiveDateTime::parse_from_str(&date, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?
            .and_utc();

        let symptoms: String = row.get(3)?;
        let recommendations: String = row.get(6)?;
        let advisory: AdvisoryRecord = serde_json::from_str(&recommendations)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

        Ok(ReportRecord {
            id: row.get(0)?,
            owner: row.get(1)?,
            created_at,
            symptoms: SymptomSet::from_csv(&symptoms),
            top_label: row.get(4)?,
            top_confidence: Self::confidence_from_sql(row.get_ref(5)?).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e))
            })?,
            advisory,
        })
    }
}

impl ReportStore for SqliteReportStore {
    type Error = StorageError;

    fn append_report(&self, report: &NewReport) -> Result<ReportRecord, Self::Error> {
        let recommendations = serde_json::to_string(&report.advisory)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        // The date column has second resolution; keep the returned record identical
        // to what a later read yields.
        let created_at = report.created_at.trunc_subsecs(0);
        let confidence = format!("{:.1}%", report.top_confidence);
        let top_confidence = parse_confidence(&confidence).ok_or_else(|| {
            StorageError::Serialization(format!("confidence {confidence} is not a number"))
        })?;

        let conn = self.lock()?;
        conn.execute(
            r"
            INSERT INTO reports (
                username, date, symptoms, prediction, confidence, recommendations
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                report.owner,
                created_at.format(DATE_FORMAT).to_string(),
                report.symptoms.to_csv(),
                report.top_label,
                confidence,
                recommendations,
            ],
        )?;
        let id = conn.last_insert_rowid();

        tracing::debug!("Appended report {id} to storage");
        Ok(ReportRecord {
            created_at,
            top_confidence,
            ..ReportRecord::from_new(id, report.clone())
        })
    }

    fn load_reports(
        &self,
        owner: &str,
        offset: usize,
        limit: usize,
    ) -> Result<ReportPage, Self::Error> {
        let conn = self.lock()?;

        let total_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM reports WHERE username = ?1",
            params![owner],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM reports WHERE username = ?1 \
             ORDER BY id DESC LIMIT ?2 OFFSET ?3"
        ))?;
        let reports = stmt
            .query_map(
                params![owner, limit as i64, offset as i64],
                Self::row_to_report,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ReportPage::new(reports, total_count as usize, offset, limit))
    }

    fn recent_reports(&self, limit: usize) -> Result<Vec<ReportRecord>, Self::Error> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM reports ORDER BY id DESC LIMIT ?1"
        ))?;
        let reports = stmt
            .query_map(params![limit as i64], Self::row_to_report)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(reports)
    }

    fn count_reports(&self, owner: Option<&str>) -> Result<usize, Self::Error> {
        let conn = self.lock()?;

        let count: i64 = match owner {
            Some(owner) => conn.query_row(
                "SELECT COUNT(*) FROM reports WHERE username = ?1",
                params![owner],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))?,
        };

        Ok(count as usize)
    }

    fn diagnosis_counts(&self) -> Result<Vec<(String, usize)>, Self::Error> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r"
            SELECT prediction, COUNT(*) AS n
            FROM reports
            GROUP BY prediction
            ORDER BY n DESC, prediction ASC
            ",
        )?;
        let counts = stmt
            .query_map([], |row| {
                let label: String = row.get(0)?;
                let n: i64 = row.get(1)?;
                Ok((label, n as usize))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }
}
