//! SQLite-backed entity store.
//!
//! One database file per project. The schema is applied idempotently on every
//! open, so a fresh file and an existing one go through the same path.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC text with microsecond
//! precision (`2026-03-02T08:30:00.000000Z`). Fixed width keeps lexical order
//! equal to chronological order, which lets window predicates use `BETWEEN`
//! on bound parameters.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::Row;

pub use rusqlite::Connection;

use crate::config::Config;
use crate::error::{Result, RollcallError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS students(
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    photo_url TEXT
);

CREATE TABLE IF NOT EXISTS rolls(
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    completed_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_rolls_completed_at ON rolls(completed_at);

CREATE TABLE IF NOT EXISTS student_roll_states(
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    roll_id INTEGER NOT NULL,
    student_id INTEGER NOT NULL,
    state TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_student_roll_states_roll ON student_roll_states(roll_id);
CREATE INDEX IF NOT EXISTS idx_student_roll_states_student ON student_roll_states(student_id);

CREATE TABLE IF NOT EXISTS student_groups(
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    number_of_weeks INTEGER NOT NULL,
    roll_states TEXT NOT NULL,
    incidents INTEGER NOT NULL,
    ltmt TEXT NOT NULL,
    run_at TEXT,
    student_count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS group_students(
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    group_id INTEGER NOT NULL,
    student_id INTEGER NOT NULL,
    incident_count INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_group_students_group ON group_students(group_id);
";

/// Open (or create) the database at `path` and apply the schema.
pub fn open(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    apply_schema(&conn)?;
    Ok(conn)
}

/// Open a private in-memory database with the schema applied.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    apply_schema(&conn)?;
    Ok(conn)
}

/// Load the project config under `root` and open its database.
pub fn open_project(root: &Path) -> Result<(Config, Connection)> {
    let config = Config::load(root)?;
    let conn = open(&config.database_path(root))?;
    Ok((config, conn))
}

fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Timestamp encoding
// ---------------------------------------------------------------------------

/// Drop sub-microsecond precision so a value equals what reading it back yields.
pub fn store_precision(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

pub fn encode_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| RollcallError::InvalidTimestamp(raw.to_string()))
}

/// Read a nullable timestamp column inside a row mapper.
pub(crate) fn ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// Build `?N, ?N+1, ...` placeholders for an `IN (...)` list starting at `first`.
pub(crate) fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn open_creates_file_and_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/rollcall.sqlite3");
        open(&path).unwrap();
        assert!(path.exists());
        // Re-opening applies the schema again without error.
        open(&path).unwrap();
    }

    #[test]
    fn schema_has_all_tables() {
        let conn = open_in_memory().unwrap();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        let names: Vec<String> = stmt
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        for table in [
            "group_students",
            "rolls",
            "student_groups",
            "student_roll_states",
            "students",
        ] {
            assert!(names.iter().any(|n| n == table), "missing table {table}");
        }
    }

    #[test]
    fn encoded_timestamps_sort_chronologically() {
        let a = Utc.with_ymd_and_hms(2026, 3, 2, 8, 30, 0).unwrap();
        let b = a + chrono::Duration::microseconds(1);
        let c = a + chrono::Duration::days(1);
        assert!(encode_ts(&a) < encode_ts(&b));
        assert!(encode_ts(&b) < encode_ts(&c));
        assert_eq!(encode_ts(&a), "2026-03-02T08:30:00.000000Z");
    }

    #[test]
    fn decode_roundtrip_and_rejects_garbage() {
        let a = Utc.with_ymd_and_hms(2026, 3, 2, 8, 30, 0).unwrap();
        assert_eq!(decode_ts(&encode_ts(&a)).unwrap(), a);
        assert!(matches!(
            decode_ts("yesterday"),
            Err(RollcallError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn store_precision_matches_encoded_value() {
        let a = Utc.with_ymd_and_hms(2026, 3, 2, 8, 30, 0).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);
        let stored = store_precision(a);
        assert_eq!(stored.timestamp_subsec_nanos(), 123_456_000);
        assert_eq!(decode_ts(&encode_ts(&a)).unwrap(), stored);
    }

    #[test]
    fn placeholders_are_numbered_from_first() {
        assert_eq!(placeholders(3, 3), "?3, ?4, ?5");
        assert_eq!(placeholders(1, 0), "");
    }
}
