use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{encode_ts, store_precision, ts_column};
use crate::error::{Result, RollcallError};
use crate::roll_state::StudentRollState;
use crate::types::required_text;

/// One attendance-taking event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roll {
    pub id: i64,
    pub name: String,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRollInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRollInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewRoll {
    pub name: String,
    pub completed_at: Option<DateTime<Utc>>,
}

impl NewRoll {
    pub fn from_input(input: CreateRollInput) -> Result<Self> {
        Ok(Self {
            name: required_text(input.name, "name")?,
            completed_at: input.completed_at,
        })
    }
}

const COLUMNS: &str = "id, name, completed_at";

impl Roll {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            completed_at: ts_column(row, 2)?,
        })
    }

    pub fn list(conn: &Connection) -> Result<Vec<Roll>> {
        let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM rolls ORDER BY id"))?;
        let rows = stmt
            .query_map([], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn find(conn: &Connection, id: i64) -> Result<Option<Roll>> {
        let roll = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM rolls WHERE id = ?1"),
                params![id],
                Self::from_row,
            )
            .optional()?;
        Ok(roll)
    }

    pub fn load(conn: &Connection, id: i64) -> Result<Roll> {
        Self::find(conn, id)?.ok_or(RollcallError::RollNotFound(id))
    }

    pub fn create(conn: &Connection, new: NewRoll) -> Result<Roll> {
        let completed_at = new.completed_at.map(store_precision);
        conn.execute(
            "INSERT INTO rolls (name, completed_at) VALUES (?1, ?2)",
            params![new.name, completed_at.as_ref().map(encode_ts)],
        )?;
        Ok(Roll {
            id: conn.last_insert_rowid(),
            name: new.name,
            completed_at,
        })
    }

    pub fn apply(&mut self, input: UpdateRollInput) {
        if let Some(v) = input.name {
            self.name = v;
        }
        if let Some(v) = input.completed_at {
            self.completed_at = Some(store_precision(v));
        }
    }

    pub fn save(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE rolls SET name = ?1, completed_at = ?2 WHERE id = ?3",
            params![self.name, self.completed_at.as_ref().map(encode_ts), self.id],
        )?;
        Ok(())
    }

    pub fn update(conn: &Connection, id: i64, input: UpdateRollInput) -> Result<Roll> {
        let mut roll = Self::load(conn, id)?;
        roll.apply(input);
        roll.save(conn)?;
        Ok(roll)
    }

    pub fn remove(conn: &Connection, id: i64) -> Result<Roll> {
        let roll = Self::load(conn, id)?;
        conn.execute("DELETE FROM rolls WHERE id = ?1", params![id])?;
        Ok(roll)
    }

    /// Every student state recorded for roll `id`.
    pub fn states(conn: &Connection, id: i64) -> Result<Vec<StudentRollState>> {
        Self::load(conn, id)?;
        StudentRollState::list_for_roll(conn, id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
