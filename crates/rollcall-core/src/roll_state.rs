use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{encode_ts, placeholders};
use crate::error::{Result, RollcallError};
use crate::types::{required, RollState};

/// One student's recorded state for one roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRollState {
    pub id: i64,
    pub roll_id: i64,
    pub student_id: i64,
    pub state: RollState,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateStudentRollStateInput {
    #[serde(default)]
    pub roll_id: Option<i64>,
    #[serde(default)]
    pub student_id: Option<i64>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStudentRollStateInput {
    #[serde(default)]
    pub roll_id: Option<i64>,
    #[serde(default)]
    pub student_id: Option<i64>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewStudentRollState {
    pub roll_id: i64,
    pub student_id: i64,
    pub state: RollState,
}

impl NewStudentRollState {
    pub fn from_input(input: CreateStudentRollStateInput) -> Result<Self> {
        let state = required(input.state, "state")?;
        Ok(Self {
            roll_id: required(input.roll_id, "roll_id")?,
            student_id: required(input.student_id, "student_id")?,
            state: state.parse()?,
        })
    }
}

/// Number of matching roll states recorded for one student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IncidentCount {
    pub student_id: i64,
    pub incident_count: i64,
}

const COLUMNS: &str = "id, roll_id, student_id, state";

impl StudentRollState {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let raw: String = row.get(3)?;
        let state = raw
            .parse::<RollState>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
        Ok(Self {
            id: row.get(0)?,
            roll_id: row.get(1)?,
            student_id: row.get(2)?,
            state,
        })
    }

    pub fn list(conn: &Connection) -> Result<Vec<StudentRollState>> {
        let mut stmt =
            conn.prepare(&format!("SELECT {COLUMNS} FROM student_roll_states ORDER BY id"))?;
        let rows = stmt
            .query_map([], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Every recorded state for one roll, in insertion order.
    pub fn list_for_roll(conn: &Connection, roll_id: i64) -> Result<Vec<StudentRollState>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM student_roll_states WHERE roll_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![roll_id], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn find(conn: &Connection, id: i64) -> Result<Option<StudentRollState>> {
        let row = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM student_roll_states WHERE id = ?1"),
                params![id],
                Self::from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn load(conn: &Connection, id: i64) -> Result<StudentRollState> {
        Self::find(conn, id)?.ok_or(RollcallError::RollStateNotFound(id))
    }

    pub fn create(conn: &Connection, new: NewStudentRollState) -> Result<StudentRollState> {
        conn.execute(
            "INSERT INTO student_roll_states (roll_id, student_id, state) VALUES (?1, ?2, ?3)",
            params![new.roll_id, new.student_id, new.state.as_str()],
        )?;
        Ok(StudentRollState {
            id: conn.last_insert_rowid(),
            roll_id: new.roll_id,
            student_id: new.student_id,
            state: new.state,
        })
    }

    /// Insert a batch of states in one transaction, e.g. a whole roster for a roll.
    pub fn create_many(
        conn: &Connection,
        batch: Vec<NewStudentRollState>,
    ) -> Result<Vec<StudentRollState>> {
        let tx = conn.unchecked_transaction()?;
        let mut created = Vec::with_capacity(batch.len());
        for new in batch {
            created.push(Self::create(&tx, new)?);
        }
        tx.commit()?;
        Ok(created)
    }

    pub fn apply(&mut self, input: UpdateStudentRollStateInput) -> Result<()> {
        if let Some(v) = input.roll_id {
            self.roll_id = v;
        }
        if let Some(v) = input.student_id {
            self.student_id = v;
        }
        if let Some(v) = input.state {
            self.state = v.parse()?;
        }
        Ok(())
    }

    pub fn save(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE student_roll_states SET roll_id = ?1, student_id = ?2, state = ?3 WHERE id = ?4",
            params![self.roll_id, self.student_id, self.state.as_str(), self.id],
        )?;
        Ok(())
    }

    pub fn update(
        conn: &Connection,
        id: i64,
        input: UpdateStudentRollStateInput,
    ) -> Result<StudentRollState> {
        let mut row = Self::load(conn, id)?;
        row.apply(input)?;
        row.save(conn)?;
        Ok(row)
    }

    pub fn remove(conn: &Connection, id: i64) -> Result<StudentRollState> {
        let row = Self::load(conn, id)?;
        conn.execute("DELETE FROM student_roll_states WHERE id = ?1", params![id])?;
        Ok(row)
    }

    /// Count rows per student whose state is one of `states`, over rolls
    /// completed in `[start, end]`, inclusive. Rolls never completed are excluded.
    ///
    /// The statement binds two timestamps plus one parameter per state, however
    /// many rolls fall in the window. Empty `states` yields no counts.
    pub fn count_by_student(
        conn: &Connection,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
        states: &[String],
    ) -> Result<Vec<IncidentCount>> {
        if states.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT srs.student_id, COUNT(*)
             FROM student_roll_states srs
             JOIN rolls r ON r.id = srs.roll_id
             WHERE r.completed_at IS NOT NULL
               AND r.completed_at BETWEEN ?1 AND ?2
               AND srs.state IN ({})
             GROUP BY srs.student_id
             ORDER BY srs.student_id",
            placeholders(3, states.len()),
        );
        let bound: Vec<Value> = [encode_ts(start), encode_ts(end)]
            .into_iter()
            .chain(states.iter().cloned())
            .map(Value::Text)
            .collect();

        let mut stmt = conn.prepare(&sql)?;
        let counts = stmt
            .query_map(params_from_iter(bound), |r| {
                Ok(IncidentCount {
                    student_id: r.get(0)?,
                    incident_count: r.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(counts)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
