use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RollcallError};
use crate::group::Group;
use crate::student::Student;

/// Materialized membership of a student in a group, as of the group's last
/// filter run. Rows are only ever written by the filter job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStudent {
    pub id: i64,
    pub group_id: i64,
    pub student_id: i64,
    pub incident_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewGroupStudent {
    pub group_id: i64,
    pub student_id: i64,
    pub incident_count: i64,
}

/// Name projection of one current group member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMember {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
}

impl From<Student> for GroupMember {
    fn from(s: Student) -> Self {
        let full_name = s.full_name();
        Self {
            id: s.id,
            first_name: s.first_name,
            last_name: s.last_name,
            full_name,
        }
    }
}

const COLUMNS: &str = "id, group_id, student_id, incident_count";

impl GroupStudent {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            group_id: row.get(1)?,
            student_id: row.get(2)?,
            incident_count: row.get(3)?,
        })
    }

    pub fn list(conn: &Connection) -> Result<Vec<GroupStudent>> {
        let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM group_students ORDER BY id"))?;
        let rows = stmt
            .query_map([], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn list_for_group(conn: &Connection, group_id: i64) -> Result<Vec<GroupStudent>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM group_students WHERE group_id = ?1 ORDER BY student_id"
        ))?;
        let rows = stmt
            .query_map(params![group_id], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn find(conn: &Connection, id: i64) -> Result<Option<GroupStudent>> {
        let row = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM group_students WHERE id = ?1"),
                params![id],
                Self::from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn load(conn: &Connection, id: i64) -> Result<GroupStudent> {
        Self::find(conn, id)?.ok_or(RollcallError::GroupStudentNotFound(id))
    }

    pub fn create(conn: &Connection, new: NewGroupStudent) -> Result<GroupStudent> {
        conn.execute(
            "INSERT INTO group_students (group_id, student_id, incident_count) VALUES (?1, ?2, ?3)",
            params![new.group_id, new.student_id, new.incident_count],
        )?;
        Ok(GroupStudent {
            id: conn.last_insert_rowid(),
            group_id: new.group_id,
            student_id: new.student_id,
            incident_count: new.incident_count,
        })
    }

    pub fn insert_many(conn: &Connection, rows: &[NewGroupStudent]) -> Result<Vec<GroupStudent>> {
        rows.iter().map(|new| Self::create(conn, *new)).collect()
    }

    pub fn remove(conn: &Connection, id: i64) -> Result<GroupStudent> {
        let row = Self::load(conn, id)?;
        conn.execute("DELETE FROM group_students WHERE id = ?1", params![id])?;
        Ok(row)
    }

    /// Delete every membership row of every group. Returns the number removed.
    pub fn clear_all(conn: &Connection) -> Result<usize> {
        Ok(conn.execute("DELETE FROM group_students", [])?)
    }

    /// Names of the students currently materialized in `group_id`.
    pub fn members(conn: &Connection, group_id: i64) -> Result<Vec<GroupMember>> {
        Group::load(conn, group_id)?;
        let mut stmt = conn.prepare(
            "SELECT s.id, s.first_name, s.last_name, s.photo_url
             FROM group_students gs
             JOIN students s ON s.id = gs.student_id
             WHERE gs.group_id = ?1
             ORDER BY s.id",
        )?;
        let members = stmt
            .query_map(params![group_id], |r| {
                Ok(Student {
                    id: r.get(0)?,
                    first_name: r.get(1)?,
                    last_name: r.get(2)?,
                    photo_url: r.get(3)?,
                })
            })?
            .map(|s| s.map(GroupMember::from))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(members)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
