use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RollcallError};
use crate::types::required_text;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub photo_url: Option<String>,
}

/// Raw create payload; required fields are checked by [`NewStudent::from_input`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateStudentInput {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStudentInput {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub photo_url: Option<String>,
}

impl NewStudent {
    pub fn from_input(input: CreateStudentInput) -> Result<Self> {
        Ok(Self {
            first_name: required_text(input.first_name, "first_name")?,
            last_name: required_text(input.last_name, "last_name")?,
            photo_url: input.photo_url,
        })
    }
}

const COLUMNS: &str = "id, first_name, last_name, photo_url";

impl Student {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            photo_url: row.get(3)?,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn list(conn: &Connection) -> Result<Vec<Student>> {
        let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM students ORDER BY id"))?;
        let rows = stmt
            .query_map([], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn find(conn: &Connection, id: i64) -> Result<Option<Student>> {
        let student = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM students WHERE id = ?1"),
                params![id],
                Self::from_row,
            )
            .optional()?;
        Ok(student)
    }

    pub fn load(conn: &Connection, id: i64) -> Result<Student> {
        Self::find(conn, id)?.ok_or(RollcallError::StudentNotFound(id))
    }

    pub fn create(conn: &Connection, new: NewStudent) -> Result<Student> {
        conn.execute(
            "INSERT INTO students (first_name, last_name, photo_url) VALUES (?1, ?2, ?3)",
            params![new.first_name, new.last_name, new.photo_url],
        )?;
        Ok(Student {
            id: conn.last_insert_rowid(),
            first_name: new.first_name,
            last_name: new.last_name,
            photo_url: new.photo_url,
        })
    }

    /// Overwrite only the fields present in `input`.
    pub fn apply(&mut self, input: UpdateStudentInput) {
        if let Some(v) = input.first_name {
            self.first_name = v;
        }
        if let Some(v) = input.last_name {
            self.last_name = v;
        }
        if let Some(v) = input.photo_url {
            self.photo_url = Some(v);
        }
    }

    pub fn save(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE students SET first_name = ?1, last_name = ?2, photo_url = ?3 WHERE id = ?4",
            params![self.first_name, self.last_name, self.photo_url, self.id],
        )?;
        Ok(())
    }

    pub fn update(conn: &Connection, id: i64, input: UpdateStudentInput) -> Result<Student> {
        let mut student = Self::load(conn, id)?;
        student.apply(input);
        student.save(conn)?;
        Ok(student)
    }

    /// Delete a student and return the removed record. Roll states recorded
    /// for the student are left in place.
    pub fn remove(conn: &Connection, id: i64) -> Result<Student> {
        let student = Self::load(conn, id)?;
        conn.execute("DELETE FROM students WHERE id = ?1", params![id])?;
        Ok(student)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
