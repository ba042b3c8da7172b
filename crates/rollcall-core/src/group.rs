use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{encode_ts, store_precision, ts_column};
use crate::error::{Result, RollcallError};
use crate::types::{non_negative, normalize_states, required, required_text, split_states, Comparator};

/// A saved attendance filter rule plus the metadata of its last run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub number_of_weeks: i64,
    /// Comma-separated roll states counted as incidents.
    pub roll_states: String,
    pub incidents: i64,
    pub ltmt: Comparator,
    pub run_at: Option<DateTime<Utc>>,
    pub student_count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateGroupInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub number_of_weeks: Option<i64>,
    #[serde(default)]
    pub roll_states: Option<String>,
    #[serde(default)]
    pub incidents: Option<i64>,
    #[serde(default)]
    pub ltmt: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGroupInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub number_of_weeks: Option<i64>,
    #[serde(default)]
    pub roll_states: Option<String>,
    #[serde(default)]
    pub incidents: Option<i64>,
    #[serde(default)]
    pub ltmt: Option<String>,
    #[serde(default)]
    pub run_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub student_count: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: String,
    pub number_of_weeks: i64,
    pub roll_states: String,
    pub incidents: i64,
    pub ltmt: Comparator,
}

impl NewGroup {
    pub fn from_input(input: CreateGroupInput) -> Result<Self> {
        let name = required_text(input.name, "name")?;
        let number_of_weeks = non_negative(
            required(input.number_of_weeks, "number_of_weeks")?,
            "number_of_weeks",
        )?;
        let roll_states = normalize_states(&required(input.roll_states, "roll_states")?)?;
        let incidents = non_negative(required(input.incidents, "incidents")?, "incidents")?;
        let ltmt = required(input.ltmt, "ltmt")?.parse()?;
        Ok(Self {
            name,
            number_of_weeks,
            roll_states,
            incidents,
            ltmt,
        })
    }
}

/// Row as stored; `ltmt` is kept as text until validated.
struct GroupRow {
    id: i64,
    name: String,
    number_of_weeks: i64,
    roll_states: String,
    incidents: i64,
    ltmt: String,
    run_at: Option<DateTime<Utc>>,
    student_count: i64,
}

impl GroupRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            number_of_weeks: row.get(2)?,
            roll_states: row.get(3)?,
            incidents: row.get(4)?,
            ltmt: row.get(5)?,
            run_at: ts_column(row, 6)?,
            student_count: row.get(7)?,
        })
    }

    fn into_group(self) -> Result<Group> {
        Ok(Group {
            id: self.id,
            name: self.name,
            number_of_weeks: self.number_of_weeks,
            roll_states: self.roll_states,
            incidents: self.incidents,
            ltmt: self.ltmt.parse()?,
            run_at: self.run_at,
            student_count: self.student_count,
        })
    }
}

const COLUMNS: &str =
    "id, name, number_of_weeks, roll_states, incidents, ltmt, run_at, student_count";

impl Group {
    /// The configured roll states, split on commas.
    pub fn states(&self) -> Vec<String> {
        split_states(&self.roll_states)
    }

    pub fn list(conn: &Connection) -> Result<Vec<Group>> {
        let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM student_groups ORDER BY id"))?;
        let rows = stmt
            .query_map([], GroupRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(GroupRow::into_group).collect()
    }

    /// Ids of every group, ascending.
    pub fn ids(conn: &Connection) -> Result<Vec<i64>> {
        let mut stmt = conn.prepare("SELECT id FROM student_groups ORDER BY id")?;
        let ids = stmt
            .query_map([], |r| r.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }

    pub fn find(conn: &Connection, id: i64) -> Result<Option<Group>> {
        let row = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM student_groups WHERE id = ?1"),
                params![id],
                GroupRow::from_row,
            )
            .optional()?;
        row.map(GroupRow::into_group).transpose()
    }

    pub fn load(conn: &Connection, id: i64) -> Result<Group> {
        Self::find(conn, id)?.ok_or(RollcallError::GroupNotFound(id))
    }

    pub fn create(conn: &Connection, new: NewGroup) -> Result<Group> {
        conn.execute(
            "INSERT INTO student_groups (name, number_of_weeks, roll_states, incidents, ltmt, run_at, student_count)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, 0)",
            params![
                new.name,
                new.number_of_weeks,
                new.roll_states,
                new.incidents,
                new.ltmt.as_str()
            ],
        )?;
        Ok(Group {
            id: conn.last_insert_rowid(),
            name: new.name,
            number_of_weeks: new.number_of_weeks,
            roll_states: new.roll_states,
            incidents: new.incidents,
            ltmt: new.ltmt,
            run_at: None,
            student_count: 0,
        })
    }

    /// Overwrite the fields present in `input`. Validation runs before any
    /// field is touched, so a rejected update leaves `self` unchanged.
    pub fn apply(&mut self, input: UpdateGroupInput) -> Result<()> {
        let roll_states = input
            .roll_states
            .as_deref()
            .map(normalize_states)
            .transpose()?;
        let ltmt = input
            .ltmt
            .as_deref()
            .map(str::parse::<Comparator>)
            .transpose()?;
        let number_of_weeks = input
            .number_of_weeks
            .map(|v| non_negative(v, "number_of_weeks"))
            .transpose()?;
        let incidents = input
            .incidents
            .map(|v| non_negative(v, "incidents"))
            .transpose()?;
        let student_count = input
            .student_count
            .map(|v| non_negative(v, "student_count"))
            .transpose()?;

        if let Some(v) = input.name {
            self.name = v;
        }
        if let Some(v) = number_of_weeks {
            self.number_of_weeks = v;
        }
        if let Some(v) = roll_states {
            self.roll_states = v;
        }
        if let Some(v) = incidents {
            self.incidents = v;
        }
        if let Some(v) = ltmt {
            self.ltmt = v;
        }
        if let Some(v) = input.run_at {
            self.run_at = Some(store_precision(v));
        }
        if let Some(v) = student_count {
            self.student_count = v;
        }
        Ok(())
    }

    pub fn save(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE student_groups
             SET name = ?1, number_of_weeks = ?2, roll_states = ?3, incidents = ?4,
                 ltmt = ?5, run_at = ?6, student_count = ?7
             WHERE id = ?8",
            params![
                self.name,
                self.number_of_weeks,
                self.roll_states,
                self.incidents,
                self.ltmt.as_str(),
                self.run_at.as_ref().map(encode_ts),
                self.student_count,
                self.id
            ],
        )?;
        Ok(())
    }

    pub fn update(conn: &Connection, id: i64, input: UpdateGroupInput) -> Result<Group> {
        let mut group = Self::load(conn, id)?;
        group.apply(input)?;
        group.save(conn)?;
        Ok(group)
    }

    /// Delete a group and return it. Materialized membership rows are not
    /// touched here; the next filter run clears them.
    pub fn remove(conn: &Connection, id: i64) -> Result<Group> {
        let group = Self::load(conn, id)?;
        conn.execute("DELETE FROM student_groups WHERE id = ?1", params![id])?;
        Ok(group)
    }

    /// Re-read the group and stamp the result of a filter run on it.
    pub fn record_run(
        conn: &Connection,
        id: i64,
        run_at: DateTime<Utc>,
        student_count: i64,
    ) -> Result<Group> {
        let mut group = Self::load(conn, id)?;
        group.run_at = Some(store_precision(run_at));
        group.student_count = student_count;
        group.save(conn)?;
        Ok(group)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::TimeZone;

    fn input() -> CreateGroupInput {
        CreateGroupInput {
            name: Some("Frequently late".into()),
            number_of_weeks: Some(2),
            roll_states: Some("late,absent".into()),
            incidents: Some(2),
            ltmt: Some(">".into()),
        }
    }

    #[test]
    fn create_sets_defaults() {
        let conn = db::open_in_memory().unwrap();
        let g = Group::create(&conn, NewGroup::from_input(input()).unwrap()).unwrap();
        assert_eq!(g.run_at, None);
        assert_eq!(g.student_count, 0);
        assert_eq!(g.ltmt, Comparator::GreaterThan);
        assert_eq!(Group::load(&conn, g.id).unwrap(), g);
        assert_eq!(g.states(), vec!["late", "absent"]);
    }

    #[test]
    fn create_rejects_unknown_comparator() {
        let err = NewGroup::from_input(CreateGroupInput {
            ltmt: Some(">=".into()),
            ..input()
        })
        .unwrap_err();
        assert!(matches!(err, RollcallError::InvalidComparator(c) if c == ">="));
    }

    #[test]
    fn create_rejects_bad_roll_states() {
        let err = NewGroup::from_input(CreateGroupInput {
            roll_states: Some("late,sick".into()),
            ..input()
        })
        .unwrap_err();
        assert!(matches!(err, RollcallError::InvalidRollState(_)));

        let err = NewGroup::from_input(CreateGroupInput {
            roll_states: Some("".into()),
            ..input()
        })
        .unwrap_err();
        assert!(matches!(err, RollcallError::InvalidField { field: "roll_states", .. }));
    }

    #[test]
    fn create_requires_every_rule_field() {
        let err = NewGroup::from_input(CreateGroupInput {
            incidents: None,
            ..input()
        })
        .unwrap_err();
        assert!(matches!(err, RollcallError::MissingField("incidents")));

        let err = NewGroup::from_input(CreateGroupInput {
            number_of_weeks: Some(-1),
            ..input()
        })
        .unwrap_err();
        assert!(matches!(err, RollcallError::InvalidField { field: "number_of_weeks", .. }));
    }

    #[test]
    fn update_is_partial_and_validated() {
        let conn = db::open_in_memory().unwrap();
        let g = Group::create(&conn, NewGroup::from_input(input()).unwrap()).unwrap();

        let updated = Group::update(
            &conn,
            g.id,
            UpdateGroupInput {
                ltmt: Some("<".into()),
                incidents: Some(1),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.ltmt, Comparator::LessThan);
        assert_eq!(updated.incidents, 1);
        assert_eq!(updated.name, "Frequently late");

        let err = Group::update(
            &conn,
            g.id,
            UpdateGroupInput {
                name: Some("renamed".into()),
                ltmt: Some("!=".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, RollcallError::InvalidComparator(_)));
        assert_eq!(Group::load(&conn, g.id).unwrap().name, "Frequently late");
    }

    #[test]
    fn update_missing_group_is_not_found() {
        let conn = db::open_in_memory().unwrap();
        assert!(matches!(
            Group::update(&conn, 5, UpdateGroupInput::default()),
            Err(RollcallError::GroupNotFound(5))
        ));
    }

    #[test]
    fn stored_garbage_comparator_fails_on_load() {
        let conn = db::open_in_memory().unwrap();
        let g = Group::create(&conn, NewGroup::from_input(input()).unwrap()).unwrap();
        conn.execute(
            "UPDATE student_groups SET ltmt = '=' WHERE id = ?1",
            params![g.id],
        )
        .unwrap();
        assert!(matches!(
            Group::load(&conn, g.id),
            Err(RollcallError::InvalidComparator(_))
        ));
    }

    #[test]
    fn record_run_keeps_rule_fields() {
        let conn = db::open_in_memory().unwrap();
        let g = Group::create(&conn, NewGroup::from_input(input()).unwrap()).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        let stamped = Group::record_run(&conn, g.id, at, 4).unwrap();
        assert_eq!(stamped.run_at, Some(at));
        assert_eq!(stamped.student_count, 4);
        assert_eq!(stamped.roll_states, g.roll_states);
        assert_eq!(Group::load(&conn, g.id).unwrap(), stamped);
    }

    #[test]
    fn remove_returns_group() {
        let conn = db::open_in_memory().unwrap();
        let g = Group::create(&conn, NewGroup::from_input(input()).unwrap()).unwrap();
        assert_eq!(Group::remove(&conn, g.id).unwrap(), g);
        assert!(Group::list(&conn).unwrap().is_empty());
    }
}
