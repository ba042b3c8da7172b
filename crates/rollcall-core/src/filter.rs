//! Group filter recomputation.
//!
//! For every group the job counts, per student, the roll states matching the
//! group's `roll_states` over the rolls completed in the trailing
//! `number_of_weeks * 7` days, keeps the students whose count satisfies the
//! group's comparator against `incidents`, and replaces the group's
//! membership rows with the result.
//!
//! All membership rows across all groups are deleted before the first group
//! is evaluated. In [`FilterMode::Atomic`] the clear and every group's
//! rewrite share one `IMMEDIATE` transaction, so a failure rolls back to the
//! previous membership. [`FilterMode::Sequential`] commits each statement as
//! it runs; a failure part-way leaves the not-yet-recomputed groups empty.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::db::store_precision;
use crate::error::{Result, RollcallError};
use crate::group::Group;
use crate::group_student::{GroupStudent, NewGroupStudent};
use crate::roll_state::StudentRollState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    Atomic,
    Sequential,
}

/// Outcome of evaluating one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRun {
    pub group_id: i64,
    pub name: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub student_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterReport {
    pub run_at: DateTime<Utc>,
    /// Membership rows deleted by the global clear.
    pub cleared: usize,
    pub groups: Vec<GroupRun>,
}

/// The `[start, end]` window ending at `now` and spanning `number_of_weeks` weeks.
pub fn window(now: DateTime<Utc>, number_of_weeks: i64) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = number_of_weeks
        .checked_mul(7)
        .and_then(Duration::try_days)
        .and_then(|d| now.checked_sub_signed(d))
        .ok_or_else(|| RollcallError::InvalidField {
            field: "number_of_weeks",
            reason: format!("{number_of_weeks} weeks is out of range"),
        })?;
    Ok((start, now))
}

/// Compute the qualifying students of `group` as of `now` without writing.
pub fn evaluate_group(
    conn: &Connection,
    group: &Group,
    now: DateTime<Utc>,
) -> Result<(GroupRun, Vec<NewGroupStudent>)> {
    let (start, end) = window(now, group.number_of_weeks)?;
    let counts = StudentRollState::count_by_student(conn, &start, &end, &group.states())?;

    let members: Vec<NewGroupStudent> = counts
        .into_iter()
        .filter(|c| group.ltmt.holds(c.incident_count, group.incidents))
        .map(|c| NewGroupStudent {
            group_id: group.id,
            student_id: c.student_id,
            incident_count: c.incident_count,
        })
        .collect();

    let run = GroupRun {
        group_id: group.id,
        name: group.name.clone(),
        window_start: start,
        window_end: end,
        student_count: members.len() as i64,
    };
    Ok((run, members))
}

/// Recompute membership for every group.
pub fn run_group_filters(
    conn: &mut Connection,
    now: DateTime<Utc>,
    mode: FilterMode,
) -> Result<FilterReport> {
    let now = store_precision(now);
    let report = match mode {
        FilterMode::Atomic => {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let report = run_all(&tx, now)?;
            tx.commit()?;
            report
        }
        FilterMode::Sequential => run_all(conn, now)?,
    };

    tracing::info!(
        groups = report.groups.len(),
        cleared = report.cleared,
        mode = ?mode,
        "group filters recomputed"
    );
    Ok(report)
}

fn run_all(conn: &Connection, now: DateTime<Utc>) -> Result<FilterReport> {
    let cleared = GroupStudent::clear_all(conn)?;

    let mut groups = Vec::new();
    for id in Group::ids(conn)? {
        let group = Group::load(conn, id)?;
        let (run, members) = evaluate_group(conn, &group, now)?;
        GroupStudent::insert_many(conn, &members)?;
        Group::record_run(conn, group.id, now, run.student_count)?;

        tracing::debug!(
            group_id = run.group_id,
            students = run.student_count,
            "group membership rebuilt"
        );
        groups.push(run);
    }

    Ok(FilterReport {
        run_at: now,
        cleared,
        groups,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::group::{CreateGroupInput, NewGroup};
    use crate::roll::{NewRoll, Roll};
    use crate::roll_state::NewStudentRollState;
    use crate::student::{CreateStudentInput, NewStudent, Student};
    use crate::types::RollState;
    use chrono::TimeZone;
    use rusqlite::params;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 14, 15, 30, 0).unwrap()
    }

    fn student(conn: &Connection, first: &str) -> i64 {
        Student::create(
            conn,
            NewStudent::from_input(CreateStudentInput {
                first_name: Some(first.into()),
                last_name: Some("Pupil".into()),
                photo_url: None,
            })
            .unwrap(),
        )
        .unwrap()
        .id
    }

    fn roll_days_ago(conn: &Connection, days: i64) -> i64 {
        Roll::create(
            conn,
            NewRoll {
                name: format!("roll -{days}d"),
                completed_at: Some(now() - Duration::days(days)),
            },
        )
        .unwrap()
        .id
    }

    fn mark(conn: &Connection, roll_id: i64, student_id: i64, state: RollState) {
        StudentRollState::create(
            conn,
            NewStudentRollState {
                roll_id,
                student_id,
                state,
            },
        )
        .unwrap();
    }

    fn group(conn: &Connection, weeks: i64, states: &str, incidents: i64, ltmt: &str) -> Group {
        Group::create(
            conn,
            NewGroup::from_input(CreateGroupInput {
                name: Some(format!("{states} {ltmt} {incidents}")),
                number_of_weeks: Some(weeks),
                roll_states: Some(states.into()),
                incidents: Some(incidents),
                ltmt: Some(ltmt.into()),
            })
            .unwrap(),
        )
        .unwrap()
    }

    fn membership(conn: &Connection, group_id: i64) -> Vec<(i64, i64)> {
        GroupStudent::list_for_group(conn, group_id)
            .unwrap()
            .into_iter()
            .map(|gs| (gs.student_id, gs.incident_count))
            .collect()
    }

    #[test]
    fn late_or_absent_more_than_twice() {
        let mut conn = db::open_in_memory().unwrap();
        let a = student(&conn, "A");
        let b = student(&conn, "B");
        for days in [1, 3, 5] {
            let r = roll_days_ago(&conn, days);
            mark(&conn, r, a, RollState::Late);
            mark(&conn, r, b, RollState::Present);
        }
        let r = roll_days_ago(&conn, 2);
        mark(&conn, r, b, RollState::Absent);
        let g = group(&conn, 2, "late,absent", 2, ">");

        let report = run_group_filters(&mut conn, now(), FilterMode::Atomic).unwrap();

        assert_eq!(membership(&conn, g.id), vec![(a, 3)]);
        let stored = Group::load(&conn, g.id).unwrap();
        assert_eq!(stored.student_count, 1);
        assert_eq!(stored.run_at, Some(now()));
        assert_eq!(report.groups[0].student_count, 1);
    }

    #[test]
    fn greater_than_excludes_counts_at_threshold() {
        let mut conn = db::open_in_memory().unwrap();
        let ids: Vec<i64> = ["one", "two", "three"].iter().map(|n| student(&conn, n)).collect();
        // Student i gets i+1 absences.
        for (i, sid) in ids.iter().enumerate() {
            for d in 0..=i as i64 {
                let r = roll_days_ago(&conn, d + 1);
                mark(&conn, r, *sid, RollState::Absent);
            }
        }
        let g = group(&conn, 1, "absent", 2, ">");
        run_group_filters(&mut conn, now(), FilterMode::Atomic).unwrap();
        assert_eq!(membership(&conn, g.id), vec![(ids[2], 3)]);
    }

    #[test]
    fn less_than_flips_direction() {
        let mut conn = db::open_in_memory().unwrap();
        let ids: Vec<i64> = ["one", "two", "three"].iter().map(|n| student(&conn, n)).collect();
        for (i, sid) in ids.iter().enumerate() {
            for d in 0..=i as i64 {
                let r = roll_days_ago(&conn, d + 1);
                mark(&conn, r, *sid, RollState::Absent);
            }
        }
        let g = group(&conn, 1, "absent", 2, "<");
        run_group_filters(&mut conn, now(), FilterMode::Atomic).unwrap();
        assert_eq!(membership(&conn, g.id), vec![(ids[0], 1)]);
    }

    #[test]
    fn two_week_window_bounds() {
        let mut conn = db::open_in_memory().unwrap();
        let s = student(&conn, "Edge");
        for days in [15, 14, 13] {
            let r = roll_days_ago(&conn, days);
            mark(&conn, r, s, RollState::Late);
        }
        let g = group(&conn, 2, "late", 0, ">");
        let report = run_group_filters(&mut conn, now(), FilterMode::Atomic).unwrap();

        // 14 and 13 days ago are inside; 15 days ago is not.
        assert_eq!(membership(&conn, g.id), vec![(s, 2)]);
        assert_eq!(report.groups[0].window_start, now() - Duration::days(14));
        assert_eq!(report.groups[0].window_end, now());
    }

    #[test]
    fn no_rolls_in_window_resets_stale_count() {
        let mut conn = db::open_in_memory().unwrap();
        let s = student(&conn, "Old");
        let r = roll_days_ago(&conn, 40);
        mark(&conn, r, s, RollState::Absent);
        let g = group(&conn, 1, "absent", 0, ">");
        Group::record_run(&conn, g.id, now() - Duration::days(30), 5).unwrap();

        run_group_filters(&mut conn, now(), FilterMode::Atomic).unwrap();

        assert!(membership(&conn, g.id).is_empty());
        assert_eq!(Group::load(&conn, g.id).unwrap().student_count, 0);
    }

    #[test]
    fn incomplete_rolls_are_ignored() {
        let mut conn = db::open_in_memory().unwrap();
        let s = student(&conn, "Open");
        let r = Roll::create(
            &conn,
            NewRoll {
                name: "not completed".into(),
                completed_at: None,
            },
        )
        .unwrap();
        mark(&conn, r.id, s, RollState::Late);
        let g = group(&conn, 4, "late", 0, ">");
        run_group_filters(&mut conn, now(), FilterMode::Atomic).unwrap();
        assert!(membership(&conn, g.id).is_empty());
    }

    #[test]
    fn unmatched_state_filters_everything_out() {
        let mut conn = db::open_in_memory().unwrap();
        let s = student(&conn, "Punctual");
        let r = roll_days_ago(&conn, 1);
        mark(&conn, r, s, RollState::Present);
        let g = group(&conn, 1, "late", 0, ">");
        run_group_filters(&mut conn, now(), FilterMode::Atomic).unwrap();
        assert!(membership(&conn, g.id).is_empty());
    }

    #[test]
    fn running_twice_is_idempotent() {
        let mut conn = db::open_in_memory().unwrap();
        let a = student(&conn, "A");
        let b = student(&conn, "B");
        for days in [1, 2] {
            let r = roll_days_ago(&conn, days);
            mark(&conn, r, a, RollState::Late);
            mark(&conn, r, b, RollState::Absent);
        }
        let late = group(&conn, 1, "late", 1, ">");
        let absent = group(&conn, 1, "absent,late", 0, ">");

        run_group_filters(&mut conn, now(), FilterMode::Atomic).unwrap();
        let first = (membership(&conn, late.id), membership(&conn, absent.id));
        let second_report = run_group_filters(&mut conn, now(), FilterMode::Atomic).unwrap();
        let second = (membership(&conn, late.id), membership(&conn, absent.id));

        assert_eq!(first, second);
        assert_eq!(first.0, vec![(a, 2)]);
        assert_eq!(first.1, vec![(a, 2), (b, 2)]);
        assert_eq!(second_report.cleared, 3);
    }

    #[test]
    fn global_clear_drops_rows_of_deleted_groups() {
        let mut conn = db::open_in_memory().unwrap();
        GroupStudent::create(
            &conn,
            NewGroupStudent {
                group_id: 77,
                student_id: 1,
                incident_count: 9,
            },
        )
        .unwrap();
        let report = run_group_filters(&mut conn, now(), FilterMode::Sequential).unwrap();
        assert_eq!(report.cleared, 1);
        assert!(report.groups.is_empty());
        assert!(GroupStudent::list(&conn).unwrap().is_empty());
    }

    /// Two groups, the second with a stored comparator the job cannot parse.
    /// Both start with one membership row.
    fn corrupt_second_group(conn: &Connection) -> (Group, i64, i64) {
        let s = student(conn, "Kept");
        let r = roll_days_ago(conn, 1);
        mark(conn, r, s, RollState::Late);
        let good = group(conn, 1, "late", 0, ">");
        let bad = group(conn, 1, "late", 0, ">");
        conn.execute(
            "UPDATE student_groups SET ltmt = '>=' WHERE id = ?1",
            params![bad.id],
        )
        .unwrap();
        for group_id in [good.id, bad.id] {
            GroupStudent::create(
                conn,
                NewGroupStudent {
                    group_id,
                    student_id: s,
                    incident_count: 1,
                },
            )
            .unwrap();
        }
        (good, bad.id, s)
    }

    #[test]
    fn atomic_failure_keeps_previous_membership() {
        let mut conn = db::open_in_memory().unwrap();
        let (good, bad_id, s) = corrupt_second_group(&conn);

        let err = run_group_filters(&mut conn, now(), FilterMode::Atomic).unwrap_err();
        assert!(matches!(err, RollcallError::InvalidComparator(_)));

        assert_eq!(membership(&conn, good.id), vec![(s, 1)]);
        assert_eq!(membership(&conn, bad_id), vec![(s, 1)]);
        assert_eq!(Group::load(&conn, good.id).unwrap().run_at, None);
    }

    #[test]
    fn sequential_failure_leaves_partial_state() {
        let mut conn = db::open_in_memory().unwrap();
        let (good, bad_id, s) = corrupt_second_group(&conn);

        assert!(run_group_filters(&mut conn, now(), FilterMode::Sequential).is_err());

        // The first group was recomputed before the failure and kept.
        assert_eq!(membership(&conn, good.id), vec![(s, 1)]);
        assert_eq!(Group::load(&conn, good.id).unwrap().run_at, Some(now()));
        // The failing group lost its rows to the global clear.
        assert!(membership(&conn, bad_id).is_empty());
    }

    #[test]
    fn window_with_more_rolls_than_sqlite_variables() {
        let mut conn = db::open_in_memory().unwrap();
        let s = student(&conn, "Busy");
        let tx = conn.transaction().unwrap();
        let mut first = None;
        for i in 0..33_000 {
            let r = Roll::create(
                &tx,
                NewRoll {
                    name: format!("period {i}"),
                    completed_at: Some(now() - Duration::minutes(i + 1)),
                },
            )
            .unwrap();
            first.get_or_insert(r.id);
        }
        tx.commit().unwrap();
        mark(&conn, first.unwrap(), s, RollState::Late);
        let g = group(&conn, 52, "late", 0, ">");

        let report = run_group_filters(&mut conn, now(), FilterMode::Atomic).unwrap();

        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].student_count, 1);
        assert_eq!(membership(&conn, g.id), vec![(s, 1)]);
    }

    #[test]
    fn report_run_at_matches_stored_group() {
        let mut conn = db::open_in_memory().unwrap();
        let g = group(&conn, 1, "late", 0, ">");
        let at = now() + Duration::nanoseconds(987_654_321);

        let report = run_group_filters(&mut conn, at, FilterMode::Atomic).unwrap();

        let stored = Group::load(&conn, g.id).unwrap();
        assert_eq!(stored.run_at, Some(report.run_at));
        assert_eq!(report.run_at, now() + Duration::microseconds(987_654));
    }

    #[test]
    fn window_rejects_overflowing_weeks() {
        assert!(window(now(), i64::MAX).is_err());
        let (start, end) = window(now(), 0).unwrap();
        assert_eq!(start, end);
    }
}
