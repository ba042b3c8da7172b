use crate::output::{print_json, print_table, ts_cell};
use chrono::Utc;
use clap::Subcommand;
use rollcall_core::{
    db,
    roll::{CreateRollInput, NewRoll, Roll, UpdateRollInput},
    roll_state::{CreateStudentRollStateInput, NewStudentRollState, StudentRollState},
};
use std::path::Path;

#[derive(Subcommand)]
pub enum RollSubcommand {
    /// Create a roll
    Create {
        name: String,
        /// Completion time (RFC 3339); leave out for an open roll
        #[arg(long)]
        completed_at: Option<String>,
    },
    /// List all rolls
    List,
    /// Mark a roll completed
    Complete {
        id: i64,
        /// Completion time (RFC 3339, default: now)
        #[arg(long)]
        at: Option<String>,
    },
    /// Record one student's state on a roll
    Mark {
        roll_id: i64,
        student_id: i64,
        /// unmarked | present | absent | late
        state: String,
    },
    /// Show the states recorded on a roll
    States { id: i64 },
    /// Remove a roll
    Remove { id: i64 },
}

pub fn run(root: &Path, subcmd: RollSubcommand, json: bool) -> anyhow::Result<()> {
    let (_, conn) = db::open_project(root)?;
    match subcmd {
        RollSubcommand::Create { name, completed_at } => {
            let completed_at = completed_at.as_deref().map(db::decode_ts).transpose()?;
            let roll = Roll::create(
                &conn,
                NewRoll::from_input(CreateRollInput {
                    name: Some(name),
                    completed_at,
                })?,
            )?;
            if json {
                print_json(&roll)?;
            } else {
                println!("Created roll {}: {}", roll.id, roll.name);
            }
        }
        RollSubcommand::List => {
            let rolls = Roll::list(&conn)?;
            if json {
                return print_json(&rolls);
            }
            if rolls.is_empty() {
                println!("No rolls.");
                return Ok(());
            }
            let rows = rolls
                .iter()
                .map(|r| vec![r.id.to_string(), r.name.clone(), ts_cell(r.completed_at)])
                .collect();
            print_table(&["ID", "NAME", "COMPLETED"], rows);
        }
        RollSubcommand::Complete { id, at } => {
            let at = match at {
                Some(raw) => db::decode_ts(&raw)?,
                None => Utc::now(),
            };
            let roll = Roll::update(
                &conn,
                id,
                UpdateRollInput {
                    completed_at: Some(at),
                    ..Default::default()
                },
            )?;
            if json {
                print_json(&roll)?;
            } else {
                println!("Completed roll {} at {}", roll.id, ts_cell(roll.completed_at));
            }
        }
        RollSubcommand::Mark {
            roll_id,
            student_id,
            state,
        } => {
            let row = StudentRollState::create(
                &conn,
                NewStudentRollState::from_input(CreateStudentRollStateInput {
                    roll_id: Some(roll_id),
                    student_id: Some(student_id),
                    state: Some(state),
                })?,
            )?;
            if json {
                print_json(&row)?;
            } else {
                println!(
                    "Marked student {} {} on roll {}",
                    row.student_id, row.state, row.roll_id
                );
            }
        }
        RollSubcommand::States { id } => {
            let states = Roll::states(&conn, id)?;
            if json {
                return print_json(&states);
            }
            let rows = states
                .iter()
                .map(|s| vec![s.id.to_string(), s.student_id.to_string(), s.state.to_string()])
                .collect();
            print_table(&["ID", "STUDENT", "STATE"], rows);
        }
        RollSubcommand::Remove { id } => {
            let roll = Roll::remove(&conn, id)?;
            if json {
                print_json(&roll)?;
            } else {
                println!("Removed roll {}: {}", roll.id, roll.name);
            }
        }
    }
    Ok(())
}
