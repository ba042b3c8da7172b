use crate::output::{print_json, print_table, ts_cell};
use clap::Subcommand;
use rollcall_core::{
    db,
    group::{CreateGroupInput, Group, NewGroup, UpdateGroupInput},
    group_student::GroupStudent,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum GroupSubcommand {
    /// Create a group rule
    Create {
        name: String,
        /// Length of the look-back window in weeks
        #[arg(long)]
        weeks: i64,
        /// Comma-separated roll states counted as incidents
        #[arg(long)]
        states: String,
        /// Incident threshold
        #[arg(long)]
        incidents: i64,
        /// `<` or `>`
        #[arg(long, visible_alias = "ltmt")]
        comparator: String,
    },
    /// List all groups with their last run
    List,
    /// Change a group's rule
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        weeks: Option<i64>,
        #[arg(long)]
        states: Option<String>,
        #[arg(long)]
        incidents: Option<i64>,
        #[arg(long, visible_alias = "ltmt")]
        comparator: Option<String>,
    },
    /// List the students currently in a group
    Students { id: i64 },
    /// Remove a group
    Remove { id: i64 },
}

pub fn run(root: &Path, subcmd: GroupSubcommand, json: bool) -> anyhow::Result<()> {
    let (_, conn) = db::open_project(root)?;
    match subcmd {
        GroupSubcommand::Create {
            name,
            weeks,
            states,
            incidents,
            comparator,
        } => {
            let new = NewGroup::from_input(CreateGroupInput {
                name: Some(name),
                number_of_weeks: Some(weeks),
                roll_states: Some(states),
                incidents: Some(incidents),
                ltmt: Some(comparator),
            })?;
            let group = Group::create(&conn, new)?;
            if json {
                print_json(&group)?;
            } else {
                println!("Created group {}: {}", group.id, group.name);
            }
        }
        GroupSubcommand::List => {
            let groups = Group::list(&conn)?;
            if json {
                return print_json(&groups);
            }
            if groups.is_empty() {
                println!("No groups.");
                return Ok(());
            }
            let rows = groups
                .iter()
                .map(|g| {
                    vec![
                        g.id.to_string(),
                        g.name.clone(),
                        format!(
                            "{} {} {} in {}w",
                            g.roll_states, g.ltmt, g.incidents, g.number_of_weeks
                        ),
                        ts_cell(g.run_at),
                        g.student_count.to_string(),
                    ]
                })
                .collect();
            print_table(&["ID", "NAME", "RULE", "LAST RUN", "STUDENTS"], rows);
        }
        GroupSubcommand::Update {
            id,
            name,
            weeks,
            states,
            incidents,
            comparator,
        } => {
            let group = Group::update(
                &conn,
                id,
                UpdateGroupInput {
                    name,
                    number_of_weeks: weeks,
                    roll_states: states,
                    incidents,
                    ltmt: comparator,
                    ..Default::default()
                },
            )?;
            if json {
                print_json(&group)?;
            } else {
                println!("Updated group {}: {}", group.id, group.name);
            }
        }
        GroupSubcommand::Students { id } => {
            let members = GroupStudent::members(&conn, id)?;
            if json {
                return print_json(&members);
            }
            if members.is_empty() {
                println!("No students in group {id}.");
                return Ok(());
            }
            let rows = members
                .iter()
                .map(|m| vec![m.id.to_string(), m.full_name.clone()])
                .collect();
            print_table(&["ID", "NAME"], rows);
        }
        GroupSubcommand::Remove { id } => {
            let group = Group::remove(&conn, id)?;
            if json {
                print_json(&group)?;
            } else {
                println!("Removed group {}: {}", group.id, group.name);
            }
        }
    }
    Ok(())
}
