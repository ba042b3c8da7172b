use crate::output::{print_json, print_table};
use clap::Subcommand;
use rollcall_core::{
    db,
    student::{CreateStudentInput, NewStudent, Student},
};
use std::path::Path;

#[derive(Subcommand)]
pub enum StudentSubcommand {
    /// Add a student
    Add {
        first_name: String,
        last_name: String,
        #[arg(long)]
        photo_url: Option<String>,
    },
    /// List all students
    List,
    /// Show one student
    Show { id: i64 },
    /// Remove a student (recorded roll states are kept)
    Remove { id: i64 },
}

pub fn run(root: &Path, subcmd: StudentSubcommand, json: bool) -> anyhow::Result<()> {
    let (_, conn) = db::open_project(root)?;
    match subcmd {
        StudentSubcommand::Add {
            first_name,
            last_name,
            photo_url,
        } => {
            let new = NewStudent::from_input(CreateStudentInput {
                first_name: Some(first_name),
                last_name: Some(last_name),
                photo_url,
            })?;
            let student = Student::create(&conn, new)?;
            if json {
                print_json(&student)?;
            } else {
                println!("Added student {}: {}", student.id, student.full_name());
            }
        }
        StudentSubcommand::List => {
            let students = Student::list(&conn)?;
            if json {
                return print_json(&students);
            }
            if students.is_empty() {
                println!("No students.");
                return Ok(());
            }
            let rows = students
                .iter()
                .map(|s| {
                    vec![
                        s.id.to_string(),
                        s.full_name(),
                        s.photo_url.clone().unwrap_or_else(|| "-".into()),
                    ]
                })
                .collect();
            print_table(&["ID", "NAME", "PHOTO"], rows);
        }
        StudentSubcommand::Show { id } => {
            let student = Student::load(&conn, id)?;
            if json {
                print_json(&student)?;
            } else {
                println!("{}  {}", student.id, student.full_name());
                if let Some(url) = &student.photo_url {
                    println!("photo: {url}");
                }
            }
        }
        StudentSubcommand::Remove { id } => {
            let student = Student::remove(&conn, id)?;
            if json {
                print_json(&student)?;
            } else {
                println!("Removed student {}: {}", student.id, student.full_name());
            }
        }
    }
    Ok(())
}
