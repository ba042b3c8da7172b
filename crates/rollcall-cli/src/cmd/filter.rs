use crate::output::{print_json, print_table};
use chrono::Utc;
use rollcall_core::{
    db,
    filter::{self, FilterMode},
};
use std::path::Path;

pub fn run(root: &Path, at: Option<&str>, sequential: bool, json: bool) -> anyhow::Result<()> {
    let (config, mut conn) = db::open_project(root)?;
    let now = match at {
        Some(raw) => db::decode_ts(raw)?,
        None => Utc::now(),
    };
    let mode = if sequential {
        FilterMode::Sequential
    } else {
        config.filters.mode()
    };

    let report = filter::run_group_filters(&mut conn, now, mode)?;

    if json {
        return print_json(&report);
    }

    if report.groups.is_empty() {
        println!("No groups defined.");
        return Ok(());
    }

    let rows = report
        .groups
        .iter()
        .map(|g| {
            vec![
                g.group_id.to_string(),
                g.name.clone(),
                g.window_start.format("%Y-%m-%d %H:%M").to_string(),
                g.window_end.format("%Y-%m-%d %H:%M").to_string(),
                g.student_count.to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "GROUP", "FROM", "TO", "STUDENTS"], rows);
    println!(
        "\n{} group(s) recomputed, {} previous membership row(s) replaced.",
        report.groups.len(),
        report.cleared
    );
    Ok(())
}
