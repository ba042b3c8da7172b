use anyhow::Context;
use rollcall_core::{config::Config, db, paths};
use std::path::Path;

pub fn run(root: &Path, name: Option<&str>) -> anyhow::Result<()> {
    let project_name = match name {
        Some(n) => n.to_string(),
        None => root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "school".to_string()),
    };

    println!("Initializing rollcall in: {}", root.display());

    let dir = paths::rollcall_dir(root);
    std::fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config = if paths::config_path(root).exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
        Config::load(root)?
    } else {
        let cfg = Config::new(&project_name);
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
        cfg
    };

    // Opening applies the schema, so this also upgrades an empty file.
    let db_path = config.database_path(root);
    let existed = db_path.exists();
    db::open(&db_path).with_context(|| format!("failed to open {}", db_path.display()))?;
    if existed {
        println!("  exists:  {}", db_path.display());
    } else {
        println!("  created: {}", db_path.display());
    }

    Ok(())
}
