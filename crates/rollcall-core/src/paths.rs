use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const ROLLCALL_DIR: &str = ".rollcall";
pub const CONFIG_FILE: &str = ".rollcall/config.yaml";
pub const DEFAULT_DB_FILE: &str = "rollcall.sqlite3";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn rollcall_dir(root: &Path) -> PathBuf {
    root.join(ROLLCALL_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve a configured database path. Relative paths live under `.rollcall/`.
pub fn database_path(root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        rollcall_dir(root).join(configured)
    }
}
