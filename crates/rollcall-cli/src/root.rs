use std::path::{Path, PathBuf};

use rollcall_core::paths::ROLLCALL_DIR;

/// Resolve the project root directory.
///
/// Priority:
/// 1. `--root` flag / `ROLLCALL_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.rollcall/`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_project(&cwd).unwrap_or(cwd)
}

/// Nearest ancestor of `start` (inclusive) that contains `.rollcall/`.
fn find_project(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(ROLLCALL_DIR).is_dir())
        .map(Path::to_path_buf)
}
