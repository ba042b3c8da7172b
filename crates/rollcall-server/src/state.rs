use std::path::PathBuf;

/// Shared application state passed to all route handlers.
///
/// Handlers open their own database connection from `root` inside
/// `spawn_blocking`; nothing else is shared between requests.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
}

impl AppState {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}
