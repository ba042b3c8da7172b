pub mod group_students;
pub mod groups;
pub mod health;
pub mod roll_states;
pub mod rolls;
pub mod students;

use axum::Json;
use rollcall_core::db::Connection;

use crate::envelope::Envelope;
use crate::error::AppError;
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<Envelope<T>>, AppError>;

/// Open the project database on the blocking pool and run `f` against it.
pub(crate) async fn with_conn<T, F>(app: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&mut Connection) -> rollcall_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let (_config, mut conn) = rollcall_core::db::open_project(&root)?;
        f(&mut conn)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(result)
}
