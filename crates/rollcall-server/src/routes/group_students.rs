use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use rollcall_core::group_student::GroupStudent;

use super::{with_conn, ApiResult};
use crate::envelope::Envelope;
use crate::state::AppState;

/// GET /api/group-students: every materialized membership row.
pub async fn list_group_students(State(app): State<AppState>) -> ApiResult<Vec<GroupStudent>> {
    let rows = with_conn(&app, |conn| GroupStudent::list(conn)).await?;
    Ok(Envelope::ok(rows))
}

/// GET /api/group-students/{id}
pub async fn get_group_student(
    State(app): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<GroupStudent> {
    let Path(id) = id?;
    let row = with_conn(&app, move |conn| GroupStudent::load(conn, id)).await?;
    Ok(Envelope::ok(row))
}

/// DELETE /api/group-students/{id}
pub async fn delete_group_student(
    State(app): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<GroupStudent> {
    let Path(id) = id?;
    let row = with_conn(&app, move |conn| GroupStudent::remove(conn, id)).await?;
    Ok(Envelope::ok(row))
}
