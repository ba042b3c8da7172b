use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use rollcall_core::filter::{self, FilterReport};
use rollcall_core::group::{CreateGroupInput, Group, NewGroup, UpdateGroupInput};
use rollcall_core::group_student::{GroupMember, GroupStudent};

use super::{with_conn, ApiResult};
use crate::envelope::Envelope;
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/groups
pub async fn list_groups(State(app): State<AppState>) -> ApiResult<Vec<Group>> {
    let groups = with_conn(&app, |conn| Group::list(conn)).await?;
    Ok(Envelope::ok(groups))
}

/// GET /api/groups/{id}
pub async fn get_group(
    State(app): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Group> {
    let Path(id) = id?;
    let group = with_conn(&app, move |conn| Group::load(conn, id)).await?;
    Ok(Envelope::ok(group))
}

/// POST /api/groups: create a filter rule. `run_at` starts empty.
pub async fn create_group(
    State(app): State<AppState>,
    body: Result<Json<CreateGroupInput>, JsonRejection>,
) -> ApiResult<Group> {
    let Json(body) = body?;
    let group = with_conn(&app, move |conn| Group::create(conn, NewGroup::from_input(body)?)).await?;
    Ok(Envelope::ok(group))
}

/// PUT /api/groups/{id}
pub async fn update_group(
    State(app): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateGroupInput>, JsonRejection>,
) -> ApiResult<Group> {
    let Path(id) = id?;
    let Json(body) = body?;
    let group = with_conn(&app, move |conn| Group::update(conn, id, body)).await?;
    Ok(Envelope::ok(group))
}

/// DELETE /api/groups/{id}
pub async fn delete_group(
    State(app): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Group> {
    let Path(id) = id?;
    let group = with_conn(&app, move |conn| Group::remove(conn, id)).await?;
    Ok(Envelope::ok_with_message(group, "group deleted"))
}

/// GET /api/groups/{id}/students: names of the group's current members.
pub async fn get_group_students(
    State(app): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Vec<GroupMember>> {
    let Path(id) = id?;
    let members = with_conn(&app, move |conn| GroupStudent::members(conn, id)).await?;
    Ok(Envelope::ok(members))
}

/// POST /api/groups/run-filters: recompute membership of every group.
pub async fn run_filters(State(app): State<AppState>) -> ApiResult<FilterReport> {
    let root = app.root.clone();
    let report = tokio::task::spawn_blocking(move || {
        let (config, mut conn) = rollcall_core::db::open_project(&root)?;
        filter::run_group_filters(&mut conn, Utc::now(), config.filters.mode())
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Envelope::ok_with_message(
        report,
        "filter query executed successfully",
    ))
}
