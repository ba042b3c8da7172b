use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use rollcall_core::roll::{CreateRollInput, NewRoll, Roll, UpdateRollInput};
use rollcall_core::roll_state::StudentRollState;

use super::{with_conn, ApiResult};
use crate::envelope::Envelope;
use crate::state::AppState;

/// GET /api/rolls
pub async fn list_rolls(State(app): State<AppState>) -> ApiResult<Vec<Roll>> {
    let rolls = with_conn(&app, |conn| Roll::list(conn)).await?;
    Ok(Envelope::ok(rolls))
}

/// GET /api/rolls/{id}
pub async fn get_roll(
    State(app): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Roll> {
    let Path(id) = id?;
    let roll = with_conn(&app, move |conn| Roll::load(conn, id)).await?;
    Ok(Envelope::ok(roll))
}

/// GET /api/rolls/{id}/states: every student state recorded for the roll.
pub async fn get_roll_states(
    State(app): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Vec<StudentRollState>> {
    let Path(id) = id?;
    let states = with_conn(&app, move |conn| Roll::states(conn, id)).await?;
    Ok(Envelope::ok(states))
}

/// POST /api/rolls
pub async fn create_roll(
    State(app): State<AppState>,
    body: Result<Json<CreateRollInput>, JsonRejection>,
) -> ApiResult<Roll> {
    let Json(body) = body?;
    let roll = with_conn(&app, move |conn| Roll::create(conn, NewRoll::from_input(body)?)).await?;
    Ok(Envelope::ok(roll))
}

/// PUT /api/rolls/{id}
pub async fn update_roll(
    State(app): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateRollInput>, JsonRejection>,
) -> ApiResult<Roll> {
    let Path(id) = id?;
    let Json(body) = body?;
    let roll = with_conn(&app, move |conn| Roll::update(conn, id, body)).await?;
    Ok(Envelope::ok(roll))
}

/// DELETE /api/rolls/{id}
pub async fn delete_roll(
    State(app): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Roll> {
    let Path(id) = id?;
    let roll = with_conn(&app, move |conn| Roll::remove(conn, id)).await?;
    Ok(Envelope::ok(roll))
}
