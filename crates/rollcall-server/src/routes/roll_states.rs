use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use rollcall_core::roll_state::{
    CreateStudentRollStateInput, NewStudentRollState, StudentRollState,
    UpdateStudentRollStateInput,
};

use super::{with_conn, ApiResult};
use crate::envelope::Envelope;
use crate::state::AppState;

/// GET /api/roll-states
pub async fn list_roll_states(State(app): State<AppState>) -> ApiResult<Vec<StudentRollState>> {
    let rows = with_conn(&app, |conn| StudentRollState::list(conn)).await?;
    Ok(Envelope::ok(rows))
}

/// GET /api/roll-states/{id}
pub async fn get_roll_state(
    State(app): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StudentRollState> {
    let Path(id) = id?;
    let row = with_conn(&app, move |conn| StudentRollState::load(conn, id)).await?;
    Ok(Envelope::ok(row))
}

/// POST /api/roll-states: record one student's state for one roll.
pub async fn create_roll_state(
    State(app): State<AppState>,
    body: Result<Json<CreateStudentRollStateInput>, JsonRejection>,
) -> ApiResult<StudentRollState> {
    let Json(body) = body?;
    let row = with_conn(&app, move |conn| {
        StudentRollState::create(conn, NewStudentRollState::from_input(body)?)
    })
    .await?;
    Ok(Envelope::ok(row))
}

/// POST /api/roll-states/bulk: record a list of states in one transaction.
///
/// Every entry is validated before anything is written.
pub async fn create_roll_states(
    State(app): State<AppState>,
    body: Result<Json<Vec<CreateStudentRollStateInput>>, JsonRejection>,
) -> ApiResult<Vec<StudentRollState>> {
    let Json(body) = body?;
    let rows = with_conn(&app, move |conn| {
        let batch = body
            .into_iter()
            .map(NewStudentRollState::from_input)
            .collect::<rollcall_core::Result<Vec<_>>>()?;
        StudentRollState::create_many(conn, batch)
    })
    .await?;
    Ok(Envelope::ok(rows))
}

/// PUT /api/roll-states/{id}
pub async fn update_roll_state(
    State(app): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateStudentRollStateInput>, JsonRejection>,
) -> ApiResult<StudentRollState> {
    let Path(id) = id?;
    let Json(body) = body?;
    let row = with_conn(&app, move |conn| StudentRollState::update(conn, id, body)).await?;
    Ok(Envelope::ok(row))
}

/// DELETE /api/roll-states/{id}
pub async fn delete_roll_state(
    State(app): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StudentRollState> {
    let Path(id) = id?;
    let row = with_conn(&app, move |conn| StudentRollState::remove(conn, id)).await?;
    Ok(Envelope::ok(row))
}
