use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use rollcall_core::student::{CreateStudentInput, NewStudent, Student, UpdateStudentInput};

use super::{with_conn, ApiResult};
use crate::envelope::Envelope;
use crate::state::AppState;

/// GET /api/students: list all students.
pub async fn list_students(State(app): State<AppState>) -> ApiResult<Vec<Student>> {
    let students = with_conn(&app, |conn| Student::list(conn)).await?;
    Ok(Envelope::ok(students))
}

/// GET /api/students/{id}
pub async fn get_student(
    State(app): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Student> {
    let Path(id) = id?;
    let student = with_conn(&app, move |conn| Student::load(conn, id)).await?;
    Ok(Envelope::ok(student))
}

/// POST /api/students: create a student.
pub async fn create_student(
    State(app): State<AppState>,
    body: Result<Json<CreateStudentInput>, JsonRejection>,
) -> ApiResult<Student> {
    let Json(body) = body?;
    let student = with_conn(&app, move |conn| {
        Student::create(conn, NewStudent::from_input(body)?)
    })
    .await?;
    Ok(Envelope::ok(student))
}

/// PUT /api/students/{id}: overwrite the given fields.
pub async fn update_student(
    State(app): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateStudentInput>, JsonRejection>,
) -> ApiResult<Student> {
    let Path(id) = id?;
    let Json(body) = body?;
    let student = with_conn(&app, move |conn| Student::update(conn, id, body)).await?;
    Ok(Envelope::ok(student))
}

/// DELETE /api/students/{id}: returns the removed student.
pub async fn delete_student(
    State(app): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Student> {
    let Path(id) = id?;
    let student = with_conn(&app, move |conn| Student::remove(conn, id)).await?;
    Ok(Envelope::ok(student))
}
