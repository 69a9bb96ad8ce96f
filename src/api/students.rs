//! Student roster endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::student::{CreateStudent, Student, StudentQuery, StudentsResponse},
    AppState,
};

use super::{ApiJson, ApiPath, ApiQuery, AuthenticatedLibrarian};

/// List students
#[utoipa::path(
    get,
    path = "/students",
    tag = "students",
    security(("bearer_auth" = [])),
    params(StudentQuery),
    responses(
        (status = 200, description = "Students, newest first", body = StudentsResponse)
    )
)]
pub async fn list_students(
    State(state): State<AppState>,
    _librarian: AuthenticatedLibrarian,
    ApiQuery(query): ApiQuery<StudentQuery>,
) -> AppResult<Json<StudentsResponse>> {
    let students = state.services.students.list_students(&query).await?;
    Ok(Json(students))
}

/// Get student by ID
#[utoipa::path(
    get,
    path = "/students/{id}",
    tag = "students",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student details", body = Student),
        (status = 404, description = "Student not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_student(
    State(state): State<AppState>,
    _librarian: AuthenticatedLibrarian,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Student>> {
    let student = state.services.students.get_student(id).await?;
    Ok(Json(student))
}

/// Get student by library card number
#[utoipa::path(
    get,
    path = "/students/card/{card_id}",
    tag = "students",
    security(("bearer_auth" = [])),
    params(("card_id" = String, Path, description = "Library card number")),
    responses(
        (status = 200, description = "Student details", body = Student),
        (status = 404, description = "Student not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_student_by_card(
    State(state): State<AppState>,
    _librarian: AuthenticatedLibrarian,
    ApiPath(card_id): ApiPath<String>,
) -> AppResult<Json<Student>> {
    let student = state.services.students.get_by_card(&card_id).await?;
    Ok(Json(student))
}

/// Register a student
#[utoipa::path(
    post,
    path = "/students",
    tag = "students",
    security(("bearer_auth" = [])),
    request_body = CreateStudent,
    responses(
        (status = 201, description = "Student created", body = Student),
        (status = 400, description = "Invalid student", body = crate::error::ErrorResponse),
        (status = 409, description = "Card number already used", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_student(
    State(state): State<AppState>,
    _librarian: AuthenticatedLibrarian,
    ApiJson(request): ApiJson<CreateStudent>,
) -> AppResult<(StatusCode, Json<Student>)> {
    let student = state.services.students.create_student(request).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// Delete a student
#[utoipa::path(
    delete,
    path = "/students/{id}",
    tag = "students",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 404, description = "Student not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Student has rental history", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_student(
    State(state): State<AppState>,
    _librarian: AuthenticatedLibrarian,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    state.services.students.delete_student(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
