use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use crate::app::AppState;
use crate::authz::Principal;
use crate::errors::AppResult;
use crate::extract::{Json, Multipart, Path, Query};
use crate::files::{Disposition, MultipartForm};
use crate::models::student::{Student, StudentCreateRequest, StudentListQuery, StudentUpdateRequest};

const CV_FIELD: &str = "cv";

#[utoipa::path(
    get,
    path = "/api/students/me",
    tag = "Students",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    responses(
        (status = 200, description = "The calling student", body = Student),
        (status = 403, description = "Caller is not a student")
    )
)]
pub async fn my_profile(State(state): State<AppState>, principal: Principal) -> AppResult<Json<Student>> {
    Ok(Json(state.students().profile(&principal).await?))
}

#[utoipa::path(
    get,
    path = "/api/students",
    tag = "Students",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(StudentListQuery),
    responses((status = 200, description = "List students", body = [Student]))
)]
pub async fn list_students(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<StudentListQuery>,
) -> AppResult<Json<Vec<Student>>> {
    Ok(Json(state.students().list(&principal, query.batch_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/students",
    tag = "Students",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    request_body = StudentCreateRequest,
    responses(
        (status = 201, description = "Student created", body = Student),
        (status = 400, description = "Missing field or invalid batch ID"),
        (status = 409, description = "Login ID or registration number already exists")
    )
)]
pub async fn create_student(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<StudentCreateRequest>,
) -> AppResult<(StatusCode, Json<Student>)> {
    let student = state.students().create(&principal, payload).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}",
    tag = "Students",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("id" = i64, Path, description = "Student id")),
    responses(
        (status = 200, description = "Student detail", body = Student),
        (status = 404, description = "Student not found")
    )
)]
pub async fn get_student(State(state): State<AppState>, principal: Principal, Path(id): Path<i64>) -> AppResult<Json<Student>> {
    Ok(Json(state.students().get(&principal, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}",
    tag = "Students",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("id" = i64, Path, description = "Student id")),
    request_body = StudentUpdateRequest,
    responses(
        (status = 200, description = "Student updated", body = Student),
        (status = 403, description = "Student tried to change identity fields"),
        (status = 409, description = "Login ID or registration number already exists")
    )
)]
pub async fn update_student(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
    Json(payload): Json<StudentUpdateRequest>,
) -> AppResult<Json<Student>> {
    Ok(Json(state.students().update(&principal, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    tag = "Students",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("id" = i64, Path, description = "Student id")),
    responses((status = 200, description = "Deleted student, internships removed with it", body = Student))
)]
pub async fn delete_student(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
) -> AppResult<Json<Student>> {
    Ok(Json(state.students().delete(&principal, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/students/{id}/cv",
    tag = "Students",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("id" = i64, Path, description = "Student id")),
    request_body(content = String, content_type = "multipart/form-data", description = "Single file part named `cv` (PDF or Word, at most 5 MB)"),
    responses(
        (status = 200, description = "CV stored", body = Student),
        (status = 400, description = "Missing file, wrong type or too large")
    )
)]
pub async fn upload_cv(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
    Multipart(multipart): Multipart,
) -> AppResult<Json<Student>> {
    let mut form = MultipartForm::read(multipart, &[], &[CV_FIELD]).await?;
    let upload = form.take_file(CV_FIELD);
    Ok(Json(state.students().upload_cv(&principal, id, upload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/students/{id}/cv",
    tag = "Students",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("id" = i64, Path, description = "Student id")),
    responses((status = 200, description = "CV removed", body = Student))
)]
pub async fn delete_cv(State(state): State<AppState>, principal: Principal, Path(id): Path<i64>) -> AppResult<Json<Student>> {
    Ok(Json(state.students().delete_cv(&principal, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/cv/download",
    tag = "Students",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("id" = i64, Path, description = "Student id")),
    responses(
        (status = 200, description = "CV bytes as an attachment"),
        (status = 404, description = "Student or CV not found")
    )
)]
pub async fn download_cv(State(state): State<AppState>, principal: Principal, Path(id): Path<i64>) -> AppResult<Response> {
    let file = state.students().cv(&principal, id).await?;
    Ok(file.into_response_with(Disposition::Attachment))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/cv/open",
    tag = "Students",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("id" = i64, Path, description = "Student id")),
    responses(
        (status = 200, description = "CV bytes, inline when PDF"),
        (status = 404, description = "Student or CV not found")
    )
)]
pub async fn open_cv(State(state): State<AppState>, principal: Principal, Path(id): Path<i64>) -> AppResult<Response> {
    let file = state.students().cv(&principal, id).await?;
    let disposition = Disposition::for_mime(&file.mime_type);
    Ok(file.into_response_with(disposition))
}
