use axum::extract::State;
use axum::http::StatusCode;

use crate::app::AppState;
use crate::authz::Principal;
use crate::errors::AppResult;
use crate::extract::{Json, Path};
use crate::models::department::{Department, DepartmentCreateRequest, DepartmentUpdateRequest};

#[utoipa::path(
    get,
    path = "/api/departments",
    tag = "Departments",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    responses((status = 200, description = "List departments", body = [Department]))
)]
pub async fn list_departments(State(state): State<AppState>, principal: Principal) -> AppResult<Json<Vec<Department>>> {
    Ok(Json(state.departments().list(&principal).await?))
}

#[utoipa::path(
    post,
    path = "/api/departments",
    tag = "Departments",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    request_body = DepartmentCreateRequest,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 400, description = "Name missing"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_department(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<DepartmentCreateRequest>,
) -> AppResult<(StatusCode, Json<Department>)> {
    let department = state.departments().create(&principal, payload).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

#[utoipa::path(
    get,
    path = "/api/departments/{id}",
    tag = "Departments",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("id" = i64, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department detail", body = Department),
        (status = 404, description = "Department not found")
    )
)]
pub async fn get_department(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
) -> AppResult<Json<Department>> {
    Ok(Json(state.departments().get(&principal, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/departments/{id}",
    tag = "Departments",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("id" = i64, Path, description = "Department id")),
    request_body = DepartmentUpdateRequest,
    responses(
        (status = 200, description = "Department updated", body = Department),
        (status = 404, description = "Department not found")
    )
)]
pub async fn update_department(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
    Json(payload): Json<DepartmentUpdateRequest>,
) -> AppResult<Json<Department>> {
    Ok(Json(state.departments().update(&principal, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/departments/{id}",
    tag = "Departments",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("id" = i64, Path, description = "Department id")),
    responses(
        (status = 200, description = "Deleted department", body = Department),
        (status = 404, description = "Department not found"),
        (status = 409, description = "Department still has batches")
    )
)]
pub async fn delete_department(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
) -> AppResult<Json<Department>> {
    Ok(Json(state.departments().delete(&principal, id).await?))
}
