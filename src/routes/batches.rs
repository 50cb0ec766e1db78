use axum::extract::State;
use axum::http::StatusCode;

use crate::app::AppState;
use crate::authz::Principal;
use crate::errors::AppResult;
use crate::extract::{Json, Path, Query};
use crate::models::batch::{Batch, BatchCreateRequest, BatchListQuery, BatchUpdateRequest};

#[utoipa::path(
    get,
    path = "/api/batches",
    tag = "Batches",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(BatchListQuery),
    responses((status = 200, description = "List batches, newest year first", body = [Batch]))
)]
pub async fn list_batches(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<BatchListQuery>,
) -> AppResult<Json<Vec<Batch>>> {
    Ok(Json(state.batches().list(&principal, query.department_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/batches",
    tag = "Batches",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    request_body = BatchCreateRequest,
    responses(
        (status = 201, description = "Batch created", body = Batch),
        (status = 400, description = "Missing field or invalid department ID")
    )
)]
pub async fn create_batch(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<BatchCreateRequest>,
) -> AppResult<(StatusCode, Json<Batch>)> {
    let batch = state.batches().create(&principal, payload).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

#[utoipa::path(
    get,
    path = "/api/batches/{id}",
    tag = "Batches",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("id" = i64, Path, description = "Batch id")),
    responses(
        (status = 200, description = "Batch detail", body = Batch),
        (status = 404, description = "Batch not found")
    )
)]
pub async fn get_batch(State(state): State<AppState>, principal: Principal, Path(id): Path<i64>) -> AppResult<Json<Batch>> {
    Ok(Json(state.batches().get(&principal, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/batches/{id}",
    tag = "Batches",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("id" = i64, Path, description = "Batch id")),
    request_body = BatchUpdateRequest,
    responses(
        (status = 200, description = "Batch updated", body = Batch),
        (status = 404, description = "Batch not found")
    )
)]
pub async fn update_batch(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
    Json(payload): Json<BatchUpdateRequest>,
) -> AppResult<Json<Batch>> {
    Ok(Json(state.batches().update(&principal, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/batches/{id}",
    tag = "Batches",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("id" = i64, Path, description = "Batch id")),
    responses(
        (status = 200, description = "Deleted batch", body = Batch),
        (status = 409, description = "Batch still has students or course advisors")
    )
)]
pub async fn delete_batch(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
) -> AppResult<Json<Batch>> {
    Ok(Json(state.batches().delete(&principal, id).await?))
}
