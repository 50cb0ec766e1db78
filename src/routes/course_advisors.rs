use axum::extract::State;
use axum::http::StatusCode;

use crate::app::AppState;
use crate::authz::Principal;
use crate::errors::AppResult;
use crate::extract::{Json, Path, Query};
use crate::models::course_advisor::{
    CourseAdvisor, CourseAdvisorCreateRequest, CourseAdvisorListQuery, CourseAdvisorUpdateRequest,
};

#[utoipa::path(
    get,
    path = "/api/course-advisors/me",
    tag = "Course advisors",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    responses(
        (status = 200, description = "The calling advisor", body = CourseAdvisor),
        (status = 403, description = "Caller is not a course advisor")
    )
)]
pub async fn my_profile(State(state): State<AppState>, principal: Principal) -> AppResult<Json<CourseAdvisor>> {
    Ok(Json(state.course_advisors().profile(&principal).await?))
}

#[utoipa::path(
    get,
    path = "/api/course-advisors",
    tag = "Course advisors",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(CourseAdvisorListQuery),
    responses((status = 200, description = "List course advisors", body = [CourseAdvisor]))
)]
pub async fn list_course_advisors(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<CourseAdvisorListQuery>,
) -> AppResult<Json<Vec<CourseAdvisor>>> {
    Ok(Json(state.course_advisors().list(&principal, query.batch_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/course-advisors",
    tag = "Course advisors",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    request_body = CourseAdvisorCreateRequest,
    responses(
        (status = 201, description = "Course advisor created", body = CourseAdvisor),
        (status = 400, description = "Missing field or invalid batch ID"),
        (status = 409, description = "Login ID already exists")
    )
)]
pub async fn create_course_advisor(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<CourseAdvisorCreateRequest>,
) -> AppResult<(StatusCode, Json<CourseAdvisor>)> {
    let advisor = state.course_advisors().create(&principal, payload).await?;
    Ok((StatusCode::CREATED, Json(advisor)))
}

#[utoipa::path(
    get,
    path = "/api/course-advisors/{id}",
    tag = "Course advisors",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("id" = i64, Path, description = "Course advisor id")),
    responses(
        (status = 200, description = "Course advisor detail", body = CourseAdvisor),
        (status = 404, description = "Course advisor not found")
    )
)]
pub async fn get_course_advisor(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
) -> AppResult<Json<CourseAdvisor>> {
    Ok(Json(state.course_advisors().get(&principal, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/course-advisors/{id}",
    tag = "Course advisors",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("id" = i64, Path, description = "Course advisor id")),
    request_body = CourseAdvisorUpdateRequest,
    responses(
        (status = 200, description = "Course advisor updated", body = CourseAdvisor),
        (status = 409, description = "Login ID already exists")
    )
)]
pub async fn update_course_advisor(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
    Json(payload): Json<CourseAdvisorUpdateRequest>,
) -> AppResult<Json<CourseAdvisor>> {
    Ok(Json(state.course_advisors().update(&principal, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/course-advisors/{id}",
    tag = "Course advisors",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("id" = i64, Path, description = "Course advisor id")),
    responses((status = 200, description = "Deleted course advisor", body = CourseAdvisor))
)]
pub async fn delete_course_advisor(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
) -> AppResult<Json<CourseAdvisor>> {
    Ok(Json(state.course_advisors().delete(&principal, id).await?))
}
