use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use crate::app::AppState;
use crate::authz::Principal;
use crate::errors::AppResult;
use crate::extract::{Json, Multipart, Path, Query};
use crate::files::{Disposition, InternshipFileKind, MultipartForm};
use crate::managers::internship::Attachments;
use crate::models::internship::{Internship, InternshipInput, InternshipListQuery, StudentWithoutInternship};

/// Split the internship form into text input and attachments.
async fn read_form(Multipart(multipart): Multipart) -> AppResult<(InternshipInput, Attachments)> {
    let mut form = MultipartForm::read(multipart, &InternshipInput::FIELDS, &InternshipFileKind::field_names()).await?;

    let input = InternshipInput {
        internship_type: form.text("internship_type"),
        reporting_officer_name: form.text("reporting_officer_name"),
        organization: form.text("organization"),
        contact: form.text("contact"),
        email: form.text("email"),
        website: form.text("website"),
        duration: form.text("duration"),
        year_of_completion: form.text("year_of_completion"),
    };

    let attachments: Attachments = InternshipFileKind::ALL
        .into_iter()
        .filter_map(|kind| form.take_file(kind.as_str()).map(|upload| (kind, upload)))
        .collect();

    Ok((input, attachments))
}

#[utoipa::path(
    get,
    path = "/api/internships",
    tag = "Internships",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(InternshipListQuery),
    responses((status = 200, description = "Internships visible to the caller", body = [Internship]))
)]
pub async fn list_internships(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<InternshipListQuery>,
) -> AppResult<Json<Vec<Internship>>> {
    Ok(Json(state.internships().list(&principal, query.batch_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/internships",
    tag = "Internships",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "Text fields internship_type, organization, duration, year_of_completion (required), \
                       reporting_officer_name, contact, email, website; optional file parts evidences, survey1, survey2, survey3"
    ),
    responses(
        (status = 201, description = "Internship created", body = Internship),
        (status = 400, description = "Missing field or rejected file"),
        (status = 403, description = "Caller is not a student")
    )
)]
pub async fn create_internship(
    State(state): State<AppState>,
    principal: Principal,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<Internship>)> {
    let (input, attachments) = read_form(multipart).await?;
    let internship = state.internships().create(&principal, input, attachments).await?;
    Ok((StatusCode::CREATED, Json(internship)))
}

#[utoipa::path(
    get,
    path = "/api/internships/no-internship",
    tag = "Internships",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(InternshipListQuery),
    responses((status = 200, description = "Students without any internship record", body = [StudentWithoutInternship]))
)]
pub async fn students_without_internship(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<InternshipListQuery>,
) -> AppResult<Json<Vec<StudentWithoutInternship>>> {
    Ok(Json(
        state.internships().students_without_internship(&principal, query.batch_id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/internships/{id}",
    tag = "Internships",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("id" = i64, Path, description = "Internship id")),
    responses(
        (status = 200, description = "Internship detail", body = Internship),
        (status = 404, description = "Internship not found")
    )
)]
pub async fn get_internship(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
) -> AppResult<Json<Internship>> {
    Ok(Json(state.internships().get(&principal, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/internships/{id}",
    tag = "Internships",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("id" = i64, Path, description = "Internship id")),
    request_body(content = String, content_type = "multipart/form-data", description = "Any subset of the create fields; files replace only their slot"),
    responses(
        (status = 200, description = "Internship updated", body = Internship),
        (status = 404, description = "Internship not found")
    )
)]
pub async fn update_internship(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> AppResult<Json<Internship>> {
    let (input, attachments) = read_form(multipart).await?;
    Ok(Json(state.internships().update(&principal, id, input, attachments).await?))
}

#[utoipa::path(
    delete,
    path = "/api/internships/{id}",
    tag = "Internships",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("id" = i64, Path, description = "Internship id")),
    responses((status = 200, description = "Deleted internship", body = Internship))
)]
pub async fn delete_internship(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
) -> AppResult<Json<Internship>> {
    Ok(Json(state.internships().delete(&principal, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/internships/{id}/files/{file_type}",
    tag = "Internships",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(
        ("id" = i64, Path, description = "Internship id"),
        ("file_type" = String, Path, description = "evidences, survey1, survey2 or survey3")
    ),
    responses(
        (status = 200, description = "Attachment bytes, inline when PDF"),
        (status = 400, description = "Unknown file type"),
        (status = 404, description = "Internship or file not found")
    )
)]
pub async fn get_internship_file(
    State(state): State<AppState>,
    principal: Principal,
    Path((id, file_type)): Path<(i64, String)>,
) -> AppResult<Response> {
    let kind: InternshipFileKind = file_type.parse()?;
    let file = state.internships().file(&principal, id, kind).await?;
    let disposition = Disposition::for_mime(&file.mime_type);
    Ok(file.into_response_with(disposition))
}

#[utoipa::path(
    delete,
    path = "/api/internships/{id}/files/{file_type}",
    tag = "Internships",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(
        ("id" = i64, Path, description = "Internship id"),
        ("file_type" = String, Path, description = "evidences, survey1, survey2 or survey3")
    ),
    responses((status = 200, description = "Attachment removed", body = Internship))
)]
pub async fn delete_internship_file(
    State(state): State<AppState>,
    principal: Principal,
    Path((id, file_type)): Path<(i64, String)>,
) -> AppResult<Json<Internship>> {
    let kind: InternshipFileKind = file_type.parse()?;
    Ok(Json(state.internships().delete_file(&principal, id, kind).await?))
}
