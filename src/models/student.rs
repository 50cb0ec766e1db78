use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Student as returned by the API.
///
/// Neither the password hash nor the CV bytes are part of this type; CV
/// presence is reported through `has_cv`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: i64,
    pub login_id: String,
    pub name: String,
    pub registration_number: String,
    pub batch_id: i64,
    pub batch_name: String,
    pub admin_id: i64,
    pub has_cv: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StudentCreateRequest {
    #[schema(example = "2024mcs001")]
    pub login_id: Option<String>,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: Option<String>,
    #[schema(example = "Nimal Silva")]
    pub name: Option<String>,
    #[schema(example = "2024/MCS/001")]
    pub registration_number: Option<String>,
    #[schema(example = 1)]
    pub batch_id: Option<i64>,
}

/// Partial update. Students may only send `password`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StudentUpdateRequest {
    pub login_id: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub registration_number: Option<String>,
    pub batch_id: Option<i64>,
}

impl StudentUpdateRequest {
    pub fn touches_identity(&self) -> bool {
        self.login_id.is_some() || self.name.is_some() || self.registration_number.is_some() || self.batch_id.is_some()
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentListQuery {
    pub batch_id: Option<i64>,
}

/// CV bytes as stored, for the download/open endpoints.
#[derive(Debug, Clone, FromRow)]
pub struct DbStudentCv {
    pub name: String,
    pub cv: Option<Vec<u8>>,
    pub cv_mime_type: Option<String>,
    pub cv_filename: Option<String>,
}
