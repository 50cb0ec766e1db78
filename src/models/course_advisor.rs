use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Course advisor as returned by the API. The password hash is not part of this type.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CourseAdvisor {
    pub id: i64,
    pub login_id: String,
    pub name: String,
    pub batch_id: i64,
    pub batch_name: String,
    pub admin_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CourseAdvisorCreateRequest {
    #[schema(example = "advisor01")]
    pub login_id: Option<String>,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: Option<String>,
    #[schema(example = "Dr. Perera")]
    pub name: Option<String>,
    #[schema(example = 1)]
    pub batch_id: Option<i64>,
}

/// Partial update; a missing or blank password keeps the stored one.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CourseAdvisorUpdateRequest {
    pub login_id: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub batch_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseAdvisorListQuery {
    pub batch_id: Option<i64>,
}
