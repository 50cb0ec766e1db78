use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Batch {
    pub id: i64,
    pub year: i64,
    pub name: String,
    pub department_id: i64,
    pub department_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BatchCreateRequest {
    #[schema(example = 2024)]
    pub year: Option<i64>,
    #[schema(example = "MCS 2024")]
    pub name: Option<String>,
    #[schema(example = 1)]
    pub department_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BatchUpdateRequest {
    #[schema(example = 2025)]
    pub year: Option<i64>,
    #[schema(example = "MCS 2025")]
    pub name: Option<String>,
    #[schema(example = 1)]
    pub department_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BatchListQuery {
    pub department_id: Option<i64>,
}
