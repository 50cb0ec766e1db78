use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::authz::Role;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Admin {
    pub id: i64,
    pub login_id: String,
    pub created_at: DateTime<Utc>,
}

/// Stored credential of any of the three login tables.
///
/// Never serialized; only the login flow reads it.
#[derive(Debug, Clone, FromRow)]
pub struct StoredCredential {
    pub id: i64,
    pub password_hash: String,
    pub batch_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "admin01")]
    pub login_id: Option<String>,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AdminSignupRequest {
    #[schema(example = "admin01")]
    pub login_id: Option<String>,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminSignupResponse {
    pub token: String,
    pub admin: Admin,
}
