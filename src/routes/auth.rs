use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::authz::{Principal, Role};
use crate::db::constraints::{translate, Constraints};
use crate::errors::{AppError, AppResult};
use crate::extract::Json;
use crate::models::admin::{Admin, AdminSignupRequest, AdminSignupResponse, AuthResponse, LoginRequest, StoredCredential};
use crate::utils::{hash_password, required, utc_now, verify_password, verify_unknown_login};

const ADMIN_CONSTRAINTS: Constraints = Constraints::new(&[("login_id", "Login ID already exists")], "Invalid reference");

/// The one message for every failed login, whatever the cause.
const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    message: String,
}

#[utoipa::path(
    post,
    path = "/api/signup/admin",
    tag = "Auth",
    request_body = AdminSignupRequest,
    responses(
        (status = 201, description = "Admin registered", body = AdminSignupResponse),
        (status = 400, description = "Missing fields or weak password"),
        (status = 409, description = "Login ID already exists")
    )
)]
pub async fn signup_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<AdminSignupRequest>,
) -> AppResult<(StatusCode, CookieJar, Json<AdminSignupResponse>)> {
    let (Some(login_id), Some(password)) = (
        required(payload.login_id.as_deref()),
        payload.password.as_deref().filter(|p| !p.trim().is_empty()),
    ) else {
        return Err(AppError::validation("login_id and password are required"));
    };

    let password_hash = hash_password(password)?;
    let now = utc_now();

    let admin_id = sqlx::query("INSERT INTO admins (login_id, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?)")
        .bind(&login_id)
        .bind(&password_hash)
        .bind(now)
        .bind(now)
        .execute(&state.pool)
        .await
        .map_err(|err| translate(err, &ADMIN_CONSTRAINTS))?
        .last_insert_rowid();

    let admin = sqlx::query_as::<_, Admin>("SELECT id, login_id, created_at FROM admins WHERE id = ?")
        .bind(admin_id)
        .fetch_one(&state.pool)
        .await?;

    let token = state.jwt.issue(&Principal::admin(admin.id))?;
    tracing::info!(admin_id = admin.id, "admin registered");

    let jar = jar.add(state.jwt.session_cookie(token.clone()));
    Ok((StatusCode::CREATED, jar, Json(AdminSignupResponse { token, admin })))
}

#[utoipa::path(
    post,
    path = "/api/admin/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; token also set as HTTP-only cookie", body = AuthResponse),
        (status = 400, description = "Invalid credentials")
    )
)]
pub async fn admin_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    login(&state, jar, payload, Role::Admin).await
}

#[utoipa::path(
    post,
    path = "/api/student/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; token also set as HTTP-only cookie", body = AuthResponse),
        (status = 400, description = "Invalid credentials")
    )
)]
pub async fn student_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    login(&state, jar, payload, Role::Student).await
}

#[utoipa::path(
    post,
    path = "/api/advisor/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; token also set as HTTP-only cookie", body = AuthResponse),
        (status = 400, description = "Invalid credentials")
    )
)]
pub async fn advisor_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    login(&state, jar, payload, Role::CourseAdvisor).await
}

#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "Auth",
    responses((status = 200, description = "Session cookie cleared", body = MessageResponse))
)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.remove(state.jwt.cleared_cookie());
    (
        jar,
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
}

fn credential_query(role: Role) -> &'static str {
    match role {
        Role::Admin => "SELECT id, password_hash, NULL AS batch_id FROM admins WHERE login_id = ?",
        Role::Student => "SELECT id, password_hash, batch_id FROM students WHERE login_id = ?",
        Role::CourseAdvisor => "SELECT id, password_hash, batch_id FROM course_advisors WHERE login_id = ?",
    }
}

fn principal_for(role: Role, credential: &StoredCredential) -> AppResult<Principal> {
    match (role, credential.batch_id) {
        (Role::Admin, _) => Ok(Principal::admin(credential.id)),
        (Role::Student, Some(batch_id)) => Ok(Principal::student(credential.id, batch_id)),
        (Role::CourseAdvisor, Some(batch_id)) => Ok(Principal::course_advisor(credential.id, batch_id)),
        _ => Err(AppError::internal(format!("{} {} has no batch", role.as_str(), credential.id))),
    }
}

/// Unknown login id and wrong password are indistinguishable to the caller.
async fn login(
    state: &AppState,
    jar: CookieJar,
    payload: LoginRequest,
    role: Role,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let (Some(login_id), Some(password)) = (required(payload.login_id.as_deref()), payload.password) else {
        return Err(AppError::validation("login_id and password are required"));
    };

    let credential = sqlx::query_as::<_, StoredCredential>(credential_query(role))
        .bind(&login_id)
        .fetch_optional(&state.pool)
        .await?;

    let Some(credential) = credential else {
        verify_unknown_login(&password)?;
        tracing::info!(role = role.as_str(), "login failed: unknown login id");
        return Err(AppError::validation(INVALID_CREDENTIALS));
    };

    if !verify_password(&password, &credential.password_hash)? {
        tracing::info!(role = role.as_str(), subject_id = credential.id, "login failed: wrong password");
        return Err(AppError::validation(INVALID_CREDENTIALS));
    }

    let principal = principal_for(role, &credential)?;
    let token = state.jwt.issue(&principal)?;
    tracing::info!(role = role.as_str(), subject_id = principal.subject_id, "login succeeded");

    let jar = jar.add(state.jwt.session_cookie(token.clone()));
    Ok((jar, Json(AuthResponse { token, role })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn student_and_advisor_tokens_carry_the_batch() {
        let credential = StoredCredential {
            id: 3,
            password_hash: String::new(),
            batch_id: Some(9),
        };
        assert_eq!(principal_for(Role::Student, &credential).unwrap(), Principal::student(3, 9));
        assert_eq!(principal_for(Role::CourseAdvisor, &credential).unwrap(), Principal::course_advisor(3, 9));

        let orphan = StoredCredential {
            batch_id: None,
            ..credential
        };
        assert!(principal_for(Role::Student, &orphan).is_err());
        assert_eq!(principal_for(Role::Admin, &orphan).unwrap(), Principal::admin(3));
    }
}
