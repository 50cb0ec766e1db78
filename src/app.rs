use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{DefaultPolicy, PolicyEvaluator};
use crate::errors::AppError;
use crate::files::MAX_ATTACHMENT_BYTES;
use crate::jwt::JwtConfig;
use crate::managers::{BatchManager, CourseAdvisorManager, DepartmentManager, InternshipManager, StudentManager};
use crate::routes::{auth, batches, course_advisors, departments, health, internships, students};

/// Room for all four internship attachments at their ceiling plus the text fields.
const BODY_LIMIT_BYTES: usize = 4 * MAX_ATTACHMENT_BYTES + 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub policy: Arc<dyn PolicyEvaluator>,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig) -> Self {
        Self::with_policy(pool, jwt, Arc::new(DefaultPolicy::new()))
    }

    pub fn with_policy(pool: SqlitePool, jwt: JwtConfig, policy: Arc<dyn PolicyEvaluator>) -> Self {
        Self {
            pool,
            jwt: Arc::new(jwt),
            policy,
        }
    }

    pub fn departments(&self) -> DepartmentManager {
        DepartmentManager::new(self.pool.clone(), Arc::clone(&self.policy))
    }

    pub fn batches(&self) -> BatchManager {
        BatchManager::new(self.pool.clone(), Arc::clone(&self.policy))
    }

    pub fn course_advisors(&self) -> CourseAdvisorManager {
        CourseAdvisorManager::new(self.pool.clone(), Arc::clone(&self.policy))
    }

    pub fn students(&self) -> StudentManager {
        StudentManager::new(self.pool.clone(), Arc::clone(&self.policy))
    }

    pub fn internships(&self) -> InternshipManager {
        InternshipManager::new(self.pool.clone(), Arc::clone(&self.policy))
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let state = AppState::new(pool, jwt_config);
    let cors = cors_from_env()?;

    Ok(build_router(state, cors))
}

/// `CORS_ALLOWED_ORIGINS` switches from "any origin, no credentials" to an
/// explicit list that may send the session cookie.
fn cors_from_env() -> Result<CorsLayer, AppError> {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS];

    let origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
        Ok(value) if !value.trim().is_empty() => value,
        _ => {
            return Ok(CorsLayer::new().allow_methods(methods).allow_origin(Any).allow_headers(Any));
        }
    };

    let origins = origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| AppError::configuration(format!("invalid CORS origin: {origin}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_methods(methods)
        .allow_origin(origins)
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true))
}

pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let auth_routes = Router::new()
        .route("/signup/admin", post(auth::signup_admin))
        .route("/admin/login", post(auth::admin_login))
        .route("/student/login", post(auth::student_login))
        .route("/advisor/login", post(auth::advisor_login))
        .route("/logout", post(auth::logout));

    let department_routes = Router::new()
        .route("/", get(departments::list_departments).post(departments::create_department))
        .route(
            "/:id",
            get(departments::get_department)
                .put(departments::update_department)
                .delete(departments::delete_department),
        );

    let batch_routes = Router::new()
        .route("/", get(batches::list_batches).post(batches::create_batch))
        .route(
            "/:id",
            get(batches::get_batch).put(batches::update_batch).delete(batches::delete_batch),
        );

    let advisor_routes = Router::new()
        .route("/me", get(course_advisors::my_profile))
        .route(
            "/",
            get(course_advisors::list_course_advisors).post(course_advisors::create_course_advisor),
        )
        .route(
            "/:id",
            get(course_advisors::get_course_advisor)
                .put(course_advisors::update_course_advisor)
                .delete(course_advisors::delete_course_advisor),
        );

    let student_routes = Router::new()
        .route("/me", get(students::my_profile))
        .route("/", get(students::list_students).post(students::create_student))
        .route(
            "/:id",
            get(students::get_student).put(students::update_student).delete(students::delete_student),
        )
        .route("/:id/cv", post(students::upload_cv).delete(students::delete_cv))
        .route("/:id/cv/download", get(students::download_cv))
        .route("/:id/cv/open", get(students::open_cv));

    let internship_routes = Router::new()
        .route("/", get(internships::list_internships).post(internships::create_internship))
        .route("/no-internship", get(internships::students_without_internship))
        .route(
            "/:id",
            get(internships::get_internship)
                .put(internships::update_internship)
                .delete(internships::delete_internship),
        )
        .route(
            "/:id/files/:file_type",
            get(internships::get_internship_file).delete(internships::delete_internship_file),
        );

    let api = Router::new()
        .route("/health", get(health::health))
        .merge(auth_routes)
        .nest("/departments", department_routes)
        .nest("/batches", batch_routes)
        .nest("/course-advisors", advisor_routes)
        .nest("/students", student_routes)
        .nest("/internships", internship_routes);

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
