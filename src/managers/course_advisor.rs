use std::sync::Arc;

use sqlx::SqlitePool;

use crate::authz::{self, Action, PolicyEvaluator, Principal, Resource, Scope, ScopeColumns};
use crate::db::constraints::{translate, Constraints};
use crate::errors::{AppError, AppResult};
use crate::managers::{bind_scope, replacement};
use crate::models::course_advisor::{CourseAdvisor, CourseAdvisorCreateRequest, CourseAdvisorUpdateRequest};
use crate::utils::{hash_optional_password, hash_password, required, utc_now};

const SELECT: &str = "SELECT ca.id, ca.login_id, ca.name, ca.batch_id, b.name AS batch_name, ca.admin_id, \
     ca.created_at, ca.updated_at FROM course_advisors ca JOIN batches b ON b.id = ca.batch_id";
const COLUMNS: ScopeColumns = ScopeColumns::new(None, Some("ca.batch_id"));
const CONSTRAINTS: Constraints = Constraints::new(&[("login_id", "Login ID already exists")], "Invalid batch or admin ID");
const NOT_FOUND: &str = "Course advisor not found";

#[derive(Clone)]
pub struct CourseAdvisorManager {
    pool: SqlitePool,
    policy: Arc<dyn PolicyEvaluator>,
}

impl CourseAdvisorManager {
    pub fn new(pool: SqlitePool, policy: Arc<dyn PolicyEvaluator>) -> Self {
        Self { pool, policy }
    }

    fn authorize(&self, principal: &Principal, action: Action) -> AppResult<Scope> {
        authz::authorize(self.policy.as_ref(), principal, action, Resource::CourseAdvisor)
    }

    pub async fn create(&self, principal: &Principal, req: CourseAdvisorCreateRequest) -> AppResult<CourseAdvisor> {
        self.authorize(principal, Action::Create)?;

        let (Some(login_id), Some(password), Some(name), Some(batch_id)) = (
            required(req.login_id.as_deref()),
            req.password.as_deref().filter(|p| !p.trim().is_empty()),
            required(req.name.as_deref()),
            req.batch_id,
        ) else {
            return Err(AppError::validation("login_id, password, name and batch_id are required"));
        };
        let password_hash = hash_password(password)?;

        let now = utc_now();
        let id = sqlx::query(
            "INSERT INTO course_advisors (login_id, password_hash, name, batch_id, admin_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&login_id)
        .bind(&password_hash)
        .bind(&name)
        .bind(batch_id)
        .bind(principal.subject_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| translate(err, &CONSTRAINTS))?
        .last_insert_rowid();

        tracing::info!(course_advisor_id = id, batch_id, "course advisor created");
        self.fetch(id, Scope::All).await
    }

    pub async fn list(&self, principal: &Principal, batch_id: Option<i64>) -> AppResult<Vec<CourseAdvisor>> {
        let scope = self.authorize(principal, Action::List)?;
        let (predicate, value) = scope.predicate(COLUMNS);
        let sql = format!("{SELECT} WHERE {predicate} AND (? IS NULL OR ca.batch_id = ?) ORDER BY ca.name, ca.id");

        Ok(bind_scope(sqlx::query_as::<_, CourseAdvisor>(&sql), value)
            .bind(batch_id)
            .bind(batch_id)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get(&self, principal: &Principal, id: i64) -> AppResult<CourseAdvisor> {
        let scope = self.authorize(principal, Action::Read)?;
        self.fetch(id, scope).await
    }

    /// The calling advisor's own record.
    pub async fn profile(&self, principal: &Principal) -> AppResult<CourseAdvisor> {
        let scope = authz::authorize(self.policy.as_ref(), principal, Action::Read, Resource::CourseAdvisorProfile)?;
        self.fetch(principal.subject_id, scope).await
    }

    /// Partial update; a missing or blank password leaves the stored hash untouched.
    pub async fn update(
        &self,
        principal: &Principal,
        id: i64,
        req: CourseAdvisorUpdateRequest,
    ) -> AppResult<CourseAdvisor> {
        let scope = self.authorize(principal, Action::Update)?;
        let login_id = replacement(req.login_id.as_deref(), "login_id")?;
        let name = replacement(req.name.as_deref(), "name")?;
        let password_hash = hash_optional_password(req.password.as_deref())?;
        self.fetch(id, scope).await?;

        let result = sqlx::query(
            "UPDATE course_advisors SET login_id = COALESCE(?, login_id), password_hash = COALESCE(?, password_hash), \
             name = COALESCE(?, name), batch_id = COALESCE(?, batch_id), updated_at = ? WHERE id = ?",
        )
        .bind(&login_id)
        .bind(&password_hash)
        .bind(&name)
        .bind(req.batch_id)
        .bind(utc_now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| translate(err, &CONSTRAINTS))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(NOT_FOUND));
        }

        tracing::info!(course_advisor_id = id, password_changed = password_hash.is_some(), "course advisor updated");
        self.fetch(id, scope).await
    }

    pub async fn delete(&self, principal: &Principal, id: i64) -> AppResult<CourseAdvisor> {
        let scope = self.authorize(principal, Action::Delete)?;
        let advisor = self.fetch(id, scope).await?;

        let result = sqlx::query("DELETE FROM course_advisors WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(NOT_FOUND));
        }

        tracing::info!(course_advisor_id = id, "course advisor deleted");
        Ok(advisor)
    }

    async fn fetch(&self, id: i64, scope: Scope) -> AppResult<CourseAdvisor> {
        let (predicate, value) = scope.predicate(COLUMNS);
        let sql = format!("{SELECT} WHERE ca.id = ? AND {predicate}");

        bind_scope(sqlx::query_as::<_, CourseAdvisor>(&sql).bind(id), value)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))
    }
}
