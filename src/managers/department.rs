use std::sync::Arc;

use sqlx::SqlitePool;

use crate::authz::{self, Action, PolicyEvaluator, Principal, Resource, Scope, ScopeColumns};
use crate::db::constraints::{translate, translate_delete, Constraints};
use crate::errors::{AppError, AppResult};
use crate::managers::{bind_scope, replacement};
use crate::models::department::{Department, DepartmentCreateRequest, DepartmentUpdateRequest};
use crate::utils::{required, utc_now};

const SELECT: &str = "SELECT d.id, d.name, d.admin_id, d.created_at, d.updated_at FROM departments d";
const COLUMNS: ScopeColumns = ScopeColumns::new(None, None);
const CONSTRAINTS: Constraints = Constraints::new(&[], "Invalid admin ID");
const NOT_FOUND: &str = "Department not found";

#[derive(Clone)]
pub struct DepartmentManager {
    pool: SqlitePool,
    policy: Arc<dyn PolicyEvaluator>,
}

impl DepartmentManager {
    pub fn new(pool: SqlitePool, policy: Arc<dyn PolicyEvaluator>) -> Self {
        Self { pool, policy }
    }

    fn authorize(&self, principal: &Principal, action: Action) -> AppResult<Scope> {
        authz::authorize(self.policy.as_ref(), principal, action, Resource::Department)
    }

    pub async fn create(&self, principal: &Principal, req: DepartmentCreateRequest) -> AppResult<Department> {
        self.authorize(principal, Action::Create)?;
        let name = required(req.name.as_deref()).ok_or_else(|| AppError::validation("Department name is required"))?;

        let now = utc_now();
        let id = sqlx::query("INSERT INTO departments (name, admin_id, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(&name)
            .bind(principal.subject_id)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|err| translate(err, &CONSTRAINTS))?
            .last_insert_rowid();

        tracing::info!(department_id = id, admin_id = principal.subject_id, "department created");
        self.fetch(id, Scope::All).await
    }

    pub async fn list(&self, principal: &Principal) -> AppResult<Vec<Department>> {
        let scope = self.authorize(principal, Action::List)?;
        let (predicate, value) = scope.predicate(COLUMNS);
        let sql = format!("{SELECT} WHERE {predicate} ORDER BY d.name, d.id");

        Ok(bind_scope(sqlx::query_as::<_, Department>(&sql), value)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get(&self, principal: &Principal, id: i64) -> AppResult<Department> {
        let scope = self.authorize(principal, Action::Read)?;
        self.fetch(id, scope).await
    }

    pub async fn update(&self, principal: &Principal, id: i64, req: DepartmentUpdateRequest) -> AppResult<Department> {
        let scope = self.authorize(principal, Action::Update)?;
        let name = replacement(req.name.as_deref(), "Department name")?;
        self.fetch(id, scope).await?;

        let result = sqlx::query("UPDATE departments SET name = COALESCE(?, name), updated_at = ? WHERE id = ?")
            .bind(&name)
            .bind(utc_now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| translate(err, &CONSTRAINTS))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(NOT_FOUND));
        }

        tracing::info!(department_id = id, "department updated");
        self.fetch(id, scope).await
    }

    /// Fails with CONFLICT while batches still reference the department.
    pub async fn delete(&self, principal: &Principal, id: i64) -> AppResult<Department> {
        let scope = self.authorize(principal, Action::Delete)?;
        let department = self.fetch(id, scope).await?;

        let result = sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| translate_delete(err, "Department still has batches"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(NOT_FOUND));
        }

        tracing::info!(department_id = id, "department deleted");
        Ok(department)
    }

    async fn fetch(&self, id: i64, scope: Scope) -> AppResult<Department> {
        let (predicate, value) = scope.predicate(COLUMNS);
        let sql = format!("{SELECT} WHERE d.id = ? AND {predicate}");

        bind_scope(sqlx::query_as::<_, Department>(&sql).bind(id), value)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))
    }
}
