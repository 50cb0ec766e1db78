use std::sync::Arc;

use sqlx::SqlitePool;

use crate::authz::{self, Action, PolicyEvaluator, Principal, Resource, Scope, ScopeColumns};
use crate::db::constraints::{translate, translate_delete, Constraints};
use crate::errors::{AppError, AppResult};
use crate::managers::{bind_scope, replacement};
use crate::models::batch::{Batch, BatchCreateRequest, BatchUpdateRequest};
use crate::utils::{required, utc_now};

const SELECT: &str = "SELECT b.id, b.year, b.name, b.department_id, d.name AS department_name, b.created_at, b.updated_at \
     FROM batches b JOIN departments d ON d.id = b.department_id";
const COLUMNS: ScopeColumns = ScopeColumns::new(None, Some("b.id"));
const CONSTRAINTS: Constraints = Constraints::new(&[], "Invalid department ID");
const NOT_FOUND: &str = "Batch not found";

#[derive(Clone)]
pub struct BatchManager {
    pool: SqlitePool,
    policy: Arc<dyn PolicyEvaluator>,
}

fn check_year(year: i64) -> AppResult<i64> {
    if (1900..=9999).contains(&year) {
        Ok(year)
    } else {
        Err(AppError::validation("Batch year must be a four-digit year"))
    }
}

impl BatchManager {
    pub fn new(pool: SqlitePool, policy: Arc<dyn PolicyEvaluator>) -> Self {
        Self { pool, policy }
    }

    fn authorize(&self, principal: &Principal, action: Action) -> AppResult<Scope> {
        authz::authorize(self.policy.as_ref(), principal, action, Resource::Batch)
    }

    pub async fn create(&self, principal: &Principal, req: BatchCreateRequest) -> AppResult<Batch> {
        self.authorize(principal, Action::Create)?;

        let (Some(year), Some(name), Some(department_id)) = (req.year, required(req.name.as_deref()), req.department_id)
        else {
            return Err(AppError::validation("Year, name and department_id are required"));
        };
        let year = check_year(year)?;

        let now = utc_now();
        let id = sqlx::query(
            "INSERT INTO batches (year, name, department_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(year)
        .bind(&name)
        .bind(department_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| translate(err, &CONSTRAINTS))?
        .last_insert_rowid();

        tracing::info!(batch_id = id, department_id, "batch created");
        self.fetch(id, Scope::All).await
    }

    /// Batches ordered newest year first, optionally restricted to one department.
    pub async fn list(&self, principal: &Principal, department_id: Option<i64>) -> AppResult<Vec<Batch>> {
        let scope = self.authorize(principal, Action::List)?;
        let (predicate, value) = scope.predicate(COLUMNS);
        let sql = format!(
            "{SELECT} WHERE {predicate} AND (? IS NULL OR b.department_id = ?) ORDER BY b.year DESC, b.name, b.id"
        );

        Ok(bind_scope(sqlx::query_as::<_, Batch>(&sql), value)
            .bind(department_id)
            .bind(department_id)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get(&self, principal: &Principal, id: i64) -> AppResult<Batch> {
        let scope = self.authorize(principal, Action::Read)?;
        self.fetch(id, scope).await
    }

    pub async fn update(&self, principal: &Principal, id: i64, req: BatchUpdateRequest) -> AppResult<Batch> {
        let scope = self.authorize(principal, Action::Update)?;
        let name = replacement(req.name.as_deref(), "Batch name")?;
        let year = req.year.map(check_year).transpose()?;
        self.fetch(id, scope).await?;

        let result = sqlx::query(
            "UPDATE batches SET year = COALESCE(?, year), name = COALESCE(?, name), \
             department_id = COALESCE(?, department_id), updated_at = ? WHERE id = ?",
        )
        .bind(year)
        .bind(&name)
        .bind(req.department_id)
        .bind(utc_now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| translate(err, &CONSTRAINTS))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(NOT_FOUND));
        }

        tracing::info!(batch_id = id, "batch updated");
        self.fetch(id, scope).await
    }

    /// Fails with CONFLICT while students or course advisors still belong to the batch.
    pub async fn delete(&self, principal: &Principal, id: i64) -> AppResult<Batch> {
        let scope = self.authorize(principal, Action::Delete)?;
        let batch = self.fetch(id, scope).await?;

        let result = sqlx::query("DELETE FROM batches WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| translate_delete(err, "Batch still has students or course advisors"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(NOT_FOUND));
        }

        tracing::info!(batch_id = id, "batch deleted");
        Ok(batch)
    }

    async fn fetch(&self, id: i64, scope: Scope) -> AppResult<Batch> {
        let (predicate, value) = scope.predicate(COLUMNS);
        let sql = format!("{SELECT} WHERE b.id = ? AND {predicate}");

        bind_scope(sqlx::query_as::<_, Batch>(&sql).bind(id), value)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_must_be_four_digits() {
        assert_eq!(check_year(2024).unwrap(), 2024);
        assert!(check_year(24).is_err());
        assert!(check_year(20245).is_err());
    }
}
