use std::sync::Arc;

use sqlx::SqlitePool;

use crate::authz::{self, Action, PolicyEvaluator, Principal, Resource, Scope, ScopeColumns};
use crate::db::constraints::{translate, Constraints};
use crate::errors::{AppError, AppResult};
use crate::files::{extension_for, validate_upload, StoredFile, Upload};
use crate::managers::{bind_scope, replacement};
use crate::models::student::{DbStudentCv, Student, StudentCreateRequest, StudentUpdateRequest};
use crate::utils::{hash_optional_password, hash_password, required, utc_now};

const SELECT: &str = "SELECT s.id, s.login_id, s.name, s.registration_number, s.batch_id, b.name AS batch_name, \
     s.admin_id, s.cv IS NOT NULL AS has_cv, s.created_at, s.updated_at \
     FROM students s JOIN batches b ON b.id = s.batch_id";
const COLUMNS: ScopeColumns = ScopeColumns::new(Some("s.id"), Some("s.batch_id"));
const CONSTRAINTS: Constraints = Constraints::new(
    &[
        ("login_id", "Login ID already exists"),
        ("registration_number", "Registration number already exists"),
    ],
    "Invalid batch ID",
);
const NOT_FOUND: &str = "Student not found";

#[derive(Clone)]
pub struct StudentManager {
    pool: SqlitePool,
    policy: Arc<dyn PolicyEvaluator>,
}

impl StudentManager {
    pub fn new(pool: SqlitePool, policy: Arc<dyn PolicyEvaluator>) -> Self {
        Self { pool, policy }
    }

    fn authorize(&self, principal: &Principal, action: Action, resource: Resource) -> AppResult<Scope> {
        authz::authorize(self.policy.as_ref(), principal, action, resource)
    }

    pub async fn create(&self, principal: &Principal, req: StudentCreateRequest) -> AppResult<Student> {
        self.authorize(principal, Action::Create, Resource::Student)?;

        let (Some(login_id), Some(password), Some(name), Some(registration_number), Some(batch_id)) = (
            required(req.login_id.as_deref()),
            req.password.as_deref().filter(|p| !p.trim().is_empty()),
            required(req.name.as_deref()),
            required(req.registration_number.as_deref()),
            req.batch_id,
        ) else {
            return Err(AppError::validation(
                "login_id, password, name, registration_number and batch_id are required",
            ));
        };
        let password_hash = hash_password(password)?;

        let now = utc_now();
        let id = sqlx::query(
            "INSERT INTO students (login_id, password_hash, name, registration_number, batch_id, admin_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&login_id)
        .bind(&password_hash)
        .bind(&name)
        .bind(&registration_number)
        .bind(batch_id)
        .bind(principal.subject_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| translate(err, &CONSTRAINTS))?
        .last_insert_rowid();

        tracing::info!(student_id = id, batch_id, "student created");
        self.fetch(id, Scope::All).await
    }

    pub async fn list(&self, principal: &Principal, batch_id: Option<i64>) -> AppResult<Vec<Student>> {
        let scope = self.authorize(principal, Action::List, Resource::Student)?;
        let (predicate, value) = scope.predicate(COLUMNS);
        let sql = format!(
            "{SELECT} WHERE {predicate} AND (? IS NULL OR s.batch_id = ?) ORDER BY s.registration_number, s.id"
        );

        Ok(bind_scope(sqlx::query_as::<_, Student>(&sql), value)
            .bind(batch_id)
            .bind(batch_id)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get(&self, principal: &Principal, id: i64) -> AppResult<Student> {
        let scope = self.authorize(principal, Action::Read, Resource::Student)?;
        self.fetch(id, scope).await
    }

    /// The calling student's own record.
    pub async fn profile(&self, principal: &Principal) -> AppResult<Student> {
        let scope = self.authorize(principal, Action::Read, Resource::StudentProfile)?;
        self.fetch(principal.subject_id, scope).await
    }

    /// Partial update. Admins may change every field; a student may only
    /// change its own password. A missing or blank password keeps the stored hash.
    pub async fn update(&self, principal: &Principal, id: i64, req: StudentUpdateRequest) -> AppResult<Student> {
        let scope = self.authorize(principal, Action::Update, Resource::Student)?;
        if req.touches_identity() {
            self.authorize(principal, Action::Update, Resource::StudentIdentity)?;
        }

        let login_id = replacement(req.login_id.as_deref(), "login_id")?;
        let name = replacement(req.name.as_deref(), "name")?;
        let registration_number = replacement(req.registration_number.as_deref(), "registration_number")?;
        let password_hash = hash_optional_password(req.password.as_deref())?;
        self.fetch(id, scope).await?;

        let result = sqlx::query(
            "UPDATE students SET login_id = COALESCE(?, login_id), password_hash = COALESCE(?, password_hash), \
             name = COALESCE(?, name), registration_number = COALESCE(?, registration_number), \
             batch_id = COALESCE(?, batch_id), updated_at = ? WHERE id = ?",
        )
        .bind(&login_id)
        .bind(&password_hash)
        .bind(&name)
        .bind(&registration_number)
        .bind(req.batch_id)
        .bind(utc_now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| translate(err, &CONSTRAINTS))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(NOT_FOUND));
        }

        tracing::info!(student_id = id, password_changed = password_hash.is_some(), "student updated");
        self.fetch(id, scope).await
    }

    /// Removes the student together with its internship records.
    pub async fn delete(&self, principal: &Principal, id: i64) -> AppResult<Student> {
        let scope = self.authorize(principal, Action::Delete, Resource::Student)?;
        let student = self.fetch(id, scope).await?;

        let result = sqlx::query("DELETE FROM students WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(NOT_FOUND));
        }

        tracing::info!(student_id = id, "student deleted");
        Ok(student)
    }

    /// Replace the stored CV. The previous CV survives any validation failure.
    pub async fn upload_cv(&self, principal: &Principal, id: i64, upload: Option<Upload>) -> AppResult<Student> {
        let scope = self.authorize(principal, Action::Create, Resource::StudentCv)?;
        let upload = upload.ok_or_else(|| AppError::validation("No CV file uploaded"))?;
        validate_upload(&upload)?;
        self.fetch(id, scope).await?;

        sqlx::query("UPDATE students SET cv = ?, cv_mime_type = ?, cv_filename = ?, updated_at = ? WHERE id = ?")
            .bind(&upload.bytes)
            .bind(&upload.mime_type)
            .bind(&upload.file_name)
            .bind(utc_now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::info!(student_id = id, bytes = upload.bytes.len(), mime_type = %upload.mime_type, "cv uploaded");
        self.fetch(id, scope).await
    }

    pub async fn delete_cv(&self, principal: &Principal, id: i64) -> AppResult<Student> {
        let scope = self.authorize(principal, Action::Delete, Resource::StudentCv)?;
        self.fetch(id, scope).await?;

        sqlx::query(
            "UPDATE students SET cv = NULL, cv_mime_type = NULL, cv_filename = NULL, updated_at = ? WHERE id = ?",
        )
        .bind(utc_now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        tracing::info!(student_id = id, "cv removed");
        self.fetch(id, scope).await
    }

    /// Stored CV bytes. Without an original filename the CV is named after the student.
    pub async fn cv(&self, principal: &Principal, id: i64) -> AppResult<StoredFile> {
        let scope = self.authorize(principal, Action::Read, Resource::StudentCv)?;
        let (predicate, value) = scope.predicate(COLUMNS);
        let sql = format!("SELECT s.name, s.cv, s.cv_mime_type, s.cv_filename FROM students s WHERE s.id = ? AND {predicate}");

        let row = bind_scope(sqlx::query_as::<_, DbStudentCv>(&sql).bind(id), value)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

        let bytes = row.cv.ok_or_else(|| AppError::not_found("CV not found for this student"))?;
        let file_name = row.cv_filename.filter(|name| !name.trim().is_empty()).unwrap_or_else(|| {
            let extension = extension_for(row.cv_mime_type.as_deref().unwrap_or_default());
            format!("{}_CV.{}", row.name, extension)
        });

        Ok(StoredFile::new(bytes, row.cv_mime_type, file_name))
    }

    async fn fetch(&self, id: i64, scope: Scope) -> AppResult<Student> {
        let (predicate, value) = scope.predicate(COLUMNS);
        let sql = format!("{SELECT} WHERE s.id = ? AND {predicate}");

        bind_scope(sqlx::query_as::<_, Student>(&sql).bind(id), value)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))
    }
}
