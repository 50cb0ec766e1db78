use std::collections::HashMap;
use std::sync::Arc;

use sqlx::SqlitePool;

use crate::authz::{self, Action, PolicyEvaluator, Principal, Resource, Scope, ScopeColumns};
use crate::db::constraints::{translate, Constraints};
use crate::errors::{AppError, AppResult};
use crate::files::{extension_for, validate_upload, InternshipFileKind, StoredFile, Upload};
use crate::managers::bind_scope;
use crate::models::internship::{Internship, InternshipInput, StudentWithoutInternship};
use crate::utils::{required, utc_now};

const SELECT: &str = "SELECT i.id, i.student_id, s.name AS student_name, s.registration_number, s.batch_id, \
     b.name AS batch_name, b.year AS batch_year, i.internship_type, i.reporting_officer_name, i.organization, \
     i.contact, i.email, i.website, i.duration, i.year_of_completion, \
     i.evidences IS NOT NULL AS has_evidences, i.survey1 IS NOT NULL AS has_survey1, \
     i.survey2 IS NOT NULL AS has_survey2, i.survey3 IS NOT NULL AS has_survey3, i.created_at, i.updated_at \
     FROM internships i JOIN students s ON s.id = i.student_id JOIN batches b ON b.id = s.batch_id";
const COLUMNS: ScopeColumns = ScopeColumns::new(Some("i.student_id"), Some("s.batch_id"));
const COVERAGE_COLUMNS: ScopeColumns = ScopeColumns::new(Some("s.id"), Some("s.batch_id"));
const CONSTRAINTS: Constraints = Constraints::new(&[], "Invalid student ID");
const NOT_FOUND: &str = "Internship not found";

/// Attachments submitted with a create or update, keyed by slot.
pub type Attachments = HashMap<InternshipFileKind, Upload>;

#[derive(Debug, PartialEq, Eq)]
struct ValidInternship {
    internship_type: String,
    reporting_officer_name: Option<String>,
    organization: String,
    contact: Option<String>,
    email: Option<String>,
    website: Option<String>,
    duration: String,
    year_of_completion: i64,
}

fn parse_year(value: &str) -> AppResult<i64> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|year| (1900..=9999).contains(year))
        .ok_or_else(|| AppError::validation("year_of_completion must be a four-digit year"))
}

impl ValidInternship {
    fn from_input(input: &InternshipInput) -> AppResult<Self> {
        let (Some(internship_type), Some(organization), Some(duration), Some(year)) = (
            required(input.internship_type.as_deref()),
            required(input.organization.as_deref()),
            required(input.duration.as_deref()),
            required(input.year_of_completion.as_deref()),
        ) else {
            return Err(AppError::validation(
                "internship_type, organization, duration and year_of_completion are required",
            ));
        };

        Ok(Self {
            internship_type,
            reporting_officer_name: required(input.reporting_officer_name.as_deref()),
            organization,
            contact: required(input.contact.as_deref()),
            email: required(input.email.as_deref()),
            website: required(input.website.as_deref()),
            duration,
            year_of_completion: parse_year(&year)?,
        })
    }
}

fn validate_attachments(attachments: &Attachments) -> AppResult<()> {
    attachments.values().try_for_each(validate_upload)
}

#[derive(Clone)]
pub struct InternshipManager {
    pool: SqlitePool,
    policy: Arc<dyn PolicyEvaluator>,
}

impl InternshipManager {
    pub fn new(pool: SqlitePool, policy: Arc<dyn PolicyEvaluator>) -> Self {
        Self { pool, policy }
    }

    fn authorize(&self, principal: &Principal, action: Action, resource: Resource) -> AppResult<Scope> {
        authz::authorize(self.policy.as_ref(), principal, action, resource)
    }

    /// Create a record owned by the calling student.
    pub async fn create(
        &self,
        principal: &Principal,
        input: InternshipInput,
        attachments: Attachments,
    ) -> AppResult<Internship> {
        let Scope::Student(student_id) = self.authorize(principal, Action::Create, Resource::Internship)? else {
            return Err(AppError::forbidden("Forbidden: insufficient rights"));
        };
        let valid = ValidInternship::from_input(&input)?;
        validate_attachments(&attachments)?;

        let slot = |kind: InternshipFileKind| attachments.get(&kind);
        let now = utc_now();
        let id = sqlx::query(
            "INSERT INTO internships (student_id, internship_type, reporting_officer_name, organization, contact, email, \
             website, duration, year_of_completion, evidences, evidences_mime_type, survey1, survey1_mime_type, \
             survey2, survey2_mime_type, survey3, survey3_mime_type, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(student_id)
        .bind(&valid.internship_type)
        .bind(&valid.reporting_officer_name)
        .bind(&valid.organization)
        .bind(&valid.contact)
        .bind(&valid.email)
        .bind(&valid.website)
        .bind(&valid.duration)
        .bind(valid.year_of_completion)
        .bind(slot(InternshipFileKind::Evidences).map(|u| u.bytes.as_slice()))
        .bind(slot(InternshipFileKind::Evidences).map(|u| u.mime_type.as_str()))
        .bind(slot(InternshipFileKind::Survey1).map(|u| u.bytes.as_slice()))
        .bind(slot(InternshipFileKind::Survey1).map(|u| u.mime_type.as_str()))
        .bind(slot(InternshipFileKind::Survey2).map(|u| u.bytes.as_slice()))
        .bind(slot(InternshipFileKind::Survey2).map(|u| u.mime_type.as_str()))
        .bind(slot(InternshipFileKind::Survey3).map(|u| u.bytes.as_slice()))
        .bind(slot(InternshipFileKind::Survey3).map(|u| u.mime_type.as_str()))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| translate(err, &CONSTRAINTS))?
        .last_insert_rowid();

        tracing::info!(internship_id = id, student_id, attachments = attachments.len(), "internship created");
        self.fetch(id, Scope::All).await
    }

    /// Records visible to the caller, most recent completion year first.
    pub async fn list(&self, principal: &Principal, batch_id: Option<i64>) -> AppResult<Vec<Internship>> {
        let scope = self.authorize(principal, Action::List, Resource::Internship)?;
        let (predicate, value) = scope.predicate(COLUMNS);
        let sql = format!(
            "{SELECT} WHERE {predicate} AND (? IS NULL OR s.batch_id = ?) ORDER BY i.year_of_completion DESC, i.id DESC"
        );

        Ok(bind_scope(sqlx::query_as::<_, Internship>(&sql), value)
            .bind(batch_id)
            .bind(batch_id)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get(&self, principal: &Principal, id: i64) -> AppResult<Internship> {
        let scope = self.authorize(principal, Action::Read, Resource::Internship)?;
        self.fetch(id, scope).await
    }

    /// Partial update. Blank or missing text fields keep their value; a submitted
    /// attachment replaces its slot, the other slots are left alone.
    pub async fn update(
        &self,
        principal: &Principal,
        id: i64,
        input: InternshipInput,
        attachments: Attachments,
    ) -> AppResult<Internship> {
        let scope = self.authorize(principal, Action::Update, Resource::Internship)?;
        let year = required(input.year_of_completion.as_deref()).map(|y| parse_year(&y)).transpose()?;
        validate_attachments(&attachments)?;
        self.fetch(id, scope).await?;

        let slot = |kind: InternshipFileKind| attachments.get(&kind);
        let result = sqlx::query(
            "UPDATE internships SET internship_type = COALESCE(?, internship_type), \
             reporting_officer_name = COALESCE(?, reporting_officer_name), organization = COALESCE(?, organization), \
             contact = COALESCE(?, contact), email = COALESCE(?, email), website = COALESCE(?, website), \
             duration = COALESCE(?, duration), year_of_completion = COALESCE(?, year_of_completion), \
             evidences = COALESCE(?, evidences), evidences_mime_type = COALESCE(?, evidences_mime_type), \
             survey1 = COALESCE(?, survey1), survey1_mime_type = COALESCE(?, survey1_mime_type), \
             survey2 = COALESCE(?, survey2), survey2_mime_type = COALESCE(?, survey2_mime_type), \
             survey3 = COALESCE(?, survey3), survey3_mime_type = COALESCE(?, survey3_mime_type), \
             updated_at = ? WHERE id = ?",
        )
        .bind(required(input.internship_type.as_deref()))
        .bind(required(input.reporting_officer_name.as_deref()))
        .bind(required(input.organization.as_deref()))
        .bind(required(input.contact.as_deref()))
        .bind(required(input.email.as_deref()))
        .bind(required(input.website.as_deref()))
        .bind(required(input.duration.as_deref()))
        .bind(year)
        .bind(slot(InternshipFileKind::Evidences).map(|u| u.bytes.as_slice()))
        .bind(slot(InternshipFileKind::Evidences).map(|u| u.mime_type.as_str()))
        .bind(slot(InternshipFileKind::Survey1).map(|u| u.bytes.as_slice()))
        .bind(slot(InternshipFileKind::Survey1).map(|u| u.mime_type.as_str()))
        .bind(slot(InternshipFileKind::Survey2).map(|u| u.bytes.as_slice()))
        .bind(slot(InternshipFileKind::Survey2).map(|u| u.mime_type.as_str()))
        .bind(slot(InternshipFileKind::Survey3).map(|u| u.bytes.as_slice()))
        .bind(slot(InternshipFileKind::Survey3).map(|u| u.mime_type.as_str()))
        .bind(utc_now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(NOT_FOUND));
        }

        tracing::info!(internship_id = id, attachments = attachments.len(), "internship updated");
        self.fetch(id, scope).await
    }

    pub async fn delete(&self, principal: &Principal, id: i64) -> AppResult<Internship> {
        let scope = self.authorize(principal, Action::Delete, Resource::Internship)?;
        let internship = self.fetch(id, scope).await?;

        let result = sqlx::query("DELETE FROM internships WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(NOT_FOUND));
        }

        tracing::info!(internship_id = id, "internship deleted");
        Ok(internship)
    }

    /// One attachment slot of a visible record.
    pub async fn file(&self, principal: &Principal, id: i64, kind: InternshipFileKind) -> AppResult<StoredFile> {
        let scope = self.authorize(principal, Action::Read, Resource::InternshipFile)?;
        let (predicate, value) = scope.predicate(COLUMNS);
        let sql = format!(
            "SELECT i.{}, i.{}, s.name FROM internships i JOIN students s ON s.id = i.student_id \
             WHERE i.id = ? AND {predicate}",
            kind.column(),
            kind.mime_column(),
        );

        let (bytes, mime_type, student_name) =
            bind_scope(sqlx::query_as::<_, (Option<Vec<u8>>, Option<String>, String)>(&sql).bind(id), value)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

        let bytes = bytes.ok_or_else(|| AppError::not_found("File not found"))?;
        let extension = extension_for(mime_type.as_deref().unwrap_or_default());
        let file_name = format!("{student_name}_{kind}.{extension}");

        Ok(StoredFile::new(bytes, mime_type, file_name))
    }

    /// Clear one attachment slot; the record itself stays.
    pub async fn delete_file(&self, principal: &Principal, id: i64, kind: InternshipFileKind) -> AppResult<Internship> {
        let scope = self.authorize(principal, Action::Delete, Resource::InternshipFile)?;
        self.fetch(id, scope).await?;

        let sql = format!(
            "UPDATE internships SET {} = NULL, {} = NULL, updated_at = ? WHERE id = ?",
            kind.column(),
            kind.mime_column()
        );
        sqlx::query(&sql).bind(utc_now()).bind(id).execute(&self.pool).await?;

        tracing::info!(internship_id = id, file = %kind, "internship file removed");
        self.fetch(id, scope).await
    }

    /// Students with no internship record, optionally limited to one batch.
    ///
    /// The scope applies on top of the filter, so an advisor asking for a
    /// foreign batch gets an empty list.
    pub async fn students_without_internship(
        &self,
        principal: &Principal,
        batch_id: Option<i64>,
    ) -> AppResult<Vec<StudentWithoutInternship>> {
        let scope = self.authorize(principal, Action::List, Resource::InternshipCoverage)?;
        let (predicate, value) = scope.predicate(COVERAGE_COLUMNS);
        let sql = format!(
            "SELECT s.id AS student_id, s.name, s.registration_number, s.batch_id, b.name AS batch_name, \
             b.year AS batch_year FROM students s JOIN batches b ON b.id = s.batch_id \
             WHERE NOT EXISTS (SELECT 1 FROM internships i WHERE i.student_id = s.id) \
             AND {predicate} AND (? IS NULL OR s.batch_id = ?) ORDER BY s.registration_number, s.id"
        );

        Ok(bind_scope(sqlx::query_as::<_, StudentWithoutInternship>(&sql), value)
            .bind(batch_id)
            .bind(batch_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn fetch(&self, id: i64, scope: Scope) -> AppResult<Internship> {
        let (predicate, value) = scope.predicate(COLUMNS);
        let sql = format!("{SELECT} WHERE i.id = ? AND {predicate}");

        bind_scope(sqlx::query_as::<_, Internship>(&sql).bind(id), value)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> InternshipInput {
        InternshipInput {
            internship_type: Some("Industrial".to_string()),
            organization: Some(" Acme ".to_string()),
            duration: Some("6 months".to_string()),
            year_of_completion: Some("2024".to_string()),
            contact: Some("   ".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn required_fields_are_trimmed_and_blank_optionals_dropped() {
        let valid = ValidInternship::from_input(&input()).unwrap();
        assert_eq!(valid.organization, "Acme");
        assert_eq!(valid.year_of_completion, 2024);
        assert_eq!(valid.contact, None);
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let mut missing = input();
        missing.duration = None;
        assert!(matches!(ValidInternship::from_input(&missing), Err(AppError::Validation(_))));
    }

    #[test]
    fn year_must_be_numeric() {
        let mut bad = input();
        bad.year_of_completion = Some("last year".to_string());
        assert!(ValidInternship::from_input(&bad).is_err());
        assert_eq!(parse_year(" 2023 ").unwrap(), 2023);
    }
}
