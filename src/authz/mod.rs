//! Authorization module - role policy and visibility scopes
//!
//! Every manager operation asks the policy for a [`Decision`] before touching
//! storage. An allow carries a [`Scope`] that is rendered into the WHERE clause
//! of the query, so rows outside the caller's reach simply do not exist for it.

mod evaluator;
mod principal;

pub use evaluator::{Decision, DefaultPolicy, PolicyEvaluator};
pub use principal::{Principal, Role};

use crate::errors::{AppError, AppResult};

/// What the caller is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    List,
    Read,
    Update,
    Delete,
}

/// What the caller is trying to do it to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Department,
    Batch,
    CourseAdvisor,
    Student,
    Internship,
    /// The students-without-internship report.
    InternshipCoverage,
    StudentCv,
    InternshipFile,
    /// The caller's own student record (`/students/me`).
    StudentProfile,
    /// The caller's own advisor record (`/course-advisors/me`).
    CourseAdvisorProfile,
    /// Login id, name, registration number and batch of a student.
    StudentIdentity,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Department => "department",
            Resource::Batch => "batch",
            Resource::CourseAdvisor => "course_advisor",
            Resource::Student => "student",
            Resource::Internship => "internship",
            Resource::InternshipCoverage => "internship_coverage",
            Resource::StudentCv => "student_cv",
            Resource::InternshipFile => "internship_file",
            Resource::StudentProfile => "student_profile",
            Resource::CourseAdvisorProfile => "course_advisor_profile",
            Resource::StudentIdentity => "student_identity",
        }
    }
}

/// Visibility granted by an allow decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    /// Rows belonging to students (or advisors) of this batch.
    Batch(i64),
    /// Rows owned by this student.
    Student(i64),
}

/// Column names a query exposes for scope filtering.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeColumns {
    pub student: Option<&'static str>,
    pub batch: Option<&'static str>,
}

impl ScopeColumns {
    pub const fn new(student: Option<&'static str>, batch: Option<&'static str>) -> Self {
        Self { student, batch }
    }
}

impl Scope {
    /// SQL predicate plus its single bind value.
    ///
    /// A scope that needs a column the query does not expose renders to a
    /// predicate that matches nothing.
    pub fn predicate(&self, columns: ScopeColumns) -> (String, Option<i64>) {
        match self {
            Scope::All => ("1 = 1".to_string(), None),
            Scope::Batch(batch_id) => match columns.batch {
                Some(col) => (format!("{col} = ?"), Some(*batch_id)),
                None => ("1 = 0".to_string(), None),
            },
            Scope::Student(student_id) => match columns.student {
                Some(col) => (format!("{col} = ?"), Some(*student_id)),
                None => ("1 = 0".to_string(), None),
            },
        }
    }
}

/// Ask the policy and turn a deny into FORBIDDEN.
pub fn authorize(
    policy: &dyn PolicyEvaluator,
    principal: &Principal,
    action: Action,
    resource: Resource,
) -> AppResult<Scope> {
    match policy.decide(principal, action, resource) {
        Decision::Allow(scope) => Ok(scope),
        Decision::Deny => Err(AppError::forbidden("Forbidden: insufficient rights")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERNSHIP_COLUMNS: ScopeColumns = ScopeColumns::new(Some("i.student_id"), Some("s.batch_id"));

    #[test]
    fn scope_predicates_bind_the_claim_value() {
        assert_eq!(Scope::All.predicate(INTERNSHIP_COLUMNS), ("1 = 1".to_string(), None));
        assert_eq!(
            Scope::Batch(7).predicate(INTERNSHIP_COLUMNS),
            ("s.batch_id = ?".to_string(), Some(7))
        );
        assert_eq!(
            Scope::Student(3).predicate(INTERNSHIP_COLUMNS),
            ("i.student_id = ?".to_string(), Some(3))
        );
    }

    #[test]
    fn missing_scope_column_matches_nothing() {
        let columns = ScopeColumns::new(None, Some("ca.batch_id"));
        assert_eq!(Scope::Student(3).predicate(columns), ("1 = 0".to_string(), None));
    }
}
