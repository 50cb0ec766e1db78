//! Business operations per entity.
//!
//! A manager owns a pool handle and the policy. Every public operation takes
//! the caller's [`Principal`](crate::authz::Principal), authorizes first and
//! renders the granted scope into its SQL.

use sqlx::query::QueryAs;
use sqlx::sqlite::{Sqlite, SqliteArguments};

use crate::errors::{AppError, AppResult};
use crate::utils::required;

pub mod batch;
pub mod course_advisor;
pub mod department;
pub mod internship;
pub mod student;

pub use batch::BatchManager;
pub use course_advisor::CourseAdvisorManager;
pub use department::DepartmentManager;
pub use internship::InternshipManager;
pub use student::StudentManager;

/// Bind the value of a scope predicate, if it has one.
pub(crate) fn bind_scope<'q, O>(
    query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    value: Option<i64>,
) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
    match value {
        Some(value) => query.bind(value),
        None => query,
    }
}

/// Replacement value of a text field in a partial update.
///
/// Absent means keep; present but blank is rejected.
pub(crate) fn replacement(value: Option<&str>, field: &str) -> AppResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(raw) => required(Some(raw))
            .map(Some)
            .ok_or_else(|| AppError::validation(format!("{field} must not be blank"))),
    }
}
