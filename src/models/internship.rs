use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Internship record as returned by the API, joined with its student and batch.
///
/// Attachment bytes are never included; `has_*` flags report presence.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Internship {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub registration_number: String,
    pub batch_id: i64,
    pub batch_name: String,
    pub batch_year: i64,
    pub internship_type: String,
    pub reporting_officer_name: Option<String>,
    pub organization: String,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub duration: String,
    pub year_of_completion: i64,
    pub has_evidences: bool,
    pub has_survey1: bool,
    pub has_survey2: bool,
    pub has_survey3: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Text fields of the internship multipart form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InternshipInput {
    pub internship_type: Option<String>,
    pub reporting_officer_name: Option<String>,
    pub organization: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub duration: Option<String>,
    pub year_of_completion: Option<String>,
}

impl InternshipInput {
    pub const FIELDS: [&'static str; 8] = [
        "internship_type",
        "reporting_officer_name",
        "organization",
        "contact",
        "email",
        "website",
        "duration",
        "year_of_completion",
    ];
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InternshipListQuery {
    pub batch_id: Option<i64>,
}

/// Row of the students-without-internship report.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StudentWithoutInternship {
    pub student_id: i64,
    pub name: String,
    pub registration_number: String,
    pub batch_id: i64,
    pub batch_name: String,
    pub batch_year: i64,
}
