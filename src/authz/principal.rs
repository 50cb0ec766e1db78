use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The three credentialed identities of the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Student,
    CourseAdvisor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Student => "student",
            Role::CourseAdvisor => "course_advisor",
        }
    }
}

/// Principal is the decoded identity claim of the caller.
///
/// `batch_id` is carried for students and course advisors so that scope
/// checks never need an extra lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub role: Role,
    pub subject_id: i64,
    pub batch_id: Option<i64>,
}

impl Principal {
    pub fn admin(admin_id: i64) -> Self {
        Self {
            role: Role::Admin,
            subject_id: admin_id,
            batch_id: None,
        }
    }

    pub fn student(student_id: i64, batch_id: i64) -> Self {
        Self {
            role: Role::Student,
            subject_id: student_id,
            batch_id: Some(batch_id),
        }
    }

    pub fn course_advisor(advisor_id: i64, batch_id: i64) -> Self {
        Self {
            role: Role::CourseAdvisor,
            subject_id: advisor_id,
            batch_id: Some(batch_id),
        }
    }

    /// Student and advisor claims must name a batch; admin claims must not need one.
    pub fn is_well_formed(&self) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Student | Role::CourseAdvisor => self.batch_id.is_some(),
        }
    }
}
