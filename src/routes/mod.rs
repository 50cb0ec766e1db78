pub mod auth;
pub mod batches;
pub mod course_advisors;
pub mod departments;
pub mod health;
pub mod internships;
pub mod students;
