pub mod admin;
pub mod batch;
pub mod course_advisor;
pub mod department;
pub mod internship;
pub mod student;
