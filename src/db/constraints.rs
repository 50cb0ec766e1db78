//! Translation of storage-engine constraint failures into API errors.
//!
//! The engine is the authority for uniqueness and referential integrity; writes
//! are never guarded by a pre-check alone, so every insert, update and delete
//! funnels its `sqlx::Error` through here.

use sqlx::error::ErrorKind;

use crate::errors::AppError;

/// How a write's constraint failures read to the client.
#[derive(Debug, Clone, Copy)]
pub struct Constraints {
    /// `(column, message)` pairs matched against the violated unique column.
    pub unique: &'static [(&'static str, &'static str)],
    /// Message for a dangling foreign key on insert or update.
    pub reference: &'static str,
}

impl Constraints {
    pub const fn new(unique: &'static [(&'static str, &'static str)], reference: &'static str) -> Self {
        Self { unique, reference }
    }

    fn unique_message(&self, engine_message: &str) -> &'static str {
        self.unique
            .iter()
            .find(|(column, _)| engine_message.contains(column))
            .map(|(_, message)| *message)
            .unwrap_or("Duplicate value")
    }
}

/// Map an insert/update failure: unique → CONFLICT, foreign key → INVALID_REFERENCE.
pub fn translate(err: sqlx::Error, constraints: &Constraints) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        match db_err.kind() {
            ErrorKind::UniqueViolation => {
                return AppError::conflict(constraints.unique_message(db_err.message()));
            }
            ErrorKind::ForeignKeyViolation => {
                return AppError::invalid_reference(constraints.reference);
            }
            _ => {}
        }
    }

    AppError::Database(err)
}

/// Map a delete failure: a parent that still has dependents → CONFLICT.
pub fn translate_delete(err: sqlx::Error, dependents_message: &'static str) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        if let ErrorKind::ForeignKeyViolation = db_err.kind() {
            return AppError::conflict(dependents_message);
        }
    }

    AppError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    const STUDENT: Constraints = Constraints::new(
        &[
            ("login_id", "Login ID already exists"),
            ("registration_number", "Registration number already exists"),
        ],
        "Invalid batch ID",
    );

    async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await.unwrap();
        sqlx::query("CREATE TABLE parent (id INTEGER PRIMARY KEY)").execute(&pool).await.unwrap();
        sqlx::query(
            "CREATE TABLE child (id INTEGER PRIMARY KEY, login_id TEXT UNIQUE, registration_number TEXT UNIQUE, parent_id INTEGER NOT NULL REFERENCES parent(id))",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO parent (id) VALUES (1)").execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO child (login_id, registration_number, parent_id) VALUES ('a', 'R1', 1)")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn unique_violation_names_the_column() {
        let pool = pool().await;

        let err = sqlx::query("INSERT INTO child (login_id, registration_number, parent_id) VALUES ('b', 'R1', 1)")
            .execute(&pool)
            .await
            .unwrap_err();
        match translate(err, &STUDENT) {
            AppError::Conflict(msg) => assert_eq!(msg, "Registration number already exists"),
            other => panic!("unexpected {other:?}"),
        }

        let err = sqlx::query("INSERT INTO child (login_id, registration_number, parent_id) VALUES ('a', 'R2', 1)")
            .execute(&pool)
            .await
            .unwrap_err();
        match translate(err, &STUDENT) {
            AppError::Conflict(msg) => assert_eq!(msg, "Login ID already exists"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn dangling_reference_is_invalid_reference() {
        let pool = pool().await;

        let err = sqlx::query("INSERT INTO child (login_id, registration_number, parent_id) VALUES ('c', 'R3', 99)")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(matches!(translate(err, &STUDENT), AppError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn deleting_a_referenced_parent_is_a_conflict() {
        let pool = pool().await;

        let err = sqlx::query("DELETE FROM parent WHERE id = 1").execute(&pool).await.unwrap_err();
        assert!(matches!(translate_delete(err, "Parent still has children"), AppError::Conflict(_)));
    }
}
