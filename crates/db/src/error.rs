//! Mapping of database errors onto application errors.

use bastion_shared::AppError;
use sea_orm::{DbErr, SqlErr};

/// Converts a raw database error into an [`AppError`].
///
/// Unique and foreign-key violations that slipped past the repository checks
/// (usually a concurrent insert) become `Conflict`; everything else is a
/// `Database` error whose text is only ever logged.
#[must_use]
pub fn db_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Resource already exists".to_string())
        }
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            AppError::Conflict("Resource is referenced by other records".to_string())
        }
        _ => AppError::Database(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_errors_stay_internal() {
        let app = db_error(DbErr::Custom("connection reset".into()));
        assert_eq!(app.status_code(), 500);
        assert_eq!(app.public_message(), "An internal error occurred");
    }

    #[test]
    fn test_record_not_found_is_database_error() {
        let app = db_error(DbErr::RecordNotFound("users".into()));
        assert!(matches!(app, AppError::Database(_)));
    }
}
