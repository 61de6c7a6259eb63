use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::error::AppError;

/// Maps a diesel error to the matching `AppError` variant.
///
/// Unique violations become `Duplicate` with the constraint name carried as
/// the field so callers can tell which index fired (e.g. a queue re-run
/// racing its own insert).
pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
    match error {
        DieselError::NotFound => AppError::NotFound {
            entity: "record".to_string(),
            field: "id".to_string(),
            value: String::new(),
        },
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            AppError::Duplicate {
                entity: info.table_name().unwrap_or("record").to_string(),
                field: info.constraint_name().unwrap_or("unique").to_string(),
                value: info.message().to_string(),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            AppError::BadRequest {
                message: format!(
                    "Referenced row does not exist: {}",
                    info.constraint_name().unwrap_or(info.message())
                ),
            }
        }
        other => AppError::Database {
            operation: operation.to_string(),
            source: anyhow::Error::from(other),
        },
    }
}
