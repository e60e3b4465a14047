//! Database-specific error types and conversions.

use support_core::error::SupportError;
use uuid::Uuid;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Malformed record: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },
}

impl From<DbError> for SupportError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => SupportError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => SupportError::AlreadyExists { entity },
            other => SupportError::Database(other.to_string()),
        }
    }
}

/// Parse a UUID stored as a string column.
pub(crate) fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}

/// Error mapper for a failed write on `entity`. Unique-index violations
/// become [`DbError::AlreadyExists`].
pub(crate) fn write_error(entity: &'static str) -> impl Fn(surrealdb::Error) -> DbError {
    move |e| {
        let message = e.to_string();
        if message.contains("already contains") || message.contains("already exists") {
            DbError::AlreadyExists {
                entity: entity.into(),
            }
        } else {
            DbError::Query(message)
        }
    }
}
