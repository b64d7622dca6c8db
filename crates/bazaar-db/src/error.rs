//! Database-specific error types and conversions.

use bazaar_core::error::BazaarError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Duplicate {entity}: {detail}")]
    Duplicate { entity: String, detail: String },

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl DbError {
    /// Classify a failed statement, recognising unique-index violations.
    pub(crate) fn from_statement(entity: &str, err: surrealdb::Error) -> Self {
        let detail = err.to_string();
        // A unique index violation reads
        // "Database index `idx_credential_login` already contains ...".
        if detail.contains("already contains") {
            DbError::Duplicate {
                entity: entity.into(),
                detail,
            }
        } else {
            DbError::Query(detail)
        }
    }
}

impl From<DbError> for BazaarError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => BazaarError::NotFound { entity, id },
            DbError::Duplicate { entity, .. } => BazaarError::AlreadyExists { entity },
            other => BazaarError::Database(other.to_string()),
        }
    }
}
