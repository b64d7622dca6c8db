//! Error types for the Bazaar system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BazaarError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Database error: {0}")]
    Database(String),
}

pub type BazaarResult<T> = Result<T, BazaarError>;
