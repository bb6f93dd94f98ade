use thiserror::Error;

/// Errors raised by document store engines
#[derive(Debug, Error)]
pub enum DbError {
    #[error("duplicate value for unique field '{field}' in collection '{collection}'")]
    DuplicateKey { collection: String, field: String },

    #[error("collection '{0}' is not defined")]
    UnknownCollection(String),

    #[error("invalid update on field '{field}': {reason}")]
    InvalidUpdate { field: String, reason: String },

    #[error("document is not a JSON object")]
    NotAnObject,

    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type DbResult<T> = Result<T, DbError>;
