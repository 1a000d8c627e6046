use thiserror::Error;

/// Storage outcomes the catalog distinguishes.
///
/// `NotFound` is kept apart from every other failure so callers can map it
/// to a not-found response instead of a server error.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("no matching row")]
    NotFound,

    #[error("failed to decode row: {0}")]
    Decode(#[source] sqlx::Error),

    #[error("invalid database configuration: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound)
    }
}
