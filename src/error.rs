use thiserror::Error;

/// Failures produced by the stores and the auth/news services.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, blank or oversized input.
    #[error("{0}")]
    Validation(String),
    #[error("username {0:?} is already registered")]
    DuplicateUsername(String),
    #[error("invalid username or password")]
    Authentication,
    #[error("only administrators can publish news")]
    Authorization,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("database error: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

/// True when the error is SQLite rejecting a write on a `UNIQUE` column.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
