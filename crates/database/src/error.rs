use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to load environment variables for database connection: {0}")]
    ConnectionConfigError(String),

    #[error("Database query failed: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    /// Carries the name of the violated constraint.
    #[error("Unique constraint {0} was violated.")]
    UniqueViolation(String),

    #[error("The requested data was not found in the database.")]
    NotFound,
}

const UNIQUE_VIOLATION: &str = "23505";

impl DbError {
    /// Maps `RowNotFound` to [`DbError::NotFound`] and unique constraint
    /// violations to [`DbError::UniqueViolation`].
    pub(crate) fn from_query(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                DbError::UniqueViolation(db.constraint().unwrap_or("key").to_string())
            }
            other => DbError::QueryError(other),
        }
    }
}
