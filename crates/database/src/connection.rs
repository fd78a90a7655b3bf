use crate::error::DbError;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::env;
use std::time::Duration;

/// Opens the pool behind `DbRepository`.
///
/// `DATABASE_URL` points at the hosted Supabase Postgres instance; a local
/// `.env` is read first so `glue migrate` and the server pick up the same
/// value. The pool is sized for the API: ten connections, and requests give
/// up after five seconds instead of queueing behind a stalled database.
pub async fn connect() -> Result<PgPool, DbError> {
    dotenvy::dotenv().ok();

    let database_url = env::var("DATABASE_URL")
        .map_err(|_| DbError::ConnectionConfigError("DATABASE_URL must point at the GLUE database.".to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await?;

    Ok(pool)
}

/// Applies `migrations/` (the GLUE schema, enums and deferred keys). Run by
/// `glue migrate` and at server start.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
