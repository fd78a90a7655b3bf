use sqlx::postgres::PgPool;

mod content;
mod event_days;
mod hubs;
mod map;
mod participants;
mod profile;
mod registration;
mod tour;
mod users;

pub use map::LocationRow;
pub use participants::ParticipantContact;
pub use registration::{NewParticipant, RegistrationRows};

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub(crate) const PARTICIPANT_COLUMNS: &str = "id, user_id, name, slug, short_description, description, website, \
     is_active, is_sticky, sticky_year, reactivation_status, reactivation_message, \
     reactivation_requested_at, created_at";
