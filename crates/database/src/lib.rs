//! # GLUE Database Crate
//!
//! The application-specific interface to the hosted PostgreSQL database.
//!
//! - `connect` / `run_migrations`: pool setup and embedded schema migrations.
//! - `DbRepository`: holds the pool and exposes one method per query the API
//!   needs, grouped by area (participants, hubs, content lists, tour, ...).
//! - `DbError`: the error type returned by every operation.
//!
//! Queries are checked at runtime (`sqlx::query_as::<_, T>`), so building the
//! crate does not need a live database.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::{DbRepository, LocationRow, NewParticipant, ParticipantContact, RegistrationRows};
