//! # GLUE Core Types
//!
//! Domain vocabulary shared by every other crate: the Postgres-backed row
//! structs and enums, the request payloads with their validation rules, list
//! diffing for admin forms, slugs and the map aggregation.
//!
//! This crate performs no I/O.

pub mod diff;
pub mod enums;
pub mod error;
pub mod map;
pub mod payloads;
pub mod slug;
pub mod structs;
pub mod validation;

// Re-export the core types to provide a clean public API.
pub use diff::{Keyed, SyncItem, SyncPlan, orphaned_urls, plan_sync};
pub use enums::{AboutSection, PlanKind, ReactivationStatus, SponsorType, UserRole};
pub use error::CoreError;
pub use map::{LocationDetail, MapSources, MapView, build_map_view};
pub use structs::*;
pub use validation::Validate;
