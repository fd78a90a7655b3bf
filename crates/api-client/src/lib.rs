//! Clients for the hosted services the backend talks to: authentication and
//! object storage (Supabase) and address geocoding (Mapbox).
//!
//! Handlers only see the traits below, so tests can swap in fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;
pub mod mapbox;
pub mod supabase;

// --- Public API ---
pub use error::ApiError;
pub use mapbox::MapboxGeocoder;
pub use supabase::{SupabaseClient, parse_public_url};

/// The user an access token belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub place_name: Option<String>,
}

/// Account management at the authentication provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Creates a confirmed account and returns the id the provider assigned.
    async fn create_user(&self, email: &str, password: &str, user_name: &str) -> Result<Uuid, ApiError>;

    async fn delete_user(&self, id: Uuid) -> Result<(), ApiError>;

    /// Resolves a bearer token. Rejected tokens yield [`ApiError::Unauthorized`].
    async fn verify_token(&self, token: &str) -> Result<AuthIdentity, ApiError>;
}

/// A bucket of publicly readable objects.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` under `path`, replacing any existing object, and returns its public URL.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, ApiError>;

    async fn remove(&self, paths: &[String]) -> Result<(), ApiError>;

    fn public_url(&self, path: &str) -> String;

    /// The object path behind a public URL of this bucket, if it is one.
    fn object_path(&self, url: &str) -> Option<String>;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// The best match for a free-form address, or `None` when nothing matches.
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>, ApiError>;
}
