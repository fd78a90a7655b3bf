use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an empty `config.toml` (or none at all)
/// yields a runnable local setup; secrets come from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub supabase: SupabaseSettings,
    pub mail: MailSettings,
    pub geocoding: GeocodingSettings,
    pub cache: CacheSettings,
    pub uploads: UploadSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Maximum request body size, mostly relevant for image uploads.
    pub body_limit_mb: usize,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            body_limit_mb: 20,
            cors_origins: Vec::new(),
        }
    }
}

/// The hosted Auth + Storage backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupabaseSettings {
    pub url: String,
    pub service_role_key: String,
    pub storage_bucket: String,
}

impl Default for SupabaseSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            service_role_key: String::new(),
            storage_bucket: "images".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
    /// Who gets notified about reactivation requests.
    pub moderator_emails: Vec<String>,
    /// Public site URL used for links inside emails.
    pub site_url: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.resend.com".to_string(),
            api_key: String::new(),
            from: "GLUE <hello@glue.berlin>".to_string(),
            moderator_emails: Vec::new(),
            site_url: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocodingSettings {
    pub api_url: String,
    pub access_token: String,
    /// Optional ISO country filter, e.g. "de".
    pub country: Option<String>,
}

impl Default for GeocodingSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.mapbox.com".to_string(),
            access_token: String::new(),
            country: Some("de".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub location_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { location_ttl_secs: 300 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    pub max_image_bytes: usize,
    pub max_images_per_participant: i64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_image_bytes: 5 * 1024 * 1024,
            max_images_per_participant: 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs are also written to a daily rolling file here.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info,sqlx=warn,tower_http=info".to_string(),
            format: LogFormat::Pretty,
            directory: None,
            file_prefix: "glue.log".to_string(),
        }
    }
}
