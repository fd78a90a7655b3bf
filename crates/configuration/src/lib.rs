use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    CacheSettings, GeocodingSettings, LogFormat, LoggingSettings, MailSettings, ServerSettings,
    Settings, SupabaseSettings, UploadSettings,
};

const ENV_PREFIX: &str = "GLUE";

/// Loads the application configuration from `config.toml` (if present) and
/// the environment.
///
/// Environment variables use the `GLUE` prefix and `__` as the section
/// separator, e.g. `GLUE__SUPABASE__SERVICE_ROLE_KEY`.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config.toml"))
}

/// Same as [`load_settings`] with an explicit file. A missing file is not an error.
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("mail.moderator_emails")
                .with_list_parse_key("server.cors_origins"),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;
    validate(&settings)?;

    Ok(settings)
}

fn validate(settings: &Settings) -> Result<(), ConfigError> {
    if settings.server.port == 0 {
        return Err(ConfigError::ValidationError("server.port must not be 0".to_string()));
    }
    if settings.server.body_limit_mb == 0 {
        return Err(ConfigError::ValidationError(
            "server.body_limit_mb must be positive".to_string(),
        ));
    }
    if settings.cache.location_ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "cache.location_ttl_secs must be positive".to_string(),
        ));
    }
    if settings.uploads.max_image_bytes == 0 || settings.uploads.max_images_per_participant <= 0 {
        return Err(ConfigError::ValidationError(
            "upload limits must be positive".to_string(),
        ));
    }
    if settings.supabase.storage_bucket.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "supabase.storage_bucket must be set".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.cache.location_ttl_secs, 300);
        assert_eq!(settings.uploads.max_images_per_participant, 6);
        assert_eq!(settings.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn file_values_override_defaults() {
        let file = write_config(
            r#"
            [server]
            port = 8080

            [mail]
            moderator_emails = ["team@glue.berlin"]

            [logging]
            format = "json"
            "#,
        );
        let settings = load_settings_from(file.path()).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.mail.moderator_emails, vec!["team@glue.berlin".to_string()]);
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let file = write_config("[cache]\nlocation_ttl_secs = 0\n");
        let err = load_settings_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
