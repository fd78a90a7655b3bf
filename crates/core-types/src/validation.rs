//! Request-time validation helpers.
//!
//! Every write payload implements [`Validate`] and is checked before any
//! database, storage or email call is made.

use crate::error::CoreError;
use std::collections::HashSet;
use std::hash::Hash;
use url::Url;
use uuid::Uuid;

pub const MAX_NAME_LEN: usize = 120;
pub const MAX_TEXT_LEN: usize = 2000;
pub const MAX_SECTION_ITEMS: usize = 12;

pub trait Validate {
    fn validate(&self) -> Result<(), CoreError>;
}

/// A required string: trimmed, non-empty and at most `max` characters.
pub fn required(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::invalid(field, "must not be empty"));
    }
    max_len(field, trimmed, max)
}

pub fn optional(field: &str, value: Option<&str>, max: usize) -> Result<(), CoreError> {
    match value {
        Some(v) => max_len(field, v.trim(), max),
        None => Ok(()),
    }
}

pub fn max_len(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    if value.chars().count() > max {
        return Err(CoreError::invalid(field, format!("must be at most {max} characters")));
    }
    Ok(())
}

pub fn email(field: &str, value: &str) -> Result<(), CoreError> {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return Err(CoreError::invalid(field, "must be a valid email address"));
    };
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');
    if local.is_empty() || !domain_ok || value.chars().any(char::is_whitespace) {
        return Err(CoreError::invalid(field, "must be a valid email address"));
    }
    max_len(field, value, 254)
}

/// An absolute `http` or `https` URL.
pub fn http_url(field: &str, value: &str) -> Result<(), CoreError> {
    match Url::parse(value.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => Ok(()),
        _ => Err(CoreError::invalid(field, "must be an absolute http(s) URL")),
    }
}

pub fn optional_http_url(field: &str, value: Option<&str>) -> Result<(), CoreError> {
    match value {
        Some(v) if !v.trim().is_empty() => http_url(field, v),
        _ => Ok(()),
    }
}

pub fn latitude(field: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || !(-90.0..=90.0).contains(&value) {
        return Err(CoreError::invalid(field, "must be between -90 and 90"));
    }
    Ok(())
}

pub fn longitude(field: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || !(-180.0..=180.0).contains(&value) {
        return Err(CoreError::invalid(field, "must be between -180 and 180"));
    }
    Ok(())
}

/// Latitude and longitude come as a pair or not at all.
pub fn coordinates(lat: Option<f64>, lng: Option<f64>) -> Result<(), CoreError> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => {
            latitude("latitude", lat)?;
            longitude("longitude", lng)
        }
        (None, None) => Ok(()),
        _ => Err(CoreError::invalid(
            "latitude",
            "latitude and longitude must be provided together",
        )),
    }
}

pub fn unique<T: Eq + Hash>(
    field: &str,
    values: impl IntoIterator<Item = T>,
) -> Result<(), CoreError> {
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value) {
            return Err(CoreError::invalid(field, "contains duplicates"));
        }
    }
    Ok(())
}

/// Item ids inside one list payload must not repeat.
pub fn unique_ids<'a>(field: &str, ids: impl IntoIterator<Item = Option<&'a Uuid>>) -> Result<(), CoreError> {
    unique(field, ids.into_iter().flatten())
}

pub fn list_len(field: &str, len: usize, min: usize, max: usize) -> Result<(), CoreError> {
    if len < min {
        return Err(CoreError::invalid(field, format!("must contain at least {min} entries")));
    }
    if len > max {
        return Err(CoreError::invalid(field, format!("must contain at most {max} entries")));
    }
    Ok(())
}

/// Collapses whitespace-only optional strings into `None` and trims the rest.
pub fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank_strings() {
        assert!(required("name", "   ", 10).is_err());
        assert!(required("name", "Glue", 10).is_ok());
        let err = required("name", "a very long name", 4).unwrap_err();
        assert_eq!(err.field(), "name");
    }

    #[test]
    fn email_needs_a_dotted_domain() {
        assert!(email("email", "studio@glue.berlin").is_ok());
        assert!(email("email", "studio@localhost").is_err());
        assert!(email("email", "@glue.berlin").is_err());
        assert!(email("email", "stu dio@glue.berlin").is_err());
        assert!(email("email", "a@b@glue.berlin").is_err());
    }

    #[test]
    fn urls_must_be_absolute_http() {
        assert!(http_url("website", "https://glue.berlin/about").is_ok());
        assert!(http_url("website", "ftp://glue.berlin").is_err());
        assert!(http_url("website", "glue.berlin").is_err());
        assert!(optional_http_url("website", Some("  ")).is_ok());
    }

    #[test]
    fn coordinates_come_in_pairs() {
        assert!(coordinates(Some(52.52), Some(13.40)).is_ok());
        assert!(coordinates(None, None).is_ok());
        assert!(coordinates(Some(52.52), None).is_err());
        assert!(coordinates(Some(95.0), Some(13.40)).is_err());
        assert!(coordinates(Some(52.0), Some(f64::NAN)).is_err());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let a = Uuid::new_v4();
        let ids = [Some(a), None, None, Some(a)];
        assert!(unique_ids("items", ids.iter().map(Option::as_ref)).is_err());
        let ids = [Some(a), None, None];
        assert!(unique_ids("items", ids.iter().map(Option::as_ref)).is_ok());
    }

    #[test]
    fn clean_trims_and_drops_blank_values() {
        assert_eq!(clean(Some("  hi ")), Some("hi".to_string()));
        assert_eq!(clean(Some("   ")), None);
        assert_eq!(clean(None), None);
    }
}
