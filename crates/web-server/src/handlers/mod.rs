//! Route handlers, grouped by audience and area.

use crate::{AppState, error::AppError};

pub mod admin;
pub mod hubs;
pub mod map;
pub mod me;
pub mod public;
pub mod registration;
pub mod tour;

/// Coordinates for a location form: the submitted pair when complete,
/// otherwise the geocoded `address`. Without an address there is nothing to
/// look up and the location stays unplaced.
pub(crate) async fn resolve_coordinates(
    state: &AppState,
    given: Option<(f64, f64)>,
    address: Option<&str>,
) -> Result<Option<(f64, f64)>, AppError> {
    if given.is_some() {
        return Ok(given);
    }
    let Some(address) = address.map(str::trim).filter(|a| !a.is_empty()) else {
        return Ok(None);
    };
    match state.geocoder.geocode(address).await? {
        Some(point) => Ok(Some((point.latitude, point.longitude))),
        None => Err(AppError::Unprocessable(format!("The address '{address}' could not be located"))),
    }
}

/// Deletes the storage objects behind `urls`. URLs outside our bucket are
/// skipped and failures are only logged.
pub(crate) async fn remove_stored_images(state: &AppState, urls: &[String]) {
    let paths: Vec<String> = urls.iter().filter_map(|url| state.storage.object_path(url)).collect();
    if paths.is_empty() {
        return;
    }
    match state.storage.remove(&paths).await {
        Ok(()) => tracing::info!(count = paths.len(), "Removed unused images from storage."),
        Err(e) => tracing::warn!(error = %e, ?paths, "Failed to remove images from storage."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeGeocoder, FakeStorage, test_state};
    use api_client::GeoPoint;
    use std::sync::Arc;

    fn geocoder(point: Option<GeoPoint>) -> Arc<FakeGeocoder> {
        Arc::new(FakeGeocoder { point, ..Default::default() })
    }

    #[tokio::test]
    async fn submitted_coordinates_skip_geocoding() {
        let geo = geocoder(None);
        let state = test_state(geo.clone(), Arc::new(FakeStorage::default()));
        let resolved = resolve_coordinates(&state, Some((52.5, 13.4)), Some("Torstraße 1")).await.unwrap();
        assert_eq!(resolved, Some((52.5, 13.4)));
        assert_eq!(geo.calls(), 0);
    }

    #[tokio::test]
    async fn addresses_are_geocoded() {
        let geo = geocoder(Some(GeoPoint { latitude: 52.52, longitude: 13.41, place_name: None }));
        let state = test_state(geo.clone(), Arc::new(FakeStorage::default()));
        let resolved = resolve_coordinates(&state, None, Some("Alexanderplatz")).await.unwrap();
        assert_eq!(resolved, Some((52.52, 13.41)));
        assert_eq!(geo.calls(), 1);
    }

    #[tokio::test]
    async fn unknown_addresses_are_unprocessable() {
        let state = test_state(geocoder(None), Arc::new(FakeStorage::default()));
        let err = resolve_coordinates(&state, None, Some("Nowhere 0")).await.unwrap_err();
        assert!(matches!(err, AppError::Unprocessable(_)));
    }

    #[tokio::test]
    async fn blank_addresses_stay_unplaced() {
        let geo = geocoder(None);
        let state = test_state(geo.clone(), Arc::new(FakeStorage::default()));
        assert_eq!(resolve_coordinates(&state, None, Some("  ")).await.unwrap(), None);
        assert_eq!(resolve_coordinates(&state, None, None).await.unwrap(), None);
        assert_eq!(geo.calls(), 0);
    }

    #[tokio::test]
    async fn only_our_storage_urls_are_removed() {
        let storage = Arc::new(FakeStorage::default());
        let state = test_state(geocoder(None), storage.clone());
        let urls = vec![
            "https://storage.test/public/sponsors/logo.png".to_string(),
            "https://example.com/elsewhere.png".to_string(),
        ];
        remove_stored_images(&state, &urls).await;
        assert_eq!(*storage.removed.lock().unwrap(), vec!["sponsors/logo.png".to_string()]);
    }
}
