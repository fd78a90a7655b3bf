use crate::error::ApiError;
use crate::{GeoPoint, Geocoder};
use async_trait::async_trait;
use configuration::GeocodingSettings;
use serde::Deserialize;
use url::Url;

/// Forward geocoding through the Mapbox places API.
#[derive(Clone)]
pub struct MapboxGeocoder {
    client: reqwest::Client,
    api_url: String,
    access_token: String,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    /// `[longitude, latitude]`
    center: (f64, f64),
    place_name: Option<String>,
}

impl MapboxGeocoder {
    pub fn new(settings: &GeocodingSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            access_token: settings.access_token.clone(),
            country: settings.country.clone().filter(|c| !c.trim().is_empty()),
        }
    }

    fn request_url(&self, address: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.api_url).map_err(|e| ApiError::InvalidData(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidData(format!("cannot be a base URL: {}", self.api_url)))?
            .pop_if_empty()
            .extend(["geocoding", "v5", "mapbox.places"])
            .push(&format!("{}.json", address.trim()));
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("access_token", &self.access_token);
            query.append_pair("limit", "1");
            if let Some(country) = &self.country {
                query.append_pair("country", country);
            }
        }
        Ok(url)
    }
}

fn first_point(response: PlacesResponse) -> Option<GeoPoint> {
    response.features.into_iter().next().map(|feature| GeoPoint {
        latitude: feature.center.1,
        longitude: feature.center.0,
        place_name: feature.place_name,
    })
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>, ApiError> {
        if self.access_token.is_empty() {
            return Err(ApiError::NotConfigured("geocoding access token"));
        }
        if address.trim().is_empty() {
            return Ok(None);
        }

        let response = self.client.get(self.request_url(address)?).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }
        let text = response.text().await?;
        let places: PlacesResponse =
            serde_json::from_str(&text).map_err(|e| ApiError::Deserialization(e.to_string()))?;

        let point = first_point(places);
        if point.is_none() {
            tracing::debug!(address, "No geocoding match.");
        }
        Ok(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geocoder(country: Option<&str>) -> MapboxGeocoder {
        MapboxGeocoder::new(&GeocodingSettings {
            api_url: "https://api.mapbox.com/".to_string(),
            access_token: "pk.test".to_string(),
            country: country.map(str::to_string),
        })
    }

    #[test]
    fn builds_an_encoded_places_url() {
        let url = geocoder(Some("de")).request_url("Torstraße 1, Berlin").unwrap();
        assert_eq!(url.host_str(), Some("api.mapbox.com"));
        assert!(url.path().starts_with("/geocoding/v5/mapbox.places/"));
        assert!(url.path().ends_with(".json"));
        assert!(url.path().contains("Torstra%C3%9Fe%201,%20Berlin"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("limit".to_string(), "1".to_string())));
        assert!(pairs.contains(&("country".to_string(), "de".to_string())));
    }

    #[test]
    fn omits_an_empty_country_filter() {
        let url = geocoder(Some(" ")).request_url("Berlin").unwrap();
        assert!(!url.query_pairs().any(|(k, _)| k == "country"));
    }

    #[test]
    fn takes_the_first_feature_with_swapped_coordinates() {
        let body = r#"{"features":[{"center":[13.40,52.52],"place_name":"Berlin, Germany"},{"center":[0.0,0.0]}]}"#;
        let places: PlacesResponse = serde_json::from_str(body).unwrap();
        let point = first_point(places).unwrap();
        assert_eq!(point.latitude, 52.52);
        assert_eq!(point.longitude, 13.40);
        assert_eq!(point.place_name.as_deref(), Some("Berlin, Germany"));
    }

    #[test]
    fn no_features_means_no_match() {
        let places: PlacesResponse = serde_json::from_str(r#"{"type":"FeatureCollection"}"#).unwrap();
        assert_eq!(first_point(places), None);
    }
}
