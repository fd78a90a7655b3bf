use crate::error::ApiError;
use crate::{AuthIdentity, AuthProvider, ObjectStorage};
use async_trait::async_trait;
use configuration::SupabaseSettings;
use percent_encoding::percent_decode_str;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

/// Service-role client for the Supabase Auth admin API and Storage API.
#[derive(Clone)]
pub struct SupabaseClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    bucket: String,
}

#[derive(Deserialize)]
struct RawUser {
    id: Uuid,
    email: Option<String>,
}

impl SupabaseClient {
    pub fn new(settings: &SupabaseSettings) -> Result<Self, ApiError> {
        let key = settings.service_role_key.trim();
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(key).map_err(|_| ApiError::InvalidData("service role key".to_string()))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| ApiError::InvalidData("service role key".to_string()))?,
        );

        Ok(Self {
            client: reqwest::Client::builder().default_headers(headers).build()?,
            base_url: settings.url.trim_end_matches('/').to_string(),
            api_key: key.to_string(),
            bucket: settings.storage_bucket.clone(),
        })
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }
        let text = response.text().await?;
        serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    async fn expect_success(response: Response) -> Result<(), ApiError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ApiError::from_response(response).await)
        }
    }
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    async fn create_user(&self, email: &str, password: &str, user_name: &str) -> Result<Uuid, ApiError> {
        let url = format!("{}/auth/v1/admin/users", self.base_url);
        let body = json!({
            "email": email,
            "password": password,
            "email_confirm": true,
            "user_metadata": { "user_name": user_name },
        });
        let response = self.client.post(&url).json(&body).send().await?;
        let user: RawUser = Self::parse_json(response).await?;
        tracing::info!(user_id = %user.id, "Created auth user.");
        Ok(user.id)
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), ApiError> {
        let url = format!("{}/auth/v1/admin/users/{id}", self.base_url);
        let response = self.client.delete(&url).send().await?;
        Self::expect_success(response).await
    }

    async fn verify_token(&self, token: &str) -> Result<AuthIdentity, ApiError> {
        let url = format!("{}/auth/v1/user", self.base_url);
        // The user's token replaces the service-role bearer for this call.
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await?;
        if matches!(response.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(ApiError::Unauthorized);
        }
        let user: RawUser = Self::parse_json(response).await?;
        Ok(AuthIdentity { id: user.id, email: user.email })
    }
}

#[async_trait]
impl ObjectStorage for SupabaseClient {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, ApiError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;
        Self::expect_success(response).await?;
        Ok(self.public_url(path))
    }

    async fn remove(&self, paths: &[String]) -> Result<(), ApiError> {
        if paths.is_empty() {
            return Ok(());
        }
        let url = format!("{}/storage/v1/object/{}", self.base_url, self.bucket);
        let response = self
            .client
            .delete(&url)
            .json(&json!({ "prefixes": paths }))
            .send()
            .await?;
        Self::expect_success(response).await
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, self.bucket, path)
    }

    fn object_path(&self, url: &str) -> Option<String> {
        parse_public_url(&self.base_url, &self.bucket, url)
    }
}

/// Extracts the object path from a public URL of `bucket`.
///
/// Returns `None` for URLs of other hosts or buckets, which are then simply
/// not cleaned up.
pub fn parse_public_url(base_url: &str, bucket: &str, url: &str) -> Option<String> {
    let prefix = format!("{}/storage/v1/object/public/{}/", base_url.trim_end_matches('/'), bucket);
    let encoded = url.strip_prefix(&prefix)?;
    let encoded = encoded.split(['?', '#']).next().unwrap_or_default();
    if encoded.is_empty() {
        return None;
    }
    percent_decode_str(encoded).decode_utf8().ok().map(|path| path.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://abc.supabase.co";

    #[test]
    fn extracts_the_object_path() {
        let url = "https://abc.supabase.co/storage/v1/object/public/images/participants/1/photo.jpg";
        assert_eq!(
            parse_public_url(BASE, "images", url),
            Some("participants/1/photo.jpg".to_string())
        );
    }

    #[test]
    fn decodes_percent_escapes_and_drops_the_query() {
        let url = "https://abc.supabase.co/storage/v1/object/public/images/about/Gr%C3%BC%C3%9Fe%20Berlin.png?t=1";
        assert_eq!(
            parse_public_url(&format!("{BASE}/"), "images", url),
            Some("about/Grüße Berlin.png".to_string())
        );
    }

    #[test]
    fn ignores_foreign_urls() {
        assert_eq!(parse_public_url(BASE, "images", "https://example.com/logo.png"), None);
        let other_bucket = "https://abc.supabase.co/storage/v1/object/public/docs/a.pdf";
        assert_eq!(parse_public_url(BASE, "images", other_bucket), None);
        let bare = "https://abc.supabase.co/storage/v1/object/public/images/";
        assert_eq!(parse_public_url(BASE, "images", bare), None);
    }

    #[test]
    fn public_url_and_object_path_agree() {
        let settings = SupabaseSettings {
            url: format!("{BASE}/"),
            service_role_key: "service-key".to_string(),
            storage_bucket: "images".to_string(),
        };
        let client = SupabaseClient::new(&settings).expect("client");
        let url = client.public_url("participants/42/a.webp");
        assert_eq!(url, format!("{BASE}/storage/v1/object/public/images/participants/42/a.webp"));
        assert_eq!(client.object_path(&url), Some("participants/42/a.webp".to_string()));
    }
}
