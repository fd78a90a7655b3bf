use api_client::{AuthProvider, Geocoder, MapboxGeocoder, ObjectStorage, SupabaseClient};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, post, put},
};
use cache::TtlCache;
use configuration::Settings;
use core_types::LocationDetail;
use database::DbRepository;
use mailer::{MailQueue, Mailer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

pub mod auth;
pub mod cache;
pub mod error;
pub mod handlers;

#[cfg(test)]
mod test_support;

const MAIL_QUEUE_CAPACITY: usize = 256;

/// The shared application state that all handlers can access.
pub struct AppState {
    pub db_repo: DbRepository,
    pub auth: Arc<dyn AuthProvider>,
    pub storage: Arc<dyn ObjectStorage>,
    pub geocoder: Arc<dyn Geocoder>,
    /// Used directly where the caller reports delivery, e.g. broadcasts.
    pub mailer: Arc<dyn Mailer>,
    /// Fire-and-forget notifications.
    pub mail_queue: MailQueue,
    pub location_cache: TtlCache<Uuid, LocationDetail>,
    pub settings: Settings,
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin.");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
}

/// Builds the full API router around `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    use handlers::{admin, hubs, map, me, public, registration, tour};

    let cors = cors_layer(&state.settings.server.cors_origins);
    let body_limit = state.settings.server.body_limit_mb * 1024 * 1024;

    Router::new()
        // --- Public ---
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/about/:section", get(public::get_about_section))
        .route("/api/sponsors", get(public::get_sponsors))
        .route("/api/plans", get(public::get_plans))
        .route("/api/citizens", get(public::get_citizens))
        .route("/api/event-days", get(public::get_event_days))
        .route("/api/participants/carousel", get(public::get_carousel))
        .route("/api/participants/:slug", get(public::get_participant))
        .route("/api/map", get(map::get_map))
        .route("/api/map/locations/:participant_id", get(map::get_location))
        .route("/api/register", post(registration::register))
        // --- Signed-in users ---
        .route("/api/me", get(me::get_me))
        .route("/api/me/plan", put(me::put_plan))
        .route("/api/me/invoice", put(me::put_invoice))
        .route("/api/me/map-info", put(me::put_map_info))
        .route("/api/me/hub", put(me::put_hub))
        .route("/api/me/visiting-hours", put(me::put_visiting_hours))
        .route("/api/me/images", post(me::post_image))
        .route("/api/me/images/:image_id", delete(me::delete_image))
        .route("/api/me/reactivation", post(me::post_reactivation))
        // --- Moderators ---
        .route("/api/admin/about/:section", put(admin::put_about_section))
        .route("/api/admin/sponsors", put(admin::put_sponsors))
        .route("/api/admin/plans", put(admin::put_plans))
        .route("/api/admin/citizens/:year", put(admin::put_citizens))
        .route("/api/admin/event-days", put(admin::put_event_days))
        .route("/api/admin/participants", get(tour::get_participants))
        .route("/api/admin/participants/:id/sticky", put(tour::put_sticky))
        .route("/api/admin/tour/carryover", post(tour::post_carryover))
        .route("/api/admin/reactivations", get(tour::get_reactivations))
        .route("/api/admin/reactivations/:participant_id", post(tour::post_reactivation_decision))
        .route("/api/admin/emails", post(tour::post_emails))
        .route("/api/admin/hubs", post(hubs::post_hub))
        .route("/api/admin/hubs/:id", put(hubs::put_hub).delete(hubs::delete_hub))
        .route("/api/admin/routes", post(hubs::post_route))
        .route("/api/admin/routes/:id", delete(hubs::delete_route))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
}

/// Connects the database and external services, then serves the API until
/// the process is stopped.
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;

    let db_pool = database::connect().await?;
    database::run_migrations(&db_pool).await?;
    let db_repo = DbRepository::new(db_pool);

    let supabase = Arc::new(SupabaseClient::new(&settings.supabase)?);
    let geocoder = Arc::new(MapboxGeocoder::new(&settings.geocoding));
    let mailer = mailer::build_mailer(&settings.mail);
    let (mail_queue, mail_rx) = MailQueue::channel(MAIL_QUEUE_CAPACITY);
    tokio::spawn(mailer::run_mail_service(mailer.clone(), mail_rx));

    let app_state = Arc::new(AppState {
        db_repo,
        auth: supabase.clone(),
        storage: supabase,
        geocoder,
        mailer,
        mail_queue,
        location_cache: TtlCache::new(Duration::from_secs(settings.cache.location_ttl_secs)),
        settings,
    });

    let app = build_router(app_state);

    tracing::info!("Web server started and listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::default_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use core_types::map::LocationSlot;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_check_answers_ok() {
        let app = build_router(default_state());
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn admin_routes_require_a_token() {
        let app = build_router(default_state());
        let response = app
            .oneshot(
                Request::put("/api/admin/sponsors")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"sponsors":[]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "Authentication required");
    }

    #[tokio::test]
    async fn rejected_tokens_are_unauthorized() {
        let app = build_router(default_state());
        let response = app
            .oneshot(
                Request::get("/api/admin/reactivations")
                    .header(header::AUTHORIZATION, "Bearer not-a-real-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn accepted_tokens_go_on_to_the_account_lookup() {
        use crate::test_support::{FakeAuth, FakeGeocoder, FakeStorage, state_with};
        use api_client::AuthIdentity;

        let auth = Arc::new(FakeAuth {
            accepts: Some(AuthIdentity { id: Uuid::new_v4(), email: None }),
            ..Default::default()
        });
        let state = state_with(auth, Arc::new(FakeGeocoder::default()), Arc::new(FakeStorage::default()));
        let response = build_router(state)
            .oneshot(
                Request::get("/api/me")
                    .header(header::AUTHORIZATION, "Bearer valid-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        // Past the token check; the test pool has no database behind it.
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn participant_routes_require_a_token() {
        let app = build_router(default_state());
        let response = app
            .oneshot(Request::get("/api/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_registration_is_rejected_before_any_io() {
        let app = build_router(default_state());
        let body = serde_json::json!({
            "email": "not-an-email",
            "password": "long-enough-password",
            "user_name": "Ada",
            "plan": "free"
        });
        let response = app
            .oneshot(
                Request::post("/api/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["field"], "email");
    }

    #[tokio::test]
    async fn participant_plan_without_invoice_is_rejected() {
        let app = build_router(default_state());
        let body = serde_json::json!({
            "email": "studio@example.com",
            "password": "long-enough-password",
            "user_name": "Studio",
            "plan": "participant",
            "participant": { "name": "Studio Nord" }
        });
        let response = app
            .oneshot(
                Request::post("/api/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["field"], "invoice");
    }

    #[tokio::test]
    async fn cached_locations_are_served_without_the_database() {
        let state = default_state();
        let participant_id = Uuid::new_v4();
        let detail = LocationDetail {
            participant_id,
            name: "Studio Nord".to_string(),
            slug: "studio-nord".to_string(),
            short_description: None,
            website: None,
            location_name: Some("Hinterhof".to_string()),
            address: "Torstraße 1, Berlin".to_string(),
            latitude: 52.53,
            longitude: 13.40,
            hub: None,
            images: vec![],
            visiting_hours: Vec::<LocationSlot>::new(),
        };
        state.location_cache.insert(participant_id, detail).await;

        let app = build_router(state);
        let response = app
            .oneshot(
                Request::get(format!("/api/map/locations/{participant_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["slug"], "studio-nord");
        assert_eq!(json["latitude"], 52.53);
    }
}
