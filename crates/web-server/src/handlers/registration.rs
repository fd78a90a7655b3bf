//! The signup workflow.
//!
//! Rows are written under a temporary id, the account is created at the
//! auth provider, and the rows are then moved to the id it assigned. The
//! auth call cannot join a database transaction, so every failure after the
//! first write is compensated by deleting what was created.

use super::resolve_coordinates;
use crate::{AppState, error::AppError};
use axum::{Json, extract::State, http::StatusCode};
use core_types::Validate;
use core_types::payloads::{MapInfoInput, RegistrationInput};
use core_types::slug::{slugify, unique_slug};
use database::{NewParticipant, RegistrationRows};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub user_id: Uuid,
    pub participant_slug: Option<String>,
}

/// # POST /api/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(input): Json<RegistrationInput>,
) -> Result<(StatusCode, Json<RegistrationResponse>), AppError> {
    input.validate()?;
    let map_info = locate(&state, &input).await?;
    let email = input.normalized_email();

    if state.db_repo.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("An account with this email already exists".to_string()));
    }

    let rows = prepare_rows(&state, &input, email, map_info).await?;
    let temporary_id = rows.user_id;

    if let Err(e) = state.db_repo.insert_pending_registration(&rows).await {
        compensate(&state, &[temporary_id], None).await;
        return Err(e.into());
    }

    let user_id = match state.auth.create_user(&rows.email, &input.password, &rows.user_name).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "Auth provider rejected the registration.");
            compensate(&state, &[temporary_id], None).await;
            return Err(e.into());
        }
    };

    if let Err(e) = state.db_repo.rekey_registration(temporary_id, user_id).await {
        tracing::error!(error = %e, %temporary_id, %user_id, "Failed to move registration rows to the auth id.");
        compensate(&state, &[temporary_id, user_id], Some(user_id)).await;
        return Err(AppError::Database(e));
    }

    let welcome = mailer::templates::welcome(&rows.email, &rows.user_name, rows.plan, &state.settings.mail.site_url);
    if let Err(e) = state.mail_queue.enqueue(welcome) {
        tracing::warn!(error = %e, %user_id, "Could not queue the welcome email.");
    }

    tracing::info!(%user_id, plan = rows.plan.as_str(), "Registered a new account.");
    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse {
            user_id,
            participant_slug: rows.participant.map(|p| p.slug),
        }),
    ))
}

/// Resolves the submitted location. An address the geocoder cannot place
/// fails the registration before the database is touched.
async fn locate(state: &AppState, input: &RegistrationInput) -> Result<Option<(MapInfoInput, Option<(f64, f64)>)>, AppError> {
    match &input.map_info {
        Some(map_info) => {
            let coordinates = resolve_coordinates(state, map_info.coordinates(), Some(&map_info.address)).await?;
            Ok(Some((map_info.clone(), coordinates)))
        }
        None => Ok(None),
    }
}

/// Picks a free slug and assembles the rows. Runs before anything is written.
async fn prepare_rows(
    state: &AppState,
    input: &RegistrationInput,
    email: String,
    map_info: Option<(MapInfoInput, Option<(f64, f64)>)>,
) -> Result<RegistrationRows, AppError> {
    let participant = match &input.participant {
        Some(profile) => {
            let base = slugify(&profile.name);
            let taken = state.db_repo.slugs_with_prefix(&base).await?;
            Some(NewParticipant {
                id: Uuid::new_v4(),
                name: profile.name.clone(),
                slug: unique_slug(&base, &taken),
                short_description: profile.short_description.clone(),
                description: profile.description.clone(),
                website: profile.website.clone(),
            })
        }
        None => None,
    };

    Ok(RegistrationRows {
        user_id: Uuid::new_v4(),
        email,
        user_name: input.user_name.trim().to_string(),
        plan: input.plan,
        participant,
        invoice: input.invoice.clone(),
        map_info,
    })
}

/// Best-effort cleanup of a failed registration. Errors are logged and never
/// replace the error that triggered the cleanup.
async fn compensate(state: &AppState, user_ids: &[Uuid], auth_user: Option<Uuid>) {
    for user_id in user_ids {
        if let Err(e) = state.db_repo.delete_registration(*user_id).await {
            tracing::warn!(error = %e, %user_id, "Compensating delete of registration rows failed.");
        }
    }
    if let Some(user_id) = auth_user {
        if let Err(e) = state.auth.delete_user(user_id).await {
            tracing::warn!(error = %e, %user_id, "Compensating delete of the auth user failed.");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::build_router;
    use crate::test_support::{FakeAuth, FakeGeocoder, FakeStorage, state_with};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn participant_signup(address: &str) -> serde_json::Value {
        serde_json::json!({
            "email": "Studio@Example.com",
            "password": "long-enough-password",
            "user_name": "Studio",
            "plan": "participant",
            "participant": { "name": "Studio Nord" },
            "invoice": {
                "first_name": "Ada",
                "last_name": "Lovelace",
                "street": "Torstraße 1",
                "postal_code": "10119",
                "city": "Berlin",
                "country": "DE"
            },
            "map_info": { "address": address }
        })
    }

    async fn post_register(app: axum::Router, body: serde_json::Value) -> StatusCode {
        app.oneshot(
            Request::post("/api/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
    }

    // The test pool cannot reach a database, so any query would end in a 500.
    #[tokio::test]
    async fn unlocatable_address_fails_before_any_write() {
        let auth = Arc::new(FakeAuth::default());
        let geocoder = Arc::new(FakeGeocoder::default());
        let state = state_with(auth.clone(), geocoder.clone(), Arc::new(FakeStorage::default()));

        let status = post_register(build_router(state), participant_signup("Nowhere 0")).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(geocoder.calls(), 1);
        assert_eq!(auth.created(), 0);
    }

    #[tokio::test]
    async fn database_failure_never_creates_an_auth_user() {
        let auth = Arc::new(FakeAuth::default());
        let state = state_with(auth.clone(), Arc::new(FakeGeocoder::default()), Arc::new(FakeStorage::default()));
        let body = serde_json::json!({
            "email": "visitor@example.com",
            "password": "long-enough-password",
            "user_name": "Visitor",
            "plan": "free"
        });

        let status = post_register(build_router(state), body).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(auth.created(), 0);
        assert_eq!(auth.deleted(), 0);
    }
}
