//! Request extractors for the three access levels of the API.
//!
//! A bearer token is resolved through the auth provider, then the matching
//! `users` row is loaded. Handlers take [`AuthUser`], [`Moderator`] or
//! [`ParticipantUser`] as an argument to require that level.

use crate::{AppState, error::AppError};
use api_client::ApiError;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use core_types::{Participant, User};
use database::DbError;
use std::sync::Arc;

/// Any registered user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// A user with the moderator role.
#[derive(Debug, Clone)]
pub struct Moderator(pub User);

/// A user that owns a participant profile.
#[derive(Debug, Clone)]
pub struct ParticipantUser {
    pub user: User,
    pub participant: Participant,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized)?;

        let identity = state.auth.verify_token(bearer.token()).await.map_err(|e| match e {
            ApiError::Unauthorized => AppError::Unauthorized,
            other => AppError::Api(other),
        })?;

        match state.db_repo.get_user(identity.id).await {
            Ok(user) => Ok(AuthUser(user)),
            Err(DbError::NotFound) => {
                tracing::warn!(user_id = %identity.id, "Valid token without a registered account.");
                Err(AppError::Forbidden("No registered account for this login".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Moderator {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_moderator() {
            return Err(AppError::Forbidden("Moderator access required".to_string()));
        }
        Ok(Moderator(user))
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for ParticipantUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        let participant = state
            .db_repo
            .get_participant_by_user(user.id)
            .await?
            .ok_or_else(|| AppError::Forbidden("A participant profile is required".to_string()))?;
        Ok(ParticipantUser { user, participant })
    }
}
