use super::resolve_coordinates;
use crate::{AppState, auth::Moderator, error::AppError};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use core_types::payloads::{HubInput, RouteInput};
use core_types::{Hub, Route, Validate};
use std::sync::Arc;
use uuid::Uuid;

/// Fails with 404 when any of `ids` is not a participant.
async fn ensure_participants(state: &AppState, ids: &[Uuid]) -> Result<(), AppError> {
    let found = state.db_repo.existing_participant_ids(ids).await?;
    let missing: Vec<String> = ids
        .iter()
        .filter(|id| !found.contains(*id))
        .map(Uuid::to_string)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Unknown participants: {}", missing.join(", "))))
    }
}

/// Checks members and host, and resolves the hub location.
async fn prepare_hub(state: &AppState, input: &HubInput, hub_id: Option<Uuid>) -> Result<Option<(f64, f64)>, AppError> {
    input.validate()?;
    ensure_participants(state, &input.members()).await?;

    let hosts = state.db_repo.hosts_among(&input.members(), hub_id).await?;
    if !hosts.is_empty() {
        return Err(AppError::Conflict(
            "Participants hosting another hub cannot join this one".to_string(),
        ));
    }

    let given = input.latitude.zip(input.longitude);
    resolve_coordinates(state, given, input.address.as_deref()).await
}

/// # POST /api/admin/hubs
pub async fn post_hub(
    Moderator(_): Moderator,
    State(state): State<Arc<AppState>>,
    Json(input): Json<HubInput>,
) -> Result<(StatusCode, Json<Hub>), AppError> {
    let coordinates = prepare_hub(&state, &input, None).await?;
    let hub = state.db_repo.create_hub(&input, coordinates).await?;
    state.location_cache.clear().await;
    tracing::info!(hub_id = %hub.id, members = input.members().len(), "Hub created.");
    Ok((StatusCode::CREATED, Json(hub)))
}

/// # PUT /api/admin/hubs/:id
pub async fn put_hub(
    Moderator(_): Moderator,
    Path(hub_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(input): Json<HubInput>,
) -> Result<Json<Hub>, AppError> {
    if state.db_repo.get_hub(hub_id).await?.is_none() {
        return Err(AppError::NotFound(format!("No hub {hub_id}")));
    }
    let coordinates = prepare_hub(&state, &input, Some(hub_id)).await?;
    let hub = state.db_repo.update_hub(hub_id, &input, coordinates).await?;
    state.location_cache.clear().await;
    Ok(Json(hub))
}

/// # DELETE /api/admin/hubs/:id
pub async fn delete_hub(
    Moderator(_): Moderator,
    Path(hub_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, AppError> {
    state.db_repo.delete_hub(hub_id).await?;
    state.location_cache.clear().await;
    Ok(StatusCode::NO_CONTENT)
}

/// # POST /api/admin/routes
pub async fn post_route(
    Moderator(_): Moderator,
    State(state): State<Arc<AppState>>,
    Json(input): Json<RouteInput>,
) -> Result<(StatusCode, Json<Route>), AppError> {
    input.validate()?;
    ensure_participants(&state, &input.participant_ids).await?;
    let route = state.db_repo.create_route(&input).await?;
    Ok((StatusCode::CREATED, Json(route)))
}

/// # DELETE /api/admin/routes/:id
pub async fn delete_route(
    Moderator(_): Moderator,
    Path(route_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, AppError> {
    state.db_repo.delete_route(route_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
