use crate::{AppState, error::AppError};
use axum::{
    Json,
    extract::{Path, State},
};
use core_types::map::{LocationHub, location_slots};
use core_types::{LocationDetail, MapView, build_map_view};
use std::sync::Arc;
use uuid::Uuid;

/// # GET /api/map
pub async fn get_map(State(state): State<Arc<AppState>>) -> Result<Json<MapView>, AppError> {
    let sources = state.db_repo.map_sources().await?;
    Ok(Json(build_map_view(sources)))
}

/// # GET /api/map/locations/:participant_id
/// Served from the location cache while the entry is fresh.
pub async fn get_location(
    Path(participant_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<LocationDetail>, AppError> {
    if let Some(detail) = state.location_cache.get(&participant_id).await {
        return Ok(Json(detail));
    }

    let generation = state.location_cache.generation().await;
    let detail = load_location(&state, participant_id).await?;
    if !state.location_cache.insert_if_current(participant_id, detail.clone(), generation).await {
        tracing::debug!(%participant_id, "Location changed while loading; not caching it.");
    }
    Ok(Json(detail))
}

async fn load_location(state: &AppState, participant_id: Uuid) -> Result<LocationDetail, AppError> {
    let row = state
        .db_repo
        .location_row(participant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No visible location for this participant".to_string()))?;

    let (images, hub, hours, days) = tokio::try_join!(
        state.db_repo.list_participant_images(participant_id),
        state.db_repo.hub_for_participant(participant_id),
        state.db_repo.list_visiting_hours(participant_id),
        state.db_repo.list_event_days(),
    )?;

    Ok(LocationDetail {
        participant_id: row.participant_id,
        name: row.name,
        slug: row.slug,
        short_description: row.short_description,
        website: row.website,
        location_name: row.location_name,
        address: row.address,
        latitude: row.latitude,
        longitude: row.longitude,
        hub: hub.map(|h| LocationHub {
            is_host: h.host_participant_id == participant_id,
            id: h.id,
            name: h.name,
        }),
        images: images.into_iter().map(|i| i.image_url).collect(),
        visiting_hours: location_slots(&hours, &days),
    })
}
