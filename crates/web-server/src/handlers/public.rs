use crate::{AppState, error::AppError};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{Datelike, Utc};
use core_types::{
    AboutSection, AboutSectionContent, Citizen, EventDay, ParticipantCard, Plan, PublicParticipant, Sponsor,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// # GET /api/about/:section
/// Items of a hidden section are not published.
pub async fn get_about_section(
    Path(section): Path<AboutSection>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<AboutSectionContent>, AppError> {
    let mut content = state.db_repo.get_about_section(section).await?;
    if !content.is_visible {
        content.items.clear();
    }
    Ok(Json(content))
}

/// # GET /api/sponsors
pub async fn get_sponsors(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Sponsor>>, AppError> {
    Ok(Json(state.db_repo.list_sponsors().await?))
}

/// # GET /api/plans
pub async fn get_plans(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Plan>>, AppError> {
    Ok(Json(state.db_repo.list_plans(true).await?))
}

#[derive(Debug, Deserialize)]
pub struct CitizensQuery {
    year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct CitizensResponse {
    pub year: i32,
    pub citizens: Vec<Citizen>,
}

/// # GET /api/citizens?year=
/// Without a year, the latest year with citizens (or the current year) is used.
pub async fn get_citizens(
    Query(query): Query<CitizensQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<CitizensResponse>, AppError> {
    let year = match query.year {
        Some(year) => year,
        None => state
            .db_repo
            .latest_citizen_year()
            .await?
            .unwrap_or_else(|| Utc::now().year()),
    };
    let citizens = state.db_repo.list_citizens(year).await?;
    Ok(Json(CitizensResponse { year, citizens }))
}

/// # GET /api/event-days
pub async fn get_event_days(State(state): State<Arc<AppState>>) -> Result<Json<Vec<EventDay>>, AppError> {
    Ok(Json(state.db_repo.list_event_days().await?))
}

/// # GET /api/participants/carousel
pub async fn get_carousel(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ParticipantCard>>, AppError> {
    Ok(Json(state.db_repo.carousel_cards().await?))
}

/// # GET /api/participants/:slug
pub async fn get_participant(
    Path(slug): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PublicParticipant>, AppError> {
    let participant = state
        .db_repo
        .get_participant_by_slug(&slug)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFound(format!("No participant '{slug}'")))?;

    let (images, hub, visiting_hours) = tokio::try_join!(
        state.db_repo.list_participant_images(participant.id),
        state.db_repo.hub_for_participant(participant.id),
        state.db_repo.list_visiting_hours(participant.id),
    )?;

    Ok(Json(PublicParticipant {
        id: participant.id,
        name: participant.name,
        slug: participant.slug,
        short_description: participant.short_description,
        description: participant.description,
        website: participant.website,
        is_sticky: participant.is_sticky,
        sticky_year: participant.sticky_year,
        images: images.into_iter().map(|i| i.image_url).collect(),
        hub,
        visiting_hours,
    }))
}
