//! Moderator edits of the public site lists. Each list is submitted whole
//! and diffed against what is stored.

use super::remove_stored_images;
use crate::{AppState, auth::Moderator, error::AppError};
use axum::{
    Json,
    extract::{Path, State},
};
use core_types::payloads::{AboutSectionInput, CitizensInput, EventDaysInput, PlansInput, SponsorsInput};
use core_types::{
    AboutSection, AboutSectionContent, Citizen, EventDay, Plan, Sponsor, Validate, orphaned_urls, plan_sync,
};
use std::sync::Arc;
use uuid::Uuid;

/// # PUT /api/admin/about/:section
pub async fn put_about_section(
    Moderator(moderator): Moderator,
    Path(section): Path<AboutSection>,
    State(state): State<Arc<AppState>>,
    Json(input): Json<AboutSectionInput>,
) -> Result<Json<AboutSectionContent>, AppError> {
    input.validate_for(section)?;

    let current = state.db_repo.get_about_section(section).await?;
    let existing: Vec<Uuid> = current.items.iter().map(|i| i.id).collect();
    let plan = plan_sync(&existing, &input.items);
    let saved = state.db_repo.sync_about_section(section, &input, &plan).await?;

    let orphans = orphaned_urls(current.items.iter().map(|i| i.image_url.as_deref()), &input.items);
    remove_stored_images(&state, &orphans).await;

    tracing::info!(
        moderator = %moderator.id,
        ?section,
        inserted = plan.inserts().count(),
        updated = plan.updates().count(),
        deleted = plan.deletes.len(),
        "About section saved."
    );
    Ok(Json(saved))
}

/// # PUT /api/admin/sponsors
pub async fn put_sponsors(
    Moderator(_): Moderator,
    State(state): State<Arc<AppState>>,
    Json(input): Json<SponsorsInput>,
) -> Result<Json<Vec<Sponsor>>, AppError> {
    input.validate()?;

    let current = state.db_repo.list_sponsors().await?;
    let existing: Vec<Uuid> = current.iter().map(|s| s.id).collect();
    let plan = plan_sync(&existing, &input.sponsors);
    let saved = state.db_repo.sync_sponsors(&plan).await?;

    let orphans = orphaned_urls(current.iter().map(|s| s.logo_url.as_deref()), &input.sponsors);
    remove_stored_images(&state, &orphans).await;
    Ok(Json(saved))
}

/// # PUT /api/admin/plans
/// Returns every plan, inactive ones included.
pub async fn put_plans(
    Moderator(_): Moderator,
    State(state): State<Arc<AppState>>,
    Json(input): Json<PlansInput>,
) -> Result<Json<Vec<Plan>>, AppError> {
    input.validate()?;

    let existing: Vec<Uuid> = state.db_repo.list_plans(false).await?.iter().map(|p| p.id).collect();
    let plan = plan_sync(&existing, &input.plans);
    Ok(Json(state.db_repo.sync_plans(&plan).await?))
}

/// # PUT /api/admin/citizens/:year
pub async fn put_citizens(
    Moderator(_): Moderator,
    Path(year): Path<i32>,
    State(state): State<Arc<AppState>>,
    Json(input): Json<CitizensInput>,
) -> Result<Json<Vec<Citizen>>, AppError> {
    input.validate_for_year(year)?;

    let current = state.db_repo.list_citizens(year).await?;
    let existing: Vec<Uuid> = current.iter().map(|c| c.id).collect();
    let plan = plan_sync(&existing, &input.citizens);
    let saved = state.db_repo.sync_citizens(year, &plan).await?;

    let orphans = orphaned_urls(current.iter().map(|c| c.image_url.as_deref()), &input.citizens);
    remove_stored_images(&state, &orphans).await;
    Ok(Json(saved))
}

/// # PUT /api/admin/event-days
/// Removing a day also removes its event images and visiting hours.
pub async fn put_event_days(
    Moderator(_): Moderator,
    State(state): State<Arc<AppState>>,
    Json(input): Json<EventDaysInput>,
) -> Result<Json<Vec<EventDay>>, AppError> {
    input.validate()?;

    let existing: Vec<Uuid> = state.db_repo.list_event_days().await?.iter().map(|d| d.id).collect();
    let plan = plan_sync(&existing, &input.days);
    let doomed_images = state.db_repo.event_images_for_days(&plan.deletes).await?;

    let saved = state.db_repo.sync_event_days(&plan).await?;

    let urls: Vec<String> = doomed_images.into_iter().map(|i| i.image_url).collect();
    remove_stored_images(&state, &urls).await;
    if !plan.deletes.is_empty() {
        // Visiting hours of the removed days are gone from every location.
        state.location_cache.clear().await;
    }
    Ok(Json(saved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{default_state, moderator};
    use chrono::{NaiveDate, NaiveTime};
    use core_types::payloads::EventDayInput;

    fn day(date: NaiveDate, start: u32, end: u32) -> EventDayInput {
        EventDayInput {
            id: None,
            date,
            label: None,
            start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn event_days_on_the_same_date_are_rejected() {
        let friday = NaiveDate::from_ymd_opt(2025, 9, 19).unwrap();
        let input = EventDaysInput { days: vec![day(friday, 10, 18), day(friday, 12, 20)] };

        let result = put_event_days(moderator(), State(default_state()), Json(input)).await;
        match result.err() {
            Some(AppError::Validation(e)) => assert_eq!(e.field(), "days.date"),
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn event_days_must_end_after_they_start() {
        let saturday = NaiveDate::from_ymd_opt(2025, 9, 20).unwrap();
        let input = EventDaysInput { days: vec![day(saturday, 18, 10)] };

        let result = put_event_days(moderator(), State(default_state()), Json(input)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
