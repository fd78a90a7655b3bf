use crate::{AppState, auth::Moderator, error::AppError};
use axum::{
    Json,
    extract::{Path, State},
};
use core_types::payloads::{BroadcastEmailInput, CarryoverInput, ReactivationDecisionInput, StickyInput};
use core_types::{CarryoverSummary, Participant, ReactivationRequest, Validate};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// # GET /api/admin/participants
pub async fn get_participants(
    Moderator(_): Moderator,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Participant>>, AppError> {
    Ok(Json(state.db_repo.list_participants().await?))
}

/// # PUT /api/admin/participants/:id/sticky
/// A year marks the participant as Citizen of Honour; `null` clears it.
pub async fn put_sticky(
    Moderator(_): Moderator,
    Path(participant_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(input): Json<StickyInput>,
) -> Result<Json<Participant>, AppError> {
    input.validate()?;
    Ok(Json(state.db_repo.set_sticky(participant_id, input.year).await?))
}

/// # POST /api/admin/tour/carryover
/// Starts a new tour with exactly the selected participants active.
pub async fn post_carryover(
    Moderator(moderator): Moderator,
    State(state): State<Arc<AppState>>,
    Json(input): Json<CarryoverInput>,
) -> Result<Json<CarryoverSummary>, AppError> {
    input.validate()?;
    let ids = input.deduplicated_ids();

    let summary = state.db_repo.carry_over_participants(&ids).await?;
    state.location_cache.clear().await;

    tracing::info!(
        moderator = %moderator.id,
        deactivated = summary.deactivated,
        activated = summary.activated,
        missing = summary.missing.len(),
        "Tour carryover completed."
    );
    Ok(Json(summary))
}

/// # GET /api/admin/reactivations
pub async fn get_reactivations(
    Moderator(_): Moderator,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ReactivationRequest>>, AppError> {
    Ok(Json(state.db_repo.pending_reactivations().await?))
}

/// # POST /api/admin/reactivations/:participant_id
pub async fn post_reactivation_decision(
    Moderator(_): Moderator,
    Path(participant_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(input): Json<ReactivationDecisionInput>,
) -> Result<Json<Participant>, AppError> {
    // 404 for unknown participants, 409 for ones without a pending request.
    state.db_repo.get_participant(participant_id).await?;
    let participant = state
        .db_repo
        .decide_reactivation(participant_id, input.approve)
        .await?
        .ok_or_else(|| AppError::Conflict("There is no pending reactivation request".to_string()))?;
    state.location_cache.invalidate(&participant_id).await;

    let contacts = state.db_repo.participant_contacts(&[participant_id]).await?;
    for contact in contacts {
        let email = mailer::templates::reactivation_decided(
            &contact.email,
            &contact.name,
            input.approve,
            &state.settings.mail.site_url,
        );
        if let Err(e) = state.mail_queue.enqueue(email) {
            tracing::warn!(error = %e, %participant_id, "Could not queue the reactivation decision email.");
        }
    }

    tracing::info!(%participant_id, approved = input.approve, "Reactivation request decided.");
    Ok(Json(participant))
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastResult {
    pub sent: usize,
    pub failed: usize,
}

/// # POST /api/admin/emails
/// Sends one email per selected participant and reports how many went out.
/// Ids without a participant count as failed.
pub async fn post_emails(
    Moderator(moderator): Moderator,
    State(state): State<Arc<AppState>>,
    Json(input): Json<BroadcastEmailInput>,
) -> Result<Json<BroadcastResult>, AppError> {
    input.validate()?;

    let mut ids = input.participant_ids.clone();
    ids.sort();
    ids.dedup();
    let contacts = state.db_repo.participant_contacts(&ids).await?;

    let mut result = BroadcastResult {
        failed: ids.len().saturating_sub(contacts.len()),
        ..Default::default()
    };
    for contact in &contacts {
        let email = mailer::templates::broadcast(&contact.email, &input.subject, &input.body);
        match state.mailer.send(&email).await {
            Ok(()) => result.sent += 1,
            Err(e) => {
                tracing::warn!(error = %e, participant_id = %contact.participant_id, "Broadcast email failed.");
                result.failed += 1;
            }
        }
    }

    tracing::info!(moderator = %moderator.id, sent = result.sent, failed = result.failed, "Broadcast sent.");
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{default_state, moderator};

    #[tokio::test]
    async fn carryover_needs_at_least_one_participant() {
        let input = CarryoverInput { participant_ids: vec![] };
        let result = post_carryover(moderator(), State(default_state()), Json(input)).await;
        match result.err() {
            Some(AppError::Validation(e)) => assert_eq!(e.field(), "participant_ids"),
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn broadcast_without_subject_is_rejected() {
        let input = BroadcastEmailInput {
            participant_ids: vec![Uuid::new_v4()],
            subject: "  ".to_string(),
            body: "See you at the opening.".to_string(),
        };
        let result = post_emails(moderator(), State(default_state()), Json(input)).await;
        match result.err() {
            Some(AppError::Validation(e)) => assert_eq!(e.field(), "subject"),
            other => panic!("expected a validation error, got {other:?}"),
        }
    }
}
