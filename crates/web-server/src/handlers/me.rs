use super::{remove_stored_images, resolve_coordinates};
use crate::{
    AppState,
    auth::{AuthUser, ParticipantUser},
    error::AppError,
};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use core_types::payloads::{
    HubMembershipInput, InvoiceInput, MapInfoInput, PlanChangeInput, ReactivationRequestInput, VisitingHoursInput,
};
use core_types::{
    CoreError, Hub, InvoiceData, MapInfo, Participant, ParticipantImage, Profile, User, Validate, VisitingHours,
};
use std::sync::Arc;
use uuid::Uuid;

/// # GET /api/me
pub async fn get_me(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Profile>, AppError> {
    let (participant, invoice, map_info) = tokio::try_join!(
        state.db_repo.get_participant_by_user(user.id),
        state.db_repo.get_invoice(user.id),
        state.db_repo.get_map_info(user.id),
    )?;

    let (hub, images, visiting_hours) = match &participant {
        Some(p) => tokio::try_join!(
            state.db_repo.hub_for_participant(p.id),
            state.db_repo.list_participant_images(p.id),
            state.db_repo.list_visiting_hours(p.id),
        )?,
        None => (None, Vec::new(), Vec::new()),
    };

    Ok(Json(Profile {
        user,
        participant,
        invoice,
        map_info,
        hub,
        images,
        visiting_hours,
    }))
}

/// # PUT /api/me/plan
/// Paid plans need invoice data on file.
pub async fn put_plan(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
    Json(input): Json<PlanChangeInput>,
) -> Result<Json<User>, AppError> {
    if input.plan.requires_invoice() && state.db_repo.get_invoice(user.id).await?.is_none() {
        return Err(AppError::Unprocessable(format!(
            "The {} plan requires invoice data",
            input.plan.as_str()
        )));
    }
    let user = state.db_repo.update_user_plan(user.id, input.plan).await?;
    tracing::info!(user_id = %user.id, plan = user.plan.as_str(), "Plan changed.");
    Ok(Json(user))
}

/// # PUT /api/me/invoice
pub async fn put_invoice(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
    Json(input): Json<InvoiceInput>,
) -> Result<Json<InvoiceData>, AppError> {
    input.validate()?;
    Ok(Json(state.db_repo.upsert_invoice(user.id, &input).await?))
}

/// # PUT /api/me/map-info
pub async fn put_map_info(
    ParticipantUser { user, participant }: ParticipantUser,
    State(state): State<Arc<AppState>>,
    Json(input): Json<MapInfoInput>,
) -> Result<Json<MapInfo>, AppError> {
    input.validate()?;
    let coordinates = resolve_coordinates(&state, input.coordinates(), Some(&input.address)).await?;
    let map_info = state.db_repo.upsert_map_info(user.id, &input, coordinates).await?;
    state.location_cache.invalidate(&participant.id).await;
    Ok(Json(map_info))
}

/// # PUT /api/me/hub
/// Joins, switches or leaves a hub. A host stays with the hub it hosts.
pub async fn put_hub(
    ParticipantUser { participant, .. }: ParticipantUser,
    State(state): State<Arc<AppState>>,
    Json(input): Json<HubMembershipInput>,
) -> Result<Json<Option<Hub>>, AppError> {
    let current = state.db_repo.hub_for_participant(participant.id).await?;
    if let Some(hub) = &current {
        if hub.host_participant_id == participant.id && input.hub_id != Some(hub.id) {
            return Err(AppError::Conflict("The host of a hub cannot leave it".to_string()));
        }
    }

    let target = match input.hub_id {
        Some(hub_id) => Some(
            state
                .db_repo
                .get_hub(hub_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("No hub {hub_id}")))?,
        ),
        None => None,
    };

    state.db_repo.set_hub_membership(participant.id, input.hub_id).await?;
    state.location_cache.invalidate(&participant.id).await;
    Ok(Json(target))
}

/// # PUT /api/me/visiting-hours
pub async fn put_visiting_hours(
    ParticipantUser { participant, .. }: ParticipantUser,
    State(state): State<Arc<AppState>>,
    Json(input): Json<VisitingHoursInput>,
) -> Result<Json<Vec<VisitingHours>>, AppError> {
    input.validate()?;
    if !state.db_repo.event_days_exist(&input.event_day_ids()).await? {
        return Err(CoreError::invalid("hours", "refers to an unknown event day").into());
    }
    let hours = state.db_repo.replace_visiting_hours(participant.id, &input).await?;
    state.location_cache.invalidate(&participant.id).await;
    Ok(Json(hours))
}

fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// # POST /api/me/images
/// Multipart upload with the image in the `file` field.
pub async fn post_image(
    ParticipantUser { participant, .. }: ParticipantUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ParticipantImage>), AppError> {
    let limits = &state.settings.uploads;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            upload = Some((content_type, bytes));
            break;
        }
    }
    let (content_type, bytes) = upload.ok_or_else(|| CoreError::invalid("file", "is required"))?;

    let extension = image_extension(&content_type)
        .ok_or_else(|| CoreError::invalid("file", "must be a JPEG, PNG or WebP image"))?;
    if bytes.is_empty() {
        return Err(CoreError::invalid("file", "is empty").into());
    }
    if bytes.len() > limits.max_image_bytes {
        return Err(CoreError::invalid(
            "file",
            format!("must not exceed {} bytes", limits.max_image_bytes),
        )
        .into());
    }
    if state.db_repo.count_participant_images(participant.id).await? >= limits.max_images_per_participant {
        return Err(AppError::Conflict(format!(
            "A participant can have at most {} images",
            limits.max_images_per_participant
        )));
    }

    let path = format!("participants/{}/{}.{}", participant.id, Uuid::new_v4(), extension);
    let url = state.storage.upload(&path, bytes.to_vec(), &content_type).await?;

    let image = match state.db_repo.insert_participant_image(participant.id, &url).await {
        Ok(image) => image,
        Err(e) => {
            remove_stored_images(&state, &[url]).await;
            return Err(e.into());
        }
    };

    state.location_cache.invalidate(&participant.id).await;
    Ok((StatusCode::CREATED, Json(image)))
}

/// # DELETE /api/me/images/:image_id
/// The row goes first; a storage object left behind is only logged.
pub async fn delete_image(
    ParticipantUser { participant, .. }: ParticipantUser,
    Path(image_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, AppError> {
    let image = state
        .db_repo
        .get_participant_image(image_id)
        .await?
        .filter(|image| image.participant_id == participant.id)
        .ok_or_else(|| AppError::NotFound(format!("No image {image_id}")))?;

    state.db_repo.delete_participant_image(image.id).await?;
    remove_stored_images(&state, &[image.image_url]).await;
    state.location_cache.invalidate(&participant.id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// # POST /api/me/reactivation
pub async fn post_reactivation(
    ParticipantUser { participant, .. }: ParticipantUser,
    State(state): State<Arc<AppState>>,
    Json(input): Json<ReactivationRequestInput>,
) -> Result<Json<Participant>, AppError> {
    input.validate()?;
    if participant.is_active {
        return Err(AppError::Conflict("The profile is already active".to_string()));
    }

    let updated = state
        .db_repo
        .request_reactivation(participant.id, input.message.as_deref())
        .await?
        .ok_or_else(|| AppError::Conflict("A reactivation request is already pending".to_string()))?;

    let mut moderators = state.db_repo.list_moderator_emails().await?;
    for email in &state.settings.mail.moderator_emails {
        if !moderators.iter().any(|m| m.eq_ignore_ascii_case(email)) {
            moderators.push(email.clone());
        }
    }

    if moderators.is_empty() {
        tracing::warn!(participant_id = %updated.id, "No moderator address to notify about a reactivation request.");
    } else {
        let email = mailer::templates::reactivation_requested(
            &moderators,
            &updated.name,
            updated.reactivation_message.as_deref(),
            &state.settings.mail.site_url,
        );
        if let Err(e) = state.mail_queue.enqueue(email) {
            tracing::warn!(error = %e, "Could not queue the reactivation notification.");
        }
    }

    Ok(Json(updated))
}
