use super::{DbRepository, PARTICIPANT_COLUMNS};
use crate::DbError;
use core_types::validation::clean;
use core_types::{CarryoverSummary, Participant, ReactivationRequest, ReactivationStatus};
use std::collections::HashSet;
use uuid::Uuid;

impl DbRepository {
    /// Starts a new tour edition: every participant is deactivated, then the
    /// selected ones are activated again and their reactivation state reset.
    pub async fn carry_over_participants(&self, participant_ids: &[Uuid]) -> Result<CarryoverSummary, DbError> {
        let mut tx = self.pool.begin().await?;

        let deactivated = sqlx::query("UPDATE participants SET is_active = FALSE WHERE is_active")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let activated = sqlx::query(
            "UPDATE participants SET is_active = TRUE, reactivation_status = NULL, \
             reactivation_message = NULL, reactivation_requested_at = NULL WHERE id = ANY($1)",
        )
        .bind(participant_ids)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let found: HashSet<Uuid> =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM participants WHERE id = ANY($1)")
                .bind(participant_ids)
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .collect();

        let (active_total, inactive_total) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*) FILTER (WHERE is_active), COUNT(*) FILTER (WHERE NOT is_active) FROM participants",
        )
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let missing = participant_ids
            .iter()
            .filter(|id| !found.contains(*id))
            .copied()
            .collect();

        Ok(CarryoverSummary {
            deactivated,
            activated,
            active_total,
            inactive_total,
            missing,
        })
    }

    /// Records a reactivation request. Returns `None` when the participant is
    /// active or already has a pending request.
    pub async fn request_reactivation(
        &self,
        participant_id: Uuid,
        message: Option<&str>,
    ) -> Result<Option<Participant>, DbError> {
        let sql = format!(
            "UPDATE participants SET reactivation_status = 'pending', reactivation_message = $2, \
             reactivation_requested_at = NOW() \
             WHERE id = $1 AND NOT is_active AND reactivation_status IS DISTINCT FROM 'pending' \
             RETURNING {PARTICIPANT_COLUMNS}"
        );
        let participant = sqlx::query_as::<_, Participant>(&sql)
            .bind(participant_id)
            .bind(clean(message))
            .fetch_optional(&self.pool)
            .await?;
        Ok(participant)
    }

    pub async fn pending_reactivations(&self) -> Result<Vec<ReactivationRequest>, DbError> {
        let requests = sqlx::query_as::<_, ReactivationRequest>(
            r#"
            SELECT p.id AS participant_id, p.name, u.email,
                   p.reactivation_message AS message, p.reactivation_requested_at AS requested_at
            FROM participants p
            JOIN users u ON u.id = p.user_id
            WHERE p.reactivation_status = 'pending'
            ORDER BY p.reactivation_requested_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    /// Approves or declines a pending request. Returns `None` when there is no
    /// pending request for the participant.
    pub async fn decide_reactivation(
        &self,
        participant_id: Uuid,
        approve: bool,
    ) -> Result<Option<Participant>, DbError> {
        let status = if approve {
            ReactivationStatus::Approved
        } else {
            ReactivationStatus::Declined
        };
        let sql = format!(
            "UPDATE participants SET reactivation_status = $2, is_active = is_active OR $3 \
             WHERE id = $1 AND reactivation_status = 'pending' \
             RETURNING {PARTICIPANT_COLUMNS}"
        );
        let participant = sqlx::query_as::<_, Participant>(&sql)
            .bind(participant_id)
            .bind(status)
            .bind(approve)
            .fetch_optional(&self.pool)
            .await?;
        Ok(participant)
    }
}
