use super::{DbRepository, PARTICIPANT_COLUMNS};
use crate::DbError;
use core_types::{Participant, ParticipantCard, ParticipantImage};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

/// Name and email of a participant's owner, used for outgoing mail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ParticipantContact {
    pub participant_id: Uuid,
    pub name: String,
    pub email: String,
}

impl DbRepository {
    pub async fn get_participant(&self, participant_id: Uuid) -> Result<Participant, DbError> {
        let sql = format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = $1");
        sqlx::query_as::<_, Participant>(&sql)
            .bind(participant_id)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from_query)
    }

    pub async fn get_participant_by_user(&self, user_id: Uuid) -> Result<Option<Participant>, DbError> {
        let sql = format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE user_id = $1");
        let participant = sqlx::query_as::<_, Participant>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(participant)
    }

    pub async fn get_participant_by_slug(&self, slug: &str) -> Result<Option<Participant>, DbError> {
        let sql = format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE slug = $1");
        let participant = sqlx::query_as::<_, Participant>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(participant)
    }

    pub async fn list_participants(&self) -> Result<Vec<Participant>, DbError> {
        let sql = format!("SELECT {PARTICIPANT_COLUMNS} FROM participants ORDER BY lower(name)");
        let participants = sqlx::query_as::<_, Participant>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(participants)
    }

    /// Ids out of `ids` that exist as participants.
    pub async fn existing_participant_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, DbError> {
        let found = sqlx::query_scalar::<_, Uuid>("SELECT id FROM participants WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(found)
    }

    /// Slugs equal to `base` or derived from it (`base-2`, `base-3`, ...).
    pub async fn slugs_with_prefix(&self, base: &str) -> Result<Vec<String>, DbError> {
        let slugs = sqlx::query_scalar::<_, String>(
            "SELECT slug FROM participants WHERE slug = $1 OR slug LIKE $1 || '-%'",
        )
        .bind(base)
        .fetch_all(&self.pool)
        .await?;
        Ok(slugs)
    }

    /// Marks a participant as Citizen of Honour for `year`, or clears the flag.
    pub async fn set_sticky(&self, participant_id: Uuid, year: Option<i32>) -> Result<Participant, DbError> {
        let sql = format!(
            "UPDATE participants SET is_sticky = $2 IS NOT NULL, sticky_year = $2 \
             WHERE id = $1 RETURNING {PARTICIPANT_COLUMNS}"
        );
        sqlx::query_as::<_, Participant>(&sql)
            .bind(participant_id)
            .bind(year)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from_query)
    }

    pub async fn participant_contacts(&self, ids: &[Uuid]) -> Result<Vec<ParticipantContact>, DbError> {
        let contacts = sqlx::query_as::<_, ParticipantContact>(
            r#"
            SELECT p.id AS participant_id, p.name, u.email
            FROM participants p
            JOIN users u ON u.id = p.user_id
            WHERE p.id = ANY($1)
            ORDER BY lower(p.name)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(contacts)
    }

    /// Active participants with at least one image, Citizens of Honour first.
    pub async fn carousel_cards(&self) -> Result<Vec<ParticipantCard>, DbError> {
        let cards = sqlx::query_as::<_, ParticipantCard>(
            r#"
            SELECT p.id, p.name, p.slug, p.short_description, img.image_url, p.is_sticky
            FROM participants p
            JOIN LATERAL (
                SELECT image_url FROM participant_images
                WHERE participant_id = p.id
                ORDER BY position, created_at
                LIMIT 1
            ) img ON TRUE
            WHERE p.is_active
            ORDER BY p.is_sticky DESC, lower(p.name)
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(cards)
    }

    // --- Images ---

    pub async fn list_participant_images(&self, participant_id: Uuid) -> Result<Vec<ParticipantImage>, DbError> {
        let images = sqlx::query_as::<_, ParticipantImage>(
            "SELECT id, participant_id, image_url, position, created_at FROM participant_images \
             WHERE participant_id = $1 ORDER BY position, created_at",
        )
        .bind(participant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    pub async fn count_participant_images(&self, participant_id: Uuid) -> Result<i64, DbError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM participant_images WHERE participant_id = $1",
        )
        .bind(participant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Appends an image after the participant's current last one.
    pub async fn insert_participant_image(
        &self,
        participant_id: Uuid,
        image_url: &str,
    ) -> Result<ParticipantImage, DbError> {
        let image = sqlx::query_as::<_, ParticipantImage>(
            r#"
            INSERT INTO participant_images (id, participant_id, image_url, position, created_at)
            SELECT $1, $2, $3, COALESCE(MAX(position) + 1, 0), NOW()
            FROM participant_images WHERE participant_id = $2
            RETURNING id, participant_id, image_url, position, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(participant_id)
        .bind(image_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(image)
    }

    pub async fn get_participant_image(&self, image_id: Uuid) -> Result<Option<ParticipantImage>, DbError> {
        let image = sqlx::query_as::<_, ParticipantImage>(
            "SELECT id, participant_id, image_url, position, created_at FROM participant_images WHERE id = $1",
        )
        .bind(image_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(image)
    }

    pub async fn delete_participant_image(&self, image_id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM participant_images WHERE id = $1")
            .bind(image_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    /// The first image of every participant that has one.
    pub async fn first_images(&self) -> Result<HashMap<Uuid, String>, DbError> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT DISTINCT ON (participant_id) participant_id, image_url FROM participant_images \
             ORDER BY participant_id, position, created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }
}
