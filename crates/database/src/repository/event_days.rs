use super::DbRepository;
use crate::DbError;
use core_types::payloads::EventDayInput;
use core_types::validation::clean;
use core_types::{EventDay, EventImage, SyncPlan};
use uuid::Uuid;

impl DbRepository {
    pub async fn list_event_days(&self) -> Result<Vec<EventDay>, DbError> {
        let days = sqlx::query_as::<_, EventDay>(
            "SELECT id, date, label, start_time, end_time FROM event_days ORDER BY date",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(days)
    }

    /// True when every id in `ids` is a known event day.
    pub async fn event_days_exist(&self, ids: &[Uuid]) -> Result<bool, DbError> {
        if ids.is_empty() {
            return Ok(true);
        }
        let found = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM event_days WHERE id = ANY($1)")
            .bind(ids)
            .fetch_one(&self.pool)
            .await?;
        Ok(found as usize == ids.len())
    }

    pub async fn event_images_for_days(&self, day_ids: &[Uuid]) -> Result<Vec<EventImage>, DbError> {
        let images = sqlx::query_as::<_, EventImage>(
            "SELECT id, event_day_id, participant_id, image_url FROM event_images WHERE event_day_id = ANY($1)",
        )
        .bind(day_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    /// Applies an event-days edit: removes the event images of deleted days,
    /// then the days themselves (their visiting hours cascade), then writes
    /// the submitted days. Returns the re-fetched list.
    pub async fn sync_event_days(&self, plan: &SyncPlan<'_, EventDayInput>) -> Result<Vec<EventDay>, DbError> {
        let mut tx = self.pool.begin().await?;

        if !plan.deletes.is_empty() {
            let removed_images = sqlx::query("DELETE FROM event_images WHERE event_day_id = ANY($1)")
                .bind(&plan.deletes)
                .execute(&mut *tx)
                .await?;
            let removed_days = sqlx::query("DELETE FROM event_days WHERE id = ANY($1)")
                .bind(&plan.deletes)
                .execute(&mut *tx)
                .await?;
            tracing::info!(
                days = removed_days.rows_affected(),
                images = removed_images.rows_affected(),
                "Removed event days."
            );
        }

        for entry in &plan.upserts {
            let day = entry.item;
            let sql = if entry.is_new {
                "INSERT INTO event_days (id, date, label, start_time, end_time) VALUES ($1, $2, $3, $4, $5)"
            } else {
                "UPDATE event_days SET date = $2, label = $3, start_time = $4, end_time = $5 WHERE id = $1"
            };
            sqlx::query(sql)
                .bind(entry.id)
                .bind(day.date)
                .bind(clean(day.label.as_deref()))
                .bind(day.start_time)
                .bind(day.end_time)
                .execute(&mut *tx)
                .await
                .map_err(DbError::from_query)?;
        }

        tx.commit().await.map_err(DbError::from_query)?;
        self.list_event_days().await
    }
}
