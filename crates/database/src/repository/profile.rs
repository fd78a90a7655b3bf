use super::DbRepository;
use crate::DbError;
use core_types::payloads::{InvoiceInput, MapInfoInput, VisitingHoursInput};
use core_types::validation::clean;
use core_types::{InvoiceData, MapInfo, VisitingHours};
use uuid::Uuid;

impl DbRepository {
    pub async fn get_invoice(&self, user_id: Uuid) -> Result<Option<InvoiceData>, DbError> {
        let invoice = sqlx::query_as::<_, InvoiceData>(
            "SELECT user_id, company, first_name, last_name, street, postal_code, city, country, vat_id, updated_at \
             FROM invoice_data WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invoice)
    }

    pub async fn upsert_invoice(&self, user_id: Uuid, input: &InvoiceInput) -> Result<InvoiceData, DbError> {
        let invoice = sqlx::query_as::<_, InvoiceData>(
            r#"
            INSERT INTO invoice_data (user_id, company, first_name, last_name, street, postal_code, city, country, vat_id, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                company = EXCLUDED.company,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                street = EXCLUDED.street,
                postal_code = EXCLUDED.postal_code,
                city = EXCLUDED.city,
                country = EXCLUDED.country,
                vat_id = EXCLUDED.vat_id,
                updated_at = NOW()
            RETURNING user_id, company, first_name, last_name, street, postal_code, city, country, vat_id, updated_at
            "#,
        )
        .bind(user_id)
        .bind(clean(input.company.as_deref()))
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(input.street.trim())
        .bind(input.postal_code.trim())
        .bind(input.city.trim())
        .bind(input.country.trim().to_uppercase())
        .bind(clean(input.vat_id.as_deref()))
        .fetch_one(&self.pool)
        .await?;
        Ok(invoice)
    }

    pub async fn get_map_info(&self, user_id: Uuid) -> Result<Option<MapInfo>, DbError> {
        let map_info = sqlx::query_as::<_, MapInfo>(
            "SELECT user_id, location_name, address, latitude, longitude, is_hidden, updated_at \
             FROM map_info WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(map_info)
    }

    /// Stores the map location with already resolved coordinates.
    pub async fn upsert_map_info(
        &self,
        user_id: Uuid,
        input: &MapInfoInput,
        coordinates: Option<(f64, f64)>,
    ) -> Result<MapInfo, DbError> {
        let map_info = sqlx::query_as::<_, MapInfo>(
            r#"
            INSERT INTO map_info (user_id, location_name, address, latitude, longitude, is_hidden, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                location_name = EXCLUDED.location_name,
                address = EXCLUDED.address,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                is_hidden = EXCLUDED.is_hidden,
                updated_at = NOW()
            RETURNING user_id, location_name, address, latitude, longitude, is_hidden, updated_at
            "#,
        )
        .bind(user_id)
        .bind(clean(input.location_name.as_deref()))
        .bind(input.address.trim())
        .bind(coordinates.map(|c| c.0))
        .bind(coordinates.map(|c| c.1))
        .bind(input.is_hidden)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_info)
    }

    // --- Visiting hours ---

    pub async fn list_visiting_hours(&self, participant_id: Uuid) -> Result<Vec<VisitingHours>, DbError> {
        let hours = sqlx::query_as::<_, VisitingHours>(
            r#"
            SELECT vh.id, vh.participant_id, vh.event_day_id, vh.opens_at, vh.closes_at
            FROM visiting_hours vh
            JOIN event_days d ON d.id = vh.event_day_id
            WHERE vh.participant_id = $1
            ORDER BY d.date, vh.opens_at
            "#,
        )
        .bind(participant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(hours)
    }

    /// Replaces all of a participant's visiting hours within one transaction.
    pub async fn replace_visiting_hours(
        &self,
        participant_id: Uuid,
        input: &VisitingHoursInput,
    ) -> Result<Vec<VisitingHours>, DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM visiting_hours WHERE participant_id = $1")
            .bind(participant_id)
            .execute(&mut *tx)
            .await?;

        for slot in &input.hours {
            sqlx::query(
                "INSERT INTO visiting_hours (id, participant_id, event_day_id, opens_at, closes_at) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(Uuid::new_v4())
            .bind(participant_id)
            .bind(slot.event_day_id)
            .bind(slot.opens_at)
            .bind(slot.closes_at)
            .execute(&mut *tx) // Note: must use the transaction object `tx` here
            .await?;
        }

        tx.commit().await?;
        self.list_visiting_hours(participant_id).await
    }
}
