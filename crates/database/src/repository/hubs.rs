use super::DbRepository;
use crate::DbError;
use core_types::payloads::{HubInput, RouteInput};
use core_types::validation::clean;
use core_types::{Hub, HubMembership, Route, RouteStop};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

const HUB_COLUMNS: &str =
    "id, name, description, address, latitude, longitude, host_participant_id, created_at";

impl DbRepository {
    pub async fn list_hubs(&self) -> Result<Vec<Hub>, DbError> {
        let sql = format!("SELECT {HUB_COLUMNS} FROM hubs ORDER BY lower(name)");
        let hubs = sqlx::query_as::<_, Hub>(&sql).fetch_all(&self.pool).await?;
        Ok(hubs)
    }

    pub async fn list_hub_memberships(&self) -> Result<Vec<HubMembership>, DbError> {
        let memberships = sqlx::query_as::<_, HubMembership>(
            "SELECT hub_id, participant_id FROM hub_participants",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(memberships)
    }

    pub async fn get_hub(&self, hub_id: Uuid) -> Result<Option<Hub>, DbError> {
        let sql = format!("SELECT {HUB_COLUMNS} FROM hubs WHERE id = $1");
        let hub = sqlx::query_as::<_, Hub>(&sql)
            .bind(hub_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(hub)
    }

    /// The hub a participant belongs to, if any.
    pub async fn hub_for_participant(&self, participant_id: Uuid) -> Result<Option<Hub>, DbError> {
        let hub = sqlx::query_as::<_, Hub>(
            r#"
            SELECT h.id, h.name, h.description, h.address, h.latitude, h.longitude, h.host_participant_id, h.created_at
            FROM hubs h
            JOIN hub_participants hp ON hp.hub_id = h.id
            WHERE hp.participant_id = $1
            "#,
        )
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(hub)
    }

    /// Participants among `ids` that host a hub other than `except`.
    pub async fn hosts_among(&self, ids: &[Uuid], except: Option<Uuid>) -> Result<Vec<Uuid>, DbError> {
        let hosts = sqlx::query_scalar::<_, Uuid>(
            "SELECT host_participant_id FROM hubs \
             WHERE host_participant_id = ANY($1) AND ($2::uuid IS NULL OR id <> $2)",
        )
        .bind(ids)
        .bind(except)
        .fetch_all(&self.pool)
        .await?;
        Ok(hosts)
    }

    pub async fn create_hub(&self, input: &HubInput, coordinates: Option<(f64, f64)>) -> Result<Hub, DbError> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "INSERT INTO hubs (id, name, description, address, latitude, longitude, host_participant_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) RETURNING {HUB_COLUMNS}"
        );
        let hub = sqlx::query_as::<_, Hub>(&sql)
            .bind(Uuid::new_v4())
            .bind(input.name.trim())
            .bind(clean(input.description.as_deref()))
            .bind(clean(input.address.as_deref()))
            .bind(coordinates.map(|c| c.0))
            .bind(coordinates.map(|c| c.1))
            .bind(input.host_participant_id)
            .fetch_one(&mut *tx)
            .await?;

        replace_members(&mut tx, hub.id, &input.members()).await?;
        tx.commit().await?;
        Ok(hub)
    }

    pub async fn update_hub(
        &self,
        hub_id: Uuid,
        input: &HubInput,
        coordinates: Option<(f64, f64)>,
    ) -> Result<Hub, DbError> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "UPDATE hubs SET name = $2, description = $3, address = $4, latitude = $5, longitude = $6, \
             host_participant_id = $7 WHERE id = $1 RETURNING {HUB_COLUMNS}"
        );
        let hub = sqlx::query_as::<_, Hub>(&sql)
            .bind(hub_id)
            .bind(input.name.trim())
            .bind(clean(input.description.as_deref()))
            .bind(clean(input.address.as_deref()))
            .bind(coordinates.map(|c| c.0))
            .bind(coordinates.map(|c| c.1))
            .bind(input.host_participant_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::from_query)?;

        replace_members(&mut tx, hub.id, &input.members()).await?;
        tx.commit().await?;
        Ok(hub)
    }

    pub async fn delete_hub(&self, hub_id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM hubs WHERE id = $1")
            .bind(hub_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    /// Moves a participant into `hub_id`, or out of any hub when `None`.
    pub async fn set_hub_membership(&self, participant_id: Uuid, hub_id: Option<Uuid>) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM hub_participants WHERE participant_id = $1")
            .bind(participant_id)
            .execute(&mut *tx)
            .await?;
        if let Some(hub_id) = hub_id {
            sqlx::query("INSERT INTO hub_participants (hub_id, participant_id) VALUES ($1, $2)")
                .bind(hub_id)
                .bind(participant_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    // --- Routes ---

    pub async fn list_routes(&self) -> Result<Vec<Route>, DbError> {
        let routes = sqlx::query_as::<_, Route>(
            "SELECT id, name, description, created_at FROM routes ORDER BY lower(name)",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(routes)
    }

    pub async fn list_route_stops(&self) -> Result<Vec<RouteStop>, DbError> {
        let stops = sqlx::query_as::<_, RouteStop>(
            "SELECT route_id, participant_id, position FROM route_stops ORDER BY route_id, position",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(stops)
    }

    pub async fn create_route(&self, input: &RouteInput) -> Result<Route, DbError> {
        let mut tx = self.pool.begin().await?;
        let route = sqlx::query_as::<_, Route>(
            "INSERT INTO routes (id, name, description, created_at) VALUES ($1, $2, $3, NOW()) \
             RETURNING id, name, description, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(input.name.trim())
        .bind(clean(input.description.as_deref()))
        .fetch_one(&mut *tx)
        .await?;

        for (position, participant_id) in input.participant_ids.iter().enumerate() {
            sqlx::query("INSERT INTO route_stops (route_id, participant_id, position) VALUES ($1, $2, $3)")
                .bind(route.id)
                .bind(participant_id)
                .bind(position as i32)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(route)
    }

    pub async fn delete_route(&self, route_id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM routes WHERE id = $1")
            .bind(route_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}

/// Sets the member list of a hub. Members leave whatever hub they were in.
async fn replace_members(
    tx: &mut Transaction<'_, Postgres>,
    hub_id: Uuid,
    members: &[Uuid],
) -> Result<(), DbError> {
    sqlx::query("DELETE FROM hub_participants WHERE hub_id = $1 OR participant_id = ANY($2)")
        .bind(hub_id)
        .bind(members)
        .execute(&mut **tx)
        .await?;
    for participant_id in members {
        sqlx::query("INSERT INTO hub_participants (hub_id, participant_id) VALUES ($1, $2)")
            .bind(hub_id)
            .bind(participant_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}
