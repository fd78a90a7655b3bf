use super::DbRepository;
use crate::DbError;
use core_types::map::{MapParticipantRow, MapSources};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A visible participant's location joined with its public profile fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LocationRow {
    pub participant_id: Uuid,
    pub name: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub website: Option<String>,
    pub location_name: Option<String>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl DbRepository {
    /// Active participants whose map location is geocoded and not hidden.
    pub async fn map_participants(&self) -> Result<Vec<MapParticipantRow>, DbError> {
        let rows = sqlx::query_as::<_, MapParticipantRow>(
            r#"
            SELECT p.id AS participant_id, p.name, p.slug, p.short_description,
                   m.location_name, m.address, m.latitude, m.longitude
            FROM participants p
            JOIN map_info m ON m.user_id = p.user_id
            WHERE p.is_active
              AND NOT m.is_hidden
              AND m.latitude IS NOT NULL
              AND m.longitude IS NOT NULL
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Loads every table the map view is built from.
    ///
    /// The queries are independent, so they run concurrently.
    pub async fn map_sources(&self) -> Result<MapSources, DbError> {
        let (participants, first_images, hubs, memberships, routes, route_stops) = tokio::join!(
            self.map_participants(),
            self.first_images(),
            self.list_hubs(),
            self.list_hub_memberships(),
            self.list_routes(),
            self.list_route_stops(),
        );

        Ok(MapSources {
            participants: participants?,
            first_images: first_images?,
            hubs: hubs?,
            memberships: memberships?,
            routes: routes?,
            route_stops: route_stops?,
        })
    }

    /// The location of one active, visible participant.
    pub async fn location_row(&self, participant_id: Uuid) -> Result<Option<LocationRow>, DbError> {
        let row = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT p.id AS participant_id, p.name, p.slug, p.short_description, p.website,
                   m.location_name, m.address, m.latitude, m.longitude
            FROM participants p
            JOIN map_info m ON m.user_id = p.user_id
            WHERE p.id = $1
              AND p.is_active
              AND NOT m.is_hidden
              AND m.latitude IS NOT NULL
              AND m.longitude IS NOT NULL
            "#,
        )
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
