//! The merged view behind the public map.
//!
//! Participants, hubs, hub memberships, images and route stops come from
//! separate queries; `build_map_view` joins them in memory.

use crate::structs::{Hub, HubMembership, Route, RouteStop, VisitingHours};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

/// An active participant with a visible, geocoded location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MapParticipantRow {
    pub participant_id: Uuid,
    pub name: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub location_name: Option<String>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapParticipant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub location_name: Option<String>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub image_url: Option<String>,
    pub hub_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapHub {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub host_participant_id: Uuid,
    pub participants: Vec<MapParticipant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRouteStop {
    pub participant_id: Uuid,
    pub name: String,
    pub slug: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRoute {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub stops: Vec<MapRouteStop>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub hubs: Vec<MapHub>,
    /// Participants not shown under a hub.
    pub participants: Vec<MapParticipant>,
    pub routes: Vec<MapRoute>,
}

/// Raw inputs for [`build_map_view`].
#[derive(Debug, Clone, Default)]
pub struct MapSources {
    pub participants: Vec<MapParticipantRow>,
    pub first_images: HashMap<Uuid, String>,
    pub hubs: Vec<Hub>,
    pub memberships: Vec<HubMembership>,
    pub routes: Vec<Route>,
    pub route_stops: Vec<RouteStop>,
}

fn by_name(a: &MapParticipant, b: &MapParticipant) -> std::cmp::Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}

pub fn build_map_view(sources: MapSources) -> MapView {
    let MapSources {
        participants,
        mut first_images,
        hubs,
        memberships,
        routes,
        route_stops,
    } = sources;

    let hub_of: HashMap<Uuid, Uuid> = memberships
        .iter()
        .map(|m| (m.participant_id, m.hub_id))
        .collect();

    let visible: HashMap<Uuid, MapParticipant> = participants
        .into_iter()
        .map(|row| {
            let participant = MapParticipant {
                id: row.participant_id,
                image_url: first_images.remove(&row.participant_id),
                hub_id: hub_of.get(&row.participant_id).copied(),
                name: row.name,
                slug: row.slug,
                short_description: row.short_description,
                location_name: row.location_name,
                address: row.address,
                latitude: row.latitude,
                longitude: row.longitude,
            };
            (participant.id, participant)
        })
        .collect();

    let known_hubs: HashMap<Uuid, &Hub> = hubs.iter().map(|h| (h.id, h)).collect();

    let mut members_by_hub: HashMap<Uuid, Vec<MapParticipant>> = HashMap::new();
    let mut standalone: Vec<MapParticipant> = Vec::new();
    for participant in visible.values() {
        match participant.hub_id.filter(|id| known_hubs.contains_key(id)) {
            Some(hub_id) => members_by_hub.entry(hub_id).or_default().push(participant.clone()),
            None => standalone.push(participant.clone()),
        }
    }

    let mut map_hubs: Vec<MapHub> = hubs
        .iter()
        .filter_map(|hub| {
            let host = visible.get(&hub.host_participant_id);
            let (latitude, longitude) = match (hub.latitude.zip(hub.longitude), host) {
                (Some(coords), _) => coords,
                (None, Some(host)) => (host.latitude, host.longitude),
                (None, None) => return None,
            };
            let mut members = members_by_hub.remove(&hub.id).unwrap_or_default();
            members.sort_by(|a, b| {
                let a_host = a.id == hub.host_participant_id;
                let b_host = b.id == hub.host_participant_id;
                b_host.cmp(&a_host).then_with(|| by_name(a, b))
            });
            Some(MapHub {
                id: hub.id,
                name: hub.name.clone(),
                description: hub.description.clone(),
                address: hub.address.clone(),
                latitude,
                longitude,
                host_participant_id: hub.host_participant_id,
                participants: members,
            })
        })
        .collect();
    map_hubs.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    // Members of hubs that could not be placed are shown on their own.
    for participant in members_by_hub.into_values().flatten() {
        standalone.push(MapParticipant { hub_id: None, ..participant });
    }
    standalone.sort_by(by_name);

    let mut stops_by_route: HashMap<Uuid, Vec<RouteStop>> = HashMap::new();
    for stop in route_stops {
        stops_by_route.entry(stop.route_id).or_default().push(stop);
    }

    let map_routes = routes
        .into_iter()
        .filter_map(|route| {
            let mut stops = stops_by_route.remove(&route.id).unwrap_or_default();
            stops.sort_by_key(|s| s.position);
            let stops: Vec<MapRouteStop> = stops
                .iter()
                .filter_map(|stop| visible.get(&stop.participant_id))
                .map(|p| MapRouteStop {
                    participant_id: p.id,
                    name: p.name.clone(),
                    slug: p.slug.clone(),
                    latitude: p.latitude,
                    longitude: p.longitude,
                })
                .collect();
            if stops.len() < 2 {
                return None;
            }
            Some(MapRoute {
                id: route.id,
                name: route.name,
                description: route.description,
                stops,
            })
        })
        .collect();

    MapView {
        hubs: map_hubs,
        participants: standalone,
        routes: map_routes,
    }
}

// --- Location lookup ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationHub {
    pub id: Uuid,
    pub name: String,
    pub is_host: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSlot {
    pub date: NaiveDate,
    pub label: Option<String>,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
}

/// Everything the map popup shows for one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDetail {
    pub participant_id: Uuid,
    pub name: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub website: Option<String>,
    pub location_name: Option<String>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub hub: Option<LocationHub>,
    pub images: Vec<String>,
    pub visiting_hours: Vec<LocationSlot>,
}

/// Resolves visiting hours against event days and orders them by date and opening time.
pub fn location_slots(
    hours: &[VisitingHours],
    days: &[crate::structs::EventDay],
) -> Vec<LocationSlot> {
    let days: HashMap<Uuid, &crate::structs::EventDay> = days.iter().map(|d| (d.id, d)).collect();
    let mut slots: Vec<LocationSlot> = hours
        .iter()
        .filter_map(|h| {
            days.get(&h.event_day_id).map(|day| LocationSlot {
                date: day.date,
                label: day.label.clone(),
                opens_at: h.opens_at,
                closes_at: h.closes_at,
            })
        })
        .collect();
    slots.sort_by_key(|s| (s.date, s.opens_at));
    slots
}
