use crate::enums::{AboutSection, PlanKind, ReactivationStatus, SponsorType, UserRole};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row of the `users` table. The id is the one minted by the auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub user_name: String,
    pub role: UserRole,
    pub plan: PlanKind,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_moderator(&self) -> bool {
        self.role == UserRole::Moderator
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Participant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
    /// Citizen of Honour flag, together with the year it applies to.
    pub is_sticky: bool,
    pub sticky_year: Option<i32>,
    pub reactivation_status: Option<ReactivationStatus>,
    pub reactivation_message: Option<String>,
    pub reactivation_requested_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    pub fn has_pending_reactivation(&self) -> bool {
        self.reactivation_status == Some(ReactivationStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ParticipantImage {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub image_url: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InvoiceData {
    pub user_id: Uuid,
    pub company: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    pub vat_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MapInfo {
    pub user_id: Uuid,
    pub location_name: Option<String>,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_hidden: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Hub {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub host_participant_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HubMembership {
    pub hub_id: Uuid,
    pub participant_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Route {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RouteStop {
    pub route_id: Uuid,
    pub participant_id: Uuid,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Sponsor {
    pub id: Uuid,
    pub name: String,
    pub website: Option<String>,
    pub sponsor_type: SponsorType,
    pub logo_url: Option<String>,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Plan {
    pub id: Uuid,
    pub kind: PlanKind,
    pub name: String,
    pub price_cents: i32,
    pub currency: String,
    pub features: Vec<String>,
    pub is_active: bool,
    pub position: i32,
}

/// A Citizen of Honour entry for one edition year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Citizen {
    pub id: Uuid,
    pub year: i32,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub website: Option<String>,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EventDay {
    pub id: Uuid,
    pub date: NaiveDate,
    pub label: Option<String>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EventImage {
    pub id: Uuid,
    pub event_day_id: Uuid,
    pub participant_id: Uuid,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct VisitingHours {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub event_day_id: Uuid,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AboutSectionMeta {
    pub section: AboutSection,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AboutItem {
    pub id: Uuid,
    pub section: AboutSection,
    pub title: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub image_url: Option<String>,
    pub position: i32,
}

/// An About section as served to the public page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AboutSectionContent {
    pub section: AboutSection,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_visible: bool,
    pub items: Vec<AboutItem>,
}

/// One entry of the participants carousel on the homepage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ParticipantCard {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub image_url: String,
    pub is_sticky: bool,
}

/// Summary returned by the tour carryover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryoverSummary {
    pub deactivated: u64,
    pub activated: u64,
    pub active_total: i64,
    pub inactive_total: i64,
    pub missing: Vec<Uuid>,
}

/// A pending reactivation request joined with its owner's contact data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ReactivationRequest {
    pub participant_id: Uuid,
    pub name: String,
    pub email: String,
    pub message: Option<String>,
    pub requested_at: Option<DateTime<Utc>>,
}

/// Everything the dashboard shows about the signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user: User,
    pub participant: Option<Participant>,
    pub invoice: Option<InvoiceData>,
    pub map_info: Option<MapInfo>,
    pub hub: Option<Hub>,
    pub images: Vec<ParticipantImage>,
    pub visiting_hours: Vec<VisitingHours>,
}

/// The public profile page of an active participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicParticipant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub is_sticky: bool,
    pub sticky_year: Option<i32>,
    pub images: Vec<String>,
    pub hub: Option<Hub>,
    pub visiting_hours: Vec<VisitingHours>,
}
