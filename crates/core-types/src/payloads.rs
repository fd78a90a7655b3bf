//! Request bodies accepted by the API, with their validation rules.

use crate::diff::Keyed;
use crate::enums::{AboutSection, PlanKind, SponsorType};
use crate::error::CoreError;
use crate::validation::{self as v, MAX_NAME_LEN, MAX_SECTION_ITEMS, MAX_TEXT_LEN, Validate};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub const MIN_CITIZENS_PER_YEAR: usize = 3;
pub const MAX_CITIZENS_PER_YEAR: usize = 12;
pub const MIN_PASSWORD_LEN: usize = 8;

fn default_true() -> bool {
    true
}

// --- About page ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AboutItemInput {
    pub id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub image_url: Option<String>,
}

impl Keyed for AboutItemInput {
    fn key(&self) -> Option<Uuid> {
        self.id
    }
    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AboutSectionInput {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub items: Vec<AboutItemInput>,
}

impl AboutSectionInput {
    /// Item requirements depend on the section: carousel slides need an
    /// image, press entries need a link.
    pub fn validate_for(&self, section: AboutSection) -> Result<(), CoreError> {
        v::optional("title", self.title.as_deref(), MAX_NAME_LEN)?;
        v::optional("description", self.description.as_deref(), MAX_TEXT_LEN)?;
        v::list_len("items", self.items.len(), 0, MAX_SECTION_ITEMS)?;
        v::unique_ids("items", self.items.iter().map(|i| i.id.as_ref()))?;
        for item in &self.items {
            v::required("items.title", &item.title, MAX_NAME_LEN)?;
            v::optional("items.description", item.description.as_deref(), MAX_TEXT_LEN)?;
            v::optional_http_url("items.link", item.link.as_deref())?;
            v::optional_http_url("items.image_url", item.image_url.as_deref())?;
            if section.requires_image() && v::clean(item.image_url.as_deref()).is_none() {
                return Err(CoreError::invalid("items.image_url", "carousel slides need an image"));
            }
            if section.requires_link() && v::clean(item.link.as_deref()).is_none() {
                return Err(CoreError::invalid("items.link", "press entries need a link"));
            }
        }
        Ok(())
    }
}

// --- Sponsors ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsorInput {
    pub id: Option<Uuid>,
    pub name: String,
    pub website: Option<String>,
    pub sponsor_type: SponsorType,
    pub logo_url: Option<String>,
}

impl Keyed for SponsorInput {
    fn key(&self) -> Option<Uuid> {
        self.id
    }
    fn image_url(&self) -> Option<&str> {
        self.logo_url.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsorsInput {
    pub sponsors: Vec<SponsorInput>,
}

impl Validate for SponsorsInput {
    fn validate(&self) -> Result<(), CoreError> {
        v::list_len("sponsors", self.sponsors.len(), 0, 100)?;
        v::unique_ids("sponsors", self.sponsors.iter().map(|s| s.id.as_ref()))?;
        for sponsor in &self.sponsors {
            v::required("sponsors.name", &sponsor.name, MAX_NAME_LEN)?;
            v::optional_http_url("sponsors.website", sponsor.website.as_deref())?;
            v::optional_http_url("sponsors.logo_url", sponsor.logo_url.as_deref())?;
        }
        Ok(())
    }
}

// --- Plans ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanInput {
    pub id: Option<Uuid>,
    pub kind: PlanKind,
    pub name: String,
    pub price_cents: i32,
    pub currency: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Keyed for PlanInput {
    fn key(&self) -> Option<Uuid> {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlansInput {
    pub plans: Vec<PlanInput>,
}

impl Validate for PlansInput {
    fn validate(&self) -> Result<(), CoreError> {
        v::list_len("plans", self.plans.len(), 1, 10)?;
        v::unique_ids("plans", self.plans.iter().map(|p| p.id.as_ref()))?;
        v::unique("plans.kind", self.plans.iter().map(|p| p.kind))?;
        for plan in &self.plans {
            v::required("plans.name", &plan.name, MAX_NAME_LEN)?;
            if plan.price_cents < 0 {
                return Err(CoreError::invalid("plans.price_cents", "must not be negative"));
            }
            if plan.kind == PlanKind::Free && plan.price_cents != 0 {
                return Err(CoreError::invalid("plans.price_cents", "the free plan must cost nothing"));
            }
            let currency_ok =
                plan.currency.len() == 3 && plan.currency.chars().all(|c| c.is_ascii_uppercase());
            if !currency_ok {
                return Err(CoreError::invalid("plans.currency", "must be a three-letter ISO code"));
            }
            for feature in &plan.features {
                v::required("plans.features", feature, MAX_NAME_LEN)?;
            }
        }
        Ok(())
    }
}

// --- Citizens of Honour ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitizenInput {
    pub id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub website: Option<String>,
}

impl Keyed for CitizenInput {
    fn key(&self) -> Option<Uuid> {
        self.id
    }
    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitizensInput {
    pub citizens: Vec<CitizenInput>,
}

impl CitizensInput {
    pub fn validate_for_year(&self, year: i32) -> Result<(), CoreError> {
        if !(2000..=2100).contains(&year) {
            return Err(CoreError::invalid("year", "must be between 2000 and 2100"));
        }
        v::list_len(
            "citizens",
            self.citizens.len(),
            MIN_CITIZENS_PER_YEAR,
            MAX_CITIZENS_PER_YEAR,
        )?;
        v::unique_ids("citizens", self.citizens.iter().map(|c| c.id.as_ref()))?;
        for citizen in &self.citizens {
            v::required("citizens.name", &citizen.name, MAX_NAME_LEN)?;
            v::optional("citizens.description", citizen.description.as_deref(), MAX_TEXT_LEN)?;
            v::optional_http_url("citizens.image_url", citizen.image_url.as_deref())?;
            v::optional_http_url("citizens.website", citizen.website.as_deref())?;
        }
        Ok(())
    }
}

// --- Event days ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDayInput {
    pub id: Option<Uuid>,
    pub date: NaiveDate,
    pub label: Option<String>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl Keyed for EventDayInput {
    fn key(&self) -> Option<Uuid> {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDaysInput {
    pub days: Vec<EventDayInput>,
}

impl Validate for EventDaysInput {
    fn validate(&self) -> Result<(), CoreError> {
        v::list_len("days", self.days.len(), 0, 31)?;
        v::unique_ids("days", self.days.iter().map(|d| d.id.as_ref()))?;
        v::unique("days.date", self.days.iter().map(|d| d.date))?;
        for day in &self.days {
            v::optional("days.label", day.label.as_deref(), MAX_NAME_LEN)?;
            if day.start_time >= day.end_time {
                return Err(CoreError::invalid("days.start_time", "must be before end_time"));
            }
        }
        Ok(())
    }
}

// --- Visiting hours ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitingSlotInput {
    pub event_day_id: Uuid,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitingHoursInput {
    pub hours: Vec<VisitingSlotInput>,
}

impl Validate for VisitingHoursInput {
    fn validate(&self) -> Result<(), CoreError> {
        v::list_len("hours", self.hours.len(), 0, 64)?;
        let mut by_day: HashMap<Uuid, Vec<(NaiveTime, NaiveTime)>> = HashMap::new();
        for slot in &self.hours {
            if slot.opens_at >= slot.closes_at {
                return Err(CoreError::invalid("hours.opens_at", "must be before closes_at"));
            }
            by_day
                .entry(slot.event_day_id)
                .or_default()
                .push((slot.opens_at, slot.closes_at));
        }
        for slots in by_day.values_mut() {
            slots.sort();
            if slots.windows(2).any(|pair| pair[1].0 < pair[0].1) {
                return Err(CoreError::invalid("hours", "slots on the same day must not overlap"));
            }
        }
        Ok(())
    }
}

impl VisitingHoursInput {
    pub fn event_day_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.hours.iter().map(|s| s.event_day_id).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

// --- Participant dashboard ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceInput {
    pub company: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    pub vat_id: Option<String>,
}

impl Validate for InvoiceInput {
    fn validate(&self) -> Result<(), CoreError> {
        v::optional("company", self.company.as_deref(), MAX_NAME_LEN)?;
        v::required("first_name", &self.first_name, MAX_NAME_LEN)?;
        v::required("last_name", &self.last_name, MAX_NAME_LEN)?;
        v::required("street", &self.street, MAX_NAME_LEN)?;
        v::required("postal_code", &self.postal_code, 16)?;
        v::required("city", &self.city, MAX_NAME_LEN)?;
        let country = self.country.trim();
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::invalid("country", "must be a two-letter ISO code"));
        }
        v::optional("vat_id", self.vat_id.as_deref(), 32)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapInfoInput {
    pub location_name: Option<String>,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub is_hidden: bool,
}

impl MapInfoInput {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

impl Validate for MapInfoInput {
    fn validate(&self) -> Result<(), CoreError> {
        v::optional("location_name", self.location_name.as_deref(), MAX_NAME_LEN)?;
        v::required("address", &self.address, 300)?;
        v::coordinates(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubMembershipInput {
    pub hub_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanChangeInput {
    pub plan: PlanKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReactivationRequestInput {
    pub message: Option<String>,
}

impl Validate for ReactivationRequestInput {
    fn validate(&self) -> Result<(), CoreError> {
        v::optional("message", self.message.as_deref(), MAX_TEXT_LEN)
    }
}

// --- Moderation ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubInput {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub host_participant_id: Uuid,
    #[serde(default)]
    pub participant_ids: Vec<Uuid>,
}

impl HubInput {
    /// Members including the host, host first, without duplicates.
    pub fn members(&self) -> Vec<Uuid> {
        let mut members = vec![self.host_participant_id];
        for id in &self.participant_ids {
            if !members.contains(id) {
                members.push(*id);
            }
        }
        members
    }
}

impl Validate for HubInput {
    fn validate(&self) -> Result<(), CoreError> {
        v::required("name", &self.name, MAX_NAME_LEN)?;
        v::optional("description", self.description.as_deref(), MAX_TEXT_LEN)?;
        v::optional("address", self.address.as_deref(), 300)?;
        v::coordinates(self.latitude, self.longitude)?;
        v::unique("participant_ids", self.participant_ids.iter())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteInput {
    pub name: String,
    pub description: Option<String>,
    pub participant_ids: Vec<Uuid>,
}

impl Validate for RouteInput {
    fn validate(&self) -> Result<(), CoreError> {
        v::required("name", &self.name, MAX_NAME_LEN)?;
        v::optional("description", self.description.as_deref(), MAX_TEXT_LEN)?;
        v::list_len("participant_ids", self.participant_ids.len(), 2, 50)?;
        v::unique("participant_ids", self.participant_ids.iter())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StickyInput {
    pub year: Option<i32>,
}

impl Validate for StickyInput {
    fn validate(&self) -> Result<(), CoreError> {
        match self.year {
            Some(year) if !(2000..=2100).contains(&year) => {
                Err(CoreError::invalid("year", "must be between 2000 and 2100"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarryoverInput {
    pub participant_ids: Vec<Uuid>,
}

impl CarryoverInput {
    pub fn deduplicated_ids(&self) -> Vec<Uuid> {
        let mut ids = self.participant_ids.clone();
        ids.sort();
        ids.dedup();
        ids
    }
}

impl Validate for CarryoverInput {
    fn validate(&self) -> Result<(), CoreError> {
        if self.participant_ids.is_empty() {
            return Err(CoreError::invalid(
                "participant_ids",
                "select at least one participant to carry over",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactivationDecisionInput {
    pub approve: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastEmailInput {
    pub participant_ids: Vec<Uuid>,
    pub subject: String,
    pub body: String,
}

impl Validate for BroadcastEmailInput {
    fn validate(&self) -> Result<(), CoreError> {
        v::list_len("participant_ids", self.participant_ids.len(), 1, 500)?;
        v::required("subject", &self.subject, 200)?;
        v::required("body", &self.body, 10_000)
    }
}

// --- Registration ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantProfileInput {
    pub name: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
}

impl Validate for ParticipantProfileInput {
    fn validate(&self) -> Result<(), CoreError> {
        v::required("participant.name", &self.name, MAX_NAME_LEN)?;
        v::optional("participant.short_description", self.short_description.as_deref(), 280)?;
        v::optional("participant.description", self.description.as_deref(), MAX_TEXT_LEN)?;
        v::optional_http_url("participant.website", self.website.as_deref())
    }
}

/// The final submission of the multi-step signup flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationInput {
    pub email: String,
    pub password: String,
    pub user_name: String,
    pub plan: PlanKind,
    pub participant: Option<ParticipantProfileInput>,
    pub invoice: Option<InvoiceInput>,
    pub map_info: Option<MapInfoInput>,
}

impl Validate for RegistrationInput {
    fn validate(&self) -> Result<(), CoreError> {
        v::email("email", &self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CoreError::invalid(
                "password",
                format!("must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }
        v::required("user_name", &self.user_name, 64)?;

        match (&self.participant, self.plan.has_participant_profile()) {
            (Some(profile), true) => profile.validate()?,
            (None, true) => {
                return Err(CoreError::invalid("participant", "required for the participant plan"));
            }
            (Some(_), false) => {
                return Err(CoreError::invalid(
                    "participant",
                    "only the participant plan has a participant profile",
                ));
            }
            (None, false) => {}
        }

        match (&self.invoice, self.plan.requires_invoice()) {
            (Some(invoice), _) => invoice.validate()?,
            (None, true) => {
                return Err(CoreError::invalid("invoice", "required for paid plans"));
            }
            (None, false) => {}
        }

        if let Some(map_info) = &self.map_info {
            if !self.plan.has_participant_profile() {
                return Err(CoreError::invalid("map_info", "only participants appear on the map"));
            }
            map_info.validate()?;
        }
        Ok(())
    }
}

impl RegistrationInput {
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn citizen(name: &str) -> CitizenInput {
        CitizenInput {
            id: None,
            name: name.to_string(),
            description: None,
            image_url: Some("https://cdn.glue.berlin/citizens/a.jpg".to_string()),
            website: None,
        }
    }

    fn invoice() -> InvoiceInput {
        InvoiceInput {
            company: Some("Studio Nord".to_string()),
            first_name: "Kim".to_string(),
            last_name: "Berg".to_string(),
            street: "Torstr. 1".to_string(),
            postal_code: "10119".to_string(),
            city: "Berlin".to_string(),
            country: "DE".to_string(),
            vat_id: None,
        }
    }

    fn registration(plan: PlanKind) -> RegistrationInput {
        RegistrationInput {
            email: "studio@glue.berlin".to_string(),
            password: "correct-horse".to_string(),
            user_name: "studio".to_string(),
            plan,
            participant: None,
            invoice: None,
            map_info: None,
        }
    }

    #[test]
    fn citizens_need_at_least_three_entries() {
        let input = CitizensInput {
            citizens: vec![citizen("A"), citizen("B")],
        };
        let err = input.validate_for_year(2025).unwrap_err();
        assert_eq!(err.field(), "citizens");

        let input = CitizensInput {
            citizens: vec![citizen("A"), citizen("B"), citizen("C")],
        };
        assert!(input.validate_for_year(2025).is_ok());
        assert!(input.validate_for_year(1999).is_err());
    }

    #[test]
    fn plans_with_duplicate_kinds_are_rejected() {
        let plan = |kind, price| PlanInput {
            id: None,
            kind,
            name: "Plan".to_string(),
            price_cents: price,
            currency: "EUR".to_string(),
            features: vec![],
            is_active: true,
        };
        let input = PlansInput {
            plans: vec![plan(PlanKind::Member, 5000), plan(PlanKind::Member, 6000)],
        };
        assert_eq!(input.validate().unwrap_err().field(), "plans.kind");

        let input = PlansInput {
            plans: vec![plan(PlanKind::Free, 100)],
        };
        assert_eq!(input.validate().unwrap_err().field(), "plans.price_cents");

        let input = PlansInput {
            plans: vec![plan(PlanKind::Free, 0), plan(PlanKind::Participant, 25000)],
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn overlapping_visiting_hours_are_rejected() {
        let day = Uuid::new_v4();
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        let input = VisitingHoursInput {
            hours: vec![
                VisitingSlotInput { event_day_id: day, opens_at: t(10), closes_at: t(14) },
                VisitingSlotInput { event_day_id: day, opens_at: t(13), closes_at: t(18) },
            ],
        };
        assert!(input.validate().is_err());

        let other_day = Uuid::new_v4();
        let input = VisitingHoursInput {
            hours: vec![
                VisitingSlotInput { event_day_id: day, opens_at: t(10), closes_at: t(14) },
                VisitingSlotInput { event_day_id: day, opens_at: t(14), closes_at: t(18) },
                VisitingSlotInput { event_day_id: other_day, opens_at: t(11), closes_at: t(12) },
            ],
        };
        assert!(input.validate().is_ok());
        assert_eq!(input.event_day_ids().len(), 2);
    }

    #[test]
    fn participant_registration_requires_invoice_and_profile() {
        let mut input = registration(PlanKind::Participant);
        input.participant = Some(ParticipantProfileInput {
            name: "Studio Nord".to_string(),
            short_description: None,
            description: None,
            website: None,
        });
        assert_eq!(input.validate().unwrap_err().field(), "invoice");

        input.invoice = Some(invoice());
        assert!(input.validate().is_ok());

        input.participant = None;
        assert_eq!(input.validate().unwrap_err().field(), "participant");
    }

    #[test]
    fn free_registration_rejects_participant_sections() {
        let mut input = registration(PlanKind::Free);
        assert!(input.validate().is_ok());

        input.map_info = Some(MapInfoInput {
            location_name: None,
            address: "Torstr. 1, Berlin".to_string(),
            latitude: None,
            longitude: None,
            is_hidden: false,
        });
        assert_eq!(input.validate().unwrap_err().field(), "map_info");
    }

    #[test]
    fn short_passwords_are_rejected() {
        let mut input = registration(PlanKind::Free);
        input.password = "short".to_string();
        assert_eq!(input.validate().unwrap_err().field(), "password");
    }

    #[test]
    fn carousel_items_need_images() {
        let input = AboutSectionInput {
            title: Some("Highlights".to_string()),
            description: None,
            is_visible: true,
            items: vec![AboutItemInput {
                id: None,
                title: "Opening night".to_string(),
                description: None,
                link: None,
                image_url: None,
            }],
        };
        assert!(input.validate_for(AboutSection::Carousel).is_err());
        assert!(input.validate_for(AboutSection::Info).is_ok());
        assert!(input.validate_for(AboutSection::Press).is_err());
    }

    #[test]
    fn hub_members_start_with_the_host() {
        let host = Uuid::new_v4();
        let other = Uuid::new_v4();
        let input = HubInput {
            name: "Hof".to_string(),
            description: None,
            address: None,
            latitude: None,
            longitude: None,
            host_participant_id: host,
            participant_ids: vec![other, host],
        };
        assert_eq!(input.members(), vec![host, other]);
    }
}
