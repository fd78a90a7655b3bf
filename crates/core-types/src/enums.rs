use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum UserRole {
    Participant,
    Moderator,
}

/// A pricing tier. It decides which dashboard features a user can reach and
/// whether invoice data has to be on file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "plan_kind", rename_all = "snake_case")]
pub enum PlanKind {
    Free,
    Member,
    Participant,
}

impl PlanKind {
    /// Paid tiers are billed, so they need invoice data.
    pub fn requires_invoice(&self) -> bool {
        matches!(self, PlanKind::Member | PlanKind::Participant)
    }

    /// Only the participant tier gets a public profile, map marker and hub membership.
    pub fn has_participant_profile(&self) -> bool {
        matches!(self, PlanKind::Participant)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanKind::Free => "free",
            PlanKind::Member => "member",
            PlanKind::Participant => "participant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "sponsor_type", rename_all = "snake_case")]
pub enum SponsorType {
    Main,
    Partner,
    Friend,
}

/// The editable list sections of the About page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "about_section", rename_all = "snake_case")]
pub enum AboutSection {
    Carousel,
    Info,
    Press,
}

impl AboutSection {
    pub fn requires_image(&self) -> bool {
        matches!(self, AboutSection::Carousel)
    }

    pub fn requires_link(&self) -> bool {
        matches!(self, AboutSection::Press)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "reactivation_status", rename_all = "snake_case")]
pub enum ReactivationStatus {
    Pending,
    Approved,
    Declined,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paid_plans_require_invoice() {
        assert!(!PlanKind::Free.requires_invoice());
        assert!(PlanKind::Member.requires_invoice());
        assert!(PlanKind::Participant.requires_invoice());
        assert!(!PlanKind::Member.has_participant_profile());
        assert!(PlanKind::Participant.has_participant_profile());
    }

    #[test]
    fn enums_use_snake_case_on_the_wire() {
        assert_eq!(serde_json::to_string(&PlanKind::Participant).unwrap(), "\"participant\"");
        let section: AboutSection = serde_json::from_str("\"press\"").unwrap();
        assert_eq!(section, AboutSection::Press);
        assert!(section.requires_link());
        assert!(!section.requires_image());
    }
}
