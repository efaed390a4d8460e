use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Identifier of a posted donation.
    DonationId
);
record_id!(
    /// Identifier of the donor account that posted a donation.
    DonorId
);
record_id!(
    /// Identifier of an organization eligible to claim donations.
    ClaimantId
);
record_id!(
    /// Identifier of a claim record; also the payload encoded in pickup QR codes.
    RequestId
);
record_id!(PickupId);

/// Lifecycle of a donation. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DonationStatus {
    Pending,
    Allocated,
    PickedUp,
}

impl DonationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DonationStatus::Pending => "PENDING",
            DonationStatus::Allocated => "ALLOCATED",
            DonationStatus::PickedUp => "PICKED_UP",
        }
    }

    /// Only the single forward edge out of each state is legal.
    pub const fn can_advance_to(self, next: DonationStatus) -> bool {
        matches!(
            (self, next),
            (DonationStatus::Pending, DonationStatus::Allocated)
                | (DonationStatus::Allocated, DonationStatus::PickedUp)
        )
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(DonationStatus::Pending),
            "ALLOCATED" => Some(DonationStatus::Allocated),
            "PICKED_UP" => Some(DonationStatus::PickedUp),
            _ => None,
        }
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Allocated,
    Fulfilled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PickupStatus {
    Scheduled,
    Verified,
}

/// Surplus food offered by a donor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: DonationId,
    pub donor_id: DonorId,
    pub food_type: String,
    pub quantity: String,
    /// Hours the food stays usable, counted from `created_at`.
    pub expiry_hours: i32,
    pub pickup_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: DonationStatus,
    pub created_at: DateTime<Utc>,
}

impl Donation {
    /// Case-insensitive substring match on the food description. Blank needles match.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim();
        needle.is_empty()
            || self
                .food_type
                .to_lowercase()
                .contains(&needle.to_lowercase())
    }
}

/// Organization that claims and collects donations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claimant {
    pub id: ClaimantId,
    pub name: String,
    pub area: String,
    /// Track record on a 0-100 scale; `None` until one has been established.
    pub reputation: Option<f64>,
    pub verified: bool,
    pub capacity_kg_per_day: u32,
    pub fulfillment_rate: f64,
}

/// One claimant's claim on one donation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    pub id: RequestId,
    pub donation_id: DonationId,
    pub claimant_id: ClaimantId,
    /// Snapshot taken at claim time. Informational only; ranking recomputes scores.
    pub priority_score: f64,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

/// Physical handoff for a request, confirmed by scanning its QR code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pickup {
    pub id: PickupId,
    pub request_id: RequestId,
    pub status: PickupStatus,
    pub verified_at: Option<DateTime<Utc>>,
}

/// Insert payload for a donation; the store assigns the id and starts it as pending.
#[derive(Debug, Clone, PartialEq)]
pub struct DonationDraft {
    pub donor_id: DonorId,
    pub food_type: String,
    pub quantity: String,
    pub expiry_hours: i32,
    pub pickup_address: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestDraft {
    pub donation_id: DonationId,
    pub claimant_id: ClaimantId,
    pub priority_score: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClaimantDraft {
    pub name: String,
    pub area: String,
    pub reputation: Option<f64>,
    pub capacity_kg_per_day: u32,
}
