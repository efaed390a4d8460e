//! Surplus-food matching: donors post donations, claimants are ranked against them and claim
//! one, and a scanned QR code confirms the pickup.

pub mod admin;
pub mod context;
pub mod distance;
pub mod domain;
pub mod donor;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod ranking;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use admin::{
    AdminAlert, AdminKpis, AdminOverview, AlertSeverity, ClaimantQuery, ClaimantStanding,
    NewClaimant,
};
pub use context::{AccessDenied, CallerContext, CallerRole, Clock, FixedClock, SystemClock};
pub use distance::{DistanceEstimator, FixedDistance};
pub use domain::{
    Claimant, ClaimantDraft, ClaimantId, Donation, DonationDraft, DonationId, DonationRequest,
    DonationStatus, DonorId, Pickup, PickupId, PickupStatus, RequestDraft, RequestId,
    RequestStatus,
};
pub use donor::{DonationQuery, DonorDashboard, DonorOverview, NewDonation};
pub use error::{DonationError, ErrorKind};
pub use lifecycle::{ActiveRequest, DonationLifecycle, CLAIM_SCORE_SNAPSHOT};
pub use memory::{MemoryDonationStore, DEFAULT_CLAIMANT_REPUTATION};
pub use ranking::{rank_donations, RankedDonation, RankingQuery};
pub use repository::{
    DonationFilter, DonationStore, Page, PageRequest, RepositoryError, StoreTransaction,
};
pub use router::{caller_from_headers, donation_router, CALLER_ID_HEADER, CALLER_ROLE_HEADER};
pub use scoring::ScoreBreakdown;
pub use service::DonationService;
