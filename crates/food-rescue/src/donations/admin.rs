use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::context::CallerContext;
use super::distance::DistanceEstimator;
use super::domain::{
    Claimant, ClaimantDraft, ClaimantId, DonationId, DonationStatus, PickupStatus, RequestStatus,
};
use super::error::DonationError;
use super::repository::{DonationFilter, DonationStore};
use super::scoring;
use super::service::DonationService;

/// Verification standing used to filter the claimant roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimantStanding {
    Verified,
    Pending,
}

impl ClaimantStanding {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "VERIFIED" => Some(Self::Verified),
            "PENDING" => Some(Self::Pending),
            _ => None,
        }
    }

    fn of(claimant: &Claimant) -> Self {
        if claimant.verified {
            Self::Verified
        } else {
            Self::Pending
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimantQuery {
    /// Case-insensitive match against name or service area.
    pub search: Option<String>,
    pub standing: Option<ClaimantStanding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClaimant {
    pub name: String,
    pub area: String,
    pub capacity_kg_per_day: u32,
    #[serde(default)]
    pub reputation: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAlert {
    pub severity: AlertSeverity,
    pub donation_id: DonationId,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminKpis {
    pub donations_today: usize,
    /// Requests whose pickup has not been verified yet.
    pub live_requests: usize,
    pub total_pickups: usize,
    pub verified_pickups: usize,
    /// Verified share of pickups as a percentage with two decimals.
    pub fulfillment_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverview {
    pub date: NaiveDate,
    pub kpis: AdminKpis,
    pub alerts: Vec<AdminAlert>,
}

pub(crate) fn fulfillment_rate(verified: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = verified as f64 / total as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

impl<S, D> DonationService<S, D>
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    pub fn list_claimants(
        &self,
        ctx: &CallerContext,
        query: &ClaimantQuery,
    ) -> Result<Vec<Claimant>, DonationError> {
        ctx.require_admin()?;
        let needle = query
            .search
            .as_deref()
            .map(|raw| raw.trim().to_lowercase())
            .unwrap_or_default();

        Ok(self
            .store
            .claimants()?
            .into_iter()
            .filter(|claimant| {
                needle.is_empty()
                    || claimant.name.to_lowercase().contains(&needle)
                    || claimant.area.to_lowercase().contains(&needle)
            })
            .filter(|claimant| {
                query
                    .standing
                    .map_or(true, |standing| ClaimantStanding::of(claimant) == standing)
            })
            .collect())
    }

    pub fn claimant_detail(
        &self,
        ctx: &CallerContext,
        id: ClaimantId,
    ) -> Result<Claimant, DonationError> {
        ctx.require_admin()?;
        self.store
            .fetch_claimant(id)?
            .ok_or(DonationError::NotFound {
                entity: "claimant",
                id: id.0,
            })
    }

    pub fn register_claimant(
        &self,
        ctx: &CallerContext,
        submission: NewClaimant,
    ) -> Result<Claimant, DonationError> {
        ctx.require_admin()?;
        let name = submission.name.trim().to_string();
        if name.is_empty() {
            return Err(DonationError::invalid("name is required"));
        }
        if let Some(reputation) = submission.reputation {
            if !(0.0..=100.0).contains(&reputation) {
                return Err(DonationError::invalid("reputation must be between 0 and 100"));
            }
        }

        let mut tx = self.store.begin()?;
        let claimant = tx.insert_claimant(ClaimantDraft {
            name,
            area: submission.area.trim().to_string(),
            reputation: submission.reputation,
            capacity_kg_per_day: submission.capacity_kg_per_day,
        })?;
        tx.commit()?;

        info!(claimant = %claimant.id, "claimant registered");
        Ok(claimant)
    }

    pub fn verify_claimant(
        &self,
        ctx: &CallerContext,
        id: ClaimantId,
    ) -> Result<Claimant, DonationError> {
        self.set_verified(ctx, id, true)
    }

    pub fn suspend_claimant(
        &self,
        ctx: &CallerContext,
        id: ClaimantId,
    ) -> Result<Claimant, DonationError> {
        self.set_verified(ctx, id, false)
    }

    fn set_verified(
        &self,
        ctx: &CallerContext,
        id: ClaimantId,
        verified: bool,
    ) -> Result<Claimant, DonationError> {
        ctx.require_admin()?;
        let mut tx = self.store.begin()?;
        let mut claimant = tx.claimant(id)?.ok_or(DonationError::NotFound {
            entity: "claimant",
            id: id.0,
        })?;
        claimant.verified = verified;
        tx.update_claimant(&claimant)?;
        tx.commit()?;

        info!(claimant = %id, verified, "claimant standing changed");
        Ok(claimant)
    }

    /// Aggregate health of the matching pipeline for the current UTC day.
    pub fn admin_overview(&self, ctx: &CallerContext) -> Result<AdminOverview, DonationError> {
        ctx.require_admin()?;
        let today = self.clock.now().date_naive();

        let donations = self.store.donations(&DonationFilter::default())?;
        let donations_today = donations
            .iter()
            .filter(|donation| donation.created_at.date_naive() == today)
            .count();

        let live_requests = self
            .store
            .requests()?
            .iter()
            .filter(|request| request.status == RequestStatus::Allocated)
            .count();

        let pickups = self.store.pickups()?;
        let verified_pickups = pickups
            .iter()
            .filter(|pickup| pickup.status == PickupStatus::Verified)
            .count();

        let mut urgent: Vec<_> = donations
            .iter()
            .filter(|donation| donation.status == DonationStatus::Pending)
            .filter(|donation| scoring::is_urgent(donation.expiry_hours))
            .collect();
        urgent.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        let alerts = urgent
            .into_iter()
            .map(|donation| AdminAlert {
                severity: AlertSeverity::Critical,
                donation_id: donation.id,
                message: format!(
                    "{} ({}) at {} expires within {}h and is unclaimed",
                    donation.food_type,
                    donation.quantity,
                    donation.pickup_address,
                    donation.expiry_hours.max(0)
                ),
            })
            .collect();

        Ok(AdminOverview {
            date: today,
            kpis: AdminKpis {
                donations_today,
                live_requests,
                total_pickups: pickups.len(),
                verified_pickups,
                fulfillment_rate: fulfillment_rate(verified_pickups, pickups.len()),
            },
            alerts,
        })
    }
}
