use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::context::CallerContext;
use super::distance::DistanceEstimator;
use super::domain::{Donation, DonationDraft, DonationStatus};
use super::error::DonationError;
use super::repository::{DonationFilter, DonationStore, Page, PageRequest};
use super::service::DonationService;

const OVERVIEW_RECENT: usize = 3;
const DASHBOARD_RECENT: usize = 5;

/// Donor-submitted payload for a new donation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDonation {
    pub food_type: String,
    pub quantity: String,
    pub expiry_hours: i32,
    pub pickup_address: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Listing controls for a donor's own donations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonationQuery {
    pub search: Option<String>,
    pub status: Option<DonationStatus>,
    /// One-based; defaults to the first page.
    pub page: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorOverview {
    pub total_donations: usize,
    pub status_distribution: BTreeMap<DonationStatus, usize>,
    pub recent_activity: Vec<Donation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorDashboard {
    /// Donations still waiting for a claimant.
    pub active_allocations: usize,
    pub recent_donations: Vec<Donation>,
}

fn required(field: &str, value: String) -> Result<String, DonationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DonationError::invalid(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

impl<S, D> DonationService<S, D>
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    /// Post a new donation as the calling donor. It starts out pending.
    pub fn create_donation(
        &self,
        ctx: &CallerContext,
        submission: NewDonation,
    ) -> Result<Donation, DonationError> {
        let donor_id = ctx.require_donor()?;

        let food_type = required("foodType", submission.food_type)?;
        let quantity = required("quantity", submission.quantity)?;
        let pickup_address = required("pickupAddress", submission.pickup_address)?;
        if submission.expiry_hours < 0 {
            return Err(DonationError::invalid("expiryHours cannot be negative"));
        }
        let notes = submission
            .notes
            .map(|notes| notes.trim().to_string())
            .filter(|notes| !notes.is_empty());

        let mut tx = self.store.begin()?;
        let donation = tx.insert_donation(DonationDraft {
            donor_id,
            food_type,
            quantity,
            expiry_hours: submission.expiry_hours,
            pickup_address,
            notes,
            created_at: self.clock.now(),
        })?;
        tx.commit()?;

        info!(donation = %donation.id, donor = %donor_id, expiry_hours = donation.expiry_hours, "donation posted");
        Ok(donation)
    }

    /// The caller's donations, newest first, one page at a time.
    pub fn donor_donations(
        &self,
        ctx: &CallerContext,
        query: DonationQuery,
    ) -> Result<Page<Donation>, DonationError> {
        let donor_id = ctx.require_donor()?;
        let page = query.page.unwrap_or(1);
        if page == 0 {
            return Err(DonationError::invalid("page starts at 1"));
        }

        let filter = DonationFilter {
            status: query.status,
            donor_id: Some(donor_id),
            search: query.search.filter(|needle| !needle.trim().is_empty()),
        };
        let page = self.store.donation_page(
            &filter,
            PageRequest {
                page,
                per_page: self.settings.donor_page_size,
            },
        )?;
        Ok(page)
    }

    pub fn donor_overview(&self, ctx: &CallerContext) -> Result<DonorOverview, DonationError> {
        let donations = self.own_donations(ctx)?;

        let mut status_distribution = BTreeMap::new();
        for donation in &donations {
            *status_distribution.entry(donation.status).or_insert(0) += 1;
        }

        Ok(DonorOverview {
            total_donations: donations.len(),
            status_distribution,
            recent_activity: donations.into_iter().take(OVERVIEW_RECENT).collect(),
        })
    }

    pub fn donor_dashboard(&self, ctx: &CallerContext) -> Result<DonorDashboard, DonationError> {
        let donations = self.own_donations(ctx)?;
        let active_allocations = donations
            .iter()
            .filter(|donation| donation.status == DonationStatus::Pending)
            .count();

        Ok(DonorDashboard {
            active_allocations,
            recent_donations: donations.into_iter().take(DASHBOARD_RECENT).collect(),
        })
    }

    fn own_donations(&self, ctx: &CallerContext) -> Result<Vec<Donation>, DonationError> {
        let donor_id = ctx.require_donor()?;
        let filter = DonationFilter {
            donor_id: Some(donor_id),
            ..DonationFilter::default()
        };
        Ok(self.store.donations(&filter)?)
    }
}
