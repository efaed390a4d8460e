use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::context::{CallerContext, Clock};
use super::domain::{
    Donation, DonationId, DonationRequest, DonationStatus, Pickup, PickupStatus, RequestDraft,
    RequestId, RequestStatus,
};
use super::error::DonationError;
use super::repository::DonationStore;

/// Score recorded on a request when it is created. Ranking never reads it back.
pub const CLAIM_SCORE_SNAPSHOT: f64 = 0.0;

/// A claimant's request joined with the donation it points at.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRequest {
    pub request: DonationRequest,
    pub donation: Donation,
    pub status: DonationStatus,
    pub pickup_status: Option<PickupStatus>,
}

/// Sole writer of donation, request and pickup status fields.
///
/// ```text
/// PENDING --claim--> ALLOCATED --verify_pickup--> PICKED_UP
/// ```
pub struct DonationLifecycle<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> DonationLifecycle<S>
where
    S: DonationStore + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Allocate a pending donation to the calling claimant.
    ///
    /// The caller must have a claimant row; an unregistered id is [`DonationError::NotFound`].
    ///
    /// The status flip, the request and its scheduled pickup are committed together. Racing
    /// claims are serialized by the store transaction: the first sees `PENDING` and wins, the
    /// rest see `ALLOCATED` and get [`DonationError::AlreadyClaimed`].
    pub fn claim(
        &self,
        ctx: &CallerContext,
        donation_id: DonationId,
    ) -> Result<RequestId, DonationError> {
        let claimant_id = ctx.require_claimant()?;
        if donation_id.0 == 0 {
            return Err(DonationError::invalid("donation id must be positive"));
        }

        let mut tx = self.store.begin()?;
        if tx.claimant(claimant_id)?.is_none() {
            debug!(claimant = %claimant_id, "claim from unregistered claimant");
            return Err(DonationError::NotFound {
                entity: "claimant",
                id: claimant_id.0,
            });
        }
        let mut donation = tx
            .donation(donation_id)?
            .ok_or_else(|| DonationError::donation_not_found(donation_id))?;

        if !donation.status.can_advance_to(DonationStatus::Allocated) {
            warn!(
                donation = %donation_id,
                claimant = %claimant_id,
                status = %donation.status,
                "claim rejected"
            );
            tx.rollback();
            return Err(DonationError::AlreadyClaimed(donation_id));
        }

        donation.status = DonationStatus::Allocated;
        tx.update_donation(&donation)?;

        let request = tx.insert_request(RequestDraft {
            donation_id,
            claimant_id,
            priority_score: CLAIM_SCORE_SNAPSHOT,
            created_at: self.clock.now(),
        })?;
        tx.insert_pickup(request.id)?;
        tx.commit()?;

        info!(
            donation = %donation_id,
            claimant = %claimant_id,
            request = %request.id,
            "donation allocated"
        );
        Ok(request.id)
    }

    /// Confirm the handoff encoded in a pickup QR code.
    ///
    /// Unknown requests, broken request links and requests owned by another claimant all
    /// surface as [`DonationError::VerificationFailed`]. A pickup that was already verified is
    /// rejected with [`DonationError::AlreadyVerified`] and left untouched.
    pub fn verify_pickup(
        &self,
        ctx: &CallerContext,
        request_id: RequestId,
    ) -> Result<Pickup, DonationError> {
        if !ctx.is_admin() {
            ctx.require_claimant()?;
        }
        if request_id.0 == 0 {
            return Err(DonationError::invalid("request id must be positive"));
        }

        let mut tx = self.store.begin()?;

        let Some(mut pickup) = tx.pickup_for_request(request_id)? else {
            debug!(request = %request_id, "no pickup scheduled for request");
            return Err(DonationError::VerificationFailed);
        };
        let Some(mut request) = tx.request(request_id)? else {
            debug!(request = %request_id, "pickup references a missing request");
            return Err(DonationError::VerificationFailed);
        };
        if !ctx.is_admin() && request.claimant_id.0 != ctx.caller_id {
            debug!(request = %request_id, caller = ctx.caller_id, "request owned by another claimant");
            return Err(DonationError::VerificationFailed);
        }
        if pickup.status == PickupStatus::Verified {
            return Err(DonationError::AlreadyVerified(request_id));
        }
        let Some(mut donation) = tx.donation(request.donation_id)? else {
            debug!(request = %request_id, donation = %request.donation_id, "request references a missing donation");
            return Err(DonationError::VerificationFailed);
        };
        if !donation.status.can_advance_to(DonationStatus::PickedUp) {
            return Err(DonationError::InvalidTransition {
                id: donation.id,
                from: donation.status,
                to: DonationStatus::PickedUp,
            });
        }

        pickup.status = PickupStatus::Verified;
        pickup.verified_at = Some(self.clock.now());
        donation.status = DonationStatus::PickedUp;
        request.status = RequestStatus::Fulfilled;

        tx.update_pickup(&pickup)?;
        tx.update_donation(&donation)?;
        tx.update_request(&request)?;
        tx.commit()?;

        info!(
            request = %request_id,
            donation = %donation.id,
            "pickup verified"
        );
        Ok(pickup)
    }

    /// Every request owned by the calling claimant, newest first.
    pub fn list_active_requests(
        &self,
        ctx: &CallerContext,
    ) -> Result<Vec<ActiveRequest>, DonationError> {
        let claimant_id = ctx.require_claimant()?;

        let mut requests = self.store.requests_for_claimant(claimant_id)?;
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let mut active = Vec::with_capacity(requests.len());
        for request in requests {
            // Donations are never deleted; a dangling reference is skipped rather than fatal.
            let Some(donation) = self.store.fetch_donation(request.donation_id)? else {
                warn!(request = %request.id, donation = %request.donation_id, "request points at a missing donation");
                continue;
            };
            let pickup_status = self
                .store
                .pickup_for_request(request.id)?
                .map(|pickup| pickup.status);
            active.push(ActiveRequest {
                status: donation.status,
                request,
                donation,
                pickup_status,
            });
        }

        Ok(active)
    }
}
