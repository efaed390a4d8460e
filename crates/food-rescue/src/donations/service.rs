use std::sync::Arc;

use super::context::{CallerContext, Clock, SystemClock};
use super::distance::DistanceEstimator;
use super::domain::{Claimant, DonationId, DonationStatus, Pickup, RequestId};
use super::error::DonationError;
use super::lifecycle::{ActiveRequest, DonationLifecycle};
use super::ranking::{rank_donations, RankedDonation, RankingQuery};
use super::repository::{DonationFilter, DonationStore};
use crate::config::MatchingConfig;

/// Service composing the store, the distance collaborator, the scorer and the lifecycle.
pub struct DonationService<S, D> {
    pub(super) store: Arc<S>,
    distance: Arc<D>,
    pub(super) clock: Arc<dyn Clock>,
    lifecycle: DonationLifecycle<S>,
    pub(super) settings: MatchingConfig,
}

impl<S, D> DonationService<S, D>
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    pub fn new(store: Arc<S>, distance: Arc<D>, settings: MatchingConfig) -> Self {
        Self::with_clock(store, distance, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<S>,
        distance: Arc<D>,
        settings: MatchingConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let lifecycle = DonationLifecycle::new(store.clone(), clock.clone());
        Self {
            store,
            distance,
            clock,
            lifecycle,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn settings(&self) -> &MatchingConfig {
        &self.settings
    }

    /// Pending donations scored for the calling claimant, best first.
    pub fn rank_pending(
        &self,
        ctx: &CallerContext,
        query: &RankingQuery,
    ) -> Result<Vec<RankedDonation>, DonationError> {
        let claimant = self.calling_claimant(ctx)?;
        let pending = self
            .store
            .donations(&DonationFilter::with_status(DonationStatus::Pending))?;
        Ok(rank_donations(
            pending,
            &claimant,
            self.distance.as_ref(),
            query,
        ))
    }

    /// Landing view: the few donations the claimant should act on first.
    pub fn overview(&self, ctx: &CallerContext) -> Result<Vec<RankedDonation>, DonationError> {
        self.rank_pending(ctx, &RankingQuery::top(self.settings.overview_limit))
    }

    pub fn dashboard(&self, ctx: &CallerContext) -> Result<Vec<RankedDonation>, DonationError> {
        self.rank_pending(ctx, &RankingQuery::default())
    }

    pub fn browse(
        &self,
        ctx: &CallerContext,
        search: &str,
    ) -> Result<Vec<RankedDonation>, DonationError> {
        self.rank_pending(ctx, &RankingQuery::search(search))
    }

    pub fn claim(
        &self,
        ctx: &CallerContext,
        donation_id: DonationId,
    ) -> Result<RequestId, DonationError> {
        self.lifecycle.claim(ctx, donation_id)
    }

    pub fn verify_pickup(
        &self,
        ctx: &CallerContext,
        request_id: RequestId,
    ) -> Result<Pickup, DonationError> {
        self.lifecycle.verify_pickup(ctx, request_id)
    }

    pub fn list_active_requests(
        &self,
        ctx: &CallerContext,
    ) -> Result<Vec<ActiveRequest>, DonationError> {
        self.lifecycle.list_active_requests(ctx)
    }

    fn calling_claimant(&self, ctx: &CallerContext) -> Result<Claimant, DonationError> {
        let claimant_id = ctx.require_claimant()?;
        self.store
            .fetch_claimant(claimant_id)?
            .ok_or(DonationError::NotFound {
                entity: "claimant",
                id: claimant_id.0,
            })
    }
}
