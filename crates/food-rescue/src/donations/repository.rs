use serde::Serialize;

use super::domain::{
    Claimant, ClaimantDraft, ClaimantId, Donation, DonationDraft, DonationId, DonationRequest,
    DonationStatus, DonorId, Pickup, RequestDraft, RequestId,
};

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Row selection for donation listings. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonationFilter {
    pub status: Option<DonationStatus>,
    pub donor_id: Option<DonorId>,
    /// Case-insensitive substring of the food description.
    pub search: Option<String>,
}

impl DonationFilter {
    pub fn with_status(status: DonationStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, donation: &Donation) -> bool {
        self.status.map_or(true, |status| donation.status == status)
            && self.donor_id.map_or(true, |donor| donation.donor_id == donor)
            && self
                .search
                .as_deref()
                .map_or(true, |needle| donation.matches_search(needle))
    }
}

/// One-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
}

impl<T> Page<T> {
    /// Cut one page out of an already ordered result set; out-of-range pages are empty.
    pub fn slice(rows: Vec<T>, request: PageRequest) -> Self {
        let total = rows.len();
        let per_page = request.per_page.max(1);
        let skip = request.page.saturating_sub(1).saturating_mul(per_page);
        let items = rows.into_iter().skip(skip).take(per_page).collect();
        Self {
            items,
            total,
            page: request.page,
        }
    }
}

/// Persistence collaborator for donations, claims, pickups and claimants.
///
/// Reads outside a transaction observe the last committed state. Every multi-row write goes
/// through [`DonationStore::begin`].
pub trait DonationStore: Send + Sync {
    /// Open a unit of work. Implementations must serialize or isolate concurrent transactions
    /// so that a read-modify-write inside one transaction cannot lose an update.
    fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>, RepositoryError>;

    fn fetch_donation(&self, id: DonationId) -> Result<Option<Donation>, RepositoryError>;

    /// Matching donations ordered newest first (by creation time, then id).
    fn donations(&self, filter: &DonationFilter) -> Result<Vec<Donation>, RepositoryError>;

    fn donation_page(
        &self,
        filter: &DonationFilter,
        page: PageRequest,
    ) -> Result<Page<Donation>, RepositoryError> {
        Ok(Page::slice(self.donations(filter)?, page))
    }

    fn fetch_claimant(&self, id: ClaimantId) -> Result<Option<Claimant>, RepositoryError>;

    /// All claimants ordered by id.
    fn claimants(&self) -> Result<Vec<Claimant>, RepositoryError>;

    fn fetch_request(&self, id: RequestId) -> Result<Option<DonationRequest>, RepositoryError>;

    /// Requests ordered by id.
    fn requests(&self) -> Result<Vec<DonationRequest>, RepositoryError>;

    fn requests_for_claimant(
        &self,
        claimant: ClaimantId,
    ) -> Result<Vec<DonationRequest>, RepositoryError> {
        Ok(self
            .requests()?
            .into_iter()
            .filter(|request| request.claimant_id == claimant)
            .collect())
    }

    fn pickup_for_request(&self, request: RequestId) -> Result<Option<Pickup>, RepositoryError>;

    fn pickups(&self) -> Result<Vec<Pickup>, RepositoryError>;
}

/// Staged reads and writes against the store.
///
/// Nothing written through a transaction is visible to other readers until
/// [`StoreTransaction::commit`] succeeds. Dropping a transaction without committing rolls it back.
pub trait StoreTransaction {
    fn donation(&self, id: DonationId) -> Result<Option<Donation>, RepositoryError>;
    fn request(&self, id: RequestId) -> Result<Option<DonationRequest>, RepositoryError>;
    fn pickup_for_request(&self, request: RequestId) -> Result<Option<Pickup>, RepositoryError>;
    fn claimant(&self, id: ClaimantId) -> Result<Option<Claimant>, RepositoryError>;

    fn insert_donation(&mut self, draft: DonationDraft) -> Result<Donation, RepositoryError>;
    fn update_donation(&mut self, donation: &Donation) -> Result<(), RepositoryError>;
    fn insert_request(&mut self, draft: RequestDraft) -> Result<DonationRequest, RepositoryError>;
    fn update_request(&mut self, request: &DonationRequest) -> Result<(), RepositoryError>;
    fn insert_pickup(&mut self, request: RequestId) -> Result<Pickup, RepositoryError>;
    fn update_pickup(&mut self, pickup: &Pickup) -> Result<(), RepositoryError>;
    fn insert_claimant(&mut self, draft: ClaimantDraft) -> Result<Claimant, RepositoryError>;
    fn update_claimant(&mut self, claimant: &Claimant) -> Result<(), RepositoryError>;

    fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
    fn rollback(self: Box<Self>);
}
