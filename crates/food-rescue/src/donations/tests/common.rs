use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::config::MatchingConfig;
use crate::donations::domain::{
    Claimant, ClaimantDraft, ClaimantId, Donation, DonationDraft, DonationId, DonationRequest,
    DonationStatus, DonorId, Pickup, RequestDraft, RequestId,
};
use crate::donations::repository::{
    DonationFilter, DonationStore, RepositoryError, StoreTransaction,
};
use crate::donations::{DonationService, FixedClock, FixedDistance, MemoryDonationStore};

pub(super) type MemoryService = DonationService<MemoryDonationStore, FixedDistance>;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    now() - Duration::minutes(minutes)
}

pub(super) fn build_service() -> (MemoryService, Arc<MemoryDonationStore>) {
    let store = Arc::new(MemoryDonationStore::new());
    let service = service_over(store.clone());
    (service, store)
}

pub(super) fn service_over<S: DonationStore + 'static>(
    store: Arc<S>,
) -> DonationService<S, FixedDistance> {
    DonationService::with_clock(
        store,
        Arc::new(FixedDistance::default()),
        MatchingConfig::default(),
        Arc::new(FixedClock(now())),
    )
}

pub(super) fn donation_draft(
    food: &str,
    expiry_hours: i32,
    created_at: DateTime<Utc>,
) -> DonationDraft {
    DonationDraft {
        donor_id: DonorId(1),
        food_type: food.to_string(),
        quantity: "10 kg".to_string(),
        expiry_hours,
        pickup_address: "14 Harbour Street".to_string(),
        notes: None,
        created_at,
    }
}

pub(super) fn seed_donation<S: DonationStore + ?Sized>(
    store: &S,
    food: &str,
    expiry_hours: i32,
    created_at: DateTime<Utc>,
) -> Donation {
    let mut tx = store.begin().expect("begin");
    let donation = tx
        .insert_donation(donation_draft(food, expiry_hours, created_at))
        .expect("insert donation");
    tx.commit().expect("commit");
    donation
}

pub(super) fn seed_claimant<S: DonationStore + ?Sized>(
    store: &S,
    name: &str,
    reputation: f64,
) -> Claimant {
    let mut tx = store.begin().expect("begin");
    let claimant = tx
        .insert_claimant(ClaimantDraft {
            name: name.to_string(),
            area: "Riverside".to_string(),
            reputation: Some(reputation),
            capacity_kg_per_day: 200,
        })
        .expect("insert claimant");
    tx.commit().expect("commit");
    claimant
}

pub(super) fn set_status(store: &MemoryDonationStore, id: DonationId, status: DonationStatus) {
    let mut tx = store.begin().expect("begin");
    let mut donation = tx.donation(id).expect("read").expect("donation exists");
    donation.status = status;
    tx.update_donation(&donation).expect("update");
    tx.commit().expect("commit");
}

pub(super) fn donation_status(store: &MemoryDonationStore, id: DonationId) -> DonationStatus {
    store
        .fetch_donation(id)
        .expect("read")
        .expect("donation exists")
        .status
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Memory store with injectable faults: failing commits and donations that vanish on read.
#[derive(Default)]
pub(super) struct FaultyStore {
    pub(super) inner: MemoryDonationStore,
    pub(super) fail_commit: AtomicBool,
    pub(super) hidden_donation: Option<DonationId>,
}

impl FaultyStore {
    pub(super) fn failing_commits() -> Self {
        Self {
            fail_commit: AtomicBool::new(true),
            ..Self::default()
        }
    }
}

struct FaultyTransaction<'a> {
    inner: Box<dyn StoreTransaction + 'a>,
    fail_commit: bool,
}

impl DonationStore for FaultyStore {
    fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>, RepositoryError> {
        Ok(Box::new(FaultyTransaction {
            inner: self.inner.begin()?,
            fail_commit: self.fail_commit.load(Ordering::SeqCst),
        }))
    }

    fn fetch_donation(&self, id: DonationId) -> Result<Option<Donation>, RepositoryError> {
        if self.hidden_donation == Some(id) {
            return Ok(None);
        }
        self.inner.fetch_donation(id)
    }

    fn donations(&self, filter: &DonationFilter) -> Result<Vec<Donation>, RepositoryError> {
        self.inner.donations(filter)
    }

    fn fetch_claimant(&self, id: ClaimantId) -> Result<Option<Claimant>, RepositoryError> {
        self.inner.fetch_claimant(id)
    }

    fn claimants(&self) -> Result<Vec<Claimant>, RepositoryError> {
        self.inner.claimants()
    }

    fn fetch_request(&self, id: RequestId) -> Result<Option<DonationRequest>, RepositoryError> {
        self.inner.fetch_request(id)
    }

    fn requests(&self) -> Result<Vec<DonationRequest>, RepositoryError> {
        self.inner.requests()
    }

    fn pickup_for_request(&self, request: RequestId) -> Result<Option<Pickup>, RepositoryError> {
        self.inner.pickup_for_request(request)
    }

    fn pickups(&self) -> Result<Vec<Pickup>, RepositoryError> {
        self.inner.pickups()
    }
}

impl StoreTransaction for FaultyTransaction<'_> {
    fn donation(&self, id: DonationId) -> Result<Option<Donation>, RepositoryError> {
        self.inner.donation(id)
    }

    fn request(&self, id: RequestId) -> Result<Option<DonationRequest>, RepositoryError> {
        self.inner.request(id)
    }

    fn pickup_for_request(&self, request: RequestId) -> Result<Option<Pickup>, RepositoryError> {
        self.inner.pickup_for_request(request)
    }

    fn claimant(&self, id: ClaimantId) -> Result<Option<Claimant>, RepositoryError> {
        self.inner.claimant(id)
    }

    fn insert_donation(&mut self, draft: DonationDraft) -> Result<Donation, RepositoryError> {
        self.inner.insert_donation(draft)
    }

    fn update_donation(&mut self, donation: &Donation) -> Result<(), RepositoryError> {
        self.inner.update_donation(donation)
    }

    fn insert_request(&mut self, draft: RequestDraft) -> Result<DonationRequest, RepositoryError> {
        self.inner.insert_request(draft)
    }

    fn update_request(&mut self, request: &DonationRequest) -> Result<(), RepositoryError> {
        self.inner.update_request(request)
    }

    fn insert_pickup(&mut self, request: RequestId) -> Result<Pickup, RepositoryError> {
        self.inner.insert_pickup(request)
    }

    fn update_pickup(&mut self, pickup: &Pickup) -> Result<(), RepositoryError> {
        self.inner.update_pickup(pickup)
    }

    fn insert_claimant(&mut self, draft: ClaimantDraft) -> Result<Claimant, RepositoryError> {
        self.inner.insert_claimant(draft)
    }

    fn update_claimant(&mut self, claimant: &Claimant) -> Result<(), RepositoryError> {
        self.inner.update_claimant(claimant)
    }

    fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let FaultyTransaction { inner, fail_commit } = *self;
        if fail_commit {
            inner.rollback();
            return Err(RepositoryError::Unavailable("commit refused".to_string()));
        }
        inner.commit()
    }

    fn rollback(self: Box<Self>) {
        self.inner.rollback();
    }
}
