use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::domain::{
    Claimant, ClaimantDraft, ClaimantId, Donation, DonationDraft, DonationId, DonationRequest,
    DonationStatus, Pickup, PickupId, PickupStatus, RequestDraft, RequestId, RequestStatus,
};
use super::repository::{DonationFilter, DonationStore, RepositoryError, StoreTransaction};

/// Fresh claimants start from a neutral track record.
pub const DEFAULT_CLAIMANT_REPUTATION: f64 = 50.0;
const DEFAULT_FULFILLMENT_RATE: f64 = 0.8;

#[derive(Debug, Default, Clone)]
struct Tables {
    donations: BTreeMap<DonationId, Donation>,
    requests: BTreeMap<RequestId, DonationRequest>,
    pickups: BTreeMap<PickupId, Pickup>,
    claimants: BTreeMap<ClaimantId, Claimant>,
    last_donation: u64,
    last_request: u64,
    last_pickup: u64,
    last_claimant: u64,
}

impl Tables {
    fn pickup_for_request(&self, request: RequestId) -> Option<&Pickup> {
        self.pickups
            .values()
            .find(|pickup| pickup.request_id == request)
    }
}

fn next_id(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

/// Process-local store. A single mutex is held for the whole lifetime of a transaction,
/// which makes every transaction run in isolation from every other one.
#[derive(Debug, Default)]
pub struct MemoryDonationStore {
    tables: Mutex<Tables>,
}

impl MemoryDonationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl DonationStore for MemoryDonationStore {
    fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>, RepositoryError> {
        let guard = self.lock()?;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }

    fn fetch_donation(&self, id: DonationId) -> Result<Option<Donation>, RepositoryError> {
        Ok(self.lock()?.donations.get(&id).cloned())
    }

    fn donations(&self, filter: &DonationFilter) -> Result<Vec<Donation>, RepositoryError> {
        let guard = self.lock()?;
        let mut rows: Vec<Donation> = guard
            .donations
            .values()
            .filter(|donation| filter.matches(donation))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    fn fetch_claimant(&self, id: ClaimantId) -> Result<Option<Claimant>, RepositoryError> {
        Ok(self.lock()?.claimants.get(&id).cloned())
    }

    fn claimants(&self) -> Result<Vec<Claimant>, RepositoryError> {
        Ok(self.lock()?.claimants.values().cloned().collect())
    }

    fn fetch_request(&self, id: RequestId) -> Result<Option<DonationRequest>, RepositoryError> {
        Ok(self.lock()?.requests.get(&id).cloned())
    }

    fn requests(&self) -> Result<Vec<DonationRequest>, RepositoryError> {
        Ok(self.lock()?.requests.values().cloned().collect())
    }

    fn pickup_for_request(&self, request: RequestId) -> Result<Option<Pickup>, RepositoryError> {
        Ok(self.lock()?.pickup_for_request(request).cloned())
    }

    fn pickups(&self) -> Result<Vec<Pickup>, RepositoryError> {
        Ok(self.lock()?.pickups.values().cloned().collect())
    }
}

/// Writes land on `working`; commit swaps it in under the still-held lock.
struct MemoryTransaction<'a> {
    guard: MutexGuard<'a, Tables>,
    working: Tables,
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn donation(&self, id: DonationId) -> Result<Option<Donation>, RepositoryError> {
        Ok(self.working.donations.get(&id).cloned())
    }

    fn request(&self, id: RequestId) -> Result<Option<DonationRequest>, RepositoryError> {
        Ok(self.working.requests.get(&id).cloned())
    }

    fn pickup_for_request(&self, request: RequestId) -> Result<Option<Pickup>, RepositoryError> {
        Ok(self.working.pickup_for_request(request).cloned())
    }

    fn claimant(&self, id: ClaimantId) -> Result<Option<Claimant>, RepositoryError> {
        Ok(self.working.claimants.get(&id).cloned())
    }

    fn insert_donation(&mut self, draft: DonationDraft) -> Result<Donation, RepositoryError> {
        let id = DonationId(next_id(&mut self.working.last_donation));
        let donation = Donation {
            id,
            donor_id: draft.donor_id,
            food_type: draft.food_type,
            quantity: draft.quantity,
            expiry_hours: draft.expiry_hours,
            pickup_address: draft.pickup_address,
            notes: draft.notes,
            status: DonationStatus::Pending,
            created_at: draft.created_at,
        };
        self.working.donations.insert(id, donation.clone());
        Ok(donation)
    }

    fn update_donation(&mut self, donation: &Donation) -> Result<(), RepositoryError> {
        match self.working.donations.get_mut(&donation.id) {
            Some(row) => {
                *row = donation.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound {
                entity: "donation",
                id: donation.id.0,
            }),
        }
    }

    fn insert_request(&mut self, draft: RequestDraft) -> Result<DonationRequest, RepositoryError> {
        if !self.working.donations.contains_key(&draft.donation_id) {
            return Err(RepositoryError::NotFound {
                entity: "donation",
                id: draft.donation_id.0,
            });
        }
        let id = RequestId(next_id(&mut self.working.last_request));
        let request = DonationRequest {
            id,
            donation_id: draft.donation_id,
            claimant_id: draft.claimant_id,
            priority_score: draft.priority_score,
            status: RequestStatus::Allocated,
            created_at: draft.created_at,
        };
        self.working.requests.insert(id, request.clone());
        Ok(request)
    }

    fn update_request(&mut self, request: &DonationRequest) -> Result<(), RepositoryError> {
        match self.working.requests.get_mut(&request.id) {
            Some(row) => {
                *row = request.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound {
                entity: "request",
                id: request.id.0,
            }),
        }
    }

    fn insert_pickup(&mut self, request: RequestId) -> Result<Pickup, RepositoryError> {
        if !self.working.requests.contains_key(&request) {
            return Err(RepositoryError::NotFound {
                entity: "request",
                id: request.0,
            });
        }
        let id = PickupId(next_id(&mut self.working.last_pickup));
        let pickup = Pickup {
            id,
            request_id: request,
            status: PickupStatus::Scheduled,
            verified_at: None,
        };
        self.working.pickups.insert(id, pickup.clone());
        Ok(pickup)
    }

    fn update_pickup(&mut self, pickup: &Pickup) -> Result<(), RepositoryError> {
        match self.working.pickups.get_mut(&pickup.id) {
            Some(row) => {
                *row = pickup.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound {
                entity: "pickup",
                id: pickup.id.0,
            }),
        }
    }

    fn insert_claimant(&mut self, draft: ClaimantDraft) -> Result<Claimant, RepositoryError> {
        let id = ClaimantId(next_id(&mut self.working.last_claimant));
        let claimant = Claimant {
            id,
            name: draft.name,
            area: draft.area,
            reputation: Some(draft.reputation.unwrap_or(DEFAULT_CLAIMANT_REPUTATION)),
            verified: false,
            capacity_kg_per_day: draft.capacity_kg_per_day,
            fulfillment_rate: DEFAULT_FULFILLMENT_RATE,
        };
        self.working.claimants.insert(id, claimant.clone());
        Ok(claimant)
    }

    fn update_claimant(&mut self, claimant: &Claimant) -> Result<(), RepositoryError> {
        match self.working.claimants.get_mut(&claimant.id) {
            Some(row) => {
                *row = claimant.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound {
                entity: "claimant",
                id: claimant.id.0,
            }),
        }
    }

    fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    fn rollback(self: Box<Self>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::donations::domain::DonorId;
    use chrono::{TimeZone, Utc};

    fn draft(food: &str) -> DonationDraft {
        DonationDraft {
            donor_id: DonorId(1),
            food_type: food.to_string(),
            quantity: "5 kg".to_string(),
            expiry_hours: 3,
            pickup_address: "12 Market Road".to_string(),
            notes: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn uncommitted_writes_are_discarded() {
        let store = MemoryDonationStore::new();
        {
            let mut tx = store.begin().expect("begin");
            tx.insert_donation(draft("Rice")).expect("insert");
        }
        assert!(store.donations(&DonationFilter::default()).unwrap().is_empty());

        let mut tx = store.begin().expect("begin");
        tx.insert_donation(draft("Bread")).expect("insert");
        tx.rollback();
        assert!(store.fetch_donation(DonationId(1)).unwrap().is_none());
    }

    #[test]
    fn committed_writes_become_visible_together() {
        let store = MemoryDonationStore::new();
        let mut tx = store.begin().expect("begin");
        let donation = tx.insert_donation(draft("Rice")).expect("insert donation");
        let request = tx
            .insert_request(RequestDraft {
                donation_id: donation.id,
                claimant_id: ClaimantId(9),
                priority_score: 0.0,
                created_at: donation.created_at,
            })
            .expect("insert request");
        tx.insert_pickup(request.id).expect("insert pickup");
        tx.commit().expect("commit");

        assert_eq!(donation.id, DonationId(1));
        assert_eq!(
            store.requests_for_claimant(ClaimantId(9)).unwrap().len(),
            1
        );
        let pickup = store
            .pickup_for_request(request.id)
            .unwrap()
            .expect("pickup stored");
        assert_eq!(pickup.status, PickupStatus::Scheduled);
    }

    #[test]
    fn updates_to_missing_rows_fail() {
        let store = MemoryDonationStore::new();
        let mut tx = store.begin().expect("begin");
        let mut donation = tx.insert_donation(draft("Rice")).expect("insert");
        donation.id = DonationId(77);
        match tx.update_donation(&donation) {
            Err(RepositoryError::NotFound { entity, id }) => {
                assert_eq!(entity, "donation");
                assert_eq!(id, 77);
            }
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn claimants_default_to_neutral_reputation() {
        let store = MemoryDonationStore::new();
        let mut tx = store.begin().expect("begin");
        let claimant = tx
            .insert_claimant(ClaimantDraft {
                name: "Harvest Hands".to_string(),
                area: "Riverside".to_string(),
                reputation: None,
                capacity_kg_per_day: 40,
            })
            .expect("insert");
        tx.commit().expect("commit");

        assert_eq!(claimant.reputation, Some(DEFAULT_CLAIMANT_REPUTATION));
        assert!(!claimant.verified);
    }

    #[test]
    fn listing_orders_newest_first() {
        let store = MemoryDonationStore::new();
        let mut tx = store.begin().expect("begin");
        let mut older = draft("Rice");
        older.created_at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        tx.insert_donation(older).expect("insert");
        tx.insert_donation(draft("Bread")).expect("insert");
        tx.commit().expect("commit");

        let rows = store.donations(&DonationFilter::default()).unwrap();
        let foods: Vec<&str> = rows.iter().map(|d| d.food_type.as_str()).collect();
        assert_eq!(foods, vec!["Bread", "Rice"]);
    }
}
