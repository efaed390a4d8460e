use food_rescue::donations::{
    CallerContext, DistanceEstimator, DonationError, DonationId, DonationService, DonationStore,
    NewClaimant, NewDonation,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Identity used for seeding; the roster is created on behalf of this admin.
pub(crate) const SEED_ADMIN: CallerContext = CallerContext::admin(1);
pub(crate) const SEED_DONORS: [CallerContext; 2] =
    [CallerContext::donor(101), CallerContext::donor(102)];

#[derive(Debug, Default)]
pub(crate) struct SeedSummary {
    pub(crate) claimants: Vec<(u64, String)>,
    pub(crate) donations: Vec<DonationId>,
}

fn claimant(name: &str, area: &str, capacity: u32, reputation: Option<f64>) -> NewClaimant {
    NewClaimant {
        name: name.to_string(),
        area: area.to_string(),
        capacity_kg_per_day: capacity,
        reputation,
    }
}

fn donation(food: &str, quantity: &str, expiry_hours: i32, address: &str) -> NewDonation {
    NewDonation {
        food_type: food.to_string(),
        quantity: quantity.to_string(),
        expiry_hours,
        pickup_address: address.to_string(),
        notes: None,
    }
}

/// Populate an empty store with verified claimants and a spread of pending donations.
pub(crate) fn seed_demo_data<S, D>(
    service: &DonationService<S, D>,
) -> Result<SeedSummary, DonationError>
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    let mut summary = SeedSummary::default();

    for draft in [
        claimant("Harbour Kitchen", "Docklands", 250, Some(92.0)),
        claimant("Night Shelter", "Old Town", 80, Some(64.0)),
        claimant("Campus Pantry", "University Quarter", 120, None),
    ] {
        let registered = service.register_claimant(&SEED_ADMIN, draft)?;
        let verified = service.verify_claimant(&SEED_ADMIN, registered.id)?;
        summary.claimants.push((verified.id.0, verified.name));
    }

    let batches = [
        (
            SEED_DONORS[0],
            donation("Cooked rice and dal", "30 portions", 2, "14 Harbour Street"),
        ),
        (
            SEED_DONORS[0],
            donation("Bread loaves", "25 loaves", 10, "14 Harbour Street"),
        ),
        (
            SEED_DONORS[1],
            donation("Fresh vegetables", "40 kg", 4, "3 Mill Lane"),
        ),
        (
            SEED_DONORS[1],
            donation("Yoghurt cups", "60 cups", 1, "3 Mill Lane"),
        ),
    ];
    for (donor, draft) in batches {
        summary.donations.push(service.create_donation(&donor, draft)?.id);
    }

    Ok(summary)
}
