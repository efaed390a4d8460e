use super::domain::{Claimant, Donation};

/// Supplies the donation-to-claimant distance fed into the scorer.
pub trait DistanceEstimator: Send + Sync {
    fn distance_km(&self, donation: &Donation, claimant: &Claimant) -> f64;
}

/// Same distance for every pair, standing in until geolocation lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedDistance(pub f64);

impl Default for FixedDistance {
    fn default() -> Self {
        Self(5.0)
    }
}

impl DistanceEstimator for FixedDistance {
    fn distance_km(&self, _donation: &Donation, _claimant: &Claimant) -> f64 {
        self.0
    }
}
