use std::cmp::Ordering;

use serde::Serialize;

use super::distance::DistanceEstimator;
use super::domain::{Claimant, Donation, DonationStatus};
use super::scoring;

/// A pending donation together with its priority for the requesting claimant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedDonation {
    #[serde(flatten)]
    pub donation: Donation,
    pub distance_km: f64,
    pub priority_score: f64,
}

/// Truncation and filtering applied after scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankingQuery {
    pub limit: Option<usize>,
    pub search: Option<String>,
}

impl RankingQuery {
    pub fn top(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            search: None,
        }
    }

    pub fn search(needle: impl Into<String>) -> Self {
        Self {
            limit: None,
            search: Some(needle.into()),
        }
    }
}

/// Highest score first, then the donation posted earliest, then the lowest id.
pub fn compare_ranked(a: &RankedDonation, b: &RankedDonation) -> Ordering {
    b.priority_score
        .total_cmp(&a.priority_score)
        .then_with(|| a.donation.created_at.cmp(&b.donation.created_at))
        .then_with(|| a.donation.id.cmp(&b.donation.id))
}

/// Score every pending donation for `claimant` and order them by [`compare_ranked`].
pub fn rank_donations<D>(
    donations: Vec<Donation>,
    claimant: &Claimant,
    distance: &D,
    query: &RankingQuery,
) -> Vec<RankedDonation>
where
    D: DistanceEstimator + ?Sized,
{
    let search = query.search.as_deref().unwrap_or_default();

    let mut ranked: Vec<RankedDonation> = donations
        .into_iter()
        .filter(|donation| donation.status == DonationStatus::Pending)
        .filter(|donation| donation.matches_search(search))
        .map(|donation| {
            let distance_km = distance.distance_km(&donation, claimant);
            let priority_score = scoring::score(&donation, claimant, distance_km);
            RankedDonation {
                donation,
                distance_km,
                priority_score,
            }
        })
        .collect();

    ranked.sort_by(compare_ranked);

    if let Some(limit) = query.limit {
        ranked.truncate(limit);
    }

    ranked
}
