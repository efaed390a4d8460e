//! Priority rubric used to rank pending donations for a claimant.
//!
//! The score is a weighted sum of three terms: expiry urgency (up to 60 points), distance to
//! the claimant (up to 30) and the claimant's reputation (up to 10). Thresholds are inclusive,
//! so a donation expiring in exactly two hours is as urgent as one already past its window.

use serde::Serialize;

use super::domain::{Claimant, Donation};

pub const MAX_SCORE: f64 = 100.0;

const URGENT_WITHIN_HOURS: i32 = 2;
const SOON_WITHIN_HOURS: i32 = 4;
const URGENT_POINTS: f64 = 60.0;
const SOON_POINTS: f64 = 40.0;
const RELAXED_POINTS: f64 = 20.0;

const NEAR_WITHIN_KM: f64 = 3.0;
const MID_WITHIN_KM: f64 = 6.0;
const NEAR_POINTS: f64 = 30.0;
const MID_POINTS: f64 = 20.0;
const FAR_POINTS: f64 = 10.0;

const REPUTATION_CEILING: f64 = 100.0;
const REPUTATION_WEIGHT: f64 = 10.0;

/// Per-term contributions behind a priority score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub urgency: f64,
    pub distance: f64,
    pub reputation: f64,
    pub total: f64,
}

/// Whether a donation falls in the top urgency bucket.
pub fn is_urgent(expiry_hours: i32) -> bool {
    expiry_hours <= URGENT_WITHIN_HOURS
}

pub fn urgency_points(expiry_hours: i32) -> f64 {
    if expiry_hours <= URGENT_WITHIN_HOURS {
        URGENT_POINTS
    } else if expiry_hours <= SOON_WITHIN_HOURS {
        SOON_POINTS
    } else {
        RELAXED_POINTS
    }
}

pub fn distance_points(distance_km: f64) -> f64 {
    if distance_km <= NEAR_WITHIN_KM {
        NEAR_POINTS
    } else if distance_km <= MID_WITHIN_KM {
        MID_POINTS
    } else {
        FAR_POINTS
    }
}

/// Linear `reputation / 100 * 10`. Missing or non-finite reputations contribute nothing.
pub fn reputation_points(reputation: Option<f64>) -> f64 {
    match reputation {
        Some(value) if value.is_finite() => {
            value.clamp(0.0, REPUTATION_CEILING) / REPUTATION_CEILING * REPUTATION_WEIGHT
        }
        _ => 0.0,
    }
}

/// Round to one decimal place, halves rounding up (21.25 -> 21.3).
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn breakdown(donation: &Donation, claimant: &Claimant, distance_km: f64) -> ScoreBreakdown {
    let urgency = urgency_points(donation.expiry_hours);
    let distance = distance_points(distance_km);
    let reputation = reputation_points(claimant.reputation);
    let total = round_to_tenth((urgency + distance + reputation).clamp(0.0, MAX_SCORE));

    ScoreBreakdown {
        urgency,
        distance,
        reputation,
        total,
    }
}

/// Priority of `donation` for `claimant`, in `[0, 100]` with one decimal.
pub fn score(donation: &Donation, claimant: &Claimant, distance_km: f64) -> f64 {
    breakdown(donation, claimant, distance_km).total
}
