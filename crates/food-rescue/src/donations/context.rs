use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ClaimantId, DonorId};

/// Role asserted by the upstream identity layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallerRole {
    #[serde(rename = "DONOR")]
    Donor,
    #[serde(rename = "NGO")]
    Claimant,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl CallerRole {
    pub const fn label(self) -> &'static str {
        match self {
            CallerRole::Donor => "DONOR",
            CallerRole::Claimant => "NGO",
            CallerRole::Admin => "ADMIN",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "DONOR" => Some(CallerRole::Donor),
            "NGO" | "CLAIMANT" => Some(CallerRole::Claimant),
            "ADMIN" => Some(CallerRole::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for CallerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Authenticated caller, passed explicitly into every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerContext {
    pub caller_id: u64,
    pub role: CallerRole,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("access denied: {actual} caller cannot perform an operation reserved for {required}")]
pub struct AccessDenied {
    pub required: CallerRole,
    pub actual: CallerRole,
}

impl CallerContext {
    pub const fn donor(id: u64) -> Self {
        Self {
            caller_id: id,
            role: CallerRole::Donor,
        }
    }

    pub const fn claimant(id: u64) -> Self {
        Self {
            caller_id: id,
            role: CallerRole::Claimant,
        }
    }

    pub const fn admin(id: u64) -> Self {
        Self {
            caller_id: id,
            role: CallerRole::Admin,
        }
    }

    pub fn require(&self, required: CallerRole) -> Result<u64, AccessDenied> {
        if self.role == required {
            Ok(self.caller_id)
        } else {
            Err(AccessDenied {
                required,
                actual: self.role,
            })
        }
    }

    pub fn require_claimant(&self) -> Result<ClaimantId, AccessDenied> {
        self.require(CallerRole::Claimant).map(ClaimantId)
    }

    pub fn require_donor(&self) -> Result<DonorId, AccessDenied> {
        self.require(CallerRole::Donor).map(DonorId)
    }

    pub fn require_admin(&self) -> Result<(), AccessDenied> {
        self.require(CallerRole::Admin).map(|_| ())
    }

    pub fn is_admin(&self) -> bool {
        self.role == CallerRole::Admin
    }
}

/// Source of "now" for timestamps written by the service.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant; used by demos and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
