use super::context::AccessDenied;
use super::domain::{DonationId, DonationStatus, RequestId};
use super::repository::RepositoryError;

/// Caller-facing classification of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    VerificationFailed,
    Validation,
    Unauthenticated,
    Forbidden,
    Unavailable,
}

/// Error raised by donation operations. Every variant is recoverable by the caller.
#[derive(Debug, thiserror::Error)]
pub enum DonationError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    #[error("donation {0} already claimed")]
    AlreadyClaimed(DonationId),
    #[error("pickup for request {0} already verified")]
    AlreadyVerified(RequestId),
    #[error("donation {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: DonationId,
        from: DonationStatus,
        to: DonationStatus,
    },
    #[error("verification failed")]
    VerificationFailed,
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("missing or malformed caller identity")]
    Unauthenticated,
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl DonationError {
    pub(crate) fn donation_not_found(id: DonationId) -> Self {
        Self::NotFound {
            entity: "donation",
            id: id.0,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DonationError::NotFound { .. } => ErrorKind::NotFound,
            DonationError::AlreadyClaimed(_)
            | DonationError::AlreadyVerified(_)
            | DonationError::InvalidTransition { .. } => ErrorKind::Conflict,
            DonationError::VerificationFailed => ErrorKind::VerificationFailed,
            DonationError::Validation(_) => ErrorKind::Validation,
            DonationError::Unauthenticated => ErrorKind::Unauthenticated,
            DonationError::Forbidden(_) => ErrorKind::Forbidden,
            DonationError::Repository(RepositoryError::NotFound { .. }) => ErrorKind::NotFound,
            DonationError::Repository(_) => ErrorKind::Unavailable,
        }
    }
}
