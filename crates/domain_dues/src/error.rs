//! Dues domain errors
//!
//! The taxonomy mirrors the failure semantics of the allocation unit:
//! validation is rejected before any write, and persistence or lock
//! failures roll the whole unit back.

use core_kernel::{MemberId, MoneyError, ObligationId};
use thiserror::Error;

use crate::obligation::DueType;

/// Errors that can occur in the dues domain
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed or out-of-range input; rejected before any storage write
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The obligation is already fully paid and the payment is not a correction
    #[error("obligation {0} is already settled")]
    AlreadySettled(ObligationId),

    /// No open obligation of the requested type exists for the member
    #[error("no open {due_type} obligation for member {member}")]
    NoMatchingObligation {
        member: MemberId,
        due_type: DueType,
    },

    /// The storage transaction could not commit; the allocation unit was
    /// rolled back in full
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// The per-member lock could not be acquired in time
    #[error("allocation for member {0} timed out waiting for the member lock")]
    ConcurrencyConflict(MemberId),

    /// Money arithmetic error
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        LedgerError::Persistence(message.into())
    }
}
