//! Error types for store mutations.

use chrono::NaiveDate;
use thiserror::Error;

use crate::Amount;
use crate::model::{ReservationError, ReservationId, ReservationStatus};

/// Top-level error returned by [`ReservationStore::apply`](super::ReservationStore::apply)
/// and the individual mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("invalid reservation: {0}")]
    InvalidReservation(#[from] ReservationError),

    #[error("reservation {0} not found")]
    ReservationNotFound(ReservationId),

    #[error("duplicate reservation id {0}")]
    DuplicateId(ReservationId),

    #[error("reservation {id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        id: ReservationId,
        from: ReservationStatus,
        to: ReservationStatus,
    },

    #[error("date range {0}..={1} ends before it starts")]
    InvalidRange(NaiveDate, NaiveDate),

    #[error("price must be positive and at most {} per night", Amount::from_lira(super::MAX_NIGHTLY_RATE))]
    InvalidPrice,

    #[error("total price of {0}..={1} is too large")]
    PriceOverflow(NaiveDate, NaiveDate),

    #[error("no dynamic price at index {index} ({len} defined)")]
    DynamicPriceIndex { index: usize, len: usize },
}
