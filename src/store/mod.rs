//! Reservation store.
//!
//! The store owns reservations, blocked dates and dynamic price rules.
//! It answers availability and price queries and applies mutations issued
//! by the public page or the admin dashboard, either one by one or as an
//! async stream of commands.

use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::{NaiveDate, Utc};
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use crate::Amount;
use crate::model::{
    Command, DynamicPrice, NewReservation, Reservation, ReservationId, ReservationStatus,
    days_between,
};

mod error;
pub use error::StoreError;

mod state;
pub use state::{BlockedDates, Override};

mod quote;
pub use quote::Quote;

/// Default nightly rate in lira.
pub const DEFAULT_NIGHTLY_RATE: i64 = 3500;

/// Discount applied to discounted quotes, in percent.
pub const DEFAULT_DISCOUNT_PERCENT: u8 = 10;

/// Highest nightly rate accepted, in lira.
pub const MAX_NIGHTLY_RATE: i64 = 1_000_000;

/// Upper bound on guests per reservation.
pub const DEFAULT_MAX_GUESTS: u8 = 6;

/// Pricing and capacity knobs of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSettings {
    pub default_rate: Amount,
    pub discount_percent: u8,
    pub max_guests: u8,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            default_rate: Amount::from_lira(DEFAULT_NIGHTLY_RATE),
            discount_percent: DEFAULT_DISCOUNT_PERCENT,
            max_guests: DEFAULT_MAX_GUESTS,
        }
    }
}

/// The reservation store.
///
/// Reservations keep insertion order and are never deleted.
#[derive(Debug, Clone, Default)]
pub struct ReservationStore {
    settings: StoreSettings,
    reservations: Vec<Reservation>,
    blocked: BlockedDates,
    /// Later entries take precedence where ranges overlap
    dynamic_prices: Vec<DynamicPrice>,
}

/// Public API
impl ReservationStore {
    pub fn new(settings: StoreSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Rebuild a store from persisted parts; reserved days are re-derived and
    /// manual overrides are taken as stored.
    pub fn from_parts(
        settings: StoreSettings,
        reservations: Vec<Reservation>,
        dynamic_prices: Vec<DynamicPrice>,
        overrides: BTreeMap<NaiveDate, Override>,
    ) -> Self {
        let mut store = Self {
            settings,
            reservations,
            blocked: BlockedDates::with_overrides(overrides),
            dynamic_prices,
        };
        // stored releases stay in effect until the next refresh
        let days = store.approved_days();
        store.blocked.replace_reserved(days);
        store
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Run the store over a stream of commands
    pub async fn run(&mut self, mut stream: impl Stream<Item = Command> + Unpin) {
        while let Some(command) = stream.next().await {
            // a failing command must not stop the batch; apply already logged it
            let _ = self.apply(command);
        }
    }

    /// Apply a single command on top of the current store state
    pub fn apply(&mut self, command: Command) -> Result<(), StoreError> {
        match command {
            Command::Reserve(input) => {
                let name = input.customer_name.clone();
                let result = self.add_reservation(input);
                match &result {
                    Ok(id) => Self::log_result::<StoreError>("reservation", id, &Ok(())),
                    Err(e) => Self::log_result("reservation", &name, &Err(e)),
                }
                result?;
            }
            Command::Approve { id } => {
                let result = self.update_reservation_status(&id, ReservationStatus::Approved);
                Self::log_result("approval", &id, &result);
                result?;
            }
            Command::Reject { id } => {
                let result = self.update_reservation_status(&id, ReservationStatus::Rejected);
                Self::log_result("rejection", &id, &result);
                result?;
            }
            Command::ToggleDate { date } => {
                let blocked = self.toggle_date_availability(date);
                info!(date = %date, blocked, "toggle applied");
            }
            Command::RefreshBlockedDates => {
                self.refresh_blocked_dates();
            }
            Command::AddDynamicPrice(rule) => {
                let range = format!("{}..={}", rule.start_date, rule.end_date);
                let result = self.add_dynamic_price(rule);
                Self::log_result("dynamic price", &range, &result);
                result?;
            }
            Command::RemoveDynamicPrice { index } => {
                let result = self.remove_dynamic_price(index).map(|_| ());
                Self::log_result("dynamic price removal", &index, &result);
                result?;
            }
        }
        Ok(())
    }

    /// Validate form input and append it as a pending reservation.
    ///
    /// Overlap with approved reservations is not checked; double-booking
    /// is left to the admin's approval decision.
    pub fn add_reservation(&mut self, input: NewReservation) -> Result<ReservationId, StoreError> {
        input.validate(self.settings.max_guests)?;
        let id = Uuid::new_v4().to_string();
        let reservation = input.into_reservation(id.clone(), Utc::now());
        self.insert_reservation(reservation)?;
        Ok(id)
    }

    /// Append a fully formed reservation, e.g. from storage or a batch import.
    pub fn insert_reservation(&mut self, reservation: Reservation) -> Result<(), StoreError> {
        if reservation.end_date < reservation.start_date {
            return Err(StoreError::InvalidRange(
                reservation.start_date,
                reservation.end_date,
            ));
        }
        if self.get_reservation(&reservation.id).is_some() {
            return Err(StoreError::DuplicateId(reservation.id));
        }
        if reservation.status == ReservationStatus::Approved {
            self.blocked.reserve(reservation.days());
        }
        self.reservations.push(reservation);
        Ok(())
    }

    /// Flip manual availability of a day, returning whether it is now blocked.
    pub fn toggle_date_availability(&mut self, date: NaiveDate) -> bool {
        self.blocked.toggle(date)
    }

    pub fn is_date_available(&self, date: NaiveDate) -> bool {
        !self.blocked.contains(&date)
    }

    /// Move a pending reservation to `Approved` or `Rejected`.
    ///
    /// Approval blocks every day of the stay; rejection leaves blocked
    /// dates untouched. Only the status field of the reservation changes.
    pub fn update_reservation_status(
        &mut self,
        id: &str,
        status: ReservationStatus,
    ) -> Result<(), StoreError> {
        let reservation = self
            .reservations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::ReservationNotFound(id.to_string()))?;

        if reservation.status != ReservationStatus::Pending
            || status == ReservationStatus::Pending
        {
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                from: reservation.status,
                to: status,
            });
        }

        reservation.status = status;

        if status == ReservationStatus::Approved {
            let (start, end) = (reservation.start_date, reservation.end_date);
            let clashes = days_between(start, end)
                .filter(|day| self.blocked.contains(day))
                .count();
            if clashes > 0 {
                warn!(
                    id = %id,
                    start = %start,
                    end = %end,
                    clashes,
                    "approved reservation overlaps blocked dates"
                );
            }
            self.blocked.reserve(days_between(start, end));
        }

        Ok(())
    }

    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    pub fn get_reservation(&self, id: &str) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    pub fn pending_reservations(&self) -> Vec<&Reservation> {
        self.filter(|r| r.status == ReservationStatus::Pending)
    }

    pub fn discounted_reservations(&self) -> Vec<&Reservation> {
        self.filter(|r| r.is_discounted)
    }

    pub fn non_discounted_reservations(&self) -> Vec<&Reservation> {
        self.filter(|r| !r.is_discounted)
    }

    /// Sorted, de-duplicated blocked days.
    pub fn blocked_dates(&self) -> Vec<NaiveDate> {
        self.blocked.iter().collect()
    }

    pub fn blocked(&self) -> &BlockedDates {
        &self.blocked
    }

    /// Re-derive reserved days from approved reservations.
    ///
    /// Afterwards every day of every approved reservation is blocked: manual
    /// releases are dropped, manual blocks are kept.
    pub fn refresh_blocked_dates(&mut self) {
        let days = self.approved_days();
        self.blocked.refresh(days);
    }

    pub fn add_dynamic_price(&mut self, rule: DynamicPrice) -> Result<(), StoreError> {
        if rule.end_date < rule.start_date {
            return Err(StoreError::InvalidRange(rule.start_date, rule.end_date));
        }
        if !rule.price.is_positive() || rule.price > Amount::from_lira(MAX_NIGHTLY_RATE) {
            return Err(StoreError::InvalidPrice);
        }
        self.dynamic_prices.push(rule);
        Ok(())
    }

    pub fn remove_dynamic_price(&mut self, index: usize) -> Result<DynamicPrice, StoreError> {
        let len = self.dynamic_prices.len();
        if index >= len {
            return Err(StoreError::DynamicPriceIndex { index, len });
        }
        Ok(self.dynamic_prices.remove(index))
    }

    pub fn dynamic_prices(&self) -> &[DynamicPrice] {
        &self.dynamic_prices
    }

    /// Nightly price of `date`: the most recently added rule covering it, else the default rate.
    pub fn price_for_date(&self, date: NaiveDate) -> Amount {
        self.dynamic_prices
            .iter()
            .rev()
            .find(|rule| rule.contains(date))
            .map_or(self.settings.default_rate, |rule| rule.price)
    }

    /// Price every day of `start..=end`, applying the discount when asked.
    pub fn quote(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        discounted: bool,
    ) -> Result<Quote, StoreError> {
        if end < start {
            return Err(StoreError::InvalidRange(start, end));
        }
        let mut nights = 0u32;
        let mut subtotal = Amount::ZERO;
        for day in days_between(start, end) {
            nights = nights.saturating_add(1);
            subtotal = subtotal
                .checked_add(self.price_for_date(day))
                .ok_or(StoreError::PriceOverflow(start, end))?;
        }
        let discount = discounted.then_some(self.settings.discount_percent);
        Ok(Quote::new(nights, subtotal, discount))
    }
}

/// Private API
impl ReservationStore {
    fn filter(&self, predicate: impl Fn(&Reservation) -> bool) -> Vec<&Reservation> {
        self.reservations.iter().filter(|r| predicate(r)).collect()
    }

    fn approved_days(&self) -> Vec<NaiveDate> {
        self.reservations
            .iter()
            .filter(|r| r.status == ReservationStatus::Approved)
            .flat_map(|r| r.days())
            .collect()
    }

    /// Small helper to log `apply` results
    fn log_result<E: Display>(kind: &str, subject: &dyn Display, result: &Result<(), E>) {
        match result {
            Ok(()) => info!(subject = %subject, "{kind} applied"),
            Err(e) => info!(subject = %subject, reason = %e, "{kind} skipped"),
        }
    }
}
