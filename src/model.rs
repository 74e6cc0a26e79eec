//! Core domain types for the reservation store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Amount;

/// Reservation identifier.
pub type ReservationId = String;

/// Admin decision state of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Awaiting an admin decision.
    #[default]
    Pending,
    /// Confirmed; blocks its date range.
    Approved,
    /// Declined; no effect on availability.
    Rejected,
}

impl ReservationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Approved => "approved",
            ReservationStatus::Rejected => "rejected",
        }
    }
}

/// Payment progress of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Partial,
    Completed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Completed => "completed",
        }
    }
}

/// A booking request for an inclusive range of calendar days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: ReservationId,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    #[serde(with = "calendar_date")]
    pub start_date: NaiveDate,
    #[serde(with = "calendar_date")]
    pub end_date: NaiveDate,
    pub guest_count: u8,
    #[serde(default)]
    pub status: ReservationStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub paid_amount: Amount,
    pub total_price: Amount,
    #[serde(default)]
    pub is_discounted: bool,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Every calendar day the stay covers, start and end included.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        days_between(self.start_date, self.end_date)
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }
}

/// Customer input collected by the reservation form.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub guest_count: u8,
    pub total_price: Amount,
    pub is_discounted: bool,
}

/// Reasons a form submission is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReservationError {
    #[error("required field '{0}' is empty")]
    MissingField(&'static str),
    #[error("guest count {0} outside 1..={1}")]
    GuestCount(u8, u8),
    #[error("end date {1} is before start date {0}")]
    EndBeforeStart(NaiveDate, NaiveDate),
}

impl NewReservation {
    /// Check required fields, guest bounds and date order.
    pub fn validate(&self, max_guests: u8) -> Result<(), ReservationError> {
        for (field, value) in [
            ("customer_name", &self.customer_name),
            ("customer_email", &self.customer_email),
            ("customer_phone", &self.customer_phone),
        ] {
            if value.trim().is_empty() {
                return Err(ReservationError::MissingField(field));
            }
        }
        if self.guest_count == 0 || self.guest_count > max_guests {
            return Err(ReservationError::GuestCount(self.guest_count, max_guests));
        }
        if self.end_date < self.start_date {
            return Err(ReservationError::EndBeforeStart(
                self.start_date,
                self.end_date,
            ));
        }
        Ok(())
    }

    /// Turn validated input into a pending reservation.
    pub fn into_reservation(self, id: ReservationId, created_at: DateTime<Utc>) -> Reservation {
        Reservation {
            id,
            customer_name: self.customer_name.trim().to_string(),
            customer_email: self.customer_email.trim().to_string(),
            customer_phone: self.customer_phone.trim().to_string(),
            start_date: self.start_date,
            end_date: self.end_date,
            guest_count: self.guest_count,
            status: ReservationStatus::Pending,
            payment_status: PaymentStatus::Pending,
            paid_amount: Amount::ZERO,
            total_price: self.total_price,
            is_discounted: self.is_discounted,
            created_at,
        }
    }
}

/// A date-range override of the default nightly rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicPrice {
    #[serde(with = "calendar_date")]
    pub start_date: NaiveDate,
    #[serde(with = "calendar_date")]
    pub end_date: NaiveDate,
    pub price: Amount,
}

impl DynamicPrice {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, price: Amount) -> Self {
        Self {
            start_date,
            end_date,
            price,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// A store mutation, as issued by the public page or the admin dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Submit a new reservation from the form.
    Reserve(NewReservation),
    /// Confirm a pending reservation and block its days.
    Approve { id: ReservationId },
    /// Decline a pending reservation.
    Reject { id: ReservationId },
    /// Manually flip availability of one day.
    ToggleDate { date: NaiveDate },
    /// Re-derive reserved days from approved reservations.
    RefreshBlockedDates,
    /// Append a dynamic price rule.
    AddDynamicPrice(DynamicPrice),
    /// Remove the dynamic price rule at a position.
    RemoveDynamicPrice { index: usize },
}

/// Inclusive day range; empty when `end < start`.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}

/// Calendar dates are written as `YYYY-MM-DD`. Reading also accepts full
/// ISO-8601 timestamps, taking the calendar day in the local time zone.
pub mod calendar_date {
    use chrono::{DateTime, Local, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer, de};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<NaiveDate, String> {
        let raw = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, FORMAT) {
            return Ok(date);
        }
        DateTime::parse_from_rfc3339(raw)
            .map(|ts| ts.with_timezone(&Local).date_naive())
            .map_err(|e| format!("invalid date '{raw}': {e}"))
    }
}
