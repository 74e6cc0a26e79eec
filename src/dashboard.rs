//! Admin dashboard views: tabs, start-date filter and revenue statistics.

use chrono::NaiveDate;
use clap::ValueEnum;

use crate::Amount;
use crate::model::{Reservation, ReservationStatus};
use crate::store::ReservationStore;

/// Reservation list shown by a dashboard tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Tab {
    #[default]
    All,
    Pending,
    Discounted,
    #[value(name = "non-discounted")]
    NonDiscounted,
}

impl Tab {
    pub fn reservations<'a>(&self, store: &'a ReservationStore) -> Vec<&'a Reservation> {
        match self {
            Tab::All => store.reservations().iter().collect(),
            Tab::Pending => store.pending_reservations(),
            Tab::Discounted => store.discounted_reservations(),
            Tab::NonDiscounted => store.non_discounted_reservations(),
        }
    }
}

/// Start-date window; applies only when both bounds are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReservationFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ReservationFilter {
    pub fn matches(&self, reservation: &Reservation) -> bool {
        match (self.from, self.to) {
            (Some(from), Some(to)) => from <= reservation.start_date && reservation.start_date <= to,
            _ => true,
        }
    }

    pub fn apply<'a>(&self, reservations: Vec<&'a Reservation>) -> Vec<&'a Reservation> {
        reservations.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// Revenue summary over approved reservations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_revenue: Amount,
    pub approved_count: usize,
    pub average_value: Amount,
}

impl Stats {
    pub fn compute<'a>(reservations: impl IntoIterator<Item = &'a Reservation>) -> Self {
        let (total_revenue, approved_count) = reservations
            .into_iter()
            .filter(|r| r.status == ReservationStatus::Approved)
            .fold((Amount::ZERO, 0usize), |(sum, n), r| (sum + r.total_price, n + 1));

        let average_value = match approved_count {
            0 => Amount::ZERO,
            n => Amount::from_scaled(total_revenue.scaled() / n as i64),
        };

        Self {
            total_revenue,
            approved_count,
            average_value,
        }
    }
}
