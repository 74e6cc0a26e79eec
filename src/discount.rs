//! Time-limited discount offer shown on the public page.
//!
//! The offer is announced a while after the visitor arrives. Once the visitor
//! opens it, a countdown ticks once a second; the discount can be applied to a
//! closed date selection until the countdown runs out.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::info;

use crate::calendar::RangeSelection;

/// Delay before the offer is announced.
pub const ANNOUNCE_AFTER: Duration = Duration::from_secs(30);

/// Length of the countdown once the offer is opened, in seconds.
pub const COUNTDOWN_SECS: u32 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferState {
    Waiting,
    Announced,
    Counting { remaining: u32 },
    Applied,
    Expired,
    /// Spent on a submitted reservation.
    Used,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscountError {
    #[error("select a date range before applying the discount")]
    SelectionRequired,
    #[error("the discount offer has expired")]
    Expired,
    #[error("the discount offer is not open")]
    NotOffered,
}

#[derive(Debug)]
pub struct DiscountOffer {
    state: OfferState,
}

impl Default for DiscountOffer {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscountOffer {
    pub fn new() -> Self {
        Self {
            state: OfferState::Waiting,
        }
    }

    pub fn state(&self) -> OfferState {
        self.state
    }

    pub fn announce(&mut self) {
        if self.state == OfferState::Waiting {
            self.state = OfferState::Announced;
        }
    }

    /// Open an announced offer and start the countdown.
    pub fn open(&mut self) -> Result<(), DiscountError> {
        match self.state {
            OfferState::Announced => {
                self.state = OfferState::Counting {
                    remaining: COUNTDOWN_SECS,
                };
                Ok(())
            }
            OfferState::Expired => Err(DiscountError::Expired),
            _ => Err(DiscountError::NotOffered),
        }
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> OfferState {
        if let OfferState::Counting { remaining } = self.state {
            self.state = match remaining.saturating_sub(1) {
                0 => {
                    info!("discount offer expired");
                    OfferState::Expired
                }
                left => OfferState::Counting { remaining: left },
            };
        }
        self.state
    }

    /// Apply the discount to a closed selection; stops the countdown.
    pub fn apply(&mut self, selection: &RangeSelection) -> Result<(), DiscountError> {
        match self.state {
            OfferState::Counting { .. } if !selection.is_complete() => {
                Err(DiscountError::SelectionRequired)
            }
            OfferState::Counting { .. } | OfferState::Applied => {
                self.state = OfferState::Applied;
                Ok(())
            }
            OfferState::Expired => Err(DiscountError::Expired),
            _ => Err(DiscountError::NotOffered),
        }
    }

    pub fn is_applied(&self) -> bool {
        self.state == OfferState::Applied
    }

    /// Hand the discount to a reservation; returns whether one was applied.
    pub fn consume(&mut self) -> bool {
        let applied = self.is_applied();
        if applied {
            self.state = OfferState::Used;
        }
        applied
    }

    /// Remaining countdown as `m:ss`.
    pub fn remaining_display(&self) -> Option<String> {
        match self.state {
            OfferState::Counting { remaining } => {
                Some(format!("{}:{:02}", remaining / 60, remaining % 60))
            }
            _ => None,
        }
    }
}

/// Announce the offer after `delay`.
pub async fn announce_after(offer: Arc<Mutex<DiscountOffer>>, delay: Duration) {
    tokio::time::sleep(delay).await;
    offer.lock().await.announce();
}

/// Tick an open offer once a second until it is applied or expires,
/// publishing every state change.
pub async fn run_countdown(offer: Arc<Mutex<DiscountOffer>>, updates: watch::Sender<OfferState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    // the first tick completes immediately
    interval.tick().await;
    loop {
        interval.tick().await;
        let state = offer.lock().await.tick();
        // nobody listening is fine
        let _ = updates.send(state);
        if !matches!(state, OfferState::Counting { .. }) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn closed_selection() -> RangeSelection {
        let mut selection = RangeSelection::default();
        selection.click(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        selection.click(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        selection
    }

    fn counting() -> DiscountOffer {
        let mut offer = DiscountOffer::new();
        offer.announce();
        offer.open().unwrap();
        offer
    }

    #[test]
    fn must_be_announced_before_open() {
        let mut offer = DiscountOffer::new();
        assert_eq!(offer.open(), Err(DiscountError::NotOffered));
        offer.announce();
        assert!(offer.open().is_ok());
        assert_eq!(offer.remaining_display().as_deref(), Some("4:00"));
    }

    #[test]
    fn tick_counts_down_and_expires() {
        let mut offer = counting();
        assert_eq!(offer.tick(), OfferState::Counting { remaining: 239 });
        assert_eq!(offer.remaining_display().as_deref(), Some("3:59"));
        for _ in 0..238 {
            offer.tick();
        }
        assert_eq!(offer.remaining_display().as_deref(), Some("0:01"));
        assert_eq!(offer.tick(), OfferState::Expired);
        assert_eq!(offer.apply(&closed_selection()), Err(DiscountError::Expired));
    }

    #[test]
    fn apply_requires_closed_selection() {
        let mut offer = counting();
        assert_eq!(
            offer.apply(&RangeSelection::default()),
            Err(DiscountError::SelectionRequired)
        );
        assert!(offer.apply(&closed_selection()).is_ok());
        assert!(offer.is_applied());
        // countdown stops once applied
        assert_eq!(offer.tick(), OfferState::Applied);
    }

    #[test]
    fn applied_discount_outlives_countdown() {
        let mut offer = counting();
        offer.apply(&closed_selection()).unwrap();
        for _ in 0..=COUNTDOWN_SECS {
            offer.tick();
        }
        assert!(offer.is_applied());
        assert_eq!(offer.state(), OfferState::Applied);
    }

    #[test]
    fn consume_spends_discount_once() {
        let mut offer = counting();
        offer.apply(&closed_selection()).unwrap();
        assert!(offer.consume());
        assert!(!offer.consume());
        assert_eq!(offer.state(), OfferState::Used);
    }

    #[tokio::test(start_paused = true)]
    async fn announce_waits_for_delay() {
        let offer = Arc::new(Mutex::new(DiscountOffer::new()));
        let task = tokio::spawn(announce_after(offer.clone(), ANNOUNCE_AFTER));

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(offer.lock().await.state(), OfferState::Waiting);

        task.await.unwrap();
        assert_eq!(offer.lock().await.state(), OfferState::Announced);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_expires_after_four_minutes() {
        let offer = Arc::new(Mutex::new(counting()));
        let (tx, rx) = watch::channel(offer.lock().await.state());

        run_countdown(offer.clone(), tx).await;

        assert_eq!(*rx.borrow(), OfferState::Expired);
        assert_eq!(offer.lock().await.state(), OfferState::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_stops_when_applied() {
        let offer = Arc::new(Mutex::new(counting()));
        let (tx, mut rx) = watch::channel(offer.lock().await.state());
        let task = tokio::spawn(run_countdown(offer.clone(), tx));

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), OfferState::Counting { remaining: 239 });
        offer.lock().await.apply(&closed_selection()).unwrap();

        task.await.unwrap();
        assert_eq!(*rx.borrow(), OfferState::Applied);
    }
}
