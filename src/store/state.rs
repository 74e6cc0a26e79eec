use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Manual admin decision for a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Override {
    /// Day is unavailable even though no approved reservation covers it.
    Blocked,
    /// Day is available even though an approved reservation covers it.
    Released,
}

/// Blocked-date bookkeeping.
///
/// Days covered by approved reservations and manual overrides are kept apart;
/// the observable blocked set is `(reserved ∪ Blocked) − Released`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BlockedDates {
    reserved: BTreeSet<NaiveDate>,
    overrides: BTreeMap<NaiveDate, Override>,
}

impl BlockedDates {
    pub fn with_overrides(overrides: BTreeMap<NaiveDate, Override>) -> Self {
        Self {
            reserved: BTreeSet::new(),
            overrides,
        }
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        match self.overrides.get(date) {
            Some(Override::Blocked) => true,
            Some(Override::Released) => false,
            None => self.reserved.contains(date),
        }
    }

    /// Sorted, de-duplicated observable blocked days.
    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let manual = self
            .overrides
            .iter()
            .filter(|(_, o)| **o == Override::Blocked)
            .map(|(date, _)| *date);
        let merged: BTreeSet<NaiveDate> = self.reserved.iter().copied().chain(manual).collect();
        merged.into_iter().filter(|date| self.contains(date))
    }

    pub fn is_reserved(&self, date: &NaiveDate) -> bool {
        self.reserved.contains(date)
    }

    /// Mark days as covered by an approved reservation.
    ///
    /// A newly approved stay always blocks its days, so earlier releases of
    /// those days are dropped.
    pub fn reserve(&mut self, days: impl IntoIterator<Item = NaiveDate>) {
        for day in days {
            if self.overrides.get(&day) == Some(&Override::Released) {
                self.overrides.remove(&day);
            }
            self.reserved.insert(day);
        }
    }

    /// Replace the reservation-derived days, keeping manual overrides.
    pub fn replace_reserved(&mut self, days: impl IntoIterator<Item = NaiveDate>) {
        self.reserved = days.into_iter().collect();
    }

    /// Replace the reservation-derived days and drop every release, so each
    /// reserved day is blocked again. Manual blocks are kept.
    pub fn refresh(&mut self, days: impl IntoIterator<Item = NaiveDate>) {
        self.replace_reserved(days);
        self.overrides.retain(|_, o| *o == Override::Blocked);
    }

    /// Flip observable membership of `date`, returning whether it is now blocked.
    pub fn toggle(&mut self, date: NaiveDate) -> bool {
        let blocked = self.contains(&date);
        let reserved = self.reserved.contains(&date);
        match (blocked, reserved) {
            (true, true) => {
                self.overrides.insert(date, Override::Released);
            }
            (true, false) => {
                self.overrides.remove(&date);
            }
            (false, false) => {
                // overwrites a stale Released left behind by a refresh
                self.overrides.insert(date, Override::Blocked);
            }
            (false, true) => {
                self.overrides.remove(&date);
            }
        }
        !blocked
    }

    pub fn overrides(&self) -> &BTreeMap<NaiveDate, Override> {
        &self.overrides
    }
}
