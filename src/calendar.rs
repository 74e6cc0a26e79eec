//! Month grid and date-range selection for the booking calendar.

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};

use crate::Amount;
use crate::model::days_between;
use crate::store::ReservationStore;

/// Weekday column titles, Monday first.
pub const WEEKDAY_HEADER: [&str; 7] = ["Pzt", "Sal", "Çar", "Per", "Cum", "Cmt", "Paz"];

/// Stay range picked with two clicks on the calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeSelection {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl RangeSelection {
    /// First click sets the start; a later click closes the range; anything else restarts it.
    pub fn click(&mut self, date: NaiveDate) {
        match (self.start, self.end) {
            (Some(start), None) if date > start => self.end = Some(date),
            _ => {
                self.start = Some(date);
                self.end = None;
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Both ends, once the range is closed.
    pub fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.start.zip(self.end)
    }

    pub fn is_complete(&self) -> bool {
        self.range().is_some()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= date && date <= end,
            (Some(start), None) => start == date,
            _ => false,
        }
    }

    /// Inclusive number of days in a closed range.
    pub fn day_count(&self) -> u32 {
        self.range()
            .map_or(0, |(start, end)| days_between(start, end).count() as u32)
    }
}

/// One cell of the month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub disabled: bool,
    pub selected: bool,
    pub today: bool,
    /// Not shown on disabled days.
    pub price: Option<Amount>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthView {
    pub first: NaiveDate,
    /// Empty cells before the first day, Monday-based.
    pub leading_blanks: u32,
    pub days: Vec<CalendarDay>,
}

impl MonthView {
    /// Build the grid of `first`'s month; `None` for an invalid year/month.
    pub fn build(
        year: i32,
        month: u32,
        store: &ReservationStore,
        selection: &RangeSelection,
        today: NaiveDate,
    ) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let last = first.checked_add_months(Months::new(1))?.pred_opt()?;

        let days = days_between(first, last)
            .map(|date| {
                let disabled = !store.is_date_available(date);
                CalendarDay {
                    date,
                    disabled,
                    selected: selection.contains(date),
                    today: date == today,
                    price: (!disabled).then(|| store.price_for_date(date)),
                }
            })
            .collect();

        Some(Self {
            first,
            leading_blanks: first.weekday().num_days_from_monday(),
            days,
        })
    }

    /// Forward a click to the selection unless the day is disabled; returns whether it was taken.
    pub fn click(&self, date: NaiveDate, selection: &mut RangeSelection) -> bool {
        match self.days.iter().find(|day| day.date == date) {
            Some(day) if !day.disabled => {
                selection.click(date);
                true
            }
            _ => false,
        }
    }

    /// Year and month after this one.
    pub fn next(&self) -> (i32, u32) {
        let next = self.first + Months::new(1);
        (next.year(), next.month())
    }

    /// Year and month before this one.
    pub fn previous(&self) -> (i32, u32) {
        let previous = self.first - Months::new(1);
        (previous.year(), previous.month())
    }
}

impl fmt::Display for MonthView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.first.format("%m.%Y"))?;
        for title in WEEKDAY_HEADER {
            write!(f, "{title:>10}")?;
        }
        writeln!(f)?;

        let mut column = self.leading_blanks;
        for _ in 0..self.leading_blanks {
            write!(f, "{:>10}", "")?;
        }
        for day in &self.days {
            let marker = match (day.disabled, day.selected, day.today) {
                (true, _, _) => 'x',
                (_, true, _) => '*',
                (_, _, true) => '!',
                _ => ' ',
            };
            let price = day
                .price
                .map(|p| (p.scaled() / 100).to_string())
                .unwrap_or_else(|| "-".to_string());
            write!(f, "{:>3}{marker}{price:>6}", day.date.day())?;
            column += 1;
            if column % 7 == 0 {
                writeln!(f)?;
            }
        }
        if column % 7 != 0 {
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DynamicPrice, NewReservation, ReservationStatus};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn first_click_sets_start() {
        let mut selection = RangeSelection::default();
        selection.click(date(6, 5));
        assert_eq!(selection.start, Some(date(6, 5)));
        assert_eq!(selection.end, None);
        assert!(!selection.is_complete());
    }

    #[test]
    fn later_click_closes_range() {
        let mut selection = RangeSelection::default();
        selection.click(date(6, 5));
        selection.click(date(6, 8));
        assert_eq!(selection.range(), Some((date(6, 5), date(6, 8))));
        assert_eq!(selection.day_count(), 4);
    }

    #[test]
    fn earlier_or_same_click_restarts() {
        let mut selection = RangeSelection::default();
        selection.click(date(6, 5));
        selection.click(date(6, 3));
        assert_eq!(selection.start, Some(date(6, 3)));
        assert_eq!(selection.end, None);

        selection.click(date(6, 3));
        assert_eq!(selection.start, Some(date(6, 3)));
        assert_eq!(selection.end, None);
    }

    #[test]
    fn click_on_complete_range_restarts() {
        let mut selection = RangeSelection::default();
        selection.click(date(6, 5));
        selection.click(date(6, 8));
        selection.click(date(6, 20));
        assert_eq!(selection.start, Some(date(6, 20)));
        assert_eq!(selection.end, None);
    }

    #[test]
    fn contains_follows_selection_state() {
        let mut selection = RangeSelection::default();
        assert!(!selection.contains(date(6, 5)));
        selection.click(date(6, 5));
        assert!(selection.contains(date(6, 5)));
        assert!(!selection.contains(date(6, 6)));
        selection.click(date(6, 7));
        assert!(selection.contains(date(6, 6)));
        selection.clear();
        assert_eq!(selection, RangeSelection::default());
    }

    #[test]
    fn month_grid_covers_whole_month() {
        let store = ReservationStore::default();
        let view = MonthView::build(2024, 2, &store, &RangeSelection::default(), date(2, 14)).unwrap();
        assert_eq!(view.days.len(), 29);
        assert_eq!(view.days[0].date, date(2, 1));
        // 2024-02-01 is a Thursday
        assert_eq!(view.leading_blanks, 3);
        assert!(view.days[13].today);
        assert_eq!(view.days[0].price, Some(Amount::from_lira(3500)));
    }

    #[test]
    fn invalid_month_is_none() {
        let store = ReservationStore::default();
        assert!(MonthView::build(2024, 13, &store, &RangeSelection::default(), date(1, 1)).is_none());
    }

    #[test]
    fn blocked_days_are_disabled_without_price() {
        let mut store = ReservationStore::default();
        let id = store
            .add_reservation(NewReservation {
                customer_name: "Ali".to_string(),
                customer_email: "ali@example.com".to_string(),
                customer_phone: "0555".to_string(),
                start_date: date(6, 10),
                end_date: date(6, 11),
                guest_count: 2,
                total_price: Amount::from_lira(7000),
                is_discounted: false,
            })
            .unwrap();
        store
            .update_reservation_status(&id, ReservationStatus::Approved)
            .unwrap();
        store
            .add_dynamic_price(DynamicPrice::new(date(6, 12), date(6, 12), Amount::from_lira(5000)))
            .unwrap();

        let view = MonthView::build(2024, 6, &store, &RangeSelection::default(), date(6, 1)).unwrap();
        let day = |d: u32| view.days[(d - 1) as usize];
        assert!(day(10).disabled);
        assert_eq!(day(10).price, None);
        assert!(!day(12).disabled);
        assert_eq!(day(12).price, Some(Amount::from_lira(5000)));

        let mut selection = RangeSelection::default();
        assert!(!view.click(date(6, 10), &mut selection));
        assert_eq!(selection, RangeSelection::default());
        assert!(view.click(date(6, 12), &mut selection));
        assert_eq!(selection.start, Some(date(6, 12)));
    }

    #[test]
    fn navigation_wraps_years() {
        let store = ReservationStore::default();
        let view = MonthView::build(2024, 12, &store, &RangeSelection::default(), date(1, 1)).unwrap();
        assert_eq!(view.next(), (2025, 1));
        assert_eq!(view.previous(), (2024, 11));
    }

    #[test]
    fn display_renders_header_and_days() {
        let store = ReservationStore::default();
        let view = MonthView::build(2024, 6, &store, &RangeSelection::default(), date(6, 1)).unwrap();
        let text = view.to_string();
        assert!(text.starts_with("06.2024\n"));
        assert!(text.contains("Pzt"));
        assert!(text.contains("30"));
        assert!(text.contains("3500"));
    }
}
