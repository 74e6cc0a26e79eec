use chrono::{Days, NaiveDate};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rez::{Amount, DynamicPrice, NewReservation, ReservationStatus, ReservationStore};

/// Generates back-to-back reservations starting at `first`.
///
/// Pattern per reservation (repeating):
/// 1. 3-night stay
/// 2. 1-day gap
pub struct StayGenerator {
    next_start: NaiveDate,
    remaining: usize,
}

impl StayGenerator {
    pub fn new(first: NaiveDate, count: usize) -> Self {
        Self {
            next_start: first,
            remaining: count,
        }
    }
}

impl Iterator for StayGenerator {
    type Item = NewReservation;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let start = self.next_start;
        let end = start + Days::new(2);
        self.next_start = end + Days::new(2);

        Some(NewReservation {
            customer_name: "Bench Guest".to_string(),
            customer_email: "bench@example.com".to_string(),
            customer_phone: "0555".to_string(),
            start_date: start,
            end_date: end,
            guest_count: 2,
            total_price: Amount::from_lira(10500),
            is_discounted: self.remaining % 2 == 0,
        })
    }
}

fn first_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// Store with `count` approved stays and one price rule per month.
fn populated(count: usize) -> ReservationStore {
    let mut store = ReservationStore::default();
    for input in StayGenerator::new(first_day(), count) {
        let id = store.add_reservation(input).unwrap();
        store
            .update_reservation_status(&id, ReservationStatus::Approved)
            .unwrap();
    }
    for month in 0..12u64 {
        let start = first_day() + Days::new(month * 30);
        store
            .add_dynamic_price(DynamicPrice::new(
                start,
                start + Days::new(14),
                Amount::from_lira(4000 + month as i64 * 100),
            ))
            .unwrap();
    }
    store
}

fn bench_refresh(c: &mut Criterion) {
    let mut group = c.benchmark_group("refresh_blocked_dates");

    for count in [100usize, 1_000, 10_000] {
        let store = populated(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &store, |b, store| {
            b.iter(|| {
                let mut store = store.clone();
                store.refresh_blocked_dates();
                black_box(store)
            });
        });
    }

    group.finish();
}

fn bench_quote(c: &mut Criterion) {
    let store = populated(1_000);
    let start = first_day();

    c.bench_function("quote_year", |b| {
        b.iter(|| black_box(store.quote(start, start + Days::new(364), true)))
    });
}

fn bench_availability(c: &mut Criterion) {
    let store = populated(1_000);
    let start = first_day();

    c.bench_function("availability_year", |b| {
        b.iter(|| {
            (0..365u64)
                .filter(|offset| store.is_date_available(start + Days::new(*offset)))
                .count()
        })
    });
}

criterion_group!(benches, bench_refresh, bench_quote, bench_availability);
criterion_main!(benches);
