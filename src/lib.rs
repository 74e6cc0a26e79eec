pub mod admin;
pub mod amount;
pub mod calendar;
pub mod config;
pub mod csv;
pub mod dashboard;
pub mod discount;
pub mod model;
pub mod persist;
pub mod store;

pub use amount::Amount;
pub use config::Config;
pub use model::{
    Command, DynamicPrice, NewReservation, Reservation, ReservationId, ReservationStatus,
};
pub use store::{ReservationStore, StoreError, StoreSettings};
