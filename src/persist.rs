//! JSON storage record.
//!
//! The record mirrors what the booking page kept in browser storage under
//! the `reservation-storage` key:
//! `{"state": {"reservations": [..], "blockedDates": [..], "dynamicPrices": [..]}, "version": 0}`.
//! Manual availability overrides are stored next to the derived blocked dates.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{DynamicPrice, Reservation, ReservationStatus, calendar_date};
use crate::store::{Override, ReservationStore, StoreSettings};

/// Storage key of the browser record; also the default file stem.
pub const STORAGE_NAME: &str = "reservation-storage";

/// Errors that can occur while writing the storage file
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write {path}: {source}")]
    Io { path: String, source: io::Error },

    #[error("failed to encode storage record: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct StorageRecord {
    state: StoredState,
    #[serde(default)]
    version: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredState {
    #[serde(default)]
    reservations: Vec<Reservation>,
    #[serde(default, with = "date_list")]
    blocked_dates: Vec<NaiveDate>,
    #[serde(default)]
    dynamic_prices: Vec<DynamicPrice>,
    /// Absent in records written by the browser page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    manual_overrides: Option<BTreeMap<NaiveDate, Override>>,
}

/// Load a store from `path`.
///
/// A missing, unreadable or malformed file yields an empty store; the
/// failure is logged and otherwise ignored.
pub fn load(path: impl AsRef<Path>, settings: StoreSettings) -> ReservationStore {
    let path = path.as_ref();
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no storage file, starting empty");
            return ReservationStore::new(settings);
        }
        Err(e) => {
            warn!(path = %path.display(), reason = %e, "storage file unreadable, starting empty");
            return ReservationStore::new(settings);
        }
    };
    match from_json(&raw, settings) {
        Ok(store) => store,
        Err(e) => {
            warn!(path = %path.display(), reason = %e, "storage file malformed, starting empty");
            ReservationStore::new(settings)
        }
    }
}

/// Rebuild a store from a storage record.
pub fn from_json(raw: &str, settings: StoreSettings) -> Result<ReservationStore, serde_json::Error> {
    let record: StorageRecord = serde_json::from_str(raw)?;
    let StoredState {
        reservations,
        blocked_dates,
        dynamic_prices,
        manual_overrides,
    } = record.state;

    let overrides =
        manual_overrides.unwrap_or_else(|| legacy_overrides(&reservations, &blocked_dates));

    Ok(ReservationStore::from_parts(
        settings,
        reservations,
        dynamic_prices,
        overrides,
    ))
}

/// Encode a store as a storage record.
pub fn to_json(store: &ReservationStore) -> Result<String, serde_json::Error> {
    let record = StorageRecord {
        state: StoredState {
            reservations: store.reservations().to_vec(),
            blocked_dates: store.blocked_dates(),
            dynamic_prices: store.dynamic_prices().to_vec(),
            manual_overrides: Some(store.blocked().overrides().clone()),
        },
        version: 0,
    };
    serde_json::to_string_pretty(&record)
}

/// Write the store to `path`, replacing the previous record in one rename.
pub fn save(path: impl AsRef<Path>, store: &ReservationStore) -> Result<(), PersistError> {
    let path = path.as_ref();
    let io_err = |source| PersistError::Io {
        path: path.display().to_string(),
        source,
    };

    let json = to_json(store)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // the temp file is removed on drop if any step below fails
    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(json.as_bytes()).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;
    file.persist(path).map_err(|e| io_err(e.error))?;

    debug!(
        path = %path.display(),
        reservations = store.reservations().len(),
        "storage saved"
    );
    Ok(())
}

/// Records written by the browser page keep manual toggles only inside
/// `blockedDates`; any day there that no approved reservation explains
/// becomes a manual block.
fn legacy_overrides(
    reservations: &[Reservation],
    blocked_dates: &[NaiveDate],
) -> BTreeMap<NaiveDate, Override> {
    blocked_dates
        .iter()
        .filter(|date| {
            !reservations.iter().any(|r| {
                r.status == ReservationStatus::Approved && r.overlaps(**date, **date)
            })
        })
        .map(|date| (*date, Override::Blocked))
        .collect()
}

mod date_list {
    use chrono::NaiveDate;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::calendar_date;

    pub fn serialize<S: Serializer>(dates: &[NaiveDate], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(dates.len()))?;
        for date in dates {
            seq.serialize_element(&date.format("%Y-%m-%d").to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<NaiveDate>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|raw| calendar_date::parse(raw).map_err(de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Amount;
    use crate::model::NewReservation;
    use tempfile::TempDir;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn populated_store() -> ReservationStore {
        let mut store = ReservationStore::default();
        let id = store
            .add_reservation(NewReservation {
                customer_name: "Zeynep Kaya".to_string(),
                customer_email: "zeynep@example.com".to_string(),
                customer_phone: "05551112233".to_string(),
                start_date: date(6, 1),
                end_date: date(6, 3),
                guest_count: 3,
                total_price: Amount::from_lira(10500),
                is_discounted: false,
            })
            .unwrap();
        store
            .update_reservation_status(&id, ReservationStatus::Approved)
            .unwrap();
        store.toggle_date_availability(date(6, 20));
        store.toggle_date_availability(date(6, 2));
        store
            .add_dynamic_price(DynamicPrice::new(date(7, 1), date(7, 10), Amount::from_lira(5000)))
            .unwrap();
        store
    }

    #[test]
    fn save_then_load_preserves_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        let store = populated_store();

        save(&path, &store).unwrap();
        let loaded = load(&path, StoreSettings::default());

        assert_eq!(loaded.reservations(), store.reservations());
        assert_eq!(loaded.dynamic_prices(), store.dynamic_prices());
        assert_eq!(loaded.blocked_dates(), vec![date(6, 1), date(6, 3), date(6, 20)]);
        assert!(loaded.is_date_available(date(6, 2)));
    }

    #[test]
    fn failed_save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        // a directory in the way makes the final rename fail
        let path = dir.path().join("storage.json");
        fs::create_dir(&path).unwrap();

        assert!(matches!(
            save(&path, &populated_store()),
            Err(PersistError::Io { .. })
        ));
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("storage.json")]);
    }

    #[test]
    fn save_replaces_previous_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        save(&path, &ReservationStore::default()).unwrap();
        save(&path, &populated_store()).unwrap();

        let loaded = load(&path, StoreSettings::default());
        assert_eq!(loaded.reservations().len(), 1);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = load(dir.path().join("absent.json"), StoreSettings::default());
        assert!(store.reservations().is_empty());
    }

    #[test]
    fn malformed_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let store = load(&path, StoreSettings::default());
        assert!(store.reservations().is_empty());
        assert!(store.blocked_dates().is_empty());
    }

    #[test]
    fn browser_record_is_rehydrated() {
        let raw = r#"{
            "state": {
                "reservations": [{
                    "id": "1717000000000",
                    "customerName": "Ali Veli",
                    "customerEmail": "ali@example.com",
                    "customerPhone": "0555",
                    "startDate": "2024-06-01T12:00:00.000Z",
                    "endDate": "2024-06-02T12:00:00.000Z",
                    "guestCount": 2,
                    "status": "approved",
                    "paymentStatus": "pending",
                    "paidAmount": 0,
                    "totalPrice": 7000,
                    "isDiscounted": false,
                    "createdAt": "2024-05-20T10:15:00.000Z"
                }],
                "blockedDates": ["2024-06-01T12:00:00.000Z", "2024-06-02T12:00:00.000Z", "2024-06-15T12:00:00.000Z"],
                "dynamicPrices": [{"startDate": "2024-07-01", "endDate": "2024-07-10", "price": 5000}]
            },
            "version": 0
        }"#;
        let store = from_json(raw, StoreSettings::default()).unwrap();

        assert_eq!(store.reservations().len(), 1);
        assert_eq!(store.reservations()[0].total_price, Amount::from_lira(7000));
        assert_eq!(
            store.blocked_dates(),
            vec![date(6, 1), date(6, 2), date(6, 15)]
        );
        // the toggled day survives a refresh because it became an override
        let mut store = store;
        store.refresh_blocked_dates();
        assert!(!store.is_date_available(date(6, 15)));
        assert_eq!(store.price_for_date(date(7, 5)), Amount::from_lira(5000));
    }

    #[test]
    fn record_uses_browser_field_names() {
        let json = to_json(&populated_store()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], 0);
        assert!(value["state"]["reservations"].is_array());
        assert_eq!(value["state"]["blockedDates"][0], "2024-06-01");
        assert_eq!(value["state"]["manualOverrides"]["2024-06-02"], "released");
    }
}
