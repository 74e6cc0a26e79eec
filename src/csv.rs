use std::io;
use std::path::Path;

use chrono::{Local, NaiveDate};
use serde::Deserialize;
use thiserror::Error;

use crate::Amount;
use crate::model::{Command, DynamicPrice, NewReservation, Reservation, calendar_date};

/// Column titles of the reservation export, as the dashboard shows them.
pub const EXPORT_HEADER: [&str; 13] = [
    "ID",
    "Müşteri Adı",
    "E-posta",
    "Telefon",
    "Başlangıç Tarihi",
    "Bitiş Tarihi",
    "Kişi Sayısı",
    "Durum",
    "Ödeme Durumu",
    "Ödenen Miktar",
    "Toplam Fiyat",
    "İndirimli",
    "Talep Tarihi",
];

/// Errors that can occur when parsing csv rows
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open {path}: {source}")]
    Open { path: String, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized command type '{kind}'")]
    UnrecognizedType { line: usize, kind: String },

    #[error("line {line}: {kind} missing {field}")]
    MissingField {
        line: usize,
        kind: String,
        field: &'static str,
    },

    #[error("line {line}: {reason}")]
    InvalidDate { line: usize, reason: String },
}

#[derive(Debug, Deserialize)]
struct InputRow {
    r#type: String,
    id: Option<String>,
    date: Option<String>,
    start: Option<String>,
    end: Option<String>,
    price: Option<f64>,
    index: Option<usize>,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    guests: Option<u8>,
    total: Option<f64>,
    discounted: Option<bool>,
}

/// Read store commands from a csv file
///
/// Header: `type,id,date,start,end,price,index,name,email,phone,guests,total,discounted`.
/// Columns a command type does not use may be left empty.
pub fn read_commands(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Command, CsvError>>, CsvError> {
    let path = path.as_ref();
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.display().to_string(),
            source,
        })?;

    Ok(reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            row.into_command(line)
        }))
}

impl InputRow {
    fn into_command(self, line: usize) -> Result<Command, CsvError> {
        let kind = self.r#type.clone();
        let missing = |field: &'static str| CsvError::MissingField {
            line,
            kind: kind.clone(),
            field,
        };
        let date = |raw: Option<String>, field: &'static str| -> Result<NaiveDate, CsvError> {
            let raw = raw.ok_or_else(|| missing(field))?;
            calendar_date::parse(&raw).map_err(|reason| CsvError::InvalidDate { line, reason })
        };

        match self.r#type.as_str() {
            "reserve" => Ok(Command::Reserve(NewReservation {
                customer_name: self.name.ok_or_else(|| missing("name"))?,
                customer_email: self.email.ok_or_else(|| missing("email"))?,
                customer_phone: self.phone.ok_or_else(|| missing("phone"))?,
                start_date: date(self.start, "start")?,
                end_date: date(self.end, "end")?,
                guest_count: self.guests.unwrap_or(1),
                total_price: Amount::from_float(self.total.ok_or_else(|| missing("total"))?),
                is_discounted: self.discounted.unwrap_or(false),
            })),
            "approve" => Ok(Command::Approve {
                id: self.id.ok_or_else(|| missing("id"))?,
            }),
            "reject" => Ok(Command::Reject {
                id: self.id.ok_or_else(|| missing("id"))?,
            }),
            "toggle" => Ok(Command::ToggleDate {
                date: date(self.date, "date")?,
            }),
            "refresh" => Ok(Command::RefreshBlockedDates),
            "add_price" => Ok(Command::AddDynamicPrice(DynamicPrice::new(
                date(self.start, "start")?,
                date(self.end, "end")?,
                Amount::from_float(self.price.ok_or_else(|| missing("price"))?),
            ))),
            "remove_price" => Ok(Command::RemoveDynamicPrice {
                index: self.index.ok_or_else(|| missing("index"))?,
            }),
            other => Err(CsvError::UnrecognizedType {
                line,
                kind: other.to_string(),
            }),
        }
    }
}

/// Write reservations in the dashboard export layout.
///
/// Fields holding commas, quotes or line breaks are quoted by the writer.
pub fn write_reservations<'a, W: io::Write>(
    writer: W,
    reservations: impl IntoIterator<Item = &'a Reservation>,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(EXPORT_HEADER)?;

    for r in reservations {
        let created = r.created_at.with_timezone(&Local);
        writer.write_record([
            r.id.clone(),
            r.customer_name.clone(),
            r.customer_email.clone(),
            r.customer_phone.clone(),
            r.start_date.format("%d.%m.%Y").to_string(),
            r.end_date.format("%d.%m.%Y").to_string(),
            r.guest_count.to_string(),
            r.status.as_str().to_string(),
            r.payment_status.as_str().to_string(),
            r.paid_amount.to_string(),
            r.total_price.to_string(),
            if r.is_discounted { "Evet" } else { "Hayır" }.to_string(),
            created.format("%d.%m.%Y %H:%M").to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
