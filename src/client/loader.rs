//! Load clients, rate schedules and activity overrides from CSV
//!
//! Expected columns:
//! - clients: `ClientID,BillingName,Tier,Industry,Product,Population,RenewalDate,BillingFrequency`
//! - rates: `ClientID,Year,PEPM`
//! - active months: `ClientID,Year,ActiveMonths`

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use csv::Reader;
use log::debug;
use rust_decimal::Decimal;

use super::Client;
use crate::error::LoadError;
use crate::rates::RateSchedule;

/// Rate schedules keyed by client id
pub type RateSchedules = HashMap<String, RateSchedule>;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw CSV row matching the clients file columns
#[derive(Debug, serde::Deserialize)]
struct ClientRow {
    #[serde(rename = "ClientID")]
    client_id: String,
    #[serde(rename = "BillingName")]
    billing_name: String,
    #[serde(rename = "Tier", default)]
    tier: String,
    #[serde(rename = "Industry", default)]
    industry: String,
    #[serde(rename = "Product", default)]
    product: String,
    #[serde(rename = "Population")]
    population: Option<i64>,
    #[serde(rename = "RenewalDate")]
    renewal_date: Option<String>,
    #[serde(rename = "BillingFrequency")]
    billing_frequency: String,
}

impl ClientRow {
    fn into_client(self, row: usize) -> Result<Client, LoadError> {
        // Blank dates stay absent so billing reports them as incomplete data
        let renewal_date = match self.renewal_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => Some(NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|e| {
                LoadError::InvalidRow {
                    row,
                    reason: format!("bad RenewalDate {:?}: {}", text, e),
                }
            })?),
        };

        Ok(Client {
            id: self.client_id,
            billing_name: self.billing_name,
            tier: self.tier,
            industry: self.industry,
            product_label: self.product,
            population: self.population,
            renewal_date,
            billing_frequency: self.billing_frequency,
            active_months_by_year: Default::default(),
        })
    }
}

#[derive(Debug, serde::Deserialize)]
struct RateRow {
    #[serde(rename = "ClientID")]
    client_id: String,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "PEPM")]
    pepm: String,
}

#[derive(Debug, serde::Deserialize)]
struct ActiveMonthsRow {
    #[serde(rename = "ClientID")]
    client_id: String,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "ActiveMonths")]
    active_months: u8,
}

/// CSV line number of the n-th record (header is line 1)
fn line_of(index: usize) -> usize {
    index + 2
}

/// Load all clients from a CSV file
pub fn load_clients<P: AsRef<Path>>(path: P) -> Result<Vec<Client>, LoadError> {
    let file = std::fs::File::open(path)?;
    load_clients_from_reader(file)
}

/// Load clients from any reader (e.g., string buffer, network stream)
pub fn load_clients_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<Client>, LoadError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut clients = Vec::new();

    for (index, result) in csv_reader.deserialize().enumerate() {
        let row: ClientRow = result?;
        clients.push(row.into_client(line_of(index))?);
    }

    debug!("loaded {} clients", clients.len());
    Ok(clients)
}

/// Load PEPM rate schedules from a CSV file
pub fn load_rate_schedules<P: AsRef<Path>>(path: P) -> Result<RateSchedules, LoadError> {
    let file = std::fs::File::open(path)?;
    load_rate_schedules_from_reader(file)
}

/// Load PEPM rate schedules from any reader
pub fn load_rate_schedules_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<RateSchedules, LoadError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut schedules = RateSchedules::new();

    for (index, result) in csv_reader.deserialize().enumerate() {
        let row: RateRow = result?;
        let pepm = Decimal::from_str(row.pepm.trim()).map_err(|e| LoadError::InvalidRow {
            row: line_of(index),
            reason: format!("bad PEPM {:?}: {}", row.pepm, e),
        })?;
        if pepm.is_sign_negative() {
            return Err(LoadError::InvalidRow {
                row: line_of(index),
                reason: format!("negative PEPM {}", pepm),
            });
        }

        schedules
            .entry(row.client_id)
            .or_default()
            .insert(row.year, pepm);
    }

    debug!("loaded rate schedules for {} clients", schedules.len());
    Ok(schedules)
}

/// Merge active-month overrides from a CSV file into `clients`
pub fn load_active_months<P: AsRef<Path>>(path: P, clients: &mut [Client]) -> Result<usize, LoadError> {
    let file = std::fs::File::open(path)?;
    load_active_months_from_reader(file, clients)
}

/// Merge active-month overrides from any reader into `clients`
///
/// Returns the number of overrides applied. Rows naming an unknown client are rejected.
pub fn load_active_months_from_reader<R: std::io::Read>(
    reader: R,
    clients: &mut [Client],
) -> Result<usize, LoadError> {
    let positions: HashMap<String, usize> = clients
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.clone(), i))
        .collect();

    let mut csv_reader = Reader::from_reader(reader);
    let mut applied = 0;

    for (index, result) in csv_reader.deserialize().enumerate() {
        let row: ActiveMonthsRow = result?;
        let position = positions.get(&row.client_id).ok_or_else(|| LoadError::InvalidRow {
            row: line_of(index),
            reason: format!("unknown client {:?}", row.client_id),
        })?;
        if row.active_months > 12 {
            return Err(LoadError::InvalidRow {
                row: line_of(index),
                reason: format!("ActiveMonths {} exceeds 12", row.active_months),
            });
        }

        clients[*position]
            .active_months_by_year
            .insert(row.year, row.active_months);
        applied += 1;
    }

    Ok(applied)
}
