//! Client contract data structures and CSV ingestion

mod data;
pub mod loader;

pub use data::{BillingFrequency, Client, ContractTerms, MONTHS_PER_YEAR};
pub use loader::{
    load_active_months, load_active_months_from_reader, load_clients, load_clients_from_reader,
    load_rate_schedules, load_rate_schedules_from_reader, RateSchedules,
};
