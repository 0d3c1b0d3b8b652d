//! Error taxonomy for billing computations and data ingestion

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single client's billing computation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    #[error("no PEPM rate for {year} (needed for month {month})")]
    RateNotFound { year: i32, month: u32 },

    #[error("invalid billing frequency: {0:?}")]
    InvalidBillingFrequency(String),

    #[error("client data incomplete: {field} {reason}")]
    ClientDataIncomplete { field: &'static str, reason: String },

    #[error("amount overflow computing {0}")]
    AmountOverflow(&'static str),
}

pub type BillingResult<T> = Result<T, BillingError>;

/// Coarse classification of a [`BillingError`], carried in portfolio failure lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RateNotFound,
    InvalidBillingFrequency,
    ClientDataIncomplete,
    AmountOverflow,
}

impl BillingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BillingError::RateNotFound { .. } => ErrorKind::RateNotFound,
            BillingError::InvalidBillingFrequency(_) => ErrorKind::InvalidBillingFrequency,
            BillingError::ClientDataIncomplete { .. } => ErrorKind::ClientDataIncomplete,
            BillingError::AmountOverflow(_) => ErrorKind::AmountOverflow,
        }
    }
}

/// Errors raised while reading input files (CSV snapshots, JSON run config)
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}
