//! PEPM Billing - Cash and revenue recognition engine for per-head subscription contracts
//!
//! This library provides:
//! - Renewal-aware PEPM rate resolution across contract-year boundaries
//! - Monthly revenue recognition and frequency-driven cash timing
//! - Partial-year (active window) gating
//! - Client-year schedules and portfolio rollups by month, tier, industry, and product
//!
//! The engine is pure computation: callers supply client and rate snapshots and
//! receive plain data back.

pub mod billing;
pub mod client;
pub mod config;
pub mod error;
pub mod portfolio;
pub mod rates;

// Re-export commonly used types
pub use billing::{bill_year, ClientYearBiller, ClientYearBilling, MonthlyBillingRecord};
pub use client::{BillingFrequency, Client, ContractTerms, RateSchedules};
pub use config::ReportConfig;
pub use error::{BillingError, BillingResult, ErrorKind, LoadError};
pub use portfolio::{summarize, BillingFailure, GroupTotals, PortfolioAggregator, PortfolioBillingReport};
pub use rates::RateSchedule;
