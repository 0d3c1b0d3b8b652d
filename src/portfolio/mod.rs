//! Portfolio-wide aggregation of client billing into summary reports

mod aggregator;
mod report;

pub use aggregator::{summarize, PortfolioAggregator};
pub use report::{BillingFailure, GroupTotals, PortfolioBillingReport};
