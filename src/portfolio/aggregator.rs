//! Portfolio aggregation across many clients
//!
//! Clients are billed independently (optionally in parallel) and then folded
//! into the report in input order, so parallel and sequential runs produce
//! identical reports. A client that fails is listed in `failures` and never
//! aborts the batch.

use std::collections::BTreeMap;

use log::{info, warn};
use rayon::prelude::*;

use super::report::{BillingFailure, PortfolioBillingReport};
use crate::billing::{ClientYearBiller, ClientYearBilling};
use crate::client::{Client, RateSchedules};
use crate::config::ReportConfig;
use crate::error::BillingResult;
use crate::rates::RateSchedule;

/// Runs client-year billing over a portfolio and rolls the results up
#[derive(Debug, Clone)]
pub struct PortfolioAggregator {
    config: ReportConfig,
}

impl PortfolioAggregator {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Bill every client for the configured year and aggregate
    pub fn summarize(&self, clients: &[Client], schedules: &RateSchedules) -> PortfolioBillingReport {
        self.summarize_year(clients, schedules, self.config.year)
    }

    /// Produce one report per requested year
    pub fn summarize_years<I>(
        &self,
        clients: &[Client],
        schedules: &RateSchedules,
        years: I,
    ) -> BTreeMap<i32, PortfolioBillingReport>
    where
        I: IntoIterator<Item = i32>,
    {
        years
            .into_iter()
            .map(|year| (year, self.summarize_year(clients, schedules, year)))
            .collect()
    }

    fn summarize_year(&self, clients: &[Client], schedules: &RateSchedules, year: i32) -> PortfolioBillingReport {
        let biller = ClientYearBiller::new(year);
        let empty = RateSchedule::new();
        let bill_one = |client: &Client| -> BillingResult<(u32, ClientYearBilling)> {
            let schedule = schedules.get(&client.id).unwrap_or(&empty);
            let population = client.terms()?.population;
            Ok((population, biller.bill(client, schedule)?))
        };

        let results: Vec<BillingResult<(u32, ClientYearBilling)>> = if self.config.parallel {
            clients.par_iter().map(bill_one).collect()
        } else {
            clients.iter().map(bill_one).collect()
        };

        let mut report = PortfolioBillingReport::new(year);
        for (client, result) in clients.iter().zip(results) {
            let recorded =
                result.and_then(|(population, billing)| report.record(client, population, &billing).map(|()| billing));
            match recorded {
                Ok(billing) => {
                    if self.config.include_client_detail {
                        report.clients.push(billing);
                    }
                }
                Err(e) => {
                    warn!("client {} year {}: {}", client.id, year, e);
                    report.record_failure(BillingFailure::new(client.id.clone(), &e));
                }
            }
        }

        info!(
            "year {}: billed {} clients ({} failed), cash={} revrec={}",
            year,
            report.client_count(),
            report.failures.len(),
            report.total_cash(),
            report.total_revrec()
        );
        report
    }
}

impl Default for PortfolioAggregator {
    fn default() -> Self {
        Self::new(ReportConfig::default())
    }
}

/// Bill and aggregate a portfolio for `year` with default settings
pub fn summarize(clients: &[Client], schedules: &RateSchedules, year: i32) -> PortfolioBillingReport {
    PortfolioAggregator::new(ReportConfig::for_year(year)).summarize(clients, schedules)
}
