//! Portfolio-level report structures

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::billing::{checked_sum, ClientYearBilling};
use crate::client::{Client, MONTHS_PER_YEAR};
use crate::error::{BillingError, BillingResult, ErrorKind};

/// Accumulated totals for one tier, industry, or product
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTotals {
    pub cash: Decimal,
    pub revrec: Decimal,
    pub client_count: usize,
    pub population: u64,
}

impl GroupTotals {
    /// Totals with one more client folded in
    fn plus(&self, billing: &ClientYearBilling, population: u32) -> BillingResult<Self> {
        Ok(Self {
            cash: checked_sum([self.cash, billing.total_cash], "group cash total")?,
            revrec: checked_sum([self.revrec, billing.total_revrec], "group revrec total")?,
            client_count: self.client_count + 1,
            population: self.population + u64::from(population),
        })
    }
}

fn group_plus(
    groups: &BTreeMap<String, GroupTotals>,
    key: &str,
    billing: &ClientYearBilling,
    population: u32,
) -> BillingResult<GroupTotals> {
    groups
        .get(key)
        .cloned()
        .unwrap_or_default()
        .plus(billing, population)
}

/// A client whose year could not be billed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingFailure {
    pub client_id: String,
    pub error_kind: ErrorKind,
    pub message: String,
}

impl BillingFailure {
    pub fn new(client_id: impl Into<String>, error: &BillingError) -> Self {
        Self {
            client_id: client_id.into(),
            error_kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Organization-wide cash and revrec for one year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioBillingReport {
    pub year: i32,

    /// Cash by calendar month; index 0 is January
    pub monthly_cash: [Decimal; 12],

    /// Recognized revenue by calendar month; index 0 is January
    pub monthly_revrec: [Decimal; 12],

    pub by_tier: BTreeMap<String, GroupTotals>,
    pub by_industry: BTreeMap<String, GroupTotals>,
    pub by_product: BTreeMap<String, GroupTotals>,

    /// Per-client schedules, when requested
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clients: Vec<ClientYearBilling>,

    pub failures: Vec<BillingFailure>,

    client_count: usize,
    population: u64,
}

impl PortfolioBillingReport {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            monthly_cash: Default::default(),
            monthly_revrec: Default::default(),
            by_tier: BTreeMap::new(),
            by_industry: BTreeMap::new(),
            by_product: BTreeMap::new(),
            clients: Vec::new(),
            failures: Vec::new(),
            client_count: 0,
            population: 0,
        }
    }

    /// Fold one successfully billed client into the totals
    ///
    /// Either every total is updated or, on error, none is: a month outside
    /// 1-12 or a total too large to represent leaves the report unchanged.
    pub fn record(&mut self, client: &Client, population: u32, billing: &ClientYearBilling) -> BillingResult<()> {
        let mut monthly_cash = self.monthly_cash;
        let mut monthly_revrec = self.monthly_revrec;
        for record in &billing.months {
            let idx = month_index(record.month).ok_or_else(|| BillingError::ClientDataIncomplete {
                field: "month",
                reason: format!("{} is outside 1-12", record.month),
            })?;
            monthly_cash[idx] = checked_sum([monthly_cash[idx], record.cash_amount], "monthly cash total")?;
            monthly_revrec[idx] =
                checked_sum([monthly_revrec[idx], record.revrec_amount], "monthly revrec total")?;
        }

        // Grand totals are summed on demand, so they must stay representable too
        checked_sum(monthly_cash, "portfolio cash total")?;
        checked_sum(monthly_revrec, "portfolio revrec total")?;

        let tier = group_plus(&self.by_tier, &client.tier, billing, population)?;
        let industry = group_plus(&self.by_industry, &client.industry, billing, population)?;
        let product = group_plus(&self.by_product, &client.product_label, billing, population)?;

        self.monthly_cash = monthly_cash;
        self.monthly_revrec = monthly_revrec;
        self.by_tier.insert(client.tier.clone(), tier);
        self.by_industry.insert(client.industry.clone(), industry);
        self.by_product.insert(client.product_label.clone(), product);
        self.client_count += 1;
        self.population += u64::from(population);
        Ok(())
    }

    pub fn record_failure(&mut self, failure: BillingFailure) {
        self.failures.push(failure);
    }

    /// Cash for calendar `month` (1-12)
    pub fn cash_in(&self, month: u32) -> Decimal {
        month_index(month).map(|i| self.monthly_cash[i]).unwrap_or_default()
    }

    /// Recognized revenue for calendar `month` (1-12)
    pub fn revrec_in(&self, month: u32) -> Decimal {
        month_index(month).map(|i| self.monthly_revrec[i]).unwrap_or_default()
    }

    pub fn total_cash(&self) -> Decimal {
        self.monthly_cash.iter().copied().sum()
    }

    pub fn total_revrec(&self) -> Decimal {
        self.monthly_revrec.iter().copied().sum()
    }

    /// Cash minus revrec per month
    pub fn monthly_variance(&self) -> [Decimal; 12] {
        let mut variance = [Decimal::ZERO; 12];
        for (i, v) in variance.iter_mut().enumerate() {
            *v = self.monthly_cash[i] - self.monthly_revrec[i];
        }
        variance
    }

    /// Number of clients billed successfully
    pub fn client_count(&self) -> usize {
        self.client_count
    }

    /// Covered population across successfully billed clients
    pub fn population(&self) -> u64 {
        self.population
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

fn month_index(month: u32) -> Option<usize> {
    (1..=MONTHS_PER_YEAR).contains(&month).then(|| (month - 1) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::MonthlyBillingRecord;
    use crate::client::BillingFrequency;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn client() -> Client {
        let renewal = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Client::new("c1", 1, renewal, BillingFrequency::Monthly).with_grouping("Gold", "Retail", "Core")
    }

    fn billing(months: &[u32], amount: Decimal) -> ClientYearBilling {
        let records = months
            .iter()
            .map(|&month| MonthlyBillingRecord {
                month,
                active: true,
                pepm_applied: amount,
                cash_amount: amount,
                revrec_amount: amount,
            })
            .collect();
        ClientYearBilling::from_months("c1".into(), 2026, records).unwrap()
    }

    #[test]
    fn test_record_accumulates() {
        let mut report = PortfolioBillingReport::new(2026);
        report.record(&client(), 1, &billing(&[1, 2], dec!(5))).unwrap();
        report.record(&client(), 1, &billing(&[2], dec!(7))).unwrap();

        assert_eq!(report.cash_in(1), dec!(5));
        assert_eq!(report.cash_in(2), dec!(12));
        assert_eq!(report.total_revrec(), dec!(17));
        assert_eq!(report.by_tier["Gold"].client_count, 2);
        assert_eq!(report.client_count(), 2);
    }

    #[test]
    fn test_record_rejects_month_outside_year() {
        let mut report = PortfolioBillingReport::new(2026);
        let err = report.record(&client(), 1, &billing(&[3, 13], dec!(1))).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ClientDataIncomplete);
        assert_eq!(report, PortfolioBillingReport::new(2026));
    }

    #[test]
    fn test_record_overflow_leaves_report_unchanged() {
        let big = Decimal::MAX / Decimal::from(2);
        let mut report = PortfolioBillingReport::new(2026);
        report.record(&client(), 1, &billing(&[1], big)).unwrap();
        let before = report.clone();

        // Each month fits, but the grand total would not
        let err = report.record(&client(), 1, &billing(&[2], big)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmountOverflow);
        assert_eq!(report, before);
        assert_eq!(report.total_cash(), big);
    }
}
