//! Billing output structures for one client-year

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::checked_sum;
use crate::error::BillingResult;

/// Cash and recognized revenue for one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyBillingRecord {
    /// Calendar month (1-12)
    pub month: u32,

    /// Whether the month falls inside the client's active window
    pub active: bool,

    /// Rate used for the month; zero when inactive
    pub pepm_applied: Decimal,

    pub cash_amount: Decimal,
    pub revrec_amount: Decimal,
}

impl MonthlyBillingRecord {
    /// Zero record for a month outside the active window
    pub fn inactive(month: u32) -> Self {
        Self {
            month,
            active: false,
            pepm_applied: Decimal::ZERO,
            cash_amount: Decimal::ZERO,
            revrec_amount: Decimal::ZERO,
        }
    }

    /// Cash invoiced minus revenue recognized
    pub fn variance(&self) -> Decimal {
        self.cash_amount - self.revrec_amount
    }
}

/// Twelve-month billing schedule for one client and year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientYearBilling {
    pub client_id: String,
    pub year: i32,

    /// Records for months 1 through 12, in order
    pub months: Vec<MonthlyBillingRecord>,

    pub total_cash: Decimal,
    pub total_revrec: Decimal,
}

impl ClientYearBilling {
    /// Build from monthly records; totals are the sums of the records
    pub fn from_months(
        client_id: String,
        year: i32,
        months: Vec<MonthlyBillingRecord>,
    ) -> BillingResult<Self> {
        let total_cash = checked_sum(months.iter().map(|r| r.cash_amount), "annual cash total")?;
        let total_revrec = checked_sum(months.iter().map(|r| r.revrec_amount), "annual revrec total")?;

        Ok(Self {
            client_id,
            year,
            months,
            total_cash,
            total_revrec,
        })
    }

    /// Record for calendar `month` (1-12)
    pub fn month(&self, month: u32) -> Option<&MonthlyBillingRecord> {
        self.months.iter().find(|r| r.month == month)
    }

    /// Months with a non-zero invoice
    pub fn cash_months(&self) -> Vec<u32> {
        self.months
            .iter()
            .filter(|r| !r.cash_amount.is_zero())
            .map(|r| r.month)
            .collect()
    }

    /// Total cash minus total recognized revenue for the year
    pub fn variance(&self) -> Decimal {
        self.total_cash - self.total_revrec
    }
}
