//! Cash timing: when an invoice is raised and how many months it covers
//!
//! Cash is computed independently of revenue recognition. Each invoice uses the
//! single rate in force in its billing month, so a client whose rate changes
//! inside the contract year will show different cash and revrec totals.

use rust_decimal::Decimal;

use crate::client::{BillingFrequency, MONTHS_PER_YEAR};
use crate::error::{BillingError, BillingResult};

/// Fold any positive month offset back into 1-12
///
/// A December renewal billed quarterly lands on months 12, 15, 18 and 21,
/// which wrap to 12, 3, 6 and 9.
pub fn wrap_month(month: u32) -> u32 {
    debug_assert!(month >= 1);
    ((month - 1) % MONTHS_PER_YEAR) + 1
}

/// Cash invoiced in calendar `month`
pub fn monthly_cash(
    population: u32,
    pepm: Decimal,
    frequency: BillingFrequency,
    month: u32,
    renewal_month: u32,
) -> BillingResult<Decimal> {
    if !frequency.billing_months(renewal_month).contains(&month) {
        return Ok(Decimal::ZERO);
    }

    Decimal::from(population)
        .checked_mul(pepm)
        .and_then(|monthly| monthly.checked_mul(Decimal::from(frequency.months_per_bill())))
        .ok_or(BillingError::AmountOverflow("cash invoice"))
}
