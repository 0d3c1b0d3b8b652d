//! Per-client billing: revenue recognition, cash timing, and active-period gating

mod active;
mod cash;
mod engine;
mod records;
mod revrec;

pub use active::is_active;
pub use cash::{monthly_cash, wrap_month};
pub use engine::{bill_year, ClientYearBiller};
pub use records::{ClientYearBilling, MonthlyBillingRecord};
pub use revrec::monthly_revrec;

use rust_decimal::Decimal;

use crate::error::{BillingError, BillingResult};

/// Sum amounts, reporting overflow instead of panicking
pub(crate) fn checked_sum<I>(amounts: I, what: &'static str) -> BillingResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .ok_or(BillingError::AmountOverflow(what))
}
