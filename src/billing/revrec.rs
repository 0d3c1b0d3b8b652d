//! Revenue recognition: revenue is earned evenly over the service period

use rust_decimal::Decimal;

use crate::error::{BillingError, BillingResult};

/// Revenue recognized for one month of service
pub fn monthly_revrec(population: u32, pepm: Decimal) -> BillingResult<Decimal> {
    Decimal::from(population)
        .checked_mul(pepm)
        .ok_or(BillingError::AmountOverflow("monthly revrec"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_monthly_revrec() {
        assert_eq!(monthly_revrec(100, dec!(20)).unwrap(), dec!(2000));
        assert_eq!(monthly_revrec(3, dec!(12.35)).unwrap(), dec!(37.05));
        assert_eq!(monthly_revrec(0, dec!(99)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_monthly_revrec_overflow() {
        assert_eq!(
            monthly_revrec(4_000_000_000, Decimal::MAX),
            Err(BillingError::AmountOverflow("monthly revrec"))
        );
    }
}
