//! Client-year billing engine

use log::debug;

use super::active::is_active;
use super::cash::monthly_cash;
use super::records::{ClientYearBilling, MonthlyBillingRecord};
use super::revrec::monthly_revrec;
use crate::client::{Client, ContractTerms, MONTHS_PER_YEAR};
use crate::error::BillingResult;
use crate::rates::RateSchedule;

/// Bills one calendar year for any number of clients
///
/// Holds no state beyond the target year, so one biller can be shared across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientYearBiller {
    year: i32,
}

impl ClientYearBiller {
    pub fn new(year: i32) -> Self {
        Self { year }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Compute the twelve-month cash and revrec schedule for a client
    ///
    /// Incomplete client data, an unknown frequency, a missing rate, or an
    /// amount too large to represent aborts the whole year; no month is
    /// silently zeroed.
    pub fn bill(&self, client: &Client, schedule: &RateSchedule) -> BillingResult<ClientYearBilling> {
        let terms = client.terms()?;
        let active_months = client.active_months(self.year);

        let months = (1..=MONTHS_PER_YEAR)
            .map(|month| self.bill_month(&terms, schedule, active_months, month))
            .collect::<BillingResult<Vec<_>>>()?;

        let billing = ClientYearBilling::from_months(client.id.clone(), self.year, months)?;
        debug!(
            "client {} year {}: cash={} revrec={}",
            client.id, self.year, billing.total_cash, billing.total_revrec
        );
        Ok(billing)
    }

    fn bill_month(
        &self,
        terms: &ContractTerms,
        schedule: &RateSchedule,
        active_months: u32,
        month: u32,
    ) -> BillingResult<MonthlyBillingRecord> {
        if !is_active(month, terms.renewal_month, active_months) {
            return Ok(MonthlyBillingRecord::inactive(month));
        }

        let pepm = schedule.resolve(terms.renewal_month, self.year, month)?;

        Ok(MonthlyBillingRecord {
            month,
            active: true,
            pepm_applied: pepm,
            cash_amount: monthly_cash(
                terms.population,
                pepm,
                terms.frequency,
                month,
                terms.renewal_month,
            )?,
            revrec_amount: monthly_revrec(terms.population, pepm)?,
        })
    }
}

/// Bill a single client for `year`
pub fn bill_year(client: &Client, schedule: &RateSchedule, year: i32) -> BillingResult<ClientYearBilling> {
    ClientYearBiller::new(year).bill(client, schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::BillingFrequency;
    use crate::error::BillingError;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn client(population: u32, renewal_month: u32, frequency: BillingFrequency) -> Client {
        let renewal = NaiveDate::from_ymd_opt(2024, renewal_month, 1).unwrap();
        Client::new("test", population, renewal, frequency)
    }

    fn flat_schedule(pepm: Decimal) -> RateSchedule {
        [(2025, pepm), (2026, pepm)].into_iter().collect()
    }

    #[test]
    fn test_quarterly_scenario() {
        let c = client(100, 3, BillingFrequency::Quarterly);
        let billing = bill_year(&c, &flat_schedule(dec!(20)), 2026).unwrap();

        assert_eq!(billing.cash_months(), vec![3, 6, 9, 12]);
        for record in &billing.months {
            assert_eq!(record.revrec_amount, dec!(2000));
            if [3, 6, 9, 12].contains(&record.month) {
                assert_eq!(record.cash_amount, dec!(6000));
            }
        }
        assert_eq!(billing.total_cash, dec!(24000));
        assert_eq!(billing.total_revrec, dec!(24000));
    }

    #[test]
    fn test_rate_change_splits_revrec_but_not_annual_cash() {
        let c = client(50, 6, BillingFrequency::Annual);
        let schedule: RateSchedule = [(2025, dec!(10.00)), (2026, dec!(12.00))].into_iter().collect();
        let billing = bill_year(&c, &schedule, 2026).unwrap();

        assert_eq!(billing.month(5).unwrap().pepm_applied, dec!(10.00));
        assert_eq!(billing.month(6).unwrap().pepm_applied, dec!(12.00));

        // 5 months at 10 and 7 months at 12
        assert_eq!(billing.total_revrec, dec!(50) * (dec!(10) * dec!(5) + dec!(12) * dec!(7)));
        // One invoice at the renewal-month rate
        assert_eq!(billing.total_cash, dec!(50) * dec!(12) * dec!(12));
        assert_ne!(billing.variance(), Decimal::ZERO);
    }

    #[test]
    fn test_partial_year_window() {
        let c = client(10, 10, BillingFrequency::Monthly).with_active_months(2026, 4);
        let billing = bill_year(&c, &flat_schedule(dec!(3)), 2026).unwrap();

        for record in &billing.months {
            let expected_active = [10, 11, 12, 1].contains(&record.month);
            assert_eq!(record.active, expected_active, "month {}", record.month);
            if expected_active {
                assert_eq!(record.cash_amount, dec!(30));
                assert_eq!(record.revrec_amount, dec!(30));
            } else {
                assert_eq!(record.pepm_applied, Decimal::ZERO);
                assert_eq!(record.cash_amount, Decimal::ZERO);
                assert_eq!(record.revrec_amount, Decimal::ZERO);
            }
        }
        assert_eq!(billing.total_revrec, dec!(120));
    }

    #[test]
    fn test_inactive_months_need_no_rate() {
        // Only months 7-9 are active, and they only need the 2026 rate
        let c = client(10, 7, BillingFrequency::Monthly).with_active_months(2026, 3);
        let schedule = RateSchedule::new().with_rate(2026, dec!(1));
        let billing = bill_year(&c, &schedule, 2026).unwrap();
        assert_eq!(billing.total_cash, dec!(30));
    }

    #[test]
    fn test_missing_rate_aborts_year() {
        let c = client(10, 1, BillingFrequency::Monthly);
        let schedule = RateSchedule::new().with_rate(2025, dec!(1));
        assert_eq!(
            bill_year(&c, &schedule, 2026),
            Err(BillingError::RateNotFound { year: 2026, month: 1 })
        );
    }

    #[test]
    fn test_incomplete_client_fails_before_rates() {
        let mut c = client(10, 1, BillingFrequency::Monthly);
        c.renewal_date = None;
        let err = bill_year(&c, &RateSchedule::new(), 2026).unwrap_err();
        assert!(matches!(err, BillingError::ClientDataIncomplete { field: "renewal_date", .. }));
    }

    #[test]
    fn test_idempotent() {
        let c = client(321, 11, BillingFrequency::Semiannual).with_active_months(2026, 9);
        let schedule: RateSchedule = [(2025, dec!(7.15)), (2026, dec!(7.95))].into_iter().collect();

        let first = bill_year(&c, &schedule, 2026).unwrap();
        let second = bill_year(&c, &schedule, 2026).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    /// Every frequency, renewal month and a handful of populations
    fn sample_clients() -> Vec<Client> {
        let mut clients = Vec::new();
        for frequency in BillingFrequency::ALL {
            for renewal_month in 1..=12 {
                for population in [0, 1, 37, 1500] {
                    clients.push(client(population, renewal_month, frequency));
                }
            }
        }
        clients
    }

    #[test]
    fn test_sum_law_holds_for_all_samples() {
        let schedule: RateSchedule = [(2025, dec!(9.40)), (2026, dec!(10.15))].into_iter().collect();
        for c in sample_clients() {
            let billing = bill_year(&c, &schedule, 2026).unwrap();
            assert_eq!(billing.months.len(), 12);
            let cash: Decimal = billing.months.iter().map(|r| r.cash_amount).sum();
            let revrec: Decimal = billing.months.iter().map(|r| r.revrec_amount).sum();
            assert_eq!(billing.total_cash, cash);
            assert_eq!(billing.total_revrec, revrec);
        }
    }

    #[test]
    fn test_cash_cadence_for_all_samples() {
        let pepm = dec!(4.50);
        let schedule = flat_schedule(pepm);

        for c in sample_clients().into_iter().filter(|c| c.population != Some(0)) {
            let terms = c.terms().unwrap();
            let billing = bill_year(&c, &schedule, 2026).unwrap();
            let months = billing.cash_months();
            let population = Decimal::from(terms.population);

            match terms.frequency {
                BillingFrequency::Monthly => {
                    for record in &billing.months {
                        assert_eq!(record.cash_amount, record.revrec_amount);
                    }
                }
                BillingFrequency::Annual => {
                    assert_eq!(months, vec![terms.renewal_month]);
                    assert_eq!(billing.total_cash, population * pepm * dec!(12));
                }
                BillingFrequency::Semiannual | BillingFrequency::Quarterly => {
                    let step = terms.frequency.months_per_bill();
                    assert_eq!(months.len() as u32, 12 / step);
                    for &m in &months {
                        let next = crate::billing::wrap_month(m + step);
                        assert!(months.contains(&next), "{:?} renewal {}", terms.frequency, terms.renewal_month);
                    }
                }
            }

            // With a flat rate, cash and revrec agree over the full year
            assert_eq!(billing.total_cash, billing.total_revrec);
        }
    }
}
