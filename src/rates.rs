//! PEPM rate schedules and renewal-aware rate resolution
//!
//! A rate negotiated at renewal applies from the renewal month onward, so a
//! calendar year spans two rate generations: months before the renewal month
//! still bill at the prior year's rate.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{BillingError, BillingResult};

/// Per-head-per-month rates for one client, keyed by effective year
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateSchedule {
    rates: BTreeMap<i32, Decimal>,
}

impl RateSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rate effective from the renewal in `year`
    pub fn insert(&mut self, year: i32, pepm: Decimal) -> Option<Decimal> {
        self.rates.insert(year, pepm)
    }

    pub fn with_rate(mut self, year: i32, pepm: Decimal) -> Self {
        self.insert(year, pepm);
        self
    }

    /// Rate for an exact effective year, without fallback
    pub fn get(&self, year: i32) -> Option<Decimal> {
        self.rates.get(&year).copied()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.rates.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Rate governing calendar `month` of `year` for a contract renewing in `renewal_month`
    ///
    /// Before the renewal month the prior year's rate applies; if that rate is
    /// unknown the current year's rate is used instead.
    pub fn resolve(&self, renewal_month: u32, year: i32, month: u32) -> BillingResult<Decimal> {
        let not_found = BillingError::RateNotFound { year, month };

        if month < renewal_month {
            self.get(year - 1)
                .or_else(|| self.get(year))
                .ok_or(not_found)
        } else {
            self.get(year).ok_or(not_found)
        }
    }
}

impl FromIterator<(i32, Decimal)> for RateSchedule {
    fn from_iter<I: IntoIterator<Item = (i32, Decimal)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().collect(),
        }
    }
}
