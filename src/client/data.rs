//! Client contract records as supplied by the data-access layer

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::billing::wrap_month;
use crate::error::{BillingError, BillingResult};

/// Number of months in a contract year
pub const MONTHS_PER_YEAR: u32 = 12;

/// Contractual invoicing cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingFrequency {
    /// Invoiced every month
    Monthly,
    /// Invoiced every three months starting at renewal
    Quarterly,
    /// Invoiced at renewal and six months later
    Semiannual,
    /// Invoiced once, in the renewal month
    Annual,
}

impl BillingFrequency {
    pub const ALL: [BillingFrequency; 4] = [
        BillingFrequency::Monthly,
        BillingFrequency::Quarterly,
        BillingFrequency::Semiannual,
        BillingFrequency::Annual,
    ];

    /// Months of service covered by a single invoice
    pub fn months_per_bill(&self) -> u32 {
        match self {
            BillingFrequency::Monthly => 1,
            BillingFrequency::Quarterly => 3,
            BillingFrequency::Semiannual => 6,
            BillingFrequency::Annual => 12,
        }
    }

    /// Calendar months (1-12) in which an invoice is raised, starting at the renewal month
    pub fn billing_months(&self, renewal_month: u32) -> Vec<u32> {
        let step = self.months_per_bill();
        (0..MONTHS_PER_YEAR / step)
            .map(|i| wrap_month(renewal_month + i * step))
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingFrequency::Monthly => "monthly",
            BillingFrequency::Quarterly => "quarterly",
            BillingFrequency::Semiannual => "semiannual",
            BillingFrequency::Annual => "annual",
        }
    }
}

impl fmt::Display for BillingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingFrequency {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(BillingFrequency::Monthly),
            "quarterly" => Ok(BillingFrequency::Quarterly),
            "semiannual" | "semi-annual" | "semi_annual" => Ok(BillingFrequency::Semiannual),
            "annual" | "annually" => Ok(BillingFrequency::Annual),
            _ => Err(BillingError::InvalidBillingFrequency(s.to_string())),
        }
    }
}

/// One contracted account
///
/// Population, renewal date and frequency are kept exactly as the upstream
/// record carried them; [`Client::terms`] is the validation boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Opaque unique identifier
    pub id: String,

    pub billing_name: String,

    /// Pricing tier, used only for grouping
    #[serde(default)]
    pub tier: String,

    /// Industry vertical, used only for grouping
    #[serde(default)]
    pub industry: String,

    /// Product sold, used only for grouping
    #[serde(default)]
    pub product_label: String,

    /// Covered head-count
    pub population: Option<i64>,

    /// Contract anniversary; only the month drives billing timing
    pub renewal_date: Option<NaiveDate>,

    /// Billing cadence text (monthly, quarterly, semiannual, annual)
    pub billing_frequency: String,

    /// Billable months per year; a missing year means fully active
    #[serde(default)]
    pub active_months_by_year: BTreeMap<i32, u8>,
}

/// Validated view of a client's contract, used by the billing engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractTerms {
    pub population: u32,
    pub renewal_month: u32,
    pub frequency: BillingFrequency,
}

impl Client {
    /// Create a client with empty grouping metadata
    pub fn new(
        id: impl Into<String>,
        population: u32,
        renewal_date: NaiveDate,
        frequency: BillingFrequency,
    ) -> Self {
        let id = id.into();
        Self {
            billing_name: id.clone(),
            id,
            tier: String::new(),
            industry: String::new(),
            product_label: String::new(),
            population: Some(i64::from(population)),
            renewal_date: Some(renewal_date),
            billing_frequency: frequency.as_str().to_string(),
            active_months_by_year: BTreeMap::new(),
        }
    }

    /// Set tier, industry and product labels
    pub fn with_grouping(
        mut self,
        tier: impl Into<String>,
        industry: impl Into<String>,
        product_label: impl Into<String>,
    ) -> Self {
        self.tier = tier.into();
        self.industry = industry.into();
        self.product_label = product_label.into();
        self
    }

    /// Record the number of billable months for a year
    pub fn with_active_months(mut self, year: i32, months: u8) -> Self {
        self.active_months_by_year.insert(year, months);
        self
    }

    /// Billable months in `year`, clamped to 0-12 and defaulting to a full year
    pub fn active_months(&self, year: i32) -> u32 {
        self.active_months_by_year
            .get(&year)
            .map(|&m| u32::from(m).min(MONTHS_PER_YEAR))
            .unwrap_or(MONTHS_PER_YEAR)
    }

    /// Check the record is complete enough to bill and extract its contract terms
    pub fn terms(&self) -> BillingResult<ContractTerms> {
        let population = match self.population {
            None => {
                return Err(BillingError::ClientDataIncomplete {
                    field: "population",
                    reason: "is missing".to_string(),
                })
            }
            Some(p) => u32::try_from(p).map_err(|_| BillingError::ClientDataIncomplete {
                field: "population",
                reason: format!("{} is out of range", p),
            })?,
        };

        let renewal_date = self.renewal_date.ok_or_else(|| BillingError::ClientDataIncomplete {
            field: "renewal_date",
            reason: "is missing".to_string(),
        })?;

        let frequency = self.billing_frequency.parse()?;

        Ok(ContractTerms {
            population,
            renewal_month: renewal_date.month(),
            frequency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_frequency_parse() {
        assert_eq!("monthly".parse::<BillingFrequency>().unwrap(), BillingFrequency::Monthly);
        assert_eq!(" Quarterly ".parse::<BillingFrequency>().unwrap(), BillingFrequency::Quarterly);
        assert_eq!("semi-annual".parse::<BillingFrequency>().unwrap(), BillingFrequency::Semiannual);
        assert_eq!("ANNUAL".parse::<BillingFrequency>().unwrap(), BillingFrequency::Annual);

        let err = "weekly".parse::<BillingFrequency>().unwrap_err();
        assert_eq!(err, BillingError::InvalidBillingFrequency("weekly".into()));
    }

    #[test]
    fn test_billing_months() {
        assert_eq!(
            BillingFrequency::Monthly.billing_months(5),
            vec![5, 6, 7, 8, 9, 10, 11, 12, 1, 2, 3, 4]
        );
        assert_eq!(BillingFrequency::Quarterly.billing_months(3), vec![3, 6, 9, 12]);
        assert_eq!(BillingFrequency::Quarterly.billing_months(12), vec![12, 3, 6, 9]);
        assert_eq!(BillingFrequency::Semiannual.billing_months(10), vec![10, 4]);
        assert_eq!(BillingFrequency::Annual.billing_months(7), vec![7]);
    }

    #[test]
    fn test_active_months_default_and_clamp() {
        let client = Client::new("c1", 10, date(2024, 10, 1), BillingFrequency::Monthly)
            .with_active_months(2026, 4)
            .with_active_months(2027, 40);

        assert_eq!(client.active_months(2025), 12);
        assert_eq!(client.active_months(2026), 4);
        assert_eq!(client.active_months(2027), 12);
    }

    #[test]
    fn test_terms() {
        let client = Client::new("c1", 250, date(2023, 6, 15), BillingFrequency::Semiannual);
        let terms = client.terms().unwrap();
        assert_eq!(terms.population, 250);
        assert_eq!(terms.renewal_month, 6);
        assert_eq!(terms.frequency, BillingFrequency::Semiannual);
    }

    #[test]
    fn test_terms_rejects_incomplete_records() {
        let base = Client::new("c1", 10, date(2023, 1, 1), BillingFrequency::Annual);

        let mut missing_pop = base.clone();
        missing_pop.population = None;
        assert!(matches!(
            missing_pop.terms(),
            Err(BillingError::ClientDataIncomplete { field: "population", .. })
        ));

        let mut negative_pop = base.clone();
        negative_pop.population = Some(-5);
        assert!(matches!(
            negative_pop.terms(),
            Err(BillingError::ClientDataIncomplete { field: "population", .. })
        ));

        let mut missing_renewal = base.clone();
        missing_renewal.renewal_date = None;
        assert!(matches!(
            missing_renewal.terms(),
            Err(BillingError::ClientDataIncomplete { field: "renewal_date", .. })
        ));

        let mut bad_freq = base;
        bad_freq.billing_frequency = "biweekly".into();
        assert_eq!(
            bad_freq.terms(),
            Err(BillingError::InvalidBillingFrequency("biweekly".into()))
        );
    }
}
