use crate::models::{DateRange, UsageTotals};
use crate::usage::FetchedUsage;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Retail tariff, all prices in cents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TariffRates {
    pub cents_per_kwh_peak: f64,
    pub cents_per_kwh_offpeak: f64,
    /// Single rate used before the time-of-use tariff started
    pub cents_per_kwh_flat: f64,
    pub solar_rebate_cents_per_kwh: f64,
    pub daily_charge_cents: f64,
    /// First day billed on the time-of-use tariff
    pub flat_rate_until: NaiveDate,
}

impl Default for TariffRates {
    fn default() -> Self {
        Self {
            cents_per_kwh_peak: 33.0,
            cents_per_kwh_offpeak: 15.29,
            cents_per_kwh_flat: 27.29,
            solar_rebate_cents_per_kwh: 12.0,
            daily_charge_cents: 108.79,
            flat_rate_until: NaiveDate::from_ymd_opt(2023, 2, 1).unwrap_or_default(),
        }
    }
}

/// Dollar figures for a fetched range
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatedUsage {
    pub range: DateRange,
    pub totals: UsageTotals,
    pub usage_cost: f64,
    pub generated_credit: f64,
    pub daily_charge: f64,
}

impl CalculatedUsage {
    pub fn bill_estimate(&self) -> f64 {
        self.usage_cost - self.generated_credit + self.daily_charge
    }
}

impl FetchedUsage {
    pub fn calculate(&self, rates: &TariffRates) -> CalculatedUsage {
        let totals = self.totals();
        CalculatedUsage {
            range: self.range(),
            totals: totals.clone(),
            usage_cost: usage_cost(totals, rates),
            generated_credit: generated_credit(totals, rates),
            daily_charge: daily_charge(self.range(), rates),
        }
    }
}

pub fn usage_cost(totals: &UsageTotals, rates: &TariffRates) -> f64 {
    (totals.usage * rates.cents_per_kwh_flat / 100.0)
        + (totals.usage_peak * rates.cents_per_kwh_peak / 100.0)
        + (totals.usage_offpeak * rates.cents_per_kwh_offpeak / 100.0)
}

pub fn generated_credit(totals: &UsageTotals, rates: &TariffRates) -> f64 {
    totals.generated * rates.solar_rebate_cents_per_kwh / 100.0
}

// Historical formula: one cent is added to the day-count product, not one day
// to the count. Kept as-is so estimates match earlier reports.
pub fn daily_charge(range: DateRange, rates: &TariffRates) -> f64 {
    (rates.daily_charge_cents * range.span_days() as f64 + 1.0) / 100.0
}
