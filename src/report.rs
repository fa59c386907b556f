use crate::models::{DateRange, UsageTotals};
use crate::tariff::CalculatedUsage;
use serde::Serialize;
use std::fmt::Write as _;

/// Final bill estimate as printed to the user
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub range: DateRange,
    pub days: i64,
    pub totals: UsageTotals,
    pub daily_charge: f64,
    pub usage_cost: f64,
    pub generated_credit: f64,
    pub bill_estimate: f64,
}

impl Report {
    pub fn new(calculated: &CalculatedUsage) -> Self {
        Self {
            range: calculated.range,
            days: calculated.range.span_days(),
            totals: calculated.totals.clone(),
            daily_charge: calculated.daily_charge,
            usage_cost: calculated.usage_cost,
            generated_credit: calculated.generated_credit,
            bill_estimate: calculated.bill_estimate(),
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let totals = &self.totals;
        // Writing into a String cannot fail
        let _ = writeln!(out, "usage flat: {}", totals.usage);
        let _ = writeln!(out, "usage peak: {}", totals.usage_peak);
        let _ = writeln!(out, "usage offpeak: {}", totals.usage_offpeak);
        let _ = writeln!(out, "generated: {}", totals.generated);
        let _ = writeln!(out, "rows ignored: {}", totals.rows_ignored);
        let _ = writeln!(out, "start:{}, end:{}", self.range.start, self.range.end);
        let _ = writeln!(out, "days:{}", self.days);
        let _ = writeln!(out, "daily charge $:{}", self.daily_charge);
        let _ = writeln!(out, "usage $:{}", self.usage_cost);
        let _ = writeln!(out, "generated $:{}", self.generated_credit);
        let _ = writeln!(out, "bill estimate: {}", self.bill_estimate);
        out
    }

    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
