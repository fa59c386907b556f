use crate::portal::UsagePortal;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde_json::Value;

const MOCK_TOKEN: &str = "mock-token";

/// Offline portal serving synthetic day downloads.
///
/// Days before `flat_rate_until` come back in the five-column layout, later
/// days in the six-column peak/off-peak layout, like the real portal.
pub struct MockPortal {
    flat_rate_until: NaiveDate,
}

impl MockPortal {
    pub fn new(flat_rate_until: NaiveDate) -> Self {
        Self { flat_rate_until }
    }

    pub fn day_csv(&self, day: NaiveDate) -> String {
        let stamp = day.format("%Y-%m-%dT00:00:00");
        // Vary the numbers a little so multi-day totals aren't a flat multiple
        let wobble = f64::from(day.day() % 5) * 0.25;
        let generated = 8.0 + wobble;

        if day < self.flat_rate_until {
            format!(
                "Meter,Read Date,Export (kWh),Usage (kWh),Quality\n\
                 E1,{stamp},{generated},{},A\n",
                12.5 + wobble
            )
        } else {
            format!(
                "Meter,Read Date,Export (kWh),Off Peak (kWh),Peak (kWh),Quality\n\
                 E1,{stamp},{generated},{},{},A\n",
                7.5 + wobble,
                4.0 + wobble
            )
        }
    }
}

#[async_trait]
impl UsagePortal for MockPortal {
    async fn validate_user(&self, _credentials: &Value) -> Result<String> {
        Ok(MOCK_TOKEN.to_string())
    }

    async fn download_day(&self, _token: &str, day: NaiveDate) -> Result<String> {
        Ok(self.day_csv(day))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
