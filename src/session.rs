use crate::models::DateRange;
use crate::portal::UsagePortal;
use crate::token::TokenStore;
use crate::usage::{FetchedUsage, UsageAccumulator};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, info, instrument};

/// Bearer token for this run.
///
/// A credentials file means a fresh login whose token replaces the cached one;
/// without it the cached token is used as-is.
pub async fn authenticate(portal: &dyn UsagePortal, store: &TokenStore) -> Result<String> {
    if store.has_credentials() {
        login(portal, store).await
    } else {
        debug!("No credentials file, using cached token");
        store.load_token()
    }
}

pub async fn login(portal: &dyn UsagePortal, store: &TokenStore) -> Result<String> {
    let credentials = store.load_credentials()?;
    let token = portal
        .validate_user(&credentials)
        .await
        .with_context(|| format!("{} login failed", portal.name()))?;
    store.save_token(&token)?;
    info!(portal = portal.name(), "Stored fresh token");
    Ok(token)
}

/// Download every day of `range` in order and total the readings.
///
/// The first failing day aborts the whole range.
#[instrument(skip(portal, token), fields(source = portal.name()))]
pub async fn fetch_usage(
    portal: &dyn UsagePortal,
    token: &str,
    range: DateRange,
    flat_rate_until: NaiveDate,
) -> Result<FetchedUsage> {
    let mut accumulator = UsageAccumulator::new(range, flat_rate_until);

    for day in range.days() {
        let body = portal.download_day(token, day).await?;
        let outcomes = accumulator
            .ingest_csv(&body)
            .with_context(|| format!("Failed to parse usage for {}", day))?;
        debug!(%day, rows = outcomes.len(), "Fetched day");
    }

    let totals = accumulator.totals();
    info!(
        rows_booked = totals.rows_booked,
        rows_ignored = totals.rows_ignored,
        "Fetched usage"
    );
    Ok(accumulator.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tariff::TariffRates;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// In-memory portal serving canned day bodies
    #[derive(Default)]
    struct FixturePortal {
        days: HashMap<NaiveDate, String>,
        failing_day: Option<NaiveDate>,
        requested: Mutex<Vec<NaiveDate>>,
        logins: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl UsagePortal for FixturePortal {
        async fn validate_user(&self, credentials: &Value) -> Result<String> {
            self.logins.lock().unwrap().push(credentials.clone());
            Ok("fresh-token".to_string())
        }

        async fn download_day(&self, token: &str, day: NaiveDate) -> Result<String> {
            assert_eq!(token, "fresh-token");
            self.requested.lock().unwrap().push(day);
            if self.failing_day == Some(day) {
                return Err(anyhow!("Portal error for {} (500)", day));
            }
            Ok(self
                .days
                .get(&day)
                .cloned()
                .unwrap_or_else(|| "h1,h2,h3,h4,h5,h6\n".to_string()))
        }

        fn name(&self) -> &'static str {
            "fixture"
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cutoff() -> NaiveDate {
        TariffRates::default().flat_rate_until
    }

    fn store(dir: &TempDir) -> TokenStore {
        TokenStore::new(
            dir.path().join("credentials.json"),
            dir.path().join("token.txt"),
        )
    }

    #[tokio::test]
    async fn test_authenticate_with_credentials_stores_token() {
        let dir = TempDir::new().unwrap();
        let creds = json!({"email": "me@example.com", "password": "pw"});
        std::fs::write(dir.path().join("credentials.json"), creds.to_string()).unwrap();
        std::fs::write(dir.path().join("token.txt"), "stale").unwrap();

        let portal = FixturePortal::default();
        let store = store(&dir);
        let token = authenticate(&portal, &store).await.unwrap();

        assert_eq!(token, "fresh-token");
        assert_eq!(store.load_token().unwrap(), "fresh-token");
        assert_eq!(portal.logins.lock().unwrap().as_slice(), &[creds]);
    }

    #[tokio::test]
    async fn test_authenticate_without_credentials_reads_cache() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("token.txt"), "cached\n").unwrap();

        let portal = FixturePortal::default();
        let token = authenticate(&portal, &store(&dir)).await.unwrap();

        assert_eq!(token, "cached");
        assert!(portal.logins.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_requires_credentials() {
        let dir = TempDir::new().unwrap();
        let portal = FixturePortal::default();
        assert!(login(&portal, &store(&dir)).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_single_day() {
        let mut portal = FixturePortal::default();
        portal.days.insert(
            day(2023, 1, 1),
            "h1,h2,h3,h4,h5,h6\nE1,2023-01-01T00:00:00,10,5,3,A\n".to_string(),
        );

        let range = DateRange::new(day(2023, 1, 1), day(2023, 1, 1));
        let fetched = fetch_usage(&portal, "fresh-token", range, cutoff())
            .await
            .unwrap();

        let totals = fetched.totals();
        assert_eq!(totals.usage_peak, 3.0);
        assert_eq!(totals.usage_offpeak, 5.0);
        assert_eq!(totals.generated, 10.0);
        assert_eq!(fetched.range(), range);
    }

    #[tokio::test]
    async fn test_fetch_requests_each_day_in_order() {
        let mut portal = FixturePortal::default();
        portal.days.insert(
            day(2023, 1, 31),
            "h1,h2,h3,h4,h5\nE1,2023-01-31T00:00:00,1,2,A\n".to_string(),
        );
        portal.days.insert(
            day(2023, 2, 1),
            "h1,h2,h3,h4,h5\nE1,2023-02-01T00:00:00,1,4,A\nx,y,z\n".to_string(),
        );

        let range = DateRange::new(day(2023, 1, 30), day(2023, 2, 1));
        let fetched = fetch_usage(&portal, "fresh-token", range, cutoff())
            .await
            .unwrap();

        assert_eq!(
            portal.requested.lock().unwrap().as_slice(),
            &[day(2023, 1, 30), day(2023, 1, 31), day(2023, 2, 1)]
        );
        let totals = fetched.totals();
        assert_eq!(totals.usage, 2.0);
        assert_eq!(totals.usage_offpeak, 4.0);
        assert_eq!(totals.generated, 2.0);
        assert_eq!(totals.rows_ignored, 1);
    }

    #[tokio::test]
    async fn test_failing_day_aborts_range() {
        let portal = FixturePortal {
            failing_day: Some(day(2023, 3, 2)),
            ..FixturePortal::default()
        };

        let range = DateRange::new(day(2023, 3, 1), day(2023, 3, 5));
        let result = fetch_usage(&portal, "fresh-token", range, cutoff()).await;

        assert!(result.is_err());
        assert_eq!(portal.requested.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_day_aborts_range() {
        let mut portal = FixturePortal::default();
        portal.days.insert(
            day(2023, 3, 1),
            "h1,h2,h3,h4,h5,h6\nE1,2023-03-01T00:00:00,oops,1,1,A\n".to_string(),
        );

        let range = DateRange::new(day(2023, 3, 1), day(2023, 3, 3));
        let err = fetch_usage(&portal, "fresh-token", range, cutoff())
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("2023-03-01"));
        assert_eq!(portal.requested.lock().unwrap().len(), 1);
    }
}
