pub mod firstenergy;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

/// Remote source of daily usage downloads
#[async_trait]
pub trait UsagePortal: Send + Sync {
    /// Exchange login credentials for a bearer token
    async fn validate_user(&self, credentials: &Value) -> Result<String>;
    /// Raw CSV body of one day's usage download
    async fn download_day(&self, token: &str, day: NaiveDate) -> Result<String>;
    fn name(&self) -> &'static str;
}
