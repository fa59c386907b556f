use crate::config::PortalConfig;
use crate::portal::UsagePortal;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const VALIDATE_USER_PATH: &str = "/api/users/validate-user";
const USER_AGENT: &str = "energy-bill";

/// Response from /api/users/validate-user
#[derive(Debug, Deserialize)]
struct ValidateUserResponse {
    result: ValidateUserResult,
}

#[derive(Debug, Deserialize)]
struct ValidateUserResult {
    token: String,
}

/// 1st Energy customer portal
pub struct FirstEnergyPortal {
    client: reqwest::Client,
    base_url: String,
    account_id: String,
    auth_timeout: Duration,
    download_timeout: Duration,
}

impl FirstEnergyPortal {
    pub fn new(config: &PortalConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            account_id: config.account_id.clone(),
            auth_timeout: Duration::from_secs(config.auth_timeout_secs),
            download_timeout: Duration::from_secs(config.download_timeout_secs),
        }
    }

    fn validate_user_url(&self) -> String {
        format!("{}{}", self.base_url, VALIDATE_USER_PATH)
    }

    fn download_url(&self, day: NaiveDate) -> String {
        format!(
            "{}/api/utility/{}/usage-data/download?viewInterval=day&productType=POWER&startDate={}",
            self.base_url,
            self.account_id,
            day.format("%Y-%m-%d")
        )
    }
}

impl Default for FirstEnergyPortal {
    fn default() -> Self {
        Self::new(&PortalConfig::default())
    }
}

#[async_trait]
impl UsagePortal for FirstEnergyPortal {
    async fn validate_user(&self, credentials: &Value) -> Result<String> {
        let response = self
            .client
            .post(self.validate_user_url())
            .json(credentials)
            .header("User-Agent", USER_AGENT)
            .timeout(self.auth_timeout)
            .send()
            .await
            .context("Failed to connect to 1st Energy portal")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!(%status, body = %body, "validate-user response");
        if !status.is_success() {
            return Err(anyhow!("Portal login failed ({}): {}", status, body));
        }

        parse_token(&body)
    }

    async fn download_day(&self, token: &str, day: NaiveDate) -> Result<String> {
        let response = self
            .client
            .get(self.download_url(day))
            .header("Authorization", format!("Bearer {}", token))
            .header("User-Agent", USER_AGENT)
            .timeout(self.download_timeout)
            .send()
            .await
            .with_context(|| format!("Failed to download usage for {}", day))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(anyhow!(
                "Portal token expired or invalid. Run `energy-bill login` to refresh."
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Portal error for {} ({}): {}",
                day,
                status,
                body
            ));
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read usage download for {}", day))
    }

    fn name(&self) -> &'static str {
        "1st Energy"
    }
}

fn parse_token(body: &str) -> Result<String> {
    let response: ValidateUserResponse = serde_json::from_str(body)
        .context("Login response did not contain result.token")?;
    Ok(response.result.token)
}
