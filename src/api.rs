use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::RETRY_AFTER;
use serde::de::DeserializeOwned;
use tracing::debug;

use leaderboard_watch::backoff::{classify_status, StatusClass};
use leaderboard_watch::endpoints::{rank_url, top_url};
use leaderboard_watch::models::{ApiErrorBody, LeaderboardResponse, RankLookupResponse};

#[derive(Debug)]
pub(crate) enum ApiOutcome<T> {
    Ready(T),
    RateLimited { retry_after_secs: u64 },
    Failed { status: u16 },
}

#[derive(Clone)]
pub(crate) struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub(crate) fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build leaderboard API client")?;
        Ok(Self { client, base_url })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, url: reqwest::Url) -> Result<ApiOutcome<T>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        match classify_status(status.as_u16(), retry_after.as_deref()) {
            StatusClass::Success => {
                let payload = response
                    .json::<T>()
                    .await
                    .with_context(|| format!("Invalid response body from {}", url))?;
                Ok(ApiOutcome::Ready(payload))
            }
            StatusClass::RateLimited { retry_after_secs } => {
                Ok(ApiOutcome::RateLimited { retry_after_secs })
            }
            StatusClass::Failure { status } => {
                if let Ok(body) = response.json::<ApiErrorBody>().await {
                    debug!(status, url = %url, error = %body.summary(), "leaderboard API rejected request");
                }
                Ok(ApiOutcome::Failed { status })
            }
        }
    }

    pub(crate) async fn fetch_top(&self) -> Result<ApiOutcome<LeaderboardResponse>> {
        let url = top_url(&self.base_url)?;
        self.get(url).await
    }

    pub(crate) async fn fetch_rank(&self, player_id: &str) -> Result<ApiOutcome<RankLookupResponse>> {
        let url = rank_url(&self.base_url, player_id)?;
        self.get(url).await
    }
}
