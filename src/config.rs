use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::warn;

use leaderboard_watch::endpoints::top_url;
use leaderboard_watch::view::DetailLevel;

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_POLL_INTERVAL_MS, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT_MS,
    DEFAULT_STATIC_DIR,
};

#[derive(Clone)]
pub(crate) struct Config {
    pub(crate) api_base_url: String,
    pub(crate) port: u16,
    pub(crate) poll_interval: Duration,
    pub(crate) request_timeout: Duration,
    pub(crate) lookup_detail: DetailLevel,
    pub(crate) static_dir: String,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self> {
        let api_override = read_env_first(&["LEADERBOARD_API_URL", "API_BASE_URL"]);
        if api_override.is_none() {
            warn!(
                "LEADERBOARD_API_URL not set; defaulting to {}",
                DEFAULT_API_BASE_URL
            );
        }
        let api_base_url = api_override.unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        top_url(&api_base_url).map_err(|err| anyhow!("LEADERBOARD_API_URL is unusable: {}", err))?;

        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let poll_interval = Duration::from_millis(
            env::var("POLL_INTERVAL_MS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
        );

        let request_timeout = Duration::from_millis(
            env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        );

        let lookup_detail = match read_env_first(&["LOOKUP_DETAIL"]) {
            Some(value) => value.parse::<DetailLevel>().unwrap_or_else(|err| {
                warn!("{}; using full detail", err);
                DetailLevel::Full
            }),
            None => DetailLevel::Full,
        };

        let static_dir =
            env::var("STATIC_DIR").unwrap_or_else(|_| DEFAULT_STATIC_DIR.to_string());

        Ok(Self {
            api_base_url,
            port,
            poll_interval,
            request_timeout,
            lookup_detail,
            static_dir,
        })
    }

    pub(crate) fn poll_interval_ms(&self) -> u64 {
        self.poll_interval.as_millis() as u64
    }
}

pub(crate) fn read_env_first(keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Ok(value) = env::var(key) {
            let trimmed = value.trim().to_string();
            if !trimmed.is_empty() {
                return Some(trimmed);
            }
        }
    }
    None
}
