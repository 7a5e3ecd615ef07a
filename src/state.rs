use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{broadcast, Mutex, Notify, RwLock};
use tokio::task::JoinHandle;

use leaderboard_watch::backoff::RetryScheduler;
use leaderboard_watch::models::LeaderboardSnapshot;
use leaderboard_watch::sequence::ResponseSequencer;
use leaderboard_watch::{render_index, IndexParams};

use crate::api::ApiClient;
use crate::config::Config;
use crate::constants::SHUTDOWN_BUFFER;
use crate::util::now_ms;

pub(crate) struct AppState {
    pub(crate) latest: RwLock<Option<LeaderboardSnapshot>>,
    pub(crate) initial_html: RwLock<Bytes>,
    pub(crate) retry: Mutex<RetryScheduler<JoinHandle<()>>>,
    pub(crate) retry_due: Notify,
    pub(crate) sequencer: Mutex<ResponseSequencer>,
    pub(crate) shutdown: broadcast::Sender<()>,
    pub(crate) cache_bust: String,
    pub(crate) api: ApiClient,
    pub(crate) config: Config,
}

impl AppState {
    pub(crate) fn new(config: Config, api: ApiClient) -> Arc<Self> {
        let (shutdown, _) = broadcast::channel(SHUTDOWN_BUFFER);
        let cache_bust = now_ms().to_string();
        let base_html = render_page(&config, &cache_bust, None);
        Arc::new(Self {
            latest: RwLock::new(None),
            initial_html: RwLock::new(Bytes::from(base_html)),
            retry: Mutex::new(RetryScheduler::new()),
            retry_due: Notify::new(),
            sequencer: Mutex::new(ResponseSequencer::new()),
            shutdown,
            cache_bust,
            api,
            config,
        })
    }

    /// Stores a fresh snapshot and re-renders the page that embeds it.
    pub(crate) async fn store_snapshot(&self, snapshot: LeaderboardSnapshot) {
        let payload = serialize_snapshot_for_html(&snapshot);
        let html = render_page(&self.config, &self.cache_bust, payload.as_deref());
        {
            let mut cache = self.initial_html.write().await;
            *cache = Bytes::from(html);
        }
        let mut latest = self.latest.write().await;
        *latest = Some(snapshot);
    }

    pub(crate) async fn broadcast_shutdown(&self) {
        let _ = self.shutdown.send(());
        self.retry.lock().await.cancel_pending();
    }
}

fn render_page(config: &Config, cache_bust: &str, initial_payload: Option<&str>) -> String {
    let params = IndexParams {
        api_base: &config.api_base_url,
        lookup_detail: config.lookup_detail.as_str(),
        poll_interval_ms: config.poll_interval_ms(),
        cache_bust,
    };
    render_index(&params, initial_payload)
}

fn serialize_snapshot_for_html(snapshot: &LeaderboardSnapshot) -> Option<String> {
    let json = serde_json::to_string(snapshot).ok()?;
    Some(escape_json_for_script(&json))
}

/// Usernames come from the API verbatim, so markup characters are emitted as
/// `\uXXXX` escapes and never reach the HTML tokenizer.
fn escape_json_for_script(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for ch in json.chars() {
        match ch {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            _ => out.push(ch),
        }
    }
    out
}
