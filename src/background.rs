use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, enabled, info, trace, warn, Level};

use leaderboard_watch::backoff::RetryTarget;
use leaderboard_watch::models::LeaderboardSnapshot;
use leaderboard_watch::view::{leaderboard_rows, render_text_table};

use crate::api::ApiOutcome;
use crate::state::AppState;
use crate::util::now_ms;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PollOutcome {
    Applied { entries: usize },
    Stale,
    RateLimited { retry_after_secs: u64 },
    Failed,
}

/// Polls on a fixed interval for the life of the process. Ticks do not wait
/// for the previous request, so polls may overlap.
pub(crate) async fn run_leaderboard_poller(state: Arc<AppState>) {
    let mut shutdown = state.shutdown.subscribe();
    let mut interval = tokio::time::interval(state.config.poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        api = %state.api.base_url(),
        interval_ms = state.config.poll_interval_ms(),
        "leaderboard poller started"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                tokio::spawn(poll_once(Arc::clone(&state)));
            }
            _ = state.retry_due.notified() => {
                info!("running scheduled leaderboard retry");
                tokio::spawn(poll_once(Arc::clone(&state)));
            }
            _ = shutdown.recv() => {
                info!("leaderboard poller stopping");
                break;
            }
        }
    }
}

pub(crate) async fn poll_once(state: Arc<AppState>) -> PollOutcome {
    let seq = state.sequencer.lock().await.begin();

    match state.api.fetch_top().await {
        Ok(ApiOutcome::Ready(response)) => {
            let mut sequencer = state.sequencer.lock().await;
            if !sequencer.accept(seq) {
                debug!(
                    seq,
                    last_applied = ?sequencer.last_applied(),
                    "discarding out-of-order leaderboard response"
                );
                return PollOutcome::Stale;
            }
            let entries = response.leaderboard.len();
            if let Some(count) = response.count.filter(|count| *count != entries) {
                warn!(count, entries, "leaderboard count disagrees with entries returned");
            }
            if enabled!(Level::TRACE) {
                let table = render_text_table(&leaderboard_rows(&response.leaderboard));
                trace!("current leaderboard\n{}", table);
            }
            state
                .store_snapshot(LeaderboardSnapshot::new(response.leaderboard, now_ms()))
                .await;
            drop(sequencer);
            debug!(seq, entries, "leaderboard refreshed");
            PollOutcome::Applied { entries }
        }
        Ok(ApiOutcome::RateLimited { retry_after_secs }) => {
            schedule_rate_limit_retry(&state, retry_after_secs).await;
            PollOutcome::RateLimited { retry_after_secs }
        }
        Ok(ApiOutcome::Failed { status }) => {
            warn!(status, "leaderboard fetch failed; keeping previous snapshot");
            PollOutcome::Failed
        }
        Err(err) => {
            warn!(?err, "leaderboard fetch failed; keeping previous snapshot");
            PollOutcome::Failed
        }
    }
}

/// Replaces any pending retry with one that wakes the poller after
/// `retry_after_secs`.
pub(crate) async fn schedule_rate_limit_retry(state: &Arc<AppState>, retry_after_secs: u64) -> u64 {
    let delay = Duration::from_secs(retry_after_secs);
    let mut retry = state.retry.lock().await;
    let replaced = retry.pending_target().cloned();
    let task_state = Arc::clone(state);
    let generation = retry.schedule_retry(delay, RetryTarget::Leaderboard, move |generation| {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let due = task_state.retry.lock().await.fire(generation);
            if due.is_some() {
                task_state.retry_due.notify_one();
            }
        })
    });

    warn!(
        retry_after_secs,
        generation,
        replaced = ?replaced,
        "leaderboard API rate limited; retry scheduled"
    );
    generation
}
