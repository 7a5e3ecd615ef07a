use std::time::Duration;

use tracing::warn;

use leaderboard_watch::endpoints::normalize_player_id;
use leaderboard_watch::view::{DetailLevel, ResultMessage};

use crate::api::{ApiClient, ApiOutcome};

/// One-shot rank lookup. A rate-limited lookup waits out `Retry-After` and is
/// re-issued once. Every message shown to the user goes through `emit`.
pub(crate) async fn lookup_player<F>(
    api: &ApiClient,
    raw_player_id: &str,
    detail: DetailLevel,
    mut emit: F,
) -> bool
where
    F: FnMut(&ResultMessage),
{
    let player_id = match normalize_player_id(raw_player_id) {
        Some(player_id) => player_id,
        None => {
            emit(&ResultMessage::missing_player_id());
            return false;
        }
    };

    let mut retried = false;
    loop {
        let message = match api.fetch_rank(&player_id).await {
            Ok(ApiOutcome::Ready(player)) => ResultMessage::lookup_found(&player, detail),
            Ok(ApiOutcome::RateLimited { retry_after_secs }) => {
                if retried {
                    warn!(player_id = %player_id, retry_after_secs, "player lookup still rate limited");
                    emit(&ResultMessage::rate_limit_exhausted(retry_after_secs));
                    return false;
                }
                emit(&ResultMessage::rate_limited(retry_after_secs));
                retried = true;
                tokio::time::sleep(Duration::from_secs(retry_after_secs)).await;
                continue;
            }
            Ok(ApiOutcome::Failed { status }) => {
                warn!(status, player_id = %player_id, "player lookup rejected");
                ResultMessage::lookup_failed()
            }
            Err(err) => {
                warn!(?err, player_id = %player_id, "player lookup failed");
                ResultMessage::lookup_failed()
            }
        };
        emit(&message);
        return message.is_success();
    }
}
