use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub username: String,
    pub total_score: i64,
}

/// Body of `GET /leaderboard/top`. Entries arrive in rank order.
#[derive(Clone, Debug, Deserialize)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RankLookupResponse {
    pub username: String,
    pub rank: u32,
    pub total_score: i64,
}

/// Error body the leaderboard API attaches to non-2xx responses. Only ever logged.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(default)]
    pub details: Option<String>,
}

impl ApiErrorBody {
    pub fn summary(&self) -> String {
        match self.details.as_deref() {
            Some(details) if !details.is_empty() => format!("{} ({})", self.error, details),
            _ => self.error.clone(),
        }
    }
}

/// Leaderboard state embedded into the served page as `#initial-data`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardSnapshot {
    pub entries: Vec<LeaderboardEntry>,
    pub fetched_at_ms: u64,
}

impl LeaderboardSnapshot {
    pub fn new(entries: Vec<LeaderboardEntry>, fetched_at_ms: u64) -> Self {
        Self {
            entries,
            fetched_at_ms,
        }
    }
}
