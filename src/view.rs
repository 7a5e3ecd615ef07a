use std::str::FromStr;

use crate::models::{LeaderboardEntry, RankLookupResponse};

pub const MISSING_PLAYER_ID: &str = "Please enter a player ID";
pub const LOOKUP_FAILED: &str = "Player not found or an error occurred";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRow {
    pub rank: String,
    pub username: String,
    pub score: String,
}

impl TableRow {
    pub fn cells(&self) -> [&str; 3] {
        [&self.rank, &self.username, &self.score]
    }
}

pub fn leaderboard_rows(entries: &[LeaderboardEntry]) -> Vec<TableRow> {
    entries
        .iter()
        .map(|entry| TableRow {
            rank: format!("#{}", entry.rank),
            username: entry.username.clone(),
            score: entry.total_score.to_string(),
        })
        .collect()
}

/// Column-aligned rendering for terminals and logs.
pub fn render_text_table(rows: &[TableRow]) -> String {
    let header = TableRow {
        rank: "Rank".to_string(),
        username: "Player".to_string(),
        score: "Total Score".to_string(),
    };
    let mut widths = [0usize; 3];
    for row in std::iter::once(&header).chain(rows) {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in std::iter::once(&header).chain(rows) {
        let [rank, username, score] = row.cells();
        out.push_str(&format!(
            "{:<rw$} | {:<uw$} | {:>sw$}\n",
            rank,
            username,
            score,
            rw = widths[0],
            uw = widths[1],
            sw = widths[2],
        ));
    }
    out
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DetailLevel {
    #[default]
    Full,
    RankOnly,
}

impl DetailLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailLevel::Full => "full",
            DetailLevel::RankOnly => "rank",
        }
    }
}

impl FromStr for DetailLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(DetailLevel::Full),
            "rank" | "rank-only" => Ok(DetailLevel::RankOnly),
            other => Err(format!("unknown lookup detail level: {}", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Success,
    Error,
}

impl Tone {
    pub fn class_name(&self) -> &'static str {
        match self {
            Tone::Success => "player-result success",
            Tone::Error => "player-result error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultMessage {
    pub text: String,
    pub tone: Tone,
}

impl ResultMessage {
    pub fn missing_player_id() -> Self {
        Self::error(MISSING_PLAYER_ID)
    }

    pub fn lookup_failed() -> Self {
        Self::error(LOOKUP_FAILED)
    }

    pub fn lookup_found(player: &RankLookupResponse, detail: DetailLevel) -> Self {
        let text = match detail {
            DetailLevel::Full => format!(
                "Player: {}\nRank: #{}\nTotal Score: {}",
                player.username, player.rank, player.total_score
            ),
            DetailLevel::RankOnly => format!("Rank: #{}", player.rank),
        };
        Self {
            text,
            tone: Tone::Success,
        }
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self::error(&rate_limit_message(retry_after_secs))
    }

    /// Final message once a lookup has already used its one retry.
    pub fn rate_limit_exhausted(retry_after_secs: u64) -> Self {
        Self::error(&format!(
            "Rate limit exceeded. Try again in {}.",
            seconds(retry_after_secs)
        ))
    }

    pub fn is_success(&self) -> bool {
        self.tone == Tone::Success
    }

    fn error(text: &str) -> Self {
        Self {
            text: text.to_string(),
            tone: Tone::Error,
        }
    }
}

pub fn rate_limit_message(retry_after_secs: u64) -> String {
    format!("Rate limit exceeded. Retrying in {}.", seconds(retry_after_secs))
}

fn seconds(count: u64) -> String {
    let unit = if count == 1 { "second" } else { "seconds" };
    format!("{} {}", count, unit)
}
