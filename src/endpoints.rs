use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("invalid API base URL {base}: {source}")]
    InvalidBase {
        base: String,
        #[source]
        source: url::ParseError,
    },

    #[error("API base URL {0} cannot carry a path")]
    CannotBeABase(String),
}

pub type Result<T> = std::result::Result<T, EndpointError>;

pub fn top_url(api_base: &str) -> Result<Url> {
    join_segments(api_base, &["leaderboard", "top"])
}

/// The player id becomes a single percent-encoded path segment.
pub fn rank_url(api_base: &str, player_id: &str) -> Result<Url> {
    join_segments(api_base, &["leaderboard", "rank", player_id])
}

pub fn normalize_player_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn join_segments(api_base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(api_base.trim()).map_err(|source| EndpointError::InvalidBase {
        base: api_base.to_string(),
        source,
    })?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| EndpointError::CannotBeABase(api_base.to_string()))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}
