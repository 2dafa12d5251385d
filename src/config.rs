use std::env;
use std::path::PathBuf;

use crate::competition::CompetitionTable;
use crate::state::SliceKind;

const DEFAULT_API_BASE: &str = "https://v3.football.api-sports.io";
const DEFAULT_LEAGUE_ID: u32 = 39;
const MAX_LEAGUE_ID: u32 = 1_000_000;
const SEASON_RANGE: std::ops::RangeInclusive<i32> = 1850..=2200;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub http_timeout_secs: u64,
    pub fetch_parallelism: usize,
    pub league_id: u32,
    pub requested_season: Option<i32>,
    pub competitions: CompetitionTable,
    pub demo_latency_ms: (u64, u64),
    pub demo_fail: Vec<SliceKind>,
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Read settings from the process environment. Call after `dotenvy` has
    /// loaded any `.env` files.
    pub fn from_env() -> Self {
        let http_timeout_secs = env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(10)
            .clamp(2, 60);
        let fetch_parallelism = env::var("FETCH_PARALLELISM")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(6)
            .clamp(1, 16);
        let league_id = env::var("LEAGUE_ID")
            .ok()
            .and_then(|val| parse_league_id(&val))
            .unwrap_or(DEFAULT_LEAGUE_ID);
        let requested_season = env::var("LEAGUE_SEASON")
            .ok()
            .and_then(|val| parse_season(&val));
        let demo_latency_ms = env::var("DEMO_LATENCY_MS")
            .ok()
            .and_then(|val| parse_latency(&val))
            .unwrap_or((150, 900));
        let demo_fail = opt_env("DEMO_FAIL")
            .map(|raw| parse_slice_list(&raw))
            .unwrap_or_default();

        Self {
            api_base: opt_env("API_FOOTBALL_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key: opt_env("API_FOOTBALL_KEY"),
            http_timeout_secs,
            fetch_parallelism,
            league_id,
            requested_season,
            competitions: CompetitionTable::from_env(),
            demo_latency_ms,
            demo_fail,
            log_dir: opt_env("LOG_DIR").map(PathBuf::from),
        }
    }

    pub fn use_demo_source(&self) -> bool {
        self.api_key.is_none()
    }
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

fn parse_league_id(raw: &str) -> Option<u32> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|id| (1..=MAX_LEAGUE_ID).contains(id))
}

fn parse_season(raw: &str) -> Option<i32> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|year| SEASON_RANGE.contains(year))
}

/// `"200-800"` or a single `"300"`; bounds are reordered when swapped.
fn parse_latency(raw: &str) -> Option<(u64, u64)> {
    let raw = raw.trim();
    let (lo, hi) = match raw.split_once('-') {
        Some((lo, hi)) => (
            lo.trim().parse::<u64>().ok()?,
            hi.trim().parse::<u64>().ok()?,
        ),
        None => {
            let v: u64 = raw.parse().ok()?;
            (v, v)
        }
    };
    Some((lo.min(hi), lo.max(hi)))
}

fn parse_slice_list(raw: &str) -> Vec<SliceKind> {
    let mut out: Vec<SliceKind> = raw.split([',', ';']).filter_map(SliceKind::parse).collect();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::{parse_latency, parse_league_id, parse_season, parse_slice_list};
    use crate::state::SliceKind;

    #[test]
    fn latency_accepts_range_and_single_value() {
        assert_eq!(parse_latency("200-800"), Some((200, 800)));
        assert_eq!(parse_latency("800 - 200"), Some((200, 800)));
        assert_eq!(parse_latency("300"), Some((300, 300)));
        assert_eq!(parse_latency("fast"), None);
    }

    #[test]
    fn out_of_range_ids_and_seasons_are_rejected() {
        assert_eq!(parse_league_id(" 39 "), Some(39));
        assert_eq!(parse_league_id("0"), None);
        assert_eq!(parse_league_id("50000000"), None);
        assert_eq!(parse_season("2023"), Some(2023));
        assert_eq!(parse_season("-1"), None);
        assert_eq!(parse_season("2147483647"), None);
    }

    #[test]
    fn slice_list_ignores_unknown_names() {
        assert_eq!(
            parse_slice_list("top-scorers, bogus;bracket"),
            vec![SliceKind::TopScorers, SliceKind::Bracket]
        );
    }
}
