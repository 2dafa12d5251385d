use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::bracket::build_bracket;
use crate::config::AppConfig;
use crate::error::FetchError;
use crate::http_client::http_client;
use crate::models::{
    Bracket, Fixture, PlayerLeader, StandingRow, StandingsTable, TeamStatLine,
};
use crate::period::{EntityPeriodCatalog, ReportingPeriod};
use crate::source::LeagueSource;
use crate::team_stats::aggregate_team_stats;

// Fixtures, bracket and team stats all derive from one `/fixtures` call.
const FIXTURES_TTL: Duration = Duration::from_secs(10);

/// API-Football v3 backed source.
pub struct ApiFootballSource {
    client: &'static Client,
    base_url: String,
    fixtures: FixturesMemo,
}

/// Short-lived per-season fixture lists. Concurrent callers for the same
/// season share a single fetch; failures are not kept.
pub(crate) struct FixturesMemo {
    ttl: Duration,
    entries: Mutex<HashMap<(u32, i32), (Instant, Arc<OnceCell<Vec<Fixture>>>)>>,
}

impl FixturesMemo {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn get_or_fetch(
        &self,
        key: (u32, i32),
        fetch: impl FnOnce() -> Result<Vec<Fixture>, FetchError>,
    ) -> Result<Vec<Fixture>, FetchError> {
        let cell = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.retain(|_, (at, _)| at.elapsed() < self.ttl);
            entries
                .entry(key)
                .or_insert_with(|| (Instant::now(), Arc::new(OnceCell::new())))
                .1
                .clone()
        };
        cell.get_or_try_init(fetch).cloned()
    }
}

impl ApiFootballSource {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("API_FOOTBALL_KEY is not set"))?;
        Ok(Self {
            client: http_client(api_key, config.http_timeout_secs)?,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            fixtures: FixturesMemo::new(FIXTURES_TTL),
        })
    }

    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "api request");
        let resp = self.client.get(&url).query(query).send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn season_fixtures(&self, entity_id: u32, year: i32) -> Result<Vec<Fixture>, FetchError> {
        self.fixtures.get_or_fetch((entity_id, year), || {
            let body = self.get("/fixtures", &Self::season_query(entity_id, year))?;
            parse_fixtures_json(&body)
        })
    }

    fn season_query(entity_id: u32, year: i32) -> [(&'static str, String); 2] {
        [("league", entity_id.to_string()), ("season", year.to_string())]
    }
}

impl LeagueSource for ApiFootballSource {
    fn fetch_period_catalog(&self, entity_id: u32) -> Result<EntityPeriodCatalog, FetchError> {
        let body = self.get("/leagues", &[("id", entity_id.to_string())])?;
        parse_league_catalog_json(entity_id, &body)
    }

    fn fetch_standings(&self, entity_id: u32, year: i32) -> Result<StandingsTable, FetchError> {
        let body = self.get("/standings", &Self::season_query(entity_id, year))?;
        parse_standings_json(&body)
    }

    fn fetch_fixtures(&self, entity_id: u32, year: i32) -> Result<Vec<Fixture>, FetchError> {
        self.season_fixtures(entity_id, year)
    }

    fn fetch_top_scorers(
        &self,
        entity_id: u32,
        year: i32,
    ) -> Result<Vec<PlayerLeader>, FetchError> {
        let body = self.get("/players/topscorers", &Self::season_query(entity_id, year))?;
        parse_player_leaders_json(&body)
    }

    fn fetch_top_assists(
        &self,
        entity_id: u32,
        year: i32,
    ) -> Result<Vec<PlayerLeader>, FetchError> {
        let body = self.get("/players/topassists", &Self::season_query(entity_id, year))?;
        parse_player_leaders_json(&body)
    }

    fn fetch_bracket(&self, entity_id: u32, year: i32) -> Result<Bracket, FetchError> {
        Ok(build_bracket(&self.season_fixtures(entity_id, year)?))
    }

    fn fetch_team_statistics(
        &self,
        entity_id: u32,
        year: i32,
    ) -> Result<Vec<TeamStatLine>, FetchError> {
        Ok(aggregate_team_stats(&self.season_fixtures(entity_id, year)?))
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "Vec::new")]
    response: Vec<T>,
}

fn parse_envelope<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let root: Value = serde_json::from_str(trimmed)?;
    if let Some(msg) = api_errors(root.get("errors")) {
        return Err(FetchError::Api(msg));
    }
    let envelope: Envelope<T> = serde_json::from_value(root)?;
    Ok(envelope.response)
}

// `errors` is `[]` or `{}` when the call succeeded, otherwise a list or a
// map of messages.
fn api_errors(errors: Option<&Value>) -> Option<String> {
    let messages: Vec<String> = match errors? {
        Value::Array(items) => items.iter().map(value_text).collect(),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}: {}", value_text(v)))
            .collect(),
        Value::String(s) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    };
    if messages.is_empty() {
        None
    } else {
        Some(messages.join("; "))
    }
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct LeagueEntry {
    league: LeagueInfo,
    #[serde(default)]
    seasons: Vec<SeasonEntry>,
}

#[derive(Debug, Deserialize)]
struct LeagueInfo {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeasonEntry {
    year: i32,
    #[serde(default)]
    end: Option<String>,
    #[serde(default)]
    current: bool,
}

pub fn parse_league_catalog_json(
    entity_id: u32,
    raw: &str,
) -> Result<EntityPeriodCatalog, FetchError> {
    let entries: Vec<LeagueEntry> = parse_envelope(raw)?;
    let Some(entry) = entries.into_iter().next() else {
        return Ok(EntityPeriodCatalog::new(entity_id, Vec::new()));
    };
    let periods = entry
        .seasons
        .into_iter()
        .map(|s| ReportingPeriod {
            year: s.year,
            is_current: s.current,
            end_date: s.end,
        })
        .collect();
    Ok(EntityPeriodCatalog {
        entity_id,
        name: entry.league.name,
        periods,
    })
}

#[derive(Debug, Deserialize)]
struct StandingsEntry {
    league: StandingsLeague,
}

#[derive(Debug, Deserialize)]
struct StandingsLeague {
    #[serde(default)]
    standings: Vec<Vec<StandingEntry>>,
}

#[derive(Debug, Deserialize)]
struct StandingEntry {
    rank: u32,
    team: TeamRef,
    #[serde(default)]
    points: u32,
    #[serde(rename = "goalsDiff", default)]
    goals_diff: i32,
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    form: Option<String>,
    all: StandingRecord,
}

#[derive(Debug, Deserialize)]
struct StandingRecord {
    #[serde(default)]
    played: Option<u32>,
    #[serde(default)]
    win: Option<u32>,
    #[serde(default)]
    draw: Option<u32>,
    #[serde(default)]
    lose: Option<u32>,
    goals: GoalsRecord,
}

#[derive(Debug, Deserialize)]
struct GoalsRecord {
    #[serde(rename = "for", default)]
    scored: Option<u32>,
    #[serde(default)]
    against: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TeamRef {
    id: u32,
    name: String,
    #[serde(default)]
    winner: Option<bool>,
}

pub fn parse_standings_json(raw: &str) -> Result<StandingsTable, FetchError> {
    let entries: Vec<StandingsEntry> = parse_envelope(raw)?;
    let Some(entry) = entries.into_iter().next() else {
        return Ok(StandingsTable::default());
    };
    // A single table carries the league name as its group; drop it.
    let multi_table = entry.league.standings.len() > 1;
    let rows = entry
        .league
        .standings
        .into_iter()
        .flatten()
        .map(|s| StandingRow {
            rank: s.rank,
            team_id: s.team.id,
            team: s.team.name,
            played: s.all.played.unwrap_or(0),
            won: s.all.win.unwrap_or(0),
            drawn: s.all.draw.unwrap_or(0),
            lost: s.all.lose.unwrap_or(0),
            goals_for: s.all.goals.scored.unwrap_or(0),
            goals_against: s.all.goals.against.unwrap_or(0),
            goal_diff: s.goals_diff,
            points: s.points,
            form: s.form.filter(|f| !f.is_empty()),
            group: if multi_table { s.group } else { None },
        })
        .collect();
    Ok(StandingsTable { rows })
}

#[derive(Debug, Deserialize)]
struct FixtureEntry {
    fixture: FixtureInfo,
    league: FixtureLeague,
    teams: FixtureTeams,
    goals: ScorePair,
    #[serde(default)]
    score: Option<FixtureScore>,
}

#[derive(Debug, Deserialize)]
struct FixtureInfo {
    id: u64,
    date: String,
    status: FixtureStatus,
}

#[derive(Debug, Deserialize)]
struct FixtureStatus {
    short: String,
}

#[derive(Debug, Deserialize)]
struct FixtureLeague {
    #[serde(default)]
    round: String,
}

#[derive(Debug, Deserialize)]
struct FixtureTeams {
    home: TeamRef,
    away: TeamRef,
}

#[derive(Debug, Deserialize)]
struct ScorePair {
    #[serde(default)]
    home: Option<u8>,
    #[serde(default)]
    away: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct FixtureScore {
    #[serde(default)]
    penalty: Option<ScorePair>,
}

pub fn parse_fixtures_json(raw: &str) -> Result<Vec<Fixture>, FetchError> {
    let entries: Vec<FixtureEntry> = parse_envelope(raw)?;
    let mut out: Vec<Fixture> = entries
        .into_iter()
        .map(|e| {
            let penalty = e.score.and_then(|s| s.penalty);
            Fixture {
                id: e.fixture.id,
                kickoff: e.fixture.date,
                round: e.league.round,
                status: e.fixture.status.short,
                home_id: e.teams.home.id,
                home: e.teams.home.name,
                away_id: e.teams.away.id,
                away: e.teams.away.name,
                home_goals: e.goals.home,
                away_goals: e.goals.away,
                home_penalties: penalty.as_ref().and_then(|p| p.home),
                away_penalties: penalty.as_ref().and_then(|p| p.away),
                home_winner: e.teams.home.winner,
            }
        })
        .collect();
    out.sort_by(|a, b| a.kickoff.cmp(&b.kickoff).then(a.id.cmp(&b.id)));
    Ok(out)
}

#[derive(Debug, Deserialize)]
struct LeaderEntry {
    player: PlayerRef,
    #[serde(default)]
    statistics: Vec<LeaderStats>,
}

#[derive(Debug, Deserialize)]
struct PlayerRef {
    id: u32,
    name: String,
}

#[derive(Debug, Deserialize)]
struct LeaderStats {
    #[serde(default)]
    team: Option<NamedRef>,
    #[serde(default)]
    games: Option<GamesStats>,
    #[serde(default)]
    goals: Option<GoalStats>,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct GamesStats {
    // Sic: the API spells it this way.
    #[serde(rename = "appearences", default)]
    appearances: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GoalStats {
    #[serde(default)]
    total: Option<u32>,
    #[serde(default)]
    assists: Option<u32>,
}

pub fn parse_player_leaders_json(raw: &str) -> Result<Vec<PlayerLeader>, FetchError> {
    let entries: Vec<LeaderEntry> = parse_envelope(raw)?;
    Ok(entries
        .into_iter()
        .map(|e| {
            let stats = e.statistics.into_iter().next();
            let (team, games, goals) = match stats {
                Some(s) => (s.team, s.games, s.goals),
                None => (None, None, None),
            };
            PlayerLeader {
                player_id: e.player.id,
                name: e.player.name,
                team: team.map(|t| t.name).unwrap_or_default(),
                appearances: games.and_then(|g| g.appearances).unwrap_or(0),
                goals: goals.as_ref().and_then(|g| g.total).unwrap_or(0),
                assists: goals.as_ref().and_then(|g| g.assists).unwrap_or(0),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::{FixturesMemo, api_errors};
    use crate::error::FetchError;
    use serde_json::json;

    #[test]
    fn memo_shares_one_fetch_per_season() {
        let memo = Arc::new(FixturesMemo::new(Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));
        let workers: Vec<_> = (0..3)
            .map(|_| {
                let memo = memo.clone();
                let calls = calls.clone();
                thread::spawn(move || {
                    memo.get_or_fetch((39, 2024), || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(50));
                        Ok(Vec::new())
                    })
                })
            })
            .collect();
        for worker in workers {
            assert!(worker.join().expect("worker").is_ok());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        memo.get_or_fetch((39, 2023), || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        })
        .expect("other season");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn memo_does_not_keep_failures_or_expired_entries() {
        let memo = FixturesMemo::new(Duration::ZERO);
        let err = memo.get_or_fetch((39, 2024), || Err(FetchError::unavailable("down")));
        assert!(err.is_err());
        let mut fetched = 0;
        for _ in 0..2 {
            memo.get_or_fetch((39, 2024), || {
                fetched += 1;
                Ok(Vec::new())
            })
            .expect("fetch");
        }
        assert_eq!(fetched, 2);
    }

    #[test]
    fn empty_error_containers_are_success() {
        assert_eq!(api_errors(Some(&json!([]))), None);
        assert_eq!(api_errors(Some(&json!({}))), None);
        assert_eq!(api_errors(None), None);
    }

    #[test]
    fn error_map_is_flattened() {
        let msg = api_errors(Some(&json!({"token": "Missing application key"})));
        assert_eq!(msg.as_deref(), Some("token: Missing application key"));
    }
}
