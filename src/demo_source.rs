use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bracket::build_bracket;
use crate::competition::CompetitionTable;
use crate::config::AppConfig;
use crate::error::FetchError;
use crate::models::{
    Bracket, Fixture, PlayerLeader, StandingRow, StandingsTable, TeamStatLine,
};
use crate::period::{EntityPeriodCatalog, ReportingPeriod, default_period};
use crate::source::LeagueSource;
use crate::state::SliceKind;
use crate::team_stats::aggregate_team_stats;

const CATALOG_SEASONS: i32 = 8;
const LEADERS_LIMIT: usize = 20;
const KNOCKOUT_ROUNDS: &[&str] = &["Round of 16", "Quarter-finals", "Semi-finals", "Final"];

const TEAMS: &[&str] = &[
    "Northbridge",
    "Eastmoor",
    "Kingsport",
    "Redhaven",
    "Ashford City",
    "Westvale",
    "Harbour United",
    "Stonebury",
    "Millbrook",
    "Crestwood",
    "Fairfield Rovers",
    "Oakham",
    "Lowther",
    "Brightwater",
    "Greyfield",
    "Marston Athletic",
    "Rowley",
    "Elmstead",
    "Cold Harbour",
    "Pinecastle",
];

const FIRST_NAMES: &[&str] = &["A.", "B.", "C.", "D.", "E.", "F.", "G.", "J.", "L.", "M."];
const LAST_NAMES: &[&str] = &[
    "Stone", "Vega", "Holt", "Nox", "Vale", "Rook", "Quinn", "Park", "Moss", "Noor", "Hale",
    "Ash", "Reyes", "Okafor", "Lindqvist", "Moreau",
];

/// Offline source with deterministic data per (league, season), simulated
/// latency and optional per-slice failures.
pub struct DemoSource {
    today: NaiveDate,
    latency_ms: (u64, u64),
    fail: HashSet<SliceKind>,
    competitions: CompetitionTable,
}

struct DemoSeason {
    fixtures: Vec<Fixture>,
    leaders: Vec<PlayerLeader>,
}

impl DemoSource {
    pub fn new(
        today: NaiveDate,
        latency_ms: (u64, u64),
        fail: impl IntoIterator<Item = SliceKind>,
        competitions: CompetitionTable,
    ) -> Self {
        Self {
            today,
            latency_ms,
            fail: fail.into_iter().collect(),
            competitions,
        }
    }

    pub fn from_config(config: &AppConfig, today: NaiveDate) -> Self {
        Self::new(
            today,
            config.demo_latency_ms,
            config.demo_fail.iter().copied(),
            config.competitions.clone(),
        )
    }

    fn pause(&self) {
        let (lo, hi) = self.latency_ms;
        if hi == 0 {
            return;
        }
        let ms = rand::thread_rng().gen_range(lo..=hi);
        thread::sleep(Duration::from_millis(ms));
    }

    fn check(&self, kind: SliceKind) -> Result<(), FetchError> {
        self.pause();
        if self.fail.contains(&kind) {
            return Err(FetchError::unavailable(format!(
                "{} feed unavailable",
                kind.label()
            )));
        }
        Ok(())
    }

    fn season(&self, entity_id: u32, year: i32) -> DemoSeason {
        let seed = u64::from(entity_id)
            .wrapping_mul(10_000)
            .wrapping_add(i64::from(year) as u64);
        let mut rng = StdRng::seed_from_u64(seed);
        let current = default_period(self.today);
        let mut fixtures = league_fixtures(entity_id, year, current, &mut rng);
        if self.competitions.is_bracket_style(entity_id) && year <= current {
            let table = aggregate_team_stats(&fixtures);
            let seeds: Vec<(u32, String)> = table
                .iter()
                .take(16)
                .map(|t| (t.team_id, t.team.clone()))
                .collect();
            let next_id = fixtures.len() as u64 + 1;
            fixtures.extend(knockout_fixtures(
                year,
                year < current,
                seeds,
                next_id,
                &mut rng,
            ));
        }
        let leaders = season_leaders(entity_id, &fixtures, &mut rng);
        DemoSeason { fixtures, leaders }
    }
}

impl LeagueSource for DemoSource {
    fn fetch_period_catalog(&self, entity_id: u32) -> Result<EntityPeriodCatalog, FetchError> {
        self.pause();
        let current = default_period(self.today);
        let periods = ((current - CATALOG_SEASONS + 1)..=current)
            .map(|year| {
                if year == current {
                    ReportingPeriod::new(year).current()
                } else {
                    ReportingPeriod::new(year).ending(format!("{}-05-25", year + 1))
                }
            })
            .collect();
        Ok(EntityPeriodCatalog {
            entity_id,
            name: Some(league_name(entity_id)),
            periods,
        })
    }

    fn fetch_standings(&self, entity_id: u32, year: i32) -> Result<StandingsTable, FetchError> {
        self.check(SliceKind::Standings)?;
        let season = self.season(entity_id, year);
        let league_only: Vec<Fixture> = season
            .fixtures
            .into_iter()
            .filter(|f| f.round.starts_with("Regular Season"))
            .collect();
        let rows = aggregate_team_stats(&league_only)
            .into_iter()
            .enumerate()
            .map(|(idx, t)| StandingRow {
                rank: idx as u32 + 1,
                team_id: t.team_id,
                team: t.team.clone(),
                played: t.played,
                won: t.wins,
                drawn: t.draws,
                lost: t.losses,
                goals_for: t.goals_for,
                goals_against: t.goals_against,
                goal_diff: t.goal_diff(),
                points: t.points(),
                form: recent_form(t.team_id, &league_only),
                group: None,
            })
            .collect();
        Ok(StandingsTable { rows })
    }

    fn fetch_fixtures(&self, entity_id: u32, year: i32) -> Result<Vec<Fixture>, FetchError> {
        self.check(SliceKind::Fixtures)?;
        Ok(self.season(entity_id, year).fixtures)
    }

    fn fetch_top_scorers(
        &self,
        entity_id: u32,
        year: i32,
    ) -> Result<Vec<PlayerLeader>, FetchError> {
        self.check(SliceKind::TopScorers)?;
        let mut leaders = self.season(entity_id, year).leaders;
        leaders.sort_by(|a, b| {
            b.goals
                .cmp(&a.goals)
                .then(b.assists.cmp(&a.assists))
                .then(a.name.cmp(&b.name))
        });
        leaders.retain(|p| p.goals > 0);
        leaders.truncate(LEADERS_LIMIT);
        Ok(leaders)
    }

    fn fetch_top_assists(
        &self,
        entity_id: u32,
        year: i32,
    ) -> Result<Vec<PlayerLeader>, FetchError> {
        self.check(SliceKind::TopAssists)?;
        let mut leaders = self.season(entity_id, year).leaders;
        leaders.sort_by(|a, b| {
            b.assists
                .cmp(&a.assists)
                .then(b.goals.cmp(&a.goals))
                .then(a.name.cmp(&b.name))
        });
        leaders.retain(|p| p.assists > 0);
        leaders.truncate(LEADERS_LIMIT);
        Ok(leaders)
    }

    fn fetch_bracket(&self, entity_id: u32, year: i32) -> Result<Bracket, FetchError> {
        self.check(SliceKind::Bracket)?;
        Ok(build_bracket(&self.season(entity_id, year).fixtures))
    }

    fn fetch_team_statistics(
        &self,
        entity_id: u32,
        year: i32,
    ) -> Result<Vec<TeamStatLine>, FetchError> {
        self.check(SliceKind::TeamStatistics)?;
        Ok(aggregate_team_stats(&self.season(entity_id, year).fixtures))
    }
}

fn league_name(entity_id: u32) -> String {
    match entity_id {
        1 => "World Cup".to_string(),
        2 => "UEFA Champions League".to_string(),
        3 => "UEFA Europa League".to_string(),
        39 => "Premier League".to_string(),
        61 => "Ligue 1".to_string(),
        78 => "Bundesliga".to_string(),
        135 => "Serie A".to_string(),
        140 => "La Liga".to_string(),
        id => format!("League {id}"),
    }
}

fn team_id(entity_id: u32, idx: usize) -> u32 {
    entity_id.wrapping_mul(100).wrapping_add(idx as u32 + 1)
}

fn kickoff(date: NaiveDate) -> String {
    format!("{}T15:00:00+00:00", date.format("%Y-%m-%d"))
}

fn day_after(base: NaiveDate, days: i64) -> NaiveDate {
    base.checked_add_signed(ChronoDuration::days(days))
        .unwrap_or(base)
}

// Earlier table positions score a little more often.
fn goals(rng: &mut StdRng, strength: f64) -> u8 {
    (0..6).filter(|_| rng.gen_bool(strength)).count() as u8
}

fn strength(idx: usize) -> f64 {
    0.32 - (idx as f64) * 0.008
}

/// Double round robin. Seasons before `current` are complete, the current
/// one is half played, later ones are unplayed.
fn league_fixtures(entity_id: u32, year: i32, current: i32, rng: &mut StdRng) -> Vec<Fixture> {
    let n = TEAMS.len();
    let rounds = (n - 1) * 2;
    let played_rounds = match year.cmp(&current) {
        std::cmp::Ordering::Less => rounds,
        std::cmp::Ordering::Equal => rounds / 2,
        std::cmp::Ordering::Greater => 0,
    };
    let start = NaiveDate::from_ymd_opt(year, 8, 10)
        .unwrap_or(NaiveDate::MIN);

    // Circle method: team 0 fixed, the rest rotate.
    let mut order: Vec<usize> = (0..n).collect();
    let mut out = Vec::with_capacity(n / 2 * rounds);
    for round in 0..rounds {
        let date = day_after(start, round as i64 * 7);
        for i in 0..n / 2 {
            let (a, b) = (order[i], order[n - 1 - i]);
            let (home, away) = if round < n - 1 { (a, b) } else { (b, a) };
            let finished = round < played_rounds;
            let (hg, ag) = if finished {
                (goals(rng, strength(home) + 0.03), goals(rng, strength(away)))
            } else {
                (0, 0)
            };
            out.push(Fixture {
                id: out.len() as u64 + 1,
                kickoff: kickoff(date),
                round: format!("Regular Season - {}", round + 1),
                status: if finished { "FT" } else { "NS" }.to_string(),
                home_id: team_id(entity_id, home),
                home: TEAMS[home].to_string(),
                away_id: team_id(entity_id, away),
                away: TEAMS[away].to_string(),
                home_goals: finished.then_some(hg),
                away_goals: finished.then_some(ag),
                home_penalties: None,
                away_penalties: None,
                home_winner: finished.then_some(hg > ag).filter(|_| hg != ag),
            });
        }
        order[1..].rotate_right(1);
    }
    out
}

/// Two-legged ties up to a one-off final. In the running season only the
/// first knockout round has been played.
fn knockout_fixtures(
    year: i32,
    complete: bool,
    seeds: Vec<(u32, String)>,
    first_id: u64,
    rng: &mut StdRng,
) -> Vec<Fixture> {
    let mut out = Vec::new();
    let mut alive = seeds;
    let start = NaiveDate::from_ymd_opt(year.saturating_add(1), 2, 14).unwrap_or(NaiveDate::MIN);

    for (round_idx, round) in KNOCKOUT_ROUNDS.iter().enumerate() {
        if alive.len() < 2 {
            break;
        }
        let played = complete || round_idx == 0;
        let two_legs = *round != "Final";
        let first_leg = day_after(start, round_idx as i64 * 21);
        let mut next = Vec::with_capacity(alive.len() / 2);

        for i in 0..alive.len() / 2 {
            let (home, away) = (&alive[i], &alive[alive.len() - 1 - i]);
            let legs: Vec<(usize, &(u32, String), &(u32, String))> = if two_legs {
                vec![(0, home, away), (7, away, home)]
            } else {
                vec![(0, home, away)]
            };
            let mut agg_home = 0u32;
            let mut agg_away = 0u32;
            let leg_count = legs.len();
            for (leg_idx, (offset, h, a)) in legs.into_iter().enumerate() {
                let (hg, ag) = if played {
                    (goals(rng, 0.26), goals(rng, 0.24))
                } else {
                    (0, 0)
                };
                if h.0 == home.0 {
                    agg_home += hg as u32;
                    agg_away += ag as u32;
                } else {
                    agg_home += ag as u32;
                    agg_away += hg as u32;
                }
                let last = leg_idx + 1 == leg_count;
                let shootout = played && last && agg_home == agg_away;
                let (hp, ap) = if shootout {
                    let winner_home = rng.gen_bool(0.5);
                    if winner_home { (Some(5), Some(4)) } else { (Some(3), Some(4)) }
                } else {
                    (None, None)
                };
                out.push(Fixture {
                    id: first_id + out.len() as u64,
                    kickoff: kickoff(day_after(first_leg, offset as i64)),
                    round: (*round).to_string(),
                    status: match (played, shootout) {
                        (false, _) => "NS",
                        (true, true) => "PEN",
                        (true, false) => "FT",
                    }
                    .to_string(),
                    home_id: h.0,
                    home: h.1.clone(),
                    away_id: a.0,
                    away: a.1.clone(),
                    home_goals: played.then_some(hg),
                    away_goals: played.then_some(ag),
                    home_penalties: hp,
                    away_penalties: ap,
                    home_winner: match (hp, ap) {
                        (Some(home_pens), Some(away_pens)) => Some(home_pens > away_pens),
                        _ if played && hg != ag => Some(hg > ag),
                        _ => None,
                    },
                });
            }
            if !played {
                continue;
            }
            // Winner from the tie's perspective; the shootout sits on the last leg.
            let home_through = match out.last() {
                Some(last) if last.home_penalties.is_some() => {
                    let last_home_won = last.home_penalties > last.away_penalties;
                    (last.home_id == home.0) == last_home_won
                }
                _ => agg_home > agg_away,
            };
            next.push(if home_through { home.clone() } else { away.clone() });
        }
        if !played {
            break;
        }
        alive = next;
    }
    out
}

fn season_leaders(entity_id: u32, fixtures: &[Fixture], rng: &mut StdRng) -> Vec<PlayerLeader> {
    let mut players: Vec<PlayerLeader> = Vec::with_capacity(TEAMS.len() * 2);
    for (idx, team) in TEAMS.iter().enumerate() {
        for slot in 0..2 {
            let first = FIRST_NAMES[(idx + slot * 3) % FIRST_NAMES.len()];
            let last = LAST_NAMES[(idx * 2 + slot) % LAST_NAMES.len()];
            players.push(PlayerLeader {
                player_id: team_id(entity_id, idx)
                    .wrapping_mul(10)
                    .wrapping_add(slot as u32),
                name: format!("{first} {last}"),
                team: (*team).to_string(),
                appearances: 0,
                goals: 0,
                assists: 0,
            });
        }
    }

    for f in fixtures.iter().filter(|f| f.is_finished()) {
        let Some((hg, ag)) = f.score() else {
            continue;
        };
        for (team, scored) in [(&f.home, hg), (&f.away, ag)] {
            let Some(base) = players.iter().position(|p| &p.team == team) else {
                continue;
            };
            players[base].appearances += 1;
            players[base + 1].appearances += 1;
            for _ in 0..scored {
                let scorer = base + usize::from(rng.gen_bool(0.35));
                players[scorer].goals += 1;
                if rng.gen_bool(0.6) {
                    let provider = if scorer == base { base + 1 } else { base };
                    players[provider].assists += 1;
                }
            }
        }
    }
    players
}

fn recent_form(team_id: u32, fixtures: &[Fixture]) -> Option<String> {
    let mut form: Vec<char> = fixtures
        .iter()
        .filter(|f| f.is_finished() && (f.home_id == team_id || f.away_id == team_id))
        .filter_map(|f| {
            let (h, a) = f.score()?;
            let (scored, conceded) = if f.home_id == team_id { (h, a) } else { (a, h) };
            Some(match scored.cmp(&conceded) {
                std::cmp::Ordering::Greater => 'W',
                std::cmp::Ordering::Equal => 'D',
                std::cmp::Ordering::Less => 'L',
            })
        })
        .collect();
    if form.is_empty() {
        return None;
    }
    let keep = form.len().min(5);
    form.drain(..form.len() - keep);
    Some(form.into_iter().collect())
}
