use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingRow {
    pub rank: u32,
    pub team_id: u32,
    pub team: String,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_diff: i32,
    pub points: u32,
    #[serde(default)]
    pub form: Option<String>,
    // Set for competitions with several tables (groups, conferences).
    #[serde(default)]
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StandingsTable {
    pub rows: Vec<StandingRow>,
}

impl StandingsTable {
    /// Rows split by group, in first-seen group order.
    pub fn groups(&self) -> Vec<(Option<&str>, Vec<&StandingRow>)> {
        let mut out: Vec<(Option<&str>, Vec<&StandingRow>)> = Vec::new();
        for row in &self.rows {
            let key = row.group.as_deref();
            match out.iter_mut().find(|(g, _)| *g == key) {
                Some((_, rows)) => rows.push(row),
                None => out.push((key, vec![row])),
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: u64,
    /// RFC 3339 kickoff as reported by the source.
    pub kickoff: String,
    pub round: String,
    /// Short status code (`NS`, `1H`, `FT`, `AET`, `PEN`, ...).
    pub status: String,
    pub home_id: u32,
    pub home: String,
    pub away_id: u32,
    pub away: String,
    pub home_goals: Option<u8>,
    pub away_goals: Option<u8>,
    #[serde(default)]
    pub home_penalties: Option<u8>,
    #[serde(default)]
    pub away_penalties: Option<u8>,
    // Source-reported winner flag for the home side (None = draw/unknown).
    #[serde(default)]
    pub home_winner: Option<bool>,
}

impl Fixture {
    pub fn is_finished(&self) -> bool {
        matches!(self.status.as_str(), "FT" | "AET" | "PEN" | "AWD" | "WO")
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.status.as_str(), "CANC" | "ABD" | "PST")
    }

    pub fn score(&self) -> Option<(u8, u8)> {
        Some((self.home_goals?, self.away_goals?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerLeader {
    pub player_id: u32,
    pub name: String,
    pub team: String,
    pub appearances: u32,
    pub goals: u32,
    pub assists: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketTie {
    pub home_id: u32,
    pub home: String,
    pub away_id: u32,
    pub away: String,
    /// Fixture ids in kickoff order.
    pub legs: Vec<u64>,
    pub aggregate_home: u32,
    pub aggregate_away: u32,
    pub winner_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketRound {
    pub name: String,
    pub ties: Vec<BracketTie>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Bracket {
    pub rounds: Vec<BracketRound>,
}

impl Bracket {
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TeamStatLine {
    pub team_id: u32,
    pub team: String,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub clean_sheets: u32,
    pub failed_to_score: u32,
    pub home_wins: u32,
    pub away_wins: u32,
}

impl TeamStatLine {
    pub fn points(&self) -> u32 {
        self.wins * 3 + self.draws
    }

    pub fn goal_diff(&self) -> i32 {
        self.goals_for as i32 - self.goals_against as i32
    }

    pub fn goals_per_game(&self) -> f64 {
        if self.played == 0 {
            return 0.0;
        }
        self.goals_for as f64 / self.played as f64
    }
}
