use std::collections::HashSet;
use std::env;

// API-Football league ids.
const DEFAULT_BRACKET_IDS: &[u32] = &[
    1,   // World Cup
    2,   // Champions League
    3,   // Europa League
    4,   // Euro Championship
    9,   // Copa America
    15,  // Club World Cup
    45,  // FA Cup
    48,  // League Cup
    66,  // Coupe de France
    81,  // DFB Pokal
    137, // Coppa Italia
    143, // Copa del Rey
    848, // Conference League
];
const DEFAULT_NO_SEASON_IDS: &[u32] = &[1, 4, 9, 15];

/// Static per-competition classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompetitionTable {
    bracket_style: HashSet<u32>,
    no_season_selector: HashSet<u32>,
}

impl CompetitionTable {
    pub fn new(
        bracket_style: impl IntoIterator<Item = u32>,
        no_season_selector: impl IntoIterator<Item = u32>,
    ) -> Self {
        Self {
            bracket_style: bracket_style.into_iter().collect(),
            no_season_selector: no_season_selector.into_iter().collect(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(
            DEFAULT_BRACKET_IDS.iter().copied(),
            DEFAULT_NO_SEASON_IDS.iter().copied(),
        )
    }

    /// Built-in tables, overridable through `APP_BRACKET_LEAGUE_IDS` and
    /// `APP_NO_SEASON_LEAGUE_IDS`. An empty variable empties the table.
    pub fn from_env() -> Self {
        Self::new(
            parse_ids_env_or_default("APP_BRACKET_LEAGUE_IDS", DEFAULT_BRACKET_IDS),
            parse_ids_env_or_default("APP_NO_SEASON_LEAGUE_IDS", DEFAULT_NO_SEASON_IDS),
        )
    }

    pub fn is_bracket_style(&self, entity_id: u32) -> bool {
        self.bracket_style.contains(&entity_id)
    }

    pub fn is_period_selection_supported(&self, entity_id: u32) -> bool {
        !self.no_season_selector.contains(&entity_id)
    }
}

fn parse_ids_env_or_default(key: &str, default_ids: &[u32]) -> Vec<u32> {
    match env::var(key) {
        Ok(raw) => {
            if raw.trim().is_empty() {
                Vec::new()
            } else {
                parse_ids(&raw)
            }
        }
        Err(_) => default_ids.to_vec(),
    }
}

pub(crate) fn parse_ids(raw: &str) -> Vec<u32> {
    raw.split([',', ';', ' '])
        .filter_map(|part| part.trim().parse::<u32>().ok())
        .collect()
}
