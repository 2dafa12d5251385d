use crate::models::{Bracket, BracketRound, BracketTie, Fixture};

const KNOCKOUT_MARKERS: &[&str] = &[
    "round of",
    "1/8",
    "1/16",
    "8th finals",
    "quarter",
    "semi",
    "final",
    "knockout",
    "play-off",
    "playoff",
    "3rd place",
];
const NON_KNOCKOUT_MARKERS: &[&str] = &[
    "group",
    "regular season",
    "league stage",
    "qualifying",
    "preliminary",
];

pub fn is_knockout_round(round: &str) -> bool {
    let r = round.to_ascii_lowercase();
    if NON_KNOCKOUT_MARKERS.iter().any(|m| r.contains(m)) {
        return false;
    }
    KNOCKOUT_MARKERS.iter().any(|m| r.contains(m))
}

/// Knockout tree for one season. Rounds are ordered by their first kickoff;
/// fixtures between the same two teams inside a round form one tie.
pub fn build_bracket(fixtures: &[Fixture]) -> Bracket {
    let mut knockout: Vec<&Fixture> = fixtures
        .iter()
        .filter(|f| is_knockout_round(&f.round) && !f.is_cancelled())
        .collect();
    // RFC 3339 strings from one source share an offset, so they sort lexically.
    knockout.sort_by(|a, b| a.kickoff.cmp(&b.kickoff).then(a.id.cmp(&b.id)));

    let mut rounds: Vec<(String, Vec<Vec<&Fixture>>)> = Vec::new();
    for fixture in knockout {
        let idx = match rounds.iter().position(|(name, _)| *name == fixture.round) {
            Some(idx) => idx,
            None => {
                rounds.push((fixture.round.clone(), Vec::new()));
                rounds.len() - 1
            }
        };
        let ties = &mut rounds[idx].1;
        let key = pair_key(fixture);
        match ties.iter_mut().find(|legs| pair_key(legs[0]) == key) {
            Some(legs) => legs.push(fixture),
            None => ties.push(vec![fixture]),
        }
    }

    Bracket {
        rounds: rounds
            .into_iter()
            .map(|(name, ties)| BracketRound {
                name,
                ties: ties.iter().map(|legs| build_tie(legs)).collect(),
            })
            .collect(),
    }
}

fn pair_key(f: &Fixture) -> (u32, u32) {
    (f.home_id.min(f.away_id), f.home_id.max(f.away_id))
}

// Legs arrive in kickoff order; the first leg's home side is the tie's home.
fn build_tie(legs: &[&Fixture]) -> BracketTie {
    let first = legs[0];
    let (home_id, away_id) = (first.home_id, first.away_id);

    let mut aggregate_home = 0u32;
    let mut aggregate_away = 0u32;
    for leg in legs {
        let Some((h, a)) = leg.score() else {
            continue;
        };
        if leg.home_id == home_id {
            aggregate_home += h as u32;
            aggregate_away += a as u32;
        } else {
            aggregate_home += a as u32;
            aggregate_away += h as u32;
        }
    }

    let all_finished = legs.iter().all(|leg| leg.is_finished());
    let winner_id = if !all_finished {
        None
    } else if aggregate_home != aggregate_away {
        Some(if aggregate_home > aggregate_away {
            home_id
        } else {
            away_id
        })
    } else {
        decided_on_last_leg(legs[legs.len() - 1])
    };

    BracketTie {
        home_id,
        home: first.home.clone(),
        away_id,
        away: first.away.clone(),
        legs: legs.iter().map(|leg| leg.id).collect(),
        aggregate_home,
        aggregate_away,
        winner_id,
    }
}

fn decided_on_last_leg(leg: &Fixture) -> Option<u32> {
    if let (Some(h), Some(a)) = (leg.home_penalties, leg.away_penalties)
        && h != a
    {
        return Some(if h > a { leg.home_id } else { leg.away_id });
    }
    match leg.home_winner {
        Some(true) => Some(leg.home_id),
        Some(false) => Some(leg.away_id),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::is_knockout_round;

    #[test]
    fn recognizes_round_names() {
        assert!(is_knockout_round("Round of 16"));
        assert!(is_knockout_round("Quarter-finals"));
        assert!(is_knockout_round("Final"));
        assert!(is_knockout_round("Knockout Round Play-offs"));
        assert!(!is_knockout_round("Regular Season - 12"));
        assert!(!is_knockout_round("Group Stage - 3"));
        assert!(!is_knockout_round("League Stage - 8"));
        assert!(!is_knockout_round("3rd Qualifying Round"));
    }
}
