use std::collections::HashMap;

use crate::models::{Fixture, TeamStatLine};

/// Per-team season totals over finished fixtures, best record first.
pub fn aggregate_team_stats(fixtures: &[Fixture]) -> Vec<TeamStatLine> {
    let mut by_team: HashMap<u32, TeamStatLine> = HashMap::new();

    for m in fixtures {
        if !m.is_finished() || m.is_cancelled() {
            continue;
        }
        let Some((home_goals, away_goals)) = m.score() else {
            continue;
        };
        let (hg, ag) = (home_goals as u32, away_goals as u32);

        let home = by_team.entry(m.home_id).or_insert_with(|| TeamStatLine {
            team_id: m.home_id,
            team: m.home.clone(),
            ..TeamStatLine::default()
        });
        record(home, hg, ag);
        if hg > ag {
            home.home_wins += 1;
        }

        let away = by_team.entry(m.away_id).or_insert_with(|| TeamStatLine {
            team_id: m.away_id,
            team: m.away.clone(),
            ..TeamStatLine::default()
        });
        record(away, ag, hg);
        if ag > hg {
            away.away_wins += 1;
        }
    }

    let mut out: Vec<TeamStatLine> = by_team.into_values().collect();
    out.sort_by(|a, b| {
        b.points()
            .cmp(&a.points())
            .then(b.goal_diff().cmp(&a.goal_diff()))
            .then(b.goals_for.cmp(&a.goals_for))
            .then(a.team.cmp(&b.team))
    });
    out
}

fn record(line: &mut TeamStatLine, scored: u32, conceded: u32) {
    line.played += 1;
    line.goals_for += scored;
    line.goals_against += conceded;
    match scored.cmp(&conceded) {
        std::cmp::Ordering::Greater => line.wins += 1,
        std::cmp::Ordering::Equal => line.draws += 1,
        std::cmp::Ordering::Less => line.losses += 1,
    }
    if conceded == 0 {
        line.clean_sheets += 1;
    }
    if scored == 0 {
        line.failed_to_score += 1;
    }
}
