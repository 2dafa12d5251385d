use chrono::NaiveDate;

use league_desk::competition::CompetitionTable;
use league_desk::demo_source::DemoSource;
use league_desk::period::{list_available_periods, resolve_optimal_period};
use league_desk::source::LeagueSource;
use league_desk::state::SliceKind;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 15).expect("valid date")
}

fn source(fail: Vec<SliceKind>) -> DemoSource {
    DemoSource::new(today(), (0, 0), fail, CompetitionTable::builtin())
}

#[test]
fn catalog_marks_running_season_current() {
    let catalog = source(Vec::new())
        .fetch_period_catalog(39)
        .expect("catalog");
    assert_eq!(catalog.name.as_deref(), Some("Premier League"));
    assert_eq!(catalog.periods.len(), 8);
    assert_eq!(resolve_optimal_period(&catalog, None, today()), 2024);
    assert_eq!(list_available_periods(&catalog, today())[0], 2025);
}

#[test]
fn seasons_are_deterministic() {
    let a = source(Vec::new()).fetch_standings(39, 2022).expect("standings");
    let b = source(Vec::new()).fetch_standings(39, 2022).expect("standings");
    assert_eq!(a, b);
    assert_eq!(a.rows.len(), 20);
    assert!(a.rows.iter().all(|r| r.played == 38));
    assert!(a.rows.windows(2).all(|w| w[0].points >= w[1].points));
}

#[test]
fn future_season_is_unplayed() {
    let demo = source(Vec::new());
    let fixtures = demo.fetch_fixtures(39, 2025).expect("fixtures");
    assert!(!fixtures.is_empty());
    assert!(fixtures.iter().all(|f| f.status == "NS"));
    assert!(demo.fetch_standings(39, 2025).expect("standings").rows.is_empty());
    assert!(demo.fetch_top_scorers(39, 2025).expect("scorers").is_empty());
}

#[test]
fn past_cup_season_has_a_champion() {
    let bracket = source(Vec::new()).fetch_bracket(2, 2023).expect("bracket");
    let names: Vec<&str> = bracket.rounds.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Round of 16", "Quarter-finals", "Semi-finals", "Final"]
    );
    assert_eq!(bracket.rounds[0].ties.len(), 8);
    let final_tie = &bracket.rounds[3].ties[0];
    assert_eq!(final_tie.legs.len(), 1);
    assert!(final_tie.winner_id.is_some());
    for round in &bracket.rounds {
        assert!(round.ties.iter().all(|t| t.winner_id.is_some()), "{}", round.name);
    }
}

#[test]
fn running_cup_season_has_open_quarter_finals() {
    let bracket = source(Vec::new()).fetch_bracket(2, 2024).expect("bracket");
    assert_eq!(bracket.rounds.len(), 2);
    assert!(bracket.rounds[0].ties.iter().all(|t| t.winner_id.is_some()));
    let quarters = &bracket.rounds[1];
    assert_eq!(quarters.name, "Quarter-finals");
    assert_eq!(quarters.ties.len(), 4);
    assert!(quarters.ties.iter().all(|t| t.winner_id.is_none()));
}

#[test]
fn league_competition_has_no_knockout_rounds() {
    let bracket = source(Vec::new()).fetch_bracket(39, 2023).expect("bracket");
    assert!(bracket.is_empty());
}

#[test]
fn configured_slice_fails_alone() {
    let demo = source(vec![SliceKind::TopAssists]);
    let err = demo.fetch_top_assists(39, 2023).expect_err("injected failure");
    assert_eq!(err.to_string(), "Top assists feed unavailable");
    assert!(demo.fetch_top_scorers(39, 2023).is_ok());
}

#[test]
fn extreme_ids_and_seasons_still_produce_data() {
    let demo = source(Vec::new());
    let early = demo.fetch_fixtures(39, -1).expect("negative season");
    assert!(!early.is_empty());
    let wide = demo.fetch_fixtures(50_000_000, 2024).expect("large league id");
    assert!(!wide.is_empty());
    assert!(demo.fetch_bracket(u32::MAX, i32::MAX).is_ok());
    assert!(demo.fetch_standings(u32::MAX, i32::MIN).is_ok());
}
