use chrono::NaiveDate;

use league_desk::competition::CompetitionTable;
use league_desk::period::{
    EntityPeriodCatalog, ReportingPeriod, default_period, list_available_periods,
    resolve_optimal_period,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn catalog(periods: Vec<ReportingPeriod>) -> EntityPeriodCatalog {
    EntityPeriodCatalog::new(39, periods)
}

fn sample_catalog() -> EntityPeriodCatalog {
    catalog(vec![
        ReportingPeriod::new(2021).ending("2022-05-22"),
        ReportingPeriod::new(2023).current(),
        ReportingPeriod::new(2022).ending("2023-05-28"),
    ])
}

#[test]
fn explicit_request_wins_even_outside_catalog() {
    let today = date(2025, 3, 15);
    for requested in [1999, 2021, 2023, 2030] {
        assert_eq!(
            resolve_optimal_period(&sample_catalog(), Some(requested), today),
            requested
        );
        assert_eq!(
            resolve_optimal_period(&catalog(Vec::new()), Some(requested), today),
            requested
        );
    }
}

#[test]
fn current_flag_beats_end_dates() {
    let cat = catalog(vec![
        ReportingPeriod::new(2024).ending("2025-01-01"),
        ReportingPeriod::new(2019).current(),
        ReportingPeriod::new(2025),
    ]);
    assert_eq!(resolve_optimal_period(&cat, None, date(2025, 8, 1)), 2019);
}

#[test]
fn several_current_flags_pick_greatest_year() {
    let cat = catalog(vec![
        ReportingPeriod::new(2022).current(),
        ReportingPeriod::new(2024).current(),
        ReportingPeriod::new(2023).current(),
    ]);
    assert_eq!(resolve_optimal_period(&cat, None, date(2025, 8, 1)), 2024);
}

#[test]
fn most_recently_ended_period_is_used_without_current_flag() {
    let cat = catalog(vec![
        ReportingPeriod::new(2021).ending("2022-06-01"),
        ReportingPeriod::new(2022).ending("2023-06-01"),
    ]);
    assert_eq!(resolve_optimal_period(&cat, None, date(2023, 8, 1)), 2022);
}

#[test]
fn periods_ending_today_or_later_are_not_ended() {
    let cat = catalog(vec![
        ReportingPeriod::new(2021).ending("2022-06-01"),
        ReportingPeriod::new(2022).ending("2023-08-01"),
        ReportingPeriod::new(2023).ending("2024-06-01"),
    ]);
    assert_eq!(resolve_optimal_period(&cat, None, date(2023, 8, 1)), 2021);
}

#[test]
fn malformed_end_dates_are_ignored() {
    let cat = catalog(vec![
        ReportingPeriod::new(2020).ending("2021-05-30"),
        ReportingPeriod::new(2022).ending("not a date"),
        ReportingPeriod::new(2021).ending(""),
    ]);
    assert_eq!(resolve_optimal_period(&cat, None, date(2023, 8, 1)), 2020);
}

#[test]
fn greatest_year_when_nothing_has_ended() {
    let cat = catalog(vec![
        ReportingPeriod::new(2024),
        ReportingPeriod::new(2026).ending("garbage"),
        ReportingPeriod::new(2025).ending("2026-06-01"),
    ]);
    assert_eq!(resolve_optimal_period(&cat, None, date(2025, 9, 1)), 2026);
}

#[test]
fn empty_catalog_follows_july_cutover() {
    let empty = catalog(Vec::new());
    assert_eq!(resolve_optimal_period(&empty, None, date(2025, 3, 15)), 2024);
    assert_eq!(resolve_optimal_period(&empty, None, date(2025, 8, 15)), 2025);
    assert_eq!(default_period(date(2025, 6, 30)), 2024);
    assert_eq!(default_period(date(2025, 7, 1)), 2025);
}

#[test]
fn empty_catalog_lists_next_current_and_nine_past_seasons() {
    let years = list_available_periods(&catalog(Vec::new()), date(2025, 3, 15));
    assert_eq!(years.len(), 11);
    assert_eq!(years.first(), Some(&2025));
    assert_eq!(years.last(), Some(&2015));
    assert!(years.windows(2).all(|w| w[0] == w[1] + 1));
}

#[test]
fn available_periods_add_next_season_sorted_and_unique() {
    let cat = catalog(vec![
        ReportingPeriod::new(2021),
        ReportingPeriod::new(2024),
        ReportingPeriod::new(2021),
        ReportingPeriod::new(2023),
    ]);
    let years = list_available_periods(&cat, date(2025, 3, 15));
    assert_eq!(years, vec![2025, 2024, 2023, 2021]);
}

#[test]
fn available_periods_always_include_next_season() {
    let cat = catalog(vec![ReportingPeriod::new(2010), ReportingPeriod::new(2030)]);
    for today in [date(2024, 1, 1), date(2024, 7, 1), date(2031, 12, 31)] {
        let next = default_period(today) + 1;
        let years = list_available_periods(&cat, today);
        assert!(years.contains(&next), "{today}: {years:?}");
        assert!(years.windows(2).all(|w| w[0] > w[1]));
    }
}

#[test]
fn selection_support_comes_from_table() {
    let table = CompetitionTable::new([2, 1], [1]);
    assert!(!table.is_period_selection_supported(1));
    assert!(table.is_period_selection_supported(2));
    assert!(table.is_period_selection_supported(39));
}
