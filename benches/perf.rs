use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use chrono::NaiveDate;

use league_desk::api_football::{parse_fixtures_json, parse_standings_json};
use league_desk::bracket::build_bracket;
use league_desk::competition::CompetitionTable;
use league_desk::demo_source::DemoSource;
use league_desk::period::{
    EntityPeriodCatalog, ReportingPeriod, list_available_periods, resolve_optimal_period,
};
use league_desk::source::LeagueSource;
use league_desk::state::{Delta, LeagueDetailState, ProviderCommand, apply_delta};
use league_desk::team_stats::aggregate_team_stats;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
}

fn large_catalog() -> EntityPeriodCatalog {
    let periods = (1950..2025)
        .map(|year| ReportingPeriod::new(year).ending(format!("{}-05-25", year + 1)))
        .collect();
    EntityPeriodCatalog::new(39, periods)
}

fn bench_period_resolution(c: &mut Criterion) {
    let catalog = large_catalog();
    c.bench_function("period_resolution", |b| {
        b.iter(|| {
            let year = resolve_optimal_period(black_box(&catalog), None, today());
            let list = list_available_periods(black_box(&catalog), today());
            black_box((year, list.len()));
        })
    });
}

fn bench_season_toggle(c: &mut Criterion) {
    let table = CompetitionTable::builtin();
    c.bench_function("season_toggle_apply", |b| {
        b.iter(|| {
            let mut state = LeagueDetailState::new(2, &table, today());
            state.activate(None, today());
            state.take_commands();
            apply_delta(
                &mut state,
                Delta::SetCatalog {
                    entity_id: 2,
                    activation: 1,
                    catalog: large_catalog(),
                },
            );
            for year in [2020, 2021, 2024] {
                state.change_period(year);
            }
            let loads = state
                .take_commands()
                .into_iter()
                .filter(|cmd| matches!(cmd, ProviderCommand::FetchSlice { .. }))
                .count();
            black_box(loads);
        })
    });
}

fn bench_fixtures_parse(c: &mut Criterion) {
    c.bench_function("fixtures_parse", |b| {
        b.iter(|| {
            let rows = parse_fixtures_json(black_box(FIXTURES_JSON)).unwrap();
            black_box(rows.len());
        })
    });
}

fn bench_standings_parse(c: &mut Criterion) {
    c.bench_function("standings_parse", |b| {
        b.iter(|| {
            let table = parse_standings_json(black_box(STANDINGS_JSON)).unwrap();
            black_box(table.rows.len());
        })
    });
}

fn bench_derived_views(c: &mut Criterion) {
    let demo = DemoSource::new(today(), (0, 0), Vec::new(), CompetitionTable::builtin());
    let fixtures = demo.fetch_fixtures(2, 2023).unwrap();
    c.bench_function("bracket_and_team_stats", |b| {
        b.iter(|| {
            let bracket = build_bracket(black_box(&fixtures));
            let table = aggregate_team_stats(black_box(&fixtures));
            black_box((bracket.rounds.len(), table.len()));
        })
    });
}

criterion_group!(
    perf,
    bench_period_resolution,
    bench_season_toggle,
    bench_fixtures_parse,
    bench_standings_parse,
    bench_derived_views
);
criterion_main!(perf);

static FIXTURES_JSON: &str = include_str!("../tests/fixtures/fixtures.json");
static STANDINGS_JSON: &str = include_str!("../tests/fixtures/standings.json");
