use crate::error::FetchError;
use crate::models::{Bracket, Fixture, PlayerLeader, StandingsTable, TeamStatLine};
use crate::period::EntityPeriodCatalog;
use crate::state::{SliceKind, SlicePayload};

/// Data behind a league detail screen. Calls block; the provider runs them
/// off the UI thread.
pub trait LeagueSource: Send + Sync {
    fn fetch_period_catalog(&self, entity_id: u32) -> Result<EntityPeriodCatalog, FetchError>;

    fn fetch_standings(&self, entity_id: u32, year: i32) -> Result<StandingsTable, FetchError>;

    fn fetch_fixtures(&self, entity_id: u32, year: i32) -> Result<Vec<Fixture>, FetchError>;

    fn fetch_top_scorers(&self, entity_id: u32, year: i32)
    -> Result<Vec<PlayerLeader>, FetchError>;

    fn fetch_top_assists(&self, entity_id: u32, year: i32)
    -> Result<Vec<PlayerLeader>, FetchError>;

    fn fetch_bracket(&self, entity_id: u32, year: i32) -> Result<Bracket, FetchError>;

    fn fetch_team_statistics(
        &self,
        entity_id: u32,
        year: i32,
    ) -> Result<Vec<TeamStatLine>, FetchError>;
}

pub fn fetch_slice(
    source: &dyn LeagueSource,
    slice: SliceKind,
    entity_id: u32,
    year: i32,
) -> Result<SlicePayload, FetchError> {
    Ok(match slice {
        SliceKind::Standings => SlicePayload::Standings(source.fetch_standings(entity_id, year)?),
        SliceKind::Fixtures => SlicePayload::Fixtures(source.fetch_fixtures(entity_id, year)?),
        SliceKind::TopScorers => {
            SlicePayload::TopScorers(source.fetch_top_scorers(entity_id, year)?)
        }
        SliceKind::TopAssists => {
            SlicePayload::TopAssists(source.fetch_top_assists(entity_id, year)?)
        }
        SliceKind::Bracket => SlicePayload::Bracket(source.fetch_bracket(entity_id, year)?),
        SliceKind::TeamStatistics => {
            SlicePayload::TeamStatistics(source.fetch_team_statistics(entity_id, year)?)
        }
    })
}
