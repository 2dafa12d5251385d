use std::collections::VecDeque;

use chrono::NaiveDate;
use tracing::debug;

use crate::competition::CompetitionTable;
use crate::models::{Bracket, Fixture, PlayerLeader, StandingsTable, TeamStatLine};
use crate::period::{
    EntityPeriodCatalog, default_period, list_available_periods, resolve_optimal_period,
    season_label,
};

const LOG_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliceKind {
    Standings,
    Fixtures,
    TopScorers,
    TopAssists,
    Bracket,
    TeamStatistics,
}

impl SliceKind {
    pub const ALL: [SliceKind; 6] = [
        SliceKind::Standings,
        SliceKind::Fixtures,
        SliceKind::TopScorers,
        SliceKind::TopAssists,
        SliceKind::Bracket,
        SliceKind::TeamStatistics,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SliceKind::Standings => "Standings",
            SliceKind::Fixtures => "Fixtures",
            SliceKind::TopScorers => "Top scorers",
            SliceKind::TopAssists => "Top assists",
            SliceKind::Bracket => "Bracket",
            SliceKind::TeamStatistics => "Team stats",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "standings" | "table" => Some(SliceKind::Standings),
            "fixtures" | "matches" => Some(SliceKind::Fixtures),
            "top_scorers" | "scorers" => Some(SliceKind::TopScorers),
            "top_assists" | "assists" => Some(SliceKind::TopAssists),
            "bracket" => Some(SliceKind::Bracket),
            "team_statistics" | "team_stats" => Some(SliceKind::TeamStatistics),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlicePhase {
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// What a slice should render as. An error hides any stale payload; a
/// reload keeps the previous payload on screen as `Refreshing`.
#[derive(Debug, PartialEq)]
pub enum SliceView<'a, T> {
    Idle,
    Loading,
    Refreshing(&'a T),
    Failed(&'a str),
    Ready(&'a T),
}

#[derive(Debug, Clone)]
pub struct DataSlice<T> {
    payload: Option<T>,
    is_loading: bool,
    error_message: Option<String>,
    // Token of the latest load issued for this slice; 0 = none.
    request: u64,
}

impl<T> Default for DataSlice<T> {
    fn default() -> Self {
        Self {
            payload: None,
            is_loading: false,
            error_message: None,
            request: 0,
        }
    }
}

impl<T> DataSlice<T> {
    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn phase(&self) -> SlicePhase {
        if self.is_loading {
            SlicePhase::Loading
        } else if self.error_message.is_some() {
            SlicePhase::Failed
        } else if self.payload.is_some() {
            SlicePhase::Loaded
        } else {
            SlicePhase::Idle
        }
    }

    pub fn view(&self) -> SliceView<'_, T> {
        if let Some(err) = self.error_message.as_deref() {
            return SliceView::Failed(err);
        }
        match (self.payload.as_ref(), self.is_loading) {
            (Some(payload), true) => SliceView::Refreshing(payload),
            (None, true) => SliceView::Loading,
            (Some(payload), false) => SliceView::Ready(payload),
            (None, false) => SliceView::Idle,
        }
    }

    fn begin(&mut self, request: u64, clear_payload: bool) {
        if clear_payload {
            self.payload = None;
        }
        self.is_loading = true;
        self.error_message = None;
        self.request = request;
    }

    fn reset(&mut self) {
        self.payload = None;
        self.is_loading = false;
        self.error_message = None;
        self.request = 0;
    }

    fn accepts(&self, request: u64) -> bool {
        self.is_loading && self.request == request
    }

    fn finish(&mut self, result: Result<T, String>) {
        match result {
            Ok(payload) => {
                self.payload = Some(payload);
                self.error_message = None;
            }
            Err(message) => self.error_message = Some(message),
        }
        self.is_loading = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Standings,
    Bracket,
    Fixtures,
    TopScorers,
    TopAssists,
    TeamStatistics,
}

impl Tab {
    pub fn label(self) -> &'static str {
        self.slice().label()
    }

    pub fn slice(self) -> SliceKind {
        match self {
            Tab::Standings => SliceKind::Standings,
            Tab::Bracket => SliceKind::Bracket,
            Tab::Fixtures => SliceKind::Fixtures,
            Tab::TopScorers => SliceKind::TopScorers,
            Tab::TopAssists => SliceKind::TopAssists,
            Tab::TeamStatistics => SliceKind::TeamStatistics,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SlicePayload {
    Standings(StandingsTable),
    Fixtures(Vec<Fixture>),
    TopScorers(Vec<PlayerLeader>),
    TopAssists(Vec<PlayerLeader>),
    Bracket(Bracket),
    TeamStatistics(Vec<TeamStatLine>),
}

impl SlicePayload {
    pub fn kind(&self) -> SliceKind {
        match self {
            SlicePayload::Standings(_) => SliceKind::Standings,
            SlicePayload::Fixtures(_) => SliceKind::Fixtures,
            SlicePayload::TopScorers(_) => SliceKind::TopScorers,
            SlicePayload::TopAssists(_) => SliceKind::TopAssists,
            SlicePayload::Bracket(_) => SliceKind::Bracket,
            SlicePayload::TeamStatistics(_) => SliceKind::TeamStatistics,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetCatalog {
        entity_id: u32,
        activation: u64,
        catalog: EntityPeriodCatalog,
    },
    CatalogFailed {
        entity_id: u32,
        activation: u64,
        message: String,
    },
    SetSlice {
        entity_id: u32,
        year: i32,
        request: u64,
        payload: SlicePayload,
    },
    SliceFailed {
        entity_id: u32,
        year: i32,
        request: u64,
        slice: SliceKind,
        message: String,
    },
    Log(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCommand {
    FetchCatalog {
        entity_id: u32,
        activation: u64,
    },
    FetchSlice {
        entity_id: u32,
        year: i32,
        slice: SliceKind,
        request: u64,
    },
}

/// State of one league detail screen.
///
/// Operations never perform I/O. They queue [`ProviderCommand`]s which the
/// owner drains with [`LeagueDetailState::take_commands`]; results come back as
/// [`Delta`]s through [`apply_delta`].
#[derive(Debug, Clone)]
pub struct LeagueDetailState {
    entity_id: u32,
    league_name: Option<String>,
    selected_period: i32,
    selected_tab: usize,
    available_periods: Vec<i32>,
    bracket_style: bool,
    period_selectable: bool,
    requested_period: Option<i32>,
    today: NaiveDate,
    catalog_pending: bool,
    activation: u64,
    next_request: u64,
    // Period of the most recent full reload, and whether one happened since activation.
    slices_period: Option<i32>,
    loaded_since_activation: bool,
    standings: DataSlice<StandingsTable>,
    fixtures: DataSlice<Vec<Fixture>>,
    top_scorers: DataSlice<Vec<PlayerLeader>>,
    top_assists: DataSlice<Vec<PlayerLeader>>,
    bracket: DataSlice<Bracket>,
    team_statistics: DataSlice<Vec<TeamStatLine>>,
    outbox: Vec<ProviderCommand>,
    pub logs: VecDeque<String>,
}

impl LeagueDetailState {
    pub fn new(entity_id: u32, table: &CompetitionTable, today: NaiveDate) -> Self {
        Self {
            entity_id,
            league_name: None,
            selected_period: default_period(today),
            selected_tab: 0,
            available_periods: Vec::new(),
            bracket_style: table.is_bracket_style(entity_id),
            period_selectable: table.is_period_selection_supported(entity_id),
            requested_period: None,
            today,
            catalog_pending: false,
            activation: 0,
            next_request: 0,
            slices_period: None,
            loaded_since_activation: false,
            standings: DataSlice::default(),
            fixtures: DataSlice::default(),
            top_scorers: DataSlice::default(),
            top_assists: DataSlice::default(),
            bracket: DataSlice::default(),
            team_statistics: DataSlice::default(),
            outbox: Vec::new(),
            logs: VecDeque::with_capacity(LOG_CAPACITY),
        }
    }

    pub fn entity_id(&self) -> u32 {
        self.entity_id
    }

    pub fn league_name(&self) -> Option<&str> {
        self.league_name.as_deref()
    }

    pub fn selected_period(&self) -> i32 {
        self.selected_period
    }

    pub fn selected_tab(&self) -> usize {
        self.selected_tab
    }

    pub fn available_periods(&self) -> &[i32] {
        &self.available_periods
    }

    pub fn is_bracket_style(&self) -> bool {
        self.bracket_style
    }

    pub fn is_period_selection_supported(&self) -> bool {
        self.period_selectable
    }

    pub fn is_catalog_pending(&self) -> bool {
        self.catalog_pending
    }

    pub fn standings(&self) -> &DataSlice<StandingsTable> {
        &self.standings
    }

    pub fn fixtures(&self) -> &DataSlice<Vec<Fixture>> {
        &self.fixtures
    }

    pub fn top_scorers(&self) -> &DataSlice<Vec<PlayerLeader>> {
        &self.top_scorers
    }

    pub fn top_assists(&self) -> &DataSlice<Vec<PlayerLeader>> {
        &self.top_assists
    }

    pub fn bracket(&self) -> &DataSlice<Bracket> {
        &self.bracket
    }

    pub fn team_statistics(&self) -> &DataSlice<Vec<TeamStatLine>> {
        &self.team_statistics
    }

    pub fn slice_phase(&self, kind: SliceKind) -> SlicePhase {
        match kind {
            SliceKind::Standings => self.standings.phase(),
            SliceKind::Fixtures => self.fixtures.phase(),
            SliceKind::TopScorers => self.top_scorers.phase(),
            SliceKind::TopAssists => self.top_assists.phase(),
            SliceKind::Bracket => self.bracket.phase(),
            SliceKind::TeamStatistics => self.team_statistics.phase(),
        }
    }

    pub fn season_label(&self) -> String {
        season_label(self.selected_period, self.period_selectable)
    }

    /// Open the screen: show the calendar default right away and ask for the
    /// season catalog. Slices load once the catalog settles the season.
    pub fn activate(&mut self, requested: Option<i32>, today: NaiveDate) {
        self.today = today;
        self.requested_period = requested;
        self.selected_period = default_period(today);
        self.catalog_pending = true;
        self.loaded_since_activation = false;
        self.activation += 1;
        self.outbox.push(ProviderCommand::FetchCatalog {
            entity_id: self.entity_id,
            activation: self.activation,
        });
    }

    /// Re-run activation, keeping the season on screen.
    pub fn refresh(&mut self, today: NaiveDate) {
        self.push_log(format!("[INFO] Refreshing {}", self.season_label()));
        let current = self.selected_period;
        self.activate(Some(current), today);
    }

    pub fn change_period(&mut self, year: i32) {
        if year == self.selected_period {
            return;
        }
        self.selected_period = year;
        // Survives a catalog that is still in flight.
        self.requested_period = Some(year);
        self.push_log(format!("[INFO] Season {} selected", self.season_label()));
        self.reload_all(true);
    }

    /// Step to the neighbouring season in `available_periods` (older when
    /// `older` is set). Falls back to plain year arithmetic without a list.
    pub fn step_period(&mut self, older: bool) {
        let target = if self.available_periods.is_empty() {
            if older {
                self.selected_period.saturating_sub(1)
            } else {
                self.selected_period.saturating_add(1)
            }
        } else {
            // Descending order: older seasons sit at higher indices.
            let found = if older {
                self.available_periods
                    .iter()
                    .copied()
                    .find(|y| *y < self.selected_period)
            } else {
                self.available_periods
                    .iter()
                    .rev()
                    .copied()
                    .find(|y| *y > self.selected_period)
            };
            match found {
                Some(year) => year,
                None => return,
            }
        };
        self.change_period(target);
    }

    pub fn tabs(&self) -> Vec<Tab> {
        let mut tabs = vec![Tab::Standings];
        if self.bracket_style {
            tabs.push(Tab::Bracket);
        }
        tabs.extend([
            Tab::Fixtures,
            Tab::TopScorers,
            Tab::TopAssists,
            Tab::TeamStatistics,
        ]);
        tabs
    }

    pub fn current_tab(&self) -> Tab {
        self.tabs()
            .get(self.selected_tab)
            .copied()
            .unwrap_or(Tab::Standings)
    }

    pub fn select_tab(&mut self, index: usize) {
        let last = self.tabs().len().saturating_sub(1);
        self.selected_tab = index.min(last);
    }

    pub fn select_next_tab(&mut self) {
        let len = self.tabs().len();
        self.selected_tab = (self.selected_tab + 1) % len;
    }

    pub fn select_prev_tab(&mut self) {
        let len = self.tabs().len();
        self.selected_tab = (self.selected_tab + len - 1) % len;
    }

    /// Load the bracket if this competition has one and nothing is loaded or
    /// in flight. Returns whether a fetch was queued.
    pub fn ensure_supplemental_loaded(&mut self) -> bool {
        if !self.bracket_style
            || self.catalog_pending
            || self.bracket.payload.is_some()
            || self.bracket.is_loading
        {
            return false;
        }
        self.begin_load(SliceKind::Bracket, false);
        true
    }

    /// User-initiated reload of one slice. The payload stays visible while
    /// the new load runs.
    pub fn retry_slice(&mut self, kind: SliceKind) -> bool {
        if kind == SliceKind::Bracket && !self.bracket_style {
            return false;
        }
        if self.catalog_pending || self.slice_phase(kind) == SlicePhase::Loading {
            return false;
        }
        self.push_log(format!("[INFO] Retrying {}", kind.label()));
        self.begin_load(kind, false);
        true
    }

    pub fn take_commands(&mut self) -> Vec<ProviderCommand> {
        std::mem::take(&mut self.outbox)
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        if self.logs.len() >= LOG_CAPACITY {
            self.logs.pop_front();
        }
        self.logs.push_back(msg.into());
    }

    fn apply_catalog(&mut self, catalog: EntityPeriodCatalog) {
        self.catalog_pending = false;
        if catalog.name.is_some() {
            self.league_name = catalog.name.clone();
        }
        self.available_periods = list_available_periods(&catalog, self.today);
        self.selected_period =
            resolve_optimal_period(&catalog, self.requested_period, self.today);
        self.reload_after_catalog();
    }

    fn apply_catalog_failure(&mut self, message: &str) {
        self.catalog_pending = false;
        self.push_log(format!("[WARN] Season list unavailable: {message}"));
        self.available_periods.clear();
        self.selected_period = self
            .requested_period
            .unwrap_or_else(|| default_period(self.today));
        self.reload_after_catalog();
    }

    fn reload_after_catalog(&mut self) {
        // A season change made while the catalog was pending already issued
        // these loads.
        if self.loaded_since_activation && self.slices_period == Some(self.selected_period) {
            return;
        }
        let clear = self.slices_period != Some(self.selected_period);
        self.reload_all(clear);
    }

    fn reload_all(&mut self, clear_payload: bool) {
        self.slices_period = Some(self.selected_period);
        self.loaded_since_activation = true;
        for kind in SliceKind::ALL {
            if kind == SliceKind::Bracket && !self.bracket_style {
                self.bracket.reset();
                continue;
            }
            self.begin_load(kind, clear_payload);
        }
    }

    fn begin_load(&mut self, kind: SliceKind, clear_payload: bool) {
        self.next_request += 1;
        let request = self.next_request;
        match kind {
            SliceKind::Standings => self.standings.begin(request, clear_payload),
            SliceKind::Fixtures => self.fixtures.begin(request, clear_payload),
            SliceKind::TopScorers => self.top_scorers.begin(request, clear_payload),
            SliceKind::TopAssists => self.top_assists.begin(request, clear_payload),
            SliceKind::Bracket => self.bracket.begin(request, clear_payload),
            SliceKind::TeamStatistics => self.team_statistics.begin(request, clear_payload),
        }
        self.outbox.push(ProviderCommand::FetchSlice {
            entity_id: self.entity_id,
            year: self.selected_period,
            slice: kind,
            request,
        });
    }

    fn slice_accepts(&self, kind: SliceKind, request: u64) -> bool {
        match kind {
            SliceKind::Standings => self.standings.accepts(request),
            SliceKind::Fixtures => self.fixtures.accepts(request),
            SliceKind::TopScorers => self.top_scorers.accepts(request),
            SliceKind::TopAssists => self.top_assists.accepts(request),
            SliceKind::Bracket => self.bracket.accepts(request),
            SliceKind::TeamStatistics => self.team_statistics.accepts(request),
        }
    }

    fn is_current_load(&self, entity_id: u32, year: i32, kind: SliceKind, request: u64) -> bool {
        entity_id == self.entity_id
            && year == self.selected_period
            && self.slice_accepts(kind, request)
    }

    fn fail_slice(&mut self, kind: SliceKind, message: String) {
        match kind {
            SliceKind::Standings => self.standings.finish(Err(message)),
            SliceKind::Fixtures => self.fixtures.finish(Err(message)),
            SliceKind::TopScorers => self.top_scorers.finish(Err(message)),
            SliceKind::TopAssists => self.top_assists.finish(Err(message)),
            SliceKind::Bracket => self.bracket.finish(Err(message)),
            SliceKind::TeamStatistics => self.team_statistics.finish(Err(message)),
        }
    }

    fn fill_slice(&mut self, payload: SlicePayload) {
        match payload {
            SlicePayload::Standings(table) => self.standings.finish(Ok(table)),
            SlicePayload::Fixtures(rows) => self.fixtures.finish(Ok(rows)),
            SlicePayload::TopScorers(rows) => self.top_scorers.finish(Ok(rows)),
            SlicePayload::TopAssists(rows) => self.top_assists.finish(Ok(rows)),
            SlicePayload::Bracket(bracket) => self.bracket.finish(Ok(bracket)),
            SlicePayload::TeamStatistics(rows) => self.team_statistics.finish(Ok(rows)),
        }
    }
}

pub fn apply_delta(state: &mut LeagueDetailState, delta: Delta) {
    match delta {
        Delta::SetCatalog {
            entity_id,
            activation,
            catalog,
        } => {
            if entity_id != state.entity_id || activation != state.activation {
                debug!(entity_id, activation, "dropping stale season catalog");
                return;
            }
            state.apply_catalog(catalog);
        }
        Delta::CatalogFailed {
            entity_id,
            activation,
            message,
        } => {
            if entity_id != state.entity_id || activation != state.activation {
                debug!(entity_id, activation, "dropping stale catalog failure");
                return;
            }
            state.apply_catalog_failure(&message);
        }
        Delta::SetSlice {
            entity_id,
            year,
            request,
            payload,
        } => {
            let kind = payload.kind();
            if !state.is_current_load(entity_id, year, kind, request) {
                debug!(entity_id, year, request, slice = kind.label(), "dropping stale result");
                return;
            }
            state.fill_slice(payload);
        }
        Delta::SliceFailed {
            entity_id,
            year,
            request,
            slice,
            message,
        } => {
            if !state.is_current_load(entity_id, year, slice, request) {
                debug!(entity_id, year, request, slice = slice.label(), "dropping stale failure");
                return;
            }
            state.push_log(format!("[WARN] {}: {message}", slice.label()));
            state.fail_slice(slice, message);
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
