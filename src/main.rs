use std::io;
use std::path::Path;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use league_desk::api_football::ApiFootballSource;
use league_desk::config::AppConfig;
use league_desk::demo_source::DemoSource;
use league_desk::feed::spawn_provider;
use league_desk::models::{Bracket, Fixture, PlayerLeader, StandingsTable, TeamStatLine};
use league_desk::period::season_label;
use league_desk::source::LeagueSource;
use league_desk::state::{
    Delta, LeagueDetailState, ProviderCommand, SliceView, Tab, apply_delta,
};

struct App {
    state: LeagueDetailState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    help_overlay: bool,
    scroll: u16,
}

impl App {
    fn new(state: LeagueDetailState, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state,
            should_quit: false,
            cmd_tx,
            help_overlay: false,
            scroll: 0,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => {
                self.state.select_next_tab();
                self.on_tab_focus();
            }
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
                self.state.select_prev_tab();
                self.on_tab_focus();
            }
            KeyCode::Char(c @ '1'..='6') => {
                self.state.select_tab(c as usize - '1' as usize);
                self.on_tab_focus();
            }
            KeyCode::Char('[') => self.step_season(true),
            KeyCode::Char(']') => self.step_season(false),
            KeyCode::Char('r') => {
                let slice = self.state.current_tab().slice();
                if !self.state.retry_slice(slice) {
                    self.state
                        .push_log(format!("[INFO] {} cannot be retried right now", slice.label()));
                }
            }
            KeyCode::Char('R') | KeyCode::F(5) => {
                self.state.refresh(today());
                self.scroll = 0;
            }
            KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Char('?') => self.help_overlay = !self.help_overlay,
            _ => {}
        }
        self.flush_commands();
    }

    fn on_tab_focus(&mut self) {
        self.scroll = 0;
        if self.state.current_tab() == Tab::Bracket {
            self.state.ensure_supplemental_loaded();
        }
    }

    fn step_season(&mut self, older: bool) {
        if !self.state.is_period_selection_supported() {
            self.state
                .push_log("[INFO] This competition has no season selector");
            return;
        }
        self.state.step_period(older);
        self.scroll = 0;
    }

    fn flush_commands(&mut self) {
        let commands = self.state.take_commands();
        if commands.is_empty() {
            return;
        }
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[WARN] Data provider unavailable");
            return;
        };
        for cmd in commands {
            if tx.send(cmd).is_err() {
                self.state.push_log("[WARN] Data provider stopped");
                self.cmd_tx = None;
                return;
            }
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = AppConfig::from_env();
    let _log_guard = config.log_dir.as_deref().and_then(init_logging);

    let today = today();
    let source: Arc<dyn LeagueSource> = if config.use_demo_source() {
        Arc::new(DemoSource::from_config(&config, today))
    } else {
        Arc::new(ApiFootballSource::new(&config).context("api source")?)
    };

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(source, tx, cmd_rx, config.fetch_parallelism);

    let mut state = LeagueDetailState::new(config.league_id, &config.competitions, today);
    if config.use_demo_source() {
        state.push_log("[INFO] API_FOOTBALL_KEY not set, using demo data");
    }
    state.activate(config.requested_season, today);
    let mut app = App::new(state, Some(cmd_tx));
    app.flush_commands();

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

// The terminal owns stdout, so diagnostics only go to a file.
fn init_logging(log_dir: &Path) -> Option<WorkerGuard> {
    if let Err(err) = std::fs::create_dir_all(log_dir) {
        eprintln!(
            "Warning: could not create log directory {} ({err}), file logging disabled",
            log_dir.display()
        );
        return None;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,league_desk=debug"));
    let appender = tracing_appender::rolling::daily(log_dir, "league_desk.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init();
    Some(guard)
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        // Catalog results queue the slice loads.
        app.flush_commands();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(header, chunks[0]);

    let titles: Vec<String> = app
        .state
        .tabs()
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{} {}", i + 1, t.label()))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.state.selected_tab())
        .block(Block::default().borders(Borders::BOTTOM))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, chunks[1]);

    render_body(frame, chunks[2], app);

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &LeagueDetailState) -> String {
    let name = state
        .league_name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("League {}", state.entity_id()));
    let season = if state.is_catalog_pending() {
        format!("{} (resolving)", state.season_label())
    } else {
        state.season_label()
    };
    let seasons = if state.is_period_selection_supported() {
        let list: Vec<String> = state
            .available_periods()
            .iter()
            .take(6)
            .map(|y| {
                let label = season_label(*y, true);
                if *y == state.selected_period() {
                    format!("[{label}]")
                } else {
                    label
                }
            })
            .collect();
        if list.is_empty() {
            String::new()
        } else {
            format!("  Seasons: {}", list.join(" "))
        }
    } else {
        String::new()
    };
    format!("{name} | {season}{seasons}")
}

fn footer_text(state: &LeagueDetailState) -> String {
    let keys = if state.is_period_selection_supported() {
        "Tab/h/l Tabs | [ ] Season | r Retry | R Refresh | j/k Scroll | ? Help | q Quit"
    } else {
        "Tab/h/l Tabs | r Retry | R Refresh | j/k Scroll | ? Help | q Quit"
    };
    let last = state.logs.back().map(String::as_str).unwrap_or("");
    format!("{keys}\n{last}")
}

fn render_body(frame: &mut Frame, area: Rect, app: &App) {
    let state = &app.state;
    let lines = match state.current_tab() {
        Tab::Standings => slice_lines(state.standings().view(), state, standings_lines),
        Tab::Bracket => slice_lines(state.bracket().view(), state, bracket_lines),
        Tab::Fixtures => slice_lines(state.fixtures().view(), state, |f: &Vec<Fixture>| {
            fixture_lines(f)
        }),
        Tab::TopScorers => {
            slice_lines(state.top_scorers().view(), state, |p: &Vec<PlayerLeader>| {
                leader_lines(p, true)
            })
        }
        Tab::TopAssists => {
            slice_lines(state.top_assists().view(), state, |p: &Vec<PlayerLeader>| {
                leader_lines(p, false)
            })
        }
        Tab::TeamStatistics => {
            slice_lines(state.team_statistics().view(), state, |t: &Vec<TeamStatLine>| {
                team_stat_lines(t)
            })
        }
    };

    let body = Paragraph::new(lines).scroll((app.scroll, 0));
    frame.render_widget(body, area);
}

fn slice_lines<'a, T>(
    view: SliceView<'a, T>,
    state: &LeagueDetailState,
    render: impl Fn(&'a T) -> Vec<Line<'static>>,
) -> Vec<Line<'static>> {
    let dim = Style::default().fg(Color::DarkGray);
    match view {
        SliceView::Idle if state.is_catalog_pending() => {
            vec![Line::styled("Resolving season...", dim)]
        }
        SliceView::Idle => vec![Line::styled("Nothing loaded", dim)],
        SliceView::Loading => vec![Line::styled("Loading...", dim)],
        SliceView::Failed(msg) => vec![
            Line::styled(msg.to_string(), Style::default().fg(Color::Red)),
            Line::styled("Press r to retry", dim),
        ],
        SliceView::Refreshing(payload) => {
            let mut lines = vec![Line::styled("Refreshing...", dim)];
            lines.extend(render(payload));
            lines
        }
        SliceView::Ready(payload) => {
            let lines = render(payload);
            if lines.is_empty() {
                vec![Line::styled("No data for this season", dim)]
            } else {
                lines
            }
        }
    }
}

fn standings_lines(table: &StandingsTable) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    for (group, rows) in table.groups() {
        if let Some(group) = group {
            out.push(Line::styled(
                group.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        }
        out.push(Line::styled(
            format!(
                "{:>3} {:<22} {:>3} {:>3} {:>3} {:>3} {:>7} {:>4} {:>4}  Form",
                "#", "Team", "P", "W", "D", "L", "GF:GA", "GD", "Pts"
            ),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        for r in rows {
            out.push(Line::raw(format!(
                "{:>3} {:<22} {:>3} {:>3} {:>3} {:>3} {:>7} {:>+4} {:>4}  {}",
                r.rank,
                truncate(&r.team, 22),
                r.played,
                r.won,
                r.drawn,
                r.lost,
                format!("{}:{}", r.goals_for, r.goals_against),
                r.goal_diff,
                r.points,
                r.form.as_deref().unwrap_or("")
            )));
        }
        out.push(Line::raw(""));
    }
    out
}

fn fixture_lines(fixtures: &[Fixture]) -> Vec<Line<'static>> {
    let mut out = Vec::with_capacity(fixtures.len() + 8);
    let mut last_round: Option<&str> = None;
    for f in fixtures {
        if last_round != Some(f.round.as_str()) {
            out.push(Line::styled(
                f.round.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            last_round = Some(f.round.as_str());
        }
        let score = match f.score() {
            Some((h, a)) => format!("{h}-{a}"),
            None => "vs".to_string(),
        };
        let date = f.kickoff.get(..10).unwrap_or(&f.kickoff);
        out.push(Line::raw(format!(
            "  {date}  {:>4}  {:>22} {:^5} {:<22}",
            f.status,
            truncate(&f.home, 22),
            score,
            truncate(&f.away, 22)
        )));
    }
    out
}

fn leader_lines(players: &[PlayerLeader], by_goals: bool) -> Vec<Line<'static>> {
    let mut out = vec![Line::styled(
        format!(
            "{:>3} {:<24} {:<20} {:>4} {:>4} {:>4}",
            "#", "Player", "Team", "Apps", "G", "A"
        ),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (i, p) in players.iter().enumerate() {
        let style = if by_goals {
            Style::default()
        } else {
            Style::default().fg(Color::Cyan)
        };
        out.push(Line::styled(
            format!(
                "{:>3} {:<24} {:<20} {:>4} {:>4} {:>4}",
                i + 1,
                truncate(&p.name, 24),
                truncate(&p.team, 20),
                p.appearances,
                p.goals,
                p.assists
            ),
            style,
        ));
    }
    out
}

fn bracket_lines(bracket: &Bracket) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    for round in &bracket.rounds {
        out.push(Line::styled(
            round.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        for tie in &round.ties {
            let marker = |id: u32| if tie.winner_id == Some(id) { "*" } else { " " };
            out.push(Line::raw(format!(
                "  {}{:>22} {:>2}-{:<2} {:<22}{}  ({} leg{})",
                marker(tie.home_id),
                truncate(&tie.home, 22),
                tie.aggregate_home,
                tie.aggregate_away,
                truncate(&tie.away, 22),
                marker(tie.away_id),
                tie.legs.len(),
                if tie.legs.len() == 1 { "" } else { "s" }
            )));
        }
        out.push(Line::raw(""));
    }
    out
}

fn team_stat_lines(lines: &[TeamStatLine]) -> Vec<Line<'static>> {
    let mut out = vec![Line::styled(
        format!(
            "{:<22} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>4} {:>4} {:>5}",
            "Team", "P", "W", "D", "L", "GF", "GA", "CS", "FTS", "G/G"
        ),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for t in lines {
        out.push(Line::raw(format!(
            "{:<22} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>4} {:>4} {:>5.2}",
            truncate(&t.team, 22),
            t.played,
            t.wins,
            t.draws,
            t.losses,
            t.goals_for,
            t.goals_against,
            t.clean_sheets,
            t.failed_to_score,
            t.goals_per_game()
        )));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let width = area.width.min(56);
    let height = area.height.min(12);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };
    let text = "Tab / l / ->   next tab\n\
                BackTab / h / <-   previous tab\n\
                1-6   jump to tab\n\
                [ / ]   older / newer season\n\
                r   retry this tab\n\
                R / F5   refresh everything\n\
                j / k   scroll\n\
                q   quit";
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Help")),
        popup,
    );
}
