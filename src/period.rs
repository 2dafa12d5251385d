use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// How many past seasons to offer when the source publishes no catalog.
const SYNTHETIC_PAST_SEASONS: i32 = 9;

/// First month of a season (July).
const SEASON_START_MONTH: u32 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingPeriod {
    /// Starting year: 2024 is the 2024/25 season.
    pub year: i32,
    #[serde(default)]
    pub is_current: bool,
    // Raw value from the source; see `ended_on`.
    #[serde(default)]
    pub end_date: Option<String>,
}

impl ReportingPeriod {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            is_current: false,
            end_date: None,
        }
    }

    pub fn current(mut self) -> Self {
        self.is_current = true;
        self
    }

    pub fn ending(mut self, end_date: impl Into<String>) -> Self {
        self.end_date = Some(end_date.into());
        self
    }

    /// Parsed end date. Malformed values read as absent.
    pub fn ended_on(&self) -> Option<NaiveDate> {
        parse_end_date(self.end_date.as_deref()?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntityPeriodCatalog {
    pub entity_id: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub periods: Vec<ReportingPeriod>,
}

impl EntityPeriodCatalog {
    pub fn new(entity_id: u32, periods: Vec<ReportingPeriod>) -> Self {
        Self {
            entity_id,
            name: None,
            periods,
        }
    }
}

/// Season year implied by the calendar alone (July–June seasons).
pub fn default_period(today: NaiveDate) -> i32 {
    if today.month() >= SEASON_START_MONTH {
        today.year()
    } else {
        today.year() - 1
    }
}

/// Pick the season to display. Always yields a year.
pub fn resolve_optimal_period(
    catalog: &EntityPeriodCatalog,
    requested: Option<i32>,
    today: NaiveDate,
) -> i32 {
    if let Some(year) = requested {
        return year;
    }

    // Several current flags is a malformed catalog; the greatest year wins.
    if let Some(year) = catalog
        .periods
        .iter()
        .filter(|p| p.is_current)
        .map(|p| p.year)
        .max()
    {
        return year;
    }

    if let Some((_, year)) = catalog
        .periods
        .iter()
        .filter_map(|p| p.ended_on().map(|end| (end, p.year)))
        .filter(|(end, _)| *end < today)
        .max()
    {
        return year;
    }

    catalog
        .periods
        .iter()
        .map(|p| p.year)
        .max()
        .unwrap_or_else(|| default_period(today))
}

/// Selectable seasons, newest first, without duplicates.
pub fn list_available_periods(catalog: &EntityPeriodCatalog, today: NaiveDate) -> Vec<i32> {
    let default = default_period(today);
    if catalog.periods.is_empty() {
        return ((default - SYNTHETIC_PAST_SEASONS)..=(default + 1))
            .rev()
            .collect();
    }

    let mut years: Vec<i32> = catalog.periods.iter().map(|p| p.year).collect();
    // The upcoming season is selectable before the source publishes it.
    years.push(default + 1);
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

/// `2024/25` for league seasons, `2024` for single-year competitions.
pub fn season_label(year: i32, spans_two_years: bool) -> String {
    if spans_two_years {
        format!("{}/{:02}", year, (i64::from(year) + 1).rem_euclid(100))
    } else {
        year.to_string()
    }
}

fn parse_end_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}
