//! Dates with confidence, calendar arithmetic and lifespan calibration.

use std::sync::OnceLock;

use chrono::{Datelike, Duration, Months, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Mean length of a Gregorian year in days.
pub const DAYS_PER_YEAR: f64 = 365.2425;

const MILLIS_PER_DAY: i128 = 86_400_000;

/// A calendar date together with where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateInfo {
    pub date: NaiveDate,
    /// Derived by inference rather than read from the document
    pub is_estimate: bool,
    /// Supplied by the user; never replaced by inference
    pub is_overridden: bool,
}

impl DateInfo {
    /// Date read from a document event.
    pub fn known(date: NaiveDate) -> Self {
        Self {
            date,
            is_estimate: false,
            is_overridden: false,
        }
    }

    /// Date derived by inference.
    pub fn estimate(date: NaiveDate) -> Self {
        Self {
            date,
            is_estimate: true,
            is_overridden: false,
        }
    }

    /// Date supplied as a user correction.
    pub fn overridden(date: NaiveDate) -> Self {
        Self {
            date,
            is_estimate: false,
            is_overridden: true,
        }
    }

    /// True when inference may replace this value.
    pub fn is_replaceable(&self) -> bool {
        self.is_estimate && !self.is_overridden
    }
}

/// Absent, or present but an estimate that was not overridden.
pub fn is_estimable(info: &Option<DateInfo>) -> bool {
    info.map_or(true, |d| d.is_replaceable())
}

/// The date of a value that inference must not touch.
pub fn known_date(info: &Option<DateInfo>) -> Option<NaiveDate> {
    info.filter(|d| !d.is_replaceable()).map(|d| d.date)
}

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(\d{1,4})(?:-(\d{1,2})(?:-(\d{1,2}))?)?\s*$").expect("valid date regex")
    })
}

/// Parse document date text: `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
///
/// Missing or zero month/day parts default to the first. Returns `None` for
/// anything else, including impossible calendar dates.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let caps = date_regex().captures(text)?;
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let part = |i: usize| -> u32 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(1)
    };
    NaiveDate::from_ymd_opt(year, part(2), part(3))
}

/// Shift a date by a (possibly fractional, possibly negative) number of years.
///
/// Whole years move by calendar months, the remainder by days.
pub fn add_years(date: NaiveDate, years: f64) -> NaiveDate {
    let whole = years.trunc();
    let months = Months::new((whole.abs() as u32).saturating_mul(12));
    let shifted = if whole >= 0.0 {
        date.checked_add_months(months)
    } else {
        date.checked_sub_months(months)
    }
    .unwrap_or(date);

    let days = ((years - whole) * DAYS_PER_YEAR).round() as i64;
    shifted
        .checked_add_signed(Duration::days(days))
        .unwrap_or(shifted)
}

/// Elapsed years from `from` to `to`.
pub fn years_between(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64 / DAYS_PER_YEAR
}

/// Calendar-time mean: pivot on the earliest date and average the offsets.
pub fn mean_date(dates: &[NaiveDate]) -> Option<NaiveDate> {
    let pivot = *dates.iter().min()?;
    let total: i128 = dates
        .iter()
        .map(|d| (*d - pivot).num_days() as i128 * MILLIS_PER_DAY)
        .sum();
    let avg = total / dates.len() as i128;
    pivot.checked_add_signed(Duration::milliseconds(avg as i64))
}

/// One anchor of the historical lifespan table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub year: f64,
    pub lifespan: f64,
}

pub const DEFAULT_CALIBRATION: [CalibrationPoint; 2] = [
    CalibrationPoint {
        year: 1775.0,
        lifespan: 38.0,
    },
    CalibrationPoint {
        year: 2019.0,
        lifespan: 82.0,
    },
];

pub const DEFAULT_MIN_LIFESPAN: f64 = 35.0;

/// The single known endpoint a lifespan is estimated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifespanAnchor {
    Birth(NaiveDate),
    Death(NaiveDate),
}

/// Piecewise-linear lifespan model over a calibration table.
#[derive(Debug, Clone, PartialEq)]
pub struct LifespanModel {
    points: Vec<CalibrationPoint>,
    min_lifespan: f64,
}

impl Default for LifespanModel {
    fn default() -> Self {
        Self::new(DEFAULT_CALIBRATION.to_vec(), DEFAULT_MIN_LIFESPAN)
    }
}

impl LifespanModel {
    /// Tables with fewer than two anchors fall back to the default table.
    pub fn new(mut points: Vec<CalibrationPoint>, min_lifespan: f64) -> Self {
        if points.len() < 2 {
            points = DEFAULT_CALIBRATION.to_vec();
        }
        points.sort_by(|a, b| a.year.total_cmp(&b.year));
        Self {
            points,
            min_lifespan,
        }
    }

    /// Expected lifespan in years, floored at the minimum plausible lifespan.
    ///
    /// For a death anchor the table is reflected: each `(year, lifespan)`
    /// becomes `(year + lifespan, lifespan)`.
    pub fn estimate(&self, anchor: LifespanAnchor) -> f64 {
        let (year, mut table): (f64, Vec<(f64, f64)>) = match anchor {
            LifespanAnchor::Birth(d) => (
                d.year() as f64,
                self.points.iter().map(|p| (p.year, p.lifespan)).collect(),
            ),
            LifespanAnchor::Death(d) => (
                d.year() as f64,
                self.points
                    .iter()
                    .map(|p| (p.year + p.lifespan, p.lifespan))
                    .collect(),
            ),
        };
        table.sort_by(|a, b| a.0.total_cmp(&b.0));
        interpolate(&table, year).max(self.min_lifespan)
    }
}

fn interpolate(table: &[(f64, f64)], x: f64) -> f64 {
    let last = table.len() - 1;
    let seg = table
        .windows(2)
        .position(|w| x <= w[1].0)
        .unwrap_or(last - 1);
    let (x0, y0) = table[seg];
    let (x1, y1) = table[seg + 1];
    if x1 == x0 {
        return y0;
    }
    y0 + (x - x0) / (x1 - x0) * (y1 - y0)
}
