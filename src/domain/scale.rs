//! Radial time scale: the centre of the diagram is the latest date,
//! earlier dates lie further out.

use chrono::NaiveDate;

use crate::domain::date::{add_years, years_between};

pub const DEFAULT_UNITS_PER_YEAR: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    /// Date drawn at radius 0
    pub center: NaiveDate,
    /// Earliest date of the range, drawn at `outer_radius`
    pub start: NaiveDate,
    pub units_per_year: f64,
}

impl TimeScale {
    pub fn new(start: NaiveDate, center: NaiveDate, units_per_year: f64) -> Self {
        Self {
            center,
            start,
            units_per_year,
        }
    }

    /// Radial distance of a date from the centre.
    pub fn radius(&self, date: NaiveDate) -> f64 {
        years_between(date, self.center) * self.units_per_year
    }

    /// Inverse of [`TimeScale::radius`].
    pub fn date_at(&self, radius: f64) -> NaiveDate {
        if self.units_per_year == 0.0 {
            return self.center;
        }
        add_years(self.center, -radius / self.units_per_year)
    }

    pub fn outer_radius(&self) -> f64 {
        self.radius(self.start)
    }
}
