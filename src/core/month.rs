//! First-of-month calendar points and monthly date arithmetic.

use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month, the time index of every series in this crate.
///
/// Months are totally ordered and step by calendar arithmetic: "one month
/// back" from March is February, never a fixed day count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Create a month from a year and a 1-based month number.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ForecastError::InvalidInput(format!(
                "month must be in 1..=12, got {month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// The month containing `date` (snaps to the first of the month).
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The first day of this month as a calendar date.
    pub fn first_day(&self) -> NaiveDate {
        // month is validated to 1..=12 at construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("valid first-of-month date")
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// 1-based month number.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month `n` calendar months later.
    pub fn plus_months(self, n: u32) -> Self {
        self.offset(n as i64)
    }

    /// The month `n` calendar months earlier.
    pub fn minus_months(self, n: u32) -> Self {
        self.offset(-(n as i64))
    }

    /// The following month.
    pub fn next(self) -> Self {
        self.plus_months(1)
    }

    /// Signed number of months from `origin` to `self`.
    pub fn months_since(self, origin: Month) -> i64 {
        self.total_months() - origin.total_months()
    }

    /// Every month from `start` to `end` inclusive; empty when `end < start`.
    pub fn range_inclusive(start: Month, end: Month) -> Vec<Month> {
        if end < start {
            return Vec::new();
        }
        let steps = end.months_since(start) as usize + 1;
        Self::sequence(start, steps)
    }

    /// `n` consecutive months starting at `start`.
    pub fn sequence(start: Month, n: usize) -> Vec<Month> {
        (0..n).map(|i| start.offset(i as i64)).collect()
    }

    fn offset(self, months: i64) -> Self {
        let total = self.total_months() + months;
        Self {
            year: total.div_euclid(12) as i32,
            month: total.rem_euclid(12) as u32 + 1,
        }
    }

    fn total_months(self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = ForecastError;

    /// Parse from `"YYYY-MM"` form.
    fn from_str(s: &str) -> Result<Self> {
        let (year, month) = s
            .rsplit_once('-')
            .ok_or_else(|| ForecastError::InvalidInput(format!("expected YYYY-MM, got '{s}'")))?;
        let year: i32 = year
            .parse()
            .map_err(|_| ForecastError::InvalidInput(format!("invalid year in '{s}'")))?;
        let month: u32 = month
            .parse()
            .map_err(|_| ForecastError::InvalidInput(format!("invalid month in '{s}'")))?;
        Month::new(year, month)
    }
}
