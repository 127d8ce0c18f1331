use crate::error::{RelayError, Result};
use chrono::{Local, NaiveDate};
use std::fmt;

const ISO_DATE: &str = "%Y-%m-%d";

/// Inclusive window of calendar days requested from the export API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(RelayError::InvalidDateRange {
                start: format_iso(start),
                end: format_iso(end),
            });
        }
        Ok(Self { start, end })
    }

    /// Window covering only `date`
    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Window from the day before `date` through `date`
    pub fn previous_day_window(date: NaiveDate) -> Self {
        Self {
            start: date.pred_opt().unwrap_or(date),
            end: date,
        }
    }

    /// Previous-day window ending on the local wall-clock date
    pub fn for_today() -> Self {
        Self::previous_day_window(Local::now().date_naive())
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn start_iso(&self) -> String {
        format_iso(self.start)
    }

    pub fn end_iso(&self) -> String {
        format_iso(self.end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start_iso(), self.end_iso())
    }
}

/// Parse a `YYYY-MM-DD` string
pub fn parse_iso_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), ISO_DATE).map_err(|source| RelayError::InvalidDate {
        value: value.to_string(),
        source,
    })
}

fn format_iso(date: NaiveDate) -> String {
    date.format(ISO_DATE).to_string()
}
