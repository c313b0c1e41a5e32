//! Trade dates and inclusive date ranges.
//!
//! The textual form at every boundary (HTTP, CLI, environment) is DD-MM-YYYY;
//! the output filename stamp is the same digits with the separators removed.

use chrono::{Datelike, NaiveDate, Weekday};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Boundary date format accepted and emitted everywhere.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid trade date '{input}': expected DD-MM-YYYY")]
pub struct DateParseError {
    pub input: String,
}

/// A single trading calendar date.
///
/// Wraps `NaiveDate` so the DD-MM-YYYY boundary form and the DDMMYYYY
/// filename stamp have exactly one source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradeDate(NaiveDate);

impl TradeDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse the DD-MM-YYYY boundary form. Surrounding whitespace is ignored.
    pub fn parse(input: &str) -> Result<Self, DateParseError> {
        NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
            .map(Self)
            .map_err(|_| DateParseError {
                input: input.trim().to_string(),
            })
    }

    pub fn as_date(&self) -> NaiveDate {
        self.0
    }

    /// Filename stamp: DDMMYYYY, no separators.
    pub fn file_stamp(&self) -> String {
        self.0.format("%d%m%Y").to_string()
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self.0.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

impl fmt::Display for TradeDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for TradeDate {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<NaiveDate> for TradeDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

/// Inclusive ascending range of trade dates.
///
/// An inverted pair (start after end) yields nothing; callers reject that
/// case at the boundary before a range is ever built.
#[derive(Debug, Clone)]
pub struct DateRange {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: TradeDate, end: TradeDate) -> Self {
        Self {
            next: (start <= end).then_some(start.0),
            end: end.0,
        }
    }
}

impl Iterator for DateRange {
    type Item = TradeDate;

    fn next(&mut self) -> Option<TradeDate> {
        let current = self.next?;
        self.next = if current < self.end {
            current.succ_opt()
        } else {
            None
        };
        Some(TradeDate(current))
    }
}
