//! Date-range policy for weather lookups.
//!
//! `today` is always injected by the caller so the rules stay
//! deterministic under test; nothing here reads a global clock.

use crate::error::DateRangeError;
use chrono::{Duration, NaiveDate};

/// How far back the archive window reaches.
pub const MAX_PAST_DAYS: i64 = 365;

/// How far ahead the forecast window reaches.
pub const MAX_FUTURE_DAYS: i64 = 7;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A parsed, inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Parse both bounds from `YYYY-MM-DD` strings.
    ///
    /// # Errors
    /// Returns `DateRangeError::MalformedDate` naming the first bound
    /// that does not parse.
    pub fn parse(start: &str, end: &str) -> Result<Self, DateRangeError> {
        let start = parse_date(start)?;
        let end = parse_date(end)?;
        Ok(Self { start, end })
    }

    /// A single-day range.
    pub fn single(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    /// Check the range against the lookup window.
    ///
    /// Rules, in order: start before end, start within the past year,
    /// end within the forecast horizon. The first violation wins.
    ///
    /// # Errors
    /// Returns the `DateRangeError` for the first violated rule.
    pub fn validate(&self, today: NaiveDate) -> Result<(), DateRangeError> {
        if self.start > self.end {
            return Err(DateRangeError::StartAfterEnd { start: self.start, end: self.end });
        }
        if self.start < today - Duration::days(MAX_PAST_DAYS) {
            return Err(DateRangeError::StartTooFarInPast { start: self.start });
        }
        if self.end > today + Duration::days(MAX_FUTURE_DAYS) {
            return Err(DateRangeError::EndTooFarInFuture { end: self.end });
        }
        Ok(())
    }

    /// Parse and validate in one step.
    ///
    /// # Errors
    /// Propagates the first parse or validation failure.
    pub fn parse_and_validate(
        start: &str,
        end: &str,
        today: NaiveDate,
    ) -> Result<Self, DateRangeError> {
        let range = Self::parse(start, end)?;
        range.validate(today)?;
        Ok(range)
    }

    /// Every date in the range, inclusive of both bounds.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    /// Number of days covered, inclusive.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| DateRangeError::MalformedDate(raw.to_string()))
}
