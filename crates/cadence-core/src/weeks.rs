//! Weekly windows over daily totals
//!
//! Daily totals are ordered oldest to newest, calendar gaps are filled with
//! zero-minute days, and the series is cut into non-overlapping windows
//! aligned to the most recent day. Leading days that do not fill a whole
//! window are dropped.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::DailyTotal;

/// One complete week of daily totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Per-day minutes in date order
    pub daily_minutes: Vec<f64>,
}

impl WeekWindow {
    pub fn total(&self) -> f64 {
        self.daily_minutes.iter().sum()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Sort, validate and gap-fill daily totals into a contiguous series
///
/// The first-to-last calendar span may cover at most `max_span_days` days.
pub fn contiguous_days(daily_totals: &[DailyTotal], max_span_days: usize) -> Result<Vec<DailyTotal>> {
    let mut sorted = daily_totals.to_vec();
    sorted.sort_by_key(|d| d.date);

    for pair in sorted.windows(2) {
        if pair[0].date == pair[1].date {
            return Err(Error::MalformedInput(format!(
                "duplicate daily total for {}",
                pair[0].date
            )));
        }
    }
    if let Some(bad) = sorted
        .iter()
        .find(|d| !d.minutes.is_finite() || d.minutes < 0.0)
    {
        return Err(Error::MalformedInput(format!(
            "daily total for {} must be a finite, non-negative number of minutes",
            bad.date
        )));
    }

    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return Ok(vec![]);
    };

    let span = (last.date - first.date).num_days() + 1;
    if span > max_span_days as i64 {
        return Err(Error::MalformedInput(format!(
            "daily totals span {} days ({} to {}); at most {} are accepted",
            span, first.date, last.date, max_span_days
        )));
    }
    let mut filled = Vec::with_capacity(span as usize);
    let mut logged = sorted.iter().peekable();
    for offset in 0..span {
        let date = first.date + Duration::days(offset);
        let minutes = match logged.peek() {
            Some(day) if day.date == date => {
                let minutes = day.minutes;
                logged.next();
                minutes
            }
            _ => 0.0,
        };
        filled.push(DailyTotal::new(date, minutes));
    }

    Ok(filled)
}

/// Cut daily totals into complete weeks, oldest first
pub fn complete_weeks(
    daily_totals: &[DailyTotal],
    days_per_week: usize,
    max_span_days: usize,
) -> Result<Vec<WeekWindow>> {
    if days_per_week == 0 {
        return Err(Error::Config("days_per_week must be at least 1".into()));
    }

    let days = contiguous_days(daily_totals, max_span_days)?;
    let skip = days.len() % days_per_week;
    if skip > 0 {
        tracing::debug!(dropped = skip, "Dropping leading partial week");
    }

    let weeks = days[skip..]
        .chunks(days_per_week)
        .map(|chunk| WeekWindow {
            start: chunk[0].date,
            end: chunk[chunk.len() - 1].date,
            daily_minutes: chunk.iter().map(|d| d.minutes).collect(),
        })
        .collect();

    Ok(weeks)
}

/// Like [`complete_weeks`], but signals insufficient data below `min_weeks`
pub fn require_weeks(
    daily_totals: &[DailyTotal],
    days_per_week: usize,
    max_span_days: usize,
    min_weeks: usize,
) -> Result<Vec<WeekWindow>> {
    let weeks = complete_weeks(daily_totals, days_per_week, max_span_days)?;
    if weeks.len() < min_weeks {
        return Err(Error::InsufficientData(format!(
            "At least {} full weeks of data are required; found {}.",
            min_weeks,
            weeks.len()
        )));
    }
    Ok(weeks)
}
