//! CSV import of activity logs
//!
//! Expected header: `date,category,minutes`. Columns are looked up by header
//! name, so extra columns (an activity `name`, a `mood` score) and any
//! column order are accepted.

use std::collections::BTreeMap;
use std::io::Read;

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PredictorConfig;
use crate::engine::WeeklyRequest;
use crate::error::{Error, Result};
use crate::models::{CategoryTotals, DailyTotal};
use crate::weeks::complete_weeks;

/// One logged activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub date: NaiveDate,
    pub category: String,
    pub minutes: f64,
}

/// Index of a named column, matched case-insensitively
fn column(headers: &StringRecord, names: &[&str]) -> Result<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        .ok_or_else(|| Error::MalformedInput(format!("missing '{}' column", names[0])))
}

/// Parse CSV activity data
pub fn parse_activities<R: Read>(reader: R) -> Result<Vec<ActivityRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let date_col = column(&headers, &["date", "timestamp"])?;
    let category_col = column(&headers, &["category"])?;
    let minutes_col = column(&headers, &["minutes", "duration_minutes"])?;

    let mut records = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = row + 2;

        let date = parse_date(record.get(date_col).unwrap_or_default())
            .map_err(|e| Error::MalformedInput(format!("line {}: {}", line, e)))?;

        let category = record.get(category_col).unwrap_or_default().to_string();
        if category.is_empty() {
            return Err(Error::MalformedInput(format!(
                "line {}: category must not be empty",
                line
            )));
        }

        let minutes = parse_minutes(record.get(minutes_col).unwrap_or_default())
            .map_err(|e| Error::MalformedInput(format!("line {}: {}", line, e)))?;

        records.push(ActivityRecord {
            date,
            category,
            minutes,
        });
    }

    debug!(count = records.len(), "Parsed activity records");
    Ok(records)
}

/// Parse a calendar date or a timestamp (date part kept)
fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    let timestamp_formats = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];
    for fmt in timestamp_formats {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ts.date());
        }
    }

    Err(format!("unable to parse date '{}'", s))
}

/// Minutes must be positive and finite
fn parse_minutes(s: &str) -> std::result::Result<f64, String> {
    let minutes: f64 = s
        .parse()
        .map_err(|_| format!("unable to parse minutes '{}'", s))?;
    if !minutes.is_finite() || minutes <= 0.0 {
        return Err(format!("minutes must be a positive number, got '{}'", s));
    }
    Ok(minutes)
}

/// Activities aggregated into daily and weekly totals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityLog {
    records: Vec<ActivityRecord>,
}

impl ActivityLog {
    pub fn from_records(records: Vec<ActivityRecord>) -> Self {
        Self { records }
    }

    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        Ok(Self::from_records(parse_activities(reader)?))
    }

    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Minutes per logged day, oldest first
    pub fn daily_totals(&self) -> Vec<DailyTotal> {
        let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for record in &self.records {
            *by_day.entry(record.date).or_insert(0.0) += record.minutes;
        }
        by_day
            .into_iter()
            .map(|(date, minutes)| DailyTotal::new(date, minutes))
            .collect()
    }

    /// Minutes per category between `start` and `end` inclusive
    pub fn category_totals(&self, start: NaiveDate, end: NaiveDate) -> CategoryTotals {
        let mut totals = CategoryTotals::new();
        for record in self.records.iter().filter(|r| r.date >= start && r.date <= end) {
            *totals.entry(record.category.clone()).or_insert(0.0) += record.minutes;
        }
        totals
    }

    /// Build an engine request from the log
    ///
    /// Category totals are computed over the same weekly windows the engine
    /// derives from the daily totals. With no complete week the request
    /// carries empty category totals and the engine reports insufficient data.
    pub fn to_request(
        &self,
        predictor: &PredictorConfig,
        risk_history: Option<Vec<String>>,
    ) -> Result<WeeklyRequest> {
        let daily_totals = self.daily_totals();
        let weeks = complete_weeks(
            &daily_totals,
            predictor.days_per_week,
            predictor.max_span_days,
        )?;

        let mut per_week: Vec<CategoryTotals> = weeks
            .iter()
            .map(|w| self.category_totals(w.start, w.end))
            .collect();
        let weekly_category_totals = per_week.pop().unwrap_or_default();

        debug!(
            days = daily_totals.len(),
            weeks = weeks.len(),
            "Built weekly request from activity log"
        );

        Ok(WeeklyRequest {
            weekly_daily_totals: daily_totals,
            weekly_category_totals,
            category_history: per_week,
            risk_history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2026-01-15").unwrap(), date("2026-01-15"));
        assert_eq!(parse_date("2026-01-15T07:30:00").unwrap(), date("2026-01-15"));
        assert_eq!(parse_date("2026-01-15 22:10:00").unwrap(), date("2026-01-15"));
        assert!(parse_date("15/01/2026").is_err());
    }

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_minutes("45").unwrap(), 45.0);
        assert_eq!(parse_minutes("12.5").unwrap(), 12.5);
        assert!(parse_minutes("0").is_err());
        assert!(parse_minutes("-10").is_err());
        assert!(parse_minutes("NaN").is_err());
        assert!(parse_minutes("ten").is_err());
    }

    #[test]
    fn test_parse_activities_by_header_name() {
        let csv = "name,minutes,category,date\n\
                   Deep work,90,Work,2026-01-05\n\
                   Reading, 30 ,Study,2026-01-05\n";

        let records = parse_activities(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].category, "Work");
        assert_eq!(records[0].minutes, 90.0);
        assert_eq!(records[1].minutes, 30.0);
        assert_eq!(records[1].date, date("2026-01-05"));
    }

    #[test]
    fn test_missing_column() {
        let err = parse_activities("date,minutes\n2026-01-05,30\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
        assert!(err.to_string().contains("category"));
    }

    #[test]
    fn test_bad_row_reports_line() {
        let csv = "date,category,minutes\n2026-01-05,Work,30\n2026-01-06,Work,abc\n";
        let err = parse_activities(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_daily_totals_sum_same_day() {
        let log = ActivityLog::from_records(vec![
            ActivityRecord {
                date: date("2026-01-06"),
                category: "Work".into(),
                minutes: 20.0,
            },
            ActivityRecord {
                date: date("2026-01-05"),
                category: "Work".into(),
                minutes: 30.0,
            },
            ActivityRecord {
                date: date("2026-01-05"),
                category: "Study".into(),
                minutes: 15.0,
            },
        ]);

        let totals = log.daily_totals();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0], DailyTotal::new(date("2026-01-05"), 45.0));
        assert_eq!(totals[1], DailyTotal::new(date("2026-01-06"), 20.0));
    }

    #[test]
    fn test_to_request_aligns_category_weeks() {
        let mut csv = String::from("date,category,minutes\n");
        // Two leading days that fall outside the complete weeks
        csv.push_str("2026-01-03,Noise,500\n2026-01-04,Noise,500\n");
        for day in 5..=18 {
            let category = if day <= 11 { "Work" } else { "Study" };
            csv.push_str(&format!("2026-01-{:02},{},60\n", day, category));
        }

        let log = ActivityLog::from_csv(csv.as_bytes()).unwrap();
        let request = log
            .to_request(&PredictorConfig::default(), Some(vec!["R0".into()]))
            .unwrap();

        assert_eq!(request.weekly_daily_totals.len(), 16);
        assert_eq!(request.weekly_category_totals.get("Study"), Some(&420.0));
        assert_eq!(request.weekly_category_totals.get("Work"), None);
        assert_eq!(request.category_history.len(), 1);
        assert_eq!(request.category_history[0].get("Work"), Some(&420.0));
        assert_eq!(request.category_history[0].get("Noise"), None);
        assert_eq!(request.risk_history, Some(vec!["R0".to_string()]));
    }

    #[test]
    fn test_to_request_without_complete_week() {
        let csv = "date,category,minutes\n2026-01-05,Work,30\n";
        let request = ActivityLog::from_csv(csv.as_bytes())
            .unwrap()
            .to_request(&PredictorConfig::default(), None)
            .unwrap();

        assert!(request.weekly_category_totals.is_empty());
        assert!(request.category_history.is_empty());
    }

    #[test]
    fn test_to_request_rejects_excessive_span() {
        let csv = "date,category,minutes\n1900-01-01,Work,30\n2026-01-05,Work,30\n";
        let log = ActivityLog::from_csv(csv.as_bytes()).unwrap();

        let err = log.to_request(&PredictorConfig::default(), None).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }
}
