//! Data models for logged runs and the aggregates derived from them.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected user input for one of the run fields
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    Date(String),
    #[error("invalid distance '{0}' (expected a positive number of km)")]
    Distance(String),
    #[error("invalid duration '{0}' (expected h:mm:ss, mm:ss or minutes)")]
    Duration(String),
    #[error("invalid {field} '{value}'")]
    Number { field: &'static str, value: String },
    #[error("unknown time of day '{0}' (morning, forenoon, afternoon, evening)")]
    TimeOfDay(String),
}

/// Part of the day a run happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Forenoon,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Forenoon => "forenoon",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeOfDay {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" => Ok(TimeOfDay::Morning),
            "forenoon" => Ok(TimeOfDay::Forenoon),
            "afternoon" => Ok(TimeOfDay::Afternoon),
            "evening" | "night" => Ok(TimeOfDay::Evening),
            _ => Err(InputError::TimeOfDay(s.to_string())),
        }
    }
}

/// A run as stored in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: i64,
    pub date: NaiveDate,
    /// Kilometres
    pub distance: f64,
    pub duration: Option<String>,
    pub duration_seconds: Option<u32>,
    pub pace: Option<String>,
    pub cadence: Option<u32>,
    pub heart_rate: Option<f64>,
    pub heart_rate_max: Option<f64>,
    pub vo2max: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub time_of_day: Option<TimeOfDay>,
    pub place: Option<String>,
    pub notes: Option<String>,
}

/// A run about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewRun {
    pub date: NaiveDate,
    pub distance: f64,
    pub duration_seconds: Option<u32>,
    pub pace: Option<String>,
    pub cadence: Option<u32>,
    pub heart_rate: Option<f64>,
    pub heart_rate_max: Option<f64>,
    pub vo2max: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub time_of_day: Option<TimeOfDay>,
    pub place: Option<String>,
    pub notes: Option<String>,
}

impl NewRun {
    pub fn new(date: NaiveDate, distance: f64) -> Self {
        NewRun {
            date,
            distance,
            duration_seconds: None,
            pace: None,
            cadence: None,
            heart_rate: None,
            heart_rate_max: None,
            vo2max: None,
            temperature: None,
            humidity: None,
            time_of_day: None,
            place: None,
            notes: None,
        }
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    pub fn with_heart_rate(mut self, bpm: f64) -> Self {
        self.heart_rate = Some(bpm);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Check field ranges that the parsers alone cannot guarantee
    pub fn validate(&self) -> Result<(), InputError> {
        if !(self.distance.is_finite() && self.distance > 0.0) {
            return Err(InputError::Distance(self.distance.to_string()));
        }
        for (field, value) in [
            ("heart rate", self.heart_rate),
            ("max heart rate", self.heart_rate_max),
        ] {
            if let Some(v) = value {
                if !(v.is_finite() && v >= 0.0) {
                    return Err(InputError::Number {
                        field,
                        value: v.to_string(),
                    });
                }
            }
        }
        if let Some(h) = self.humidity {
            if !(0.0..=100.0).contains(&h) {
                return Err(InputError::Number {
                    field: "humidity",
                    value: h.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Formatted duration, if one was given
    pub fn duration(&self) -> Option<String> {
        self.duration_seconds.map(format_duration)
    }

    /// The explicit pace, or one derived from distance and duration
    pub fn effective_pace(&self) -> Option<String> {
        self.pace.clone().or_else(|| {
            self.duration_seconds
                .and_then(|secs| pace_for(self.distance, secs))
        })
    }
}

/// Per-month totals with running cumulative columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotals {
    /// `YYYY-MM`
    pub month: String,
    pub days_run: u32,
    pub cumulative_days_run: u32,
    pub total_distance: f64,
    pub cumulative_distance: f64,
}

/// Per-year totals with running cumulative columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyTotals {
    pub year: i32,
    pub days_run: u32,
    pub cumulative_days_run: u32,
    pub total_distance: f64,
    pub cumulative_distance: f64,
}

/// Overall statistics, computed over per-day distance totals
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub days_run: u32,
    pub total_distance: f64,
    pub avg_distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

/// Parse a date in `YYYY-MM-DD`, `YYYY/MM/DD` or `YYYYMMDD` form
pub fn parse_date(s: &str) -> Result<NaiveDate, InputError> {
    let s = s.trim();
    ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .ok_or_else(|| InputError::Date(s.to_string()))
}

/// Parse a distance in kilometres, with an optional `km` suffix
pub fn parse_distance(s: &str) -> Result<f64, InputError> {
    let trimmed = s.trim();
    let number = trimmed
        .strip_suffix("km")
        .or_else(|| trimmed.strip_suffix("KM"))
        .unwrap_or(trimmed)
        .trim();
    match number.parse::<f64>() {
        Ok(d) if d.is_finite() && d > 0.0 => Ok(d),
        _ => Err(InputError::Distance(s.to_string())),
    }
}

/// Parse `h:mm:ss`, `mm:ss` or a plain number of minutes into seconds
pub fn parse_duration(s: &str) -> Result<u32, InputError> {
    let err = || InputError::Duration(s.to_string());
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(err());
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    let seconds = match parts.as_slice() {
        [minutes] => {
            let m: f64 = minutes.parse().map_err(|_| err())?;
            if !(m.is_finite() && m >= 0.0) {
                return Err(err());
            }
            // Saturates, so huge values fail the range check below
            (m * 60.0).round() as u64
        }
        [m, s] => {
            let (m, s) = (parse_part(m).ok_or_else(err)?, parse_part(s).ok_or_else(err)?);
            if s >= 60 {
                return Err(err());
            }
            m * 60 + s
        }
        [h, m, s] => {
            let h = parse_part(h).ok_or_else(err)?;
            let m = parse_part(m).ok_or_else(err)?;
            let s = parse_part(s).ok_or_else(err)?;
            if m >= 60 || s >= 60 {
                return Err(err());
            }
            h * 3600 + m * 60 + s
        }
        _ => return Err(err()),
    };

    match u32::try_from(seconds) {
        Ok(0) | Err(_) => Err(err()),
        Ok(secs) => Ok(secs),
    }
}

/// Digits only, at most nine of them so the arithmetic above stays in `u64`
fn parse_part(s: &str) -> Option<u64> {
    if s.len() > 9 {
        return None;
    }
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Format seconds as `h:mm:ss`, or `mm:ss` under an hour
pub fn format_duration(seconds: u32) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Pace per kilometre as `m'ss"`
pub fn pace_for(distance: f64, seconds: u32) -> Option<String> {
    if !(distance.is_finite() && distance > 0.0) || seconds == 0 {
        return None;
    }
    let per_km = (seconds as f64 / distance).round() as u32;
    Some(format!("{}'{:02}\"", per_km / 60, per_km % 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(parse_date("2024-03-09").unwrap(), expected);
        assert_eq!(parse_date("2024/03/09").unwrap(), expected);
        assert_eq!(parse_date(" 20240309 ").unwrap(), expected);
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn test_parse_distance() {
        assert_eq!(parse_distance("5.2").unwrap(), 5.2);
        assert_eq!(parse_distance("10km").unwrap(), 10.0);
        assert_eq!(parse_distance(" 21.1 km ").unwrap(), 21.1);
        assert!(parse_distance("0").is_err());
        assert!(parse_distance("-3").is_err());
        assert!(parse_distance("NaN").is_err());
        assert!(parse_distance("far").is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1:02:03").unwrap(), 3723);
        assert_eq!(parse_duration("25:30").unwrap(), 1530);
        assert_eq!(parse_duration("30").unwrap(), 1800);
        assert_eq!(parse_duration("2.5").unwrap(), 150);
        assert!(parse_duration("25:61").is_err());
        assert!(parse_duration("1:2:3:4").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("0:00").is_err());
    }

    #[test]
    fn test_parse_duration_rejects_overflow() {
        assert!(parse_duration("99999999:00").is_err());
        assert!(parse_duration("1200000:00:00").is_err());
        assert!(parse_duration("99999999999999999999:00").is_err());
        assert!(parse_duration("1e12").is_err());
        // Largest representable value still parses
        assert_eq!(parse_duration("1193046:28:15").unwrap(), u32::MAX);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(3723), "1:02:03");
        assert_eq!(format_duration(1530), "25:30");
        assert_eq!(format_duration(59), "00:59");
    }

    #[test]
    fn test_pace_for() {
        // 5 km in 25:00 -> 5'00"
        assert_eq!(pace_for(5.0, 1500).as_deref(), Some("5'00\""));
        // 10 km in 52:30 -> 5'15"
        assert_eq!(pace_for(10.0, 3150).as_deref(), Some("5'15\""));
        assert_eq!(pace_for(0.0, 1500), None);
        assert_eq!(pace_for(5.0, 0), None);
    }

    #[test]
    fn test_time_of_day_parse() {
        assert_eq!("Morning".parse::<TimeOfDay>().unwrap(), TimeOfDay::Morning);
        assert_eq!("EVENING".parse::<TimeOfDay>().unwrap(), TimeOfDay::Evening);
        assert!("noonish".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn test_new_run_validation() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(NewRun::new(date, 5.0).validate().is_ok());
        assert!(NewRun::new(date, 0.0).validate().is_err());
        assert!(NewRun::new(date, f64::NAN).validate().is_err());

        let mut run = NewRun::new(date, 5.0);
        run.humidity = Some(120.0);
        assert!(run.validate().is_err());
    }

    #[test]
    fn test_effective_pace_prefers_explicit() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let run = NewRun::new(date, 5.0).with_duration(1500);
        assert_eq!(run.effective_pace().as_deref(), Some("5'00\""));

        let mut run = run;
        run.pace = Some("4'50\"".to_string());
        assert_eq!(run.effective_pace().as_deref(), Some("4'50\""));
    }
}
