//! Forecast cycle identifiers.

use std::fmt;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CycleError, CycleResult};

/// One forecast model run, identified by run date and run hour (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CycleId {
    date: NaiveDate,
    hour: u8,
}

impl CycleId {
    /// Create a cycle from a calendar date and an hour in 0-23.
    pub fn new(date: NaiveDate, hour: u8) -> CycleResult<Self> {
        if hour > 23 {
            return Err(CycleError::InvalidHour(hour.to_string()));
        }
        Ok(Self { date, hour })
    }

    /// Parse the textual form used on the command line ("20240615", "12").
    ///
    /// The hour accepts one or two digits, so "6" and "06" are the same cycle.
    pub fn parse(date: &str, hour: &str) -> CycleResult<Self> {
        if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CycleError::InvalidDate(date.to_string()));
        }
        let invalid = || CycleError::InvalidDate(date.to_string());
        let year: i32 = date[0..4].parse().map_err(|_| invalid())?;
        let month: u32 = date[4..6].parse().map_err(|_| invalid())?;
        let day: u32 = date[6..8].parse().map_err(|_| invalid())?;
        let parsed_date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;

        if hour.is_empty() || hour.len() > 2 || !hour.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CycleError::InvalidHour(hour.to_string()));
        }
        let parsed_hour: u8 = hour
            .parse()
            .map_err(|_| CycleError::InvalidHour(hour.to_string()))?;

        Self::new(parsed_date, parsed_hour)
            .map_err(|_| CycleError::InvalidHour(hour.to_string()))
    }

    /// The cycle containing `now`: its UTC date and hour, minutes dropped.
    pub fn latest(now: DateTime<Utc>) -> Self {
        Self {
            date: now.date_naive(),
            hour: now.hour() as u8,
        }
    }

    /// 8-digit run date, e.g. "20240615".
    pub fn date_str(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }

    /// 2-digit run hour, e.g. "06".
    pub fn hour_str(&self) -> String {
        format!("{:02}", self.hour)
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:02}z", self.date_str(), self.hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_valid_cycle() {
        let cycle = CycleId::parse("20240615", "12").unwrap();
        let expected = CycleId::new(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(), 12).unwrap();
        assert_eq!(cycle, expected);
        assert_eq!(cycle.date_str(), "20240615");
        assert_eq!(cycle.hour_str(), "12");
    }

    #[test]
    fn test_single_digit_hour_is_padded() {
        let cycle = CycleId::parse("20240615", "6").unwrap();
        assert_eq!(cycle.hour_str(), "06");
        assert_eq!(cycle, CycleId::parse("20240615", "06").unwrap());
    }

    #[test]
    fn test_parse_rejects_bad_date() {
        assert_eq!(
            CycleId::parse("2024-06-15", "12"),
            Err(CycleError::InvalidDate("2024-06-15".to_string()))
        );
        assert!(CycleId::parse("20240230", "12").is_err());
        assert!(CycleId::parse("2024061", "12").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_hour() {
        assert_eq!(
            CycleId::parse("20240615", "24"),
            Err(CycleError::InvalidHour("24".to_string()))
        );
        assert!(CycleId::parse("20240615", "").is_err());
        assert!(CycleId::parse("20240615", "1a").is_err());
        assert!(CycleId::parse("20240615", "123").is_err());
    }

    #[test]
    fn test_latest_truncates_to_hour() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 17, 42, 9).unwrap();
        let cycle = CycleId::latest(now);
        assert_eq!(cycle.date_str(), "20240615");
        assert_eq!(cycle.hour_str(), "17");
    }

    #[test]
    fn test_display() {
        let cycle = CycleId::parse("20240101", "00").unwrap();
        assert_eq!(cycle.to_string(), "20240101/00z");
    }
}
