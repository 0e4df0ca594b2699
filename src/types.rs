//! Common types used throughout the appointment watcher

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A calendar date offered by the appointment system as a candidate slot
pub type AppointmentDate = NaiveDate;

/// A time-of-day slot string as the appointment system reports it ("HH:MM")
pub type TimeSlot = String;

/// One element of the days endpoint payload.
///
/// The endpoint returns a JSON array of objects; only the `date` field
/// matters here, anything else the site sends along is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableDate {
    pub date: AppointmentDate,
}

/// Payload of the times endpoint for a single date.
///
/// `available_times` is ordered ascending, so the last entry is the
/// latest slot of the day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableTimes {
    pub available_times: Vec<TimeSlot>,
}

impl AvailableTimes {
    /// The latest slot offered for the day, if any.
    pub fn latest(&self) -> Option<&TimeSlot> {
        self.available_times.last()
    }
}

/// Result of a reschedule attempt with the date/time that was tried
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleOutcome {
    pub date: AppointmentDate,
    pub time_slot: TimeSlot,
    pub succeeded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_days_payload() {
        let body = r#"[{"date":"2025-05-10","business_day":true},{"date":"2025-05-12","business_day":true}]"#;
        let parsed: Vec<AvailableDate> = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(
            parsed[0].date,
            NaiveDate::from_ymd_opt(2025, 5, 10).unwrap()
        );
        assert_eq!(
            parsed[1].date,
            NaiveDate::from_ymd_opt(2025, 5, 12).unwrap()
        );
    }

    #[test]
    fn test_parse_empty_days_payload() {
        let parsed: Vec<AvailableDate> = serde_json::from_str("[]").unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_times_payload_latest_is_last() {
        let body = r#"{"available_times":["08:00","10:30","15:45"],"business_times":["08:00"]}"#;
        let parsed: AvailableTimes = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.latest(), Some(&"15:45".to_string()));
    }

    #[test]
    fn test_times_payload_empty() {
        let parsed: AvailableTimes = serde_json::from_str(r#"{"available_times":[]}"#).unwrap();
        assert_eq!(parsed.latest(), None);
    }
}
