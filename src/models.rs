use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Attendance status as recorded by staff for a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Pending,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            "late" => Ok(AttendanceStatus::Late),
            "pending" => Ok(AttendanceStatus::Pending),
            other => anyhow::bail!("unknown attendance status {other:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentWindow {
    pub start_date: NaiveDate,
    pub duration_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CourseDuration {
    pub value_count: u32,
    pub unit: DurationUnit,
}

/// What the calendar shows for a day. Collapses the four recorded statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DayStatus {
    Present,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub status: DayStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekBucket {
    pub week_start: NaiveDate,
    pub days: Vec<DayCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarSummary {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_days: usize,
    pub present_days: usize,
    pub absent_days: usize,
    pub week_count: usize,
    pub attendance_rate: f64,
}

#[derive(Debug, Clone)]
pub struct StudentEnrollment {
    pub enrollment_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub course: String,
    pub start_date: NaiveDate,
    pub duration_text: Option<String>,
}

impl StudentEnrollment {
    pub fn window(&self) -> EnrollmentWindow {
        EnrollmentWindow {
            start_date: self.start_date,
            duration_text: self.duration_text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(
            "Present".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::Present
        );
        assert_eq!(
            " LATE ".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::Late
        );
        assert!("excused".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let record = AttendanceRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            status: AttendanceStatus::Pending,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"date":"2024-01-10","status":"pending"}"#);
    }
}
