use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};
use tracing::debug;

use crate::duration;
use crate::models::{
    AttendanceRecord, AttendanceStatus, CalendarSummary, DayCell, DayStatus, EnrollmentWindow,
    WeekBucket,
};

/// Weeks close on this day.
pub const WEEK_END: Weekday = Weekday::Sat;

/// Every date from `start_date` through `end_date`, inclusive. An inverted
/// range yields just `start_date`.
pub fn generate_date_range(start_date: NaiveDate, end_date: NaiveDate) -> Vec<NaiveDate> {
    let end_date = end_date.max(start_date);
    start_date
        .iter_days()
        .take_while(|day| *day <= end_date)
        .collect()
}

/// Per-day lookup over a student's attendance records. Later records for the
/// same day replace earlier ones.
#[derive(Debug, Default, Clone)]
pub struct AttendanceIndex {
    by_date: HashMap<NaiveDate, AttendanceStatus>,
}

impl AttendanceIndex {
    pub fn from_records(records: &[AttendanceRecord]) -> Self {
        let by_date = records
            .iter()
            .map(|record| (record.date, record.status))
            .collect();
        Self { by_date }
    }

    pub fn status_on(&self, date: NaiveDate) -> Option<AttendanceStatus> {
        self.by_date.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}

// Pending shows as present and late as absent on the calendar.
fn day_status(status: Option<AttendanceStatus>) -> DayStatus {
    match status {
        Some(AttendanceStatus::Present) | Some(AttendanceStatus::Pending) => DayStatus::Present,
        Some(AttendanceStatus::Absent) | Some(AttendanceStatus::Late) | None => DayStatus::Absent,
    }
}

pub fn resolve_status(date: NaiveDate, index: &AttendanceIndex) -> DayStatus {
    day_status(index.status_on(date))
}

/// Same as [`resolve_status`] without building an index first.
pub fn resolve_status_in(date: NaiveDate, records: &[AttendanceRecord]) -> DayStatus {
    let status = records
        .iter()
        .rev()
        .find(|record| record.date == date)
        .map(|record| record.status);
    day_status(status)
}

/// Groups ascending dates into rows that close on Saturday. The first row
/// starts on whatever weekday the first date is; the last row may be partial.
pub fn bucket_into_weeks(dates: &[NaiveDate], index: &AttendanceIndex) -> Vec<WeekBucket> {
    let mut buckets = Vec::new();
    let mut current: Vec<DayCell> = Vec::with_capacity(7);

    for &date in dates {
        current.push(DayCell {
            date,
            status: resolve_status(date, index),
        });

        if date.weekday() == WEEK_END {
            let days = std::mem::replace(&mut current, Vec::with_capacity(7));
            buckets.push(WeekBucket {
                week_start: days[0].date,
                days,
            });
        }
    }

    if let Some(first) = current.first() {
        buckets.push(WeekBucket {
            week_start: first.date,
            days: current,
        });
    }

    buckets
}

/// Short month name for each bucket whose `week_start` begins a new month
/// band; `None` for buckets that continue the previous band.
pub fn month_labels(buckets: &[WeekBucket]) -> Vec<Option<String>> {
    let mut previous: Option<String> = None;
    buckets
        .iter()
        .map(|bucket| {
            let month = bucket.week_start.format("%b").to_string();
            if previous.as_deref() == Some(month.as_str()) {
                None
            } else {
                previous = Some(month.clone());
                Some(month)
            }
        })
        .collect()
}

#[tracing::instrument(skip_all, fields(start = %enrollment.start_date, records = records.len()))]
pub fn build_attendance_calendar(
    enrollment: &EnrollmentWindow,
    records: &[AttendanceRecord],
) -> Vec<WeekBucket> {
    let duration = duration::parse_duration(enrollment.duration_text.as_deref());
    let end_date =
        duration::compute_end_date(enrollment.start_date, duration.value_count, duration.unit);
    let dates = generate_date_range(enrollment.start_date, end_date);
    let index = AttendanceIndex::from_records(records);
    let buckets = bucket_into_weeks(&dates, &index);

    debug!(
        %end_date,
        days = dates.len(),
        weeks = buckets.len(),
        "built attendance calendar"
    );
    buckets
}

pub fn summarize(buckets: &[WeekBucket]) -> CalendarSummary {
    let days = || buckets.iter().flat_map(|bucket| bucket.days.iter());
    let total_days = days().count();
    let present_days = days()
        .filter(|cell| cell.status == DayStatus::Present)
        .count();

    CalendarSummary {
        start_date: days().next().map(|cell| cell.date),
        end_date: days().last().map(|cell| cell.date),
        total_days,
        present_days,
        absent_days: total_days - present_days,
        week_count: buckets.len(),
        attendance_rate: if total_days == 0 {
            0.0
        } else {
            present_days as f64 / total_days as f64
        },
    }
}
