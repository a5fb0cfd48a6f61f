use std::fmt::Write;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::calendar;
use crate::models::{CalendarSummary, DayCell, DayStatus, WeekBucket};

const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const PRESENT_CELL: &str = "■";
const ABSENT_CELL: &str = "□";

#[derive(Debug, Serialize)]
pub struct CalendarDocument<'a> {
    pub summary: CalendarSummary,
    pub weeks: Vec<WeekDocument<'a>>,
}

#[derive(Debug, Serialize)]
pub struct WeekDocument<'a> {
    pub week_start: NaiveDate,
    pub month_label: Option<String>,
    pub days: &'a [DayCell],
}

pub fn calendar_document(buckets: &[WeekBucket]) -> CalendarDocument<'_> {
    let labels = calendar::month_labels(buckets);
    let weeks = buckets
        .iter()
        .zip(labels)
        .map(|(bucket, month_label)| WeekDocument {
            week_start: bucket.week_start,
            month_label,
            days: &bucket.days,
        })
        .collect();

    CalendarDocument {
        summary: calendar::summarize(buckets),
        weeks,
    }
}

pub fn build_json(buckets: &[WeekBucket]) -> anyhow::Result<String> {
    let mut output = serde_json::to_string_pretty(&calendar_document(buckets))?;
    output.push('\n');
    Ok(output)
}

fn cell_for(bucket: &WeekBucket, weekday_index: u32) -> &'static str {
    bucket
        .days
        .iter()
        .find(|cell| cell.date.weekday().num_days_from_sunday() == weekday_index)
        .map(|cell| match cell.status {
            DayStatus::Present => PRESENT_CELL,
            DayStatus::Absent => ABSENT_CELL,
        })
        .unwrap_or(" ")
}

/// Heatmap table: one column per week, one row per weekday (Sunday first).
pub fn render_heatmap(buckets: &[WeekBucket]) -> String {
    let mut output = String::new();
    let labels = calendar::month_labels(buckets);

    let _ = write!(output, "|    |");
    for label in &labels {
        let _ = write!(output, " {} |", label.as_deref().unwrap_or(""));
    }
    let _ = writeln!(output);

    let _ = write!(output, "|----|");
    for _ in buckets {
        let _ = write!(output, "---|");
    }
    let _ = writeln!(output);

    for (weekday_index, weekday) in (0u32..).zip(WEEKDAY_LABELS) {
        let _ = write!(output, "| {weekday} |");
        for bucket in buckets {
            let _ = write!(output, " {} |", cell_for(bucket, weekday_index));
        }
        let _ = writeln!(output);
    }

    output
}

pub fn build_report(
    student: Option<&str>,
    course: Option<&str>,
    duration_text: Option<&str>,
    buckets: &[WeekBucket],
) -> String {
    let summary = calendar::summarize(buckets);
    let mut output = String::new();

    let _ = writeln!(output, "# Attendance Calendar");
    let _ = writeln!(
        output,
        "Generated for {} in {}",
        student.unwrap_or("unnamed student"),
        course.unwrap_or("unspecified course")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Enrollment Window");

    match (summary.start_date, summary.end_date) {
        (Some(start), Some(end)) => {
            let _ = writeln!(
                output,
                "- {} through {} ({})",
                start,
                end,
                duration_text.unwrap_or("default duration")
            );
        }
        _ => {
            let _ = writeln!(output, "No days in this enrollment window.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(
        output,
        "- {} of {} days present ({:.1}%) across {} weeks",
        summary.present_days,
        summary.total_days,
        summary.attendance_rate * 100.0,
        summary.week_count
    );
    let _ = writeln!(output, "- {} days absent", summary.absent_days);

    if !buckets.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Heatmap");
        let _ = writeln!(output, "{PRESENT_CELL} present, {ABSENT_CELL} absent");
        let _ = writeln!(output);
        output.push_str(&render_heatmap(buckets));
    }

    output
}
