use std::io::Read;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use tracing::debug;

use crate::models::{AttendanceRecord, AttendanceStatus};

#[derive(Debug, serde::Deserialize)]
struct RecordRow {
    date: NaiveDate,
    status: String,
}

/// One line of an enrollment import: who, which course, and one day of
/// attendance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub full_name: String,
    pub email: String,
    pub course: String,
    pub start_date: NaiveDate,
    pub duration_text: Option<String>,
    pub record: AttendanceRecord,
}

#[derive(Debug, serde::Deserialize)]
struct RawImportRow {
    full_name: String,
    email: String,
    course: String,
    start_date: NaiveDate,
    duration_text: Option<String>,
    date: NaiveDate,
    status: String,
}

fn parse_status(raw: &str, line: usize) -> anyhow::Result<AttendanceStatus> {
    raw.parse::<AttendanceStatus>()
        .with_context(|| format!("row {line}: invalid status"))
}

/// Reads `date,status` rows.
pub fn read_attendance<R: Read>(reader: R) -> anyhow::Result<Vec<AttendanceRecord>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();

    for (idx, result) in reader.deserialize::<RecordRow>().enumerate() {
        let line = idx + 2;
        let row = result.with_context(|| format!("row {line}: malformed attendance record"))?;
        records.push(AttendanceRecord {
            date: row.date,
            status: parse_status(&row.status, line)?,
        });
    }

    Ok(records)
}

pub fn read_attendance_csv(path: &Path) -> anyhow::Result<Vec<AttendanceRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let records = read_attendance(file)
        .with_context(|| format!("failed to read attendance from {}", path.display()))?;
    debug!(path = %path.display(), count = records.len(), "read attendance csv");
    Ok(records)
}

pub fn read_import<R: Read>(reader: R) -> anyhow::Result<Vec<ImportRow>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();

    for (idx, result) in reader.deserialize::<RawImportRow>().enumerate() {
        let line = idx + 2;
        let raw = result.with_context(|| format!("row {line}: malformed import row"))?;
        rows.push(ImportRow {
            full_name: raw.full_name,
            email: raw.email.trim().to_lowercase(),
            course: raw.course,
            start_date: raw.start_date,
            duration_text: raw.duration_text.filter(|text| !text.trim().is_empty()),
            record: AttendanceRecord {
                date: raw.date,
                status: parse_status(&raw.status, line)?,
            },
        });
    }

    Ok(rows)
}

pub fn read_import_csv(path: &Path) -> anyhow::Result<Vec<ImportRow>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let rows = read_import(file)
        .with_context(|| format!("failed to read import rows from {}", path.display()))?;
    debug!(path = %path.display(), count = rows.len(), "read import csv");
    Ok(rows)
}
