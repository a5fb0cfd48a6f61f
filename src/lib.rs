pub mod calendar;
pub mod config;
pub mod db;
pub mod duration;
pub mod logging;
pub mod models;
pub mod report;
pub mod source;

pub use calendar::{
    bucket_into_weeks, build_attendance_calendar, generate_date_range, month_labels,
    resolve_status, resolve_status_in, summarize, AttendanceIndex,
};
pub use duration::{compute_end_date, parse_duration};
