use std::sync::OnceLock;

use chrono::{Days, Months, NaiveDate};
use regex::Regex;
use tracing::{debug, trace};

use crate::models::{CourseDuration, DurationUnit};

pub const DEFAULT_DURATION: CourseDuration = CourseDuration {
    value_count: 3,
    unit: DurationUnit::Month,
};

/// Longest window a duration may describe: ten years. Longer counts are
/// treated as unparseable.
pub const MAX_WEEKS: u32 = 520;
pub const MAX_MONTHS: u32 = 120;

fn duration_re() -> Option<&'static Regex> {
    static DURATION_RE: OnceLock<Option<Regex>> = OnceLock::new();
    DURATION_RE
        .get_or_init(|| Regex::new(r"([0-9]+)\s*(week|month)").ok())
        .as_ref()
}

/// Reads the first `<integer> week(s)|month(s)` pair out of free text.
///
/// Anything that does not match, including a missing duration or a count
/// beyond ten years, yields three months.
pub fn parse_duration(duration_text: Option<&str>) -> CourseDuration {
    let Some(text) = duration_text else {
        trace!("no duration text; using default");
        return DEFAULT_DURATION;
    };

    let lowered = text.to_lowercase();
    let parsed = duration_re()
        .and_then(|re| re.captures(&lowered))
        .and_then(|caps| {
            let value_count = caps.get(1)?.as_str().parse::<u32>().ok()?;
            let (unit, limit) = match caps.get(2)?.as_str() {
                "week" => (DurationUnit::Week, MAX_WEEKS),
                _ => (DurationUnit::Month, MAX_MONTHS),
            };
            if value_count > limit {
                return None;
            }
            Some(CourseDuration { value_count, unit })
        });

    match parsed {
        Some(duration) => duration,
        None => {
            debug!(duration_text = %text, "unparseable duration; using default");
            DEFAULT_DURATION
        }
    }
}

/// End of the enrollment window. Month steps follow chrono's clamping
/// (Jan 31 + 1 month is the last day of February). Saturates at
/// `NaiveDate::MAX`.
pub fn compute_end_date(start_date: NaiveDate, count: u32, unit: DurationUnit) -> NaiveDate {
    let end = match unit {
        DurationUnit::Week => start_date.checked_add_days(Days::new(u64::from(count) * 7)),
        DurationUnit::Month => start_date.checked_add_months(Months::new(count)),
    };
    end.unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn missing_or_garbage_text_falls_back_to_three_months() {
        assert_eq!(parse_duration(None), DEFAULT_DURATION);
        assert_eq!(parse_duration(Some("")), DEFAULT_DURATION);
        assert_eq!(parse_duration(Some("garbage text")), DEFAULT_DURATION);
        assert_eq!(parse_duration(Some("weeks 6")), DEFAULT_DURATION);
    }

    #[test]
    fn parses_weeks_and_months_case_insensitively() {
        assert_eq!(
            parse_duration(Some("6 weeks")),
            CourseDuration {
                value_count: 6,
                unit: DurationUnit::Week
            }
        );
        assert_eq!(
            parse_duration(Some("2 Months")),
            CourseDuration {
                value_count: 2,
                unit: DurationUnit::Month
            }
        );
        assert_eq!(
            parse_duration(Some("1WEEK")),
            CourseDuration {
                value_count: 1,
                unit: DurationUnit::Week
            }
        );
    }

    #[test]
    fn first_pair_wins() {
        assert_eq!(
            parse_duration(Some("Full stack: 4 months, then 2 weeks of capstone")),
            CourseDuration {
                value_count: 4,
                unit: DurationUnit::Month
            }
        );
    }

    #[test]
    fn oversized_count_falls_back() {
        assert_eq!(
            parse_duration(Some("99999999999999999999 weeks")),
            DEFAULT_DURATION
        );
    }

    #[test]
    fn non_ascii_digits_do_not_shadow_later_pair() {
        assert_eq!(
            parse_duration(Some("\u{0661} week intro, then 2 months")),
            CourseDuration {
                value_count: 2,
                unit: DurationUnit::Month
            }
        );
        assert_eq!(parse_duration(Some("\u{0663} months")), DEFAULT_DURATION);
    }

    #[test]
    fn counts_beyond_ten_years_fall_back() {
        assert_eq!(parse_duration(Some("4000000000 weeks")), DEFAULT_DURATION);
        assert_eq!(parse_duration(Some("521 weeks")), DEFAULT_DURATION);
        assert_eq!(parse_duration(Some("121 months")), DEFAULT_DURATION);
        assert_eq!(
            parse_duration(Some("520 weeks")),
            CourseDuration {
                value_count: 520,
                unit: DurationUnit::Week
            }
        );
        assert_eq!(
            parse_duration(Some("120 Months")),
            CourseDuration {
                value_count: 120,
                unit: DurationUnit::Month
            }
        );
    }

    #[test]
    fn week_end_date_adds_seven_days_per_week() {
        assert_eq!(
            compute_end_date(date(2024, 1, 1), 1, DurationUnit::Week),
            date(2024, 1, 8)
        );
        assert_eq!(
            compute_end_date(date(2024, 1, 1), 6, DurationUnit::Week),
            date(2024, 2, 12)
        );
    }

    #[test]
    fn month_end_date_clamps_to_month_length() {
        assert_eq!(
            compute_end_date(date(2024, 1, 15), 3, DurationUnit::Month),
            date(2024, 4, 15)
        );
        assert_eq!(
            compute_end_date(date(2024, 1, 31), 1, DurationUnit::Month),
            date(2024, 2, 29)
        );
    }

    #[test]
    fn zero_count_keeps_start_date() {
        let start = date(2024, 5, 5);
        assert_eq!(compute_end_date(start, 0, DurationUnit::Week), start);
        assert_eq!(compute_end_date(start, 0, DurationUnit::Month), start);
    }
}
