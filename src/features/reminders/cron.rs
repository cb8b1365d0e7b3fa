//! Cron expression validation and minute matching
//!
//! Thin wrapper around the `cron` crate so the rest of the feature never
//! touches cron syntax directly. Accepts standard five-field expressions
//! (minute hour day-of-month month day-of-week) and six-field expressions
//! with a leading seconds field.

use chrono::{DateTime, Duration, Timelike, Utc};
use cron::Schedule;
use std::str::FromStr;

use crate::core::error::RecordError;

/// Parse a five- or six-field cron expression into a compiled schedule.
///
/// The `cron` crate speaks six/seven fields (seconds first), so a
/// five-field expression is normalized by prepending a literal `0`
/// seconds field. Anything else, including `@hourly`-style shorthands,
/// is rejected wholesale.
pub fn parse(expr: &str) -> Result<Schedule, RecordError> {
    let fields = expr.split_whitespace().count();
    let normalized = match fields {
        5 => format!("0 {expr}"),
        6 => expr.to_string(),
        _ => return Err(RecordError::CronSyntax(expr.to_string())),
    };

    Schedule::from_str(&normalized).map_err(|_| RecordError::CronSyntax(expr.to_string()))
}

/// Whether `expr` is a valid five- or six-field cron expression.
pub fn validate(expr: &str) -> bool {
    parse(expr).is_ok()
}

/// Truncate a timestamp to the start of its minute.
pub fn minute_of(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

/// Whether the schedule has an instant inside the minute containing `t`.
///
/// This is the tick decision: it depends only on the schedule and the wall
/// clock, never on how many other reminders exist.
pub fn matches_minute(schedule: &Schedule, t: DateTime<Utc>) -> bool {
    let start = minute_of(t);
    let window_end = start + Duration::seconds(60);

    schedule
        .after(&(start - Duration::seconds(1)))
        .next()
        .map(|next| next < window_end)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_standard_expressions() {
        assert!(validate("* * * * *"));
        assert!(validate("*/5 * * * *"));
        assert!(validate("0 9-17 * * 1-5"));
        assert!(validate("0,30 * * * *"));
        assert!(validate("15 8 1 1 *"));
    }

    #[test]
    fn test_validate_six_field_expressions() {
        assert!(validate("0 * * * * *"));
        assert!(validate("30 */2 9-17 * * *"));
    }

    #[test]
    fn test_validate_rejects_malformed_expressions() {
        assert!(!validate(""));
        assert!(!validate("* * * *"));
        assert!(!validate("* * * * * * *"));
        assert!(!validate("61 * * * *"));
        assert!(!validate("* 25 * * *"));
        assert!(!validate("a b c d e"));
        assert!(!validate("@hourly"));
        assert!(!validate("buy milk"));
    }

    #[test]
    fn test_parse_reports_cron_syntax_error() {
        let err = parse("not a cron").unwrap_err();
        assert_eq!(err, RecordError::CronSyntax("not a cron".to_string()));
    }

    #[test]
    fn test_minute_of_truncates_seconds() {
        let t = Utc.with_ymd_and_hms(2026, 1, 1, 10, 5, 42).unwrap();
        let expected = Utc.with_ymd_and_hms(2026, 1, 1, 10, 5, 0).unwrap();
        assert_eq!(minute_of(t), expected);
    }

    #[test]
    fn test_matches_minute_every_minute() {
        let schedule = parse("* * * * *").unwrap();
        let t = Utc.with_ymd_and_hms(2026, 1, 1, 10, 5, 42).unwrap();
        assert!(matches_minute(&schedule, t));
    }

    #[test]
    fn test_matches_minute_step_expression() {
        let schedule = parse("*/5 * * * *").unwrap();

        let on_step = Utc.with_ymd_and_hms(2026, 1, 1, 10, 5, 30).unwrap();
        assert!(matches_minute(&schedule, on_step));

        let off_step = Utc.with_ymd_and_hms(2026, 1, 1, 10, 6, 10).unwrap();
        assert!(!matches_minute(&schedule, off_step));
    }

    #[test]
    fn test_matches_minute_with_seconds_field() {
        // A mid-minute second still counts as a match for that minute
        let schedule = parse("30 * * * * *").unwrap();
        let t = Utc.with_ymd_and_hms(2026, 1, 1, 10, 5, 0).unwrap();
        assert!(matches_minute(&schedule, t));
    }
}
