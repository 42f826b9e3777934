// src/quiz/timer.rs

use chrono::{DateTime, Duration, Utc};

/// Session key holding the start timestamp of an attempt at this quiz.
pub fn start_time_key(quiz_id: i64) -> String {
    format!("quiz_{quiz_id}_start_time")
}

/// Serialized form stored in the session; must round-trip through
/// `parse_start_time`.
pub fn encode_start_time(start: DateTime<Utc>) -> String {
    start.to_rfc3339()
}

/// A value that fails to parse is treated by callers as "attempt never
/// started", never as an error.
pub fn parse_start_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Seconds left in the attempt: `duration_minutes*60 - (now - start)`.
/// Negative once the deadline has passed.
pub fn remaining_seconds(start: DateTime<Utc>, duration_minutes: i64, now: DateTime<Utc>) -> i64 {
    let end = start + Duration::minutes(duration_minutes);
    (end - now).num_seconds()
}

pub fn is_expired(start: DateTime<Utc>, duration_minutes: i64, now: DateTime<Utc>) -> bool {
    remaining_seconds(start, duration_minutes, now) <= 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> DateTime<Utc> {
        "2026-03-01T10:00:00Z".parse().unwrap()
    }

    #[test]
    fn expires_after_duration() {
        let now = start() + Duration::minutes(31);
        assert!(remaining_seconds(start(), 30, now) <= 0);
        assert!(is_expired(start(), 30, now));
    }

    #[test]
    fn still_running_before_duration() {
        let now = start() + Duration::minutes(29);
        assert!(remaining_seconds(start(), 30, now) > 0);
        assert!(!is_expired(start(), 30, now));
        assert_eq!(remaining_seconds(start(), 30, now), 60);
    }

    #[test]
    fn exactly_at_deadline_is_expired() {
        let now = start() + Duration::minutes(30);
        assert!(is_expired(start(), 30, now));
    }

    #[test]
    fn start_time_round_trips() {
        let encoded = encode_start_time(start());
        assert_eq!(parse_start_time(&encoded), Some(start()));
    }

    #[test]
    fn garbage_start_time_is_none() {
        assert_eq!(parse_start_time("yesterday-ish"), None);
        assert_eq!(parse_start_time(""), None);
    }

    #[test]
    fn key_embeds_quiz_id() {
        assert_eq!(start_time_key(42), "quiz_42_start_time");
    }
}
