use crate::models::Challenge;
use chrono::{Duration, Local, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeWindow {
    BeforeStart,
    Active,
    AfterEnd,
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses a strict `yyyy-MM-dd` day.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

pub fn window(challenge: &Challenge, date: NaiveDate) -> ChallengeWindow {
    if date < challenge.start_date {
        ChallengeWindow::BeforeStart
    } else if date > challenge.end_date {
        ChallengeWindow::AfterEnd
    } else {
        ChallengeWindow::Active
    }
}

pub fn is_last_day(challenge: &Challenge, date: NaiveDate) -> bool {
    challenge.end_date == date
}

pub fn duration_days(challenge: &Challenge) -> i64 {
    (challenge.end_date - challenge.start_date).num_days() + 1
}

/// Every calendar day of the challenge, inclusive on both ends.
pub fn challenge_days(challenge: &Challenge) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = challenge.start_date;
    while day <= challenge.end_date {
        days.push(day);
        day += Duration::days(1);
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::Value;

    fn challenge(start: NaiveDate, end: NaiveDate) -> Challenge {
        Challenge {
            id: "c1".into(),
            code: "ABC234".into(),
            title: "Test".into(),
            description: String::new(),
            start_date: start,
            end_date: end,
            start_score: 0,
            ab_enabled: false,
            config: Value::Null,
            created_at: Utc::now(),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_classifies_dates() {
        let c = challenge(day(2026, 3, 1), day(2026, 3, 7));
        assert_eq!(window(&c, day(2026, 2, 28)), ChallengeWindow::BeforeStart);
        assert_eq!(window(&c, day(2026, 3, 1)), ChallengeWindow::Active);
        assert_eq!(window(&c, day(2026, 3, 7)), ChallengeWindow::Active);
        assert_eq!(window(&c, day(2026, 3, 8)), ChallengeWindow::AfterEnd);
    }

    #[test]
    fn challenge_days_are_inclusive() {
        let c = challenge(day(2026, 2, 27), day(2026, 3, 2));
        let days = challenge_days(&c);
        assert_eq!(days.len(), 4);
        assert_eq!(duration_days(&c), 4);
        assert_eq!(days.first(), Some(&day(2026, 2, 27)));
        assert_eq!(days.last(), Some(&day(2026, 3, 2)));
        assert!(is_last_day(&c, day(2026, 3, 2)));
        assert!(!is_last_day(&c, day(2026, 3, 1)));
    }

    #[test]
    fn parse_day_is_strict() {
        assert_eq!(parse_day("2026-03-05"), Some(day(2026, 3, 5)));
        assert_eq!(parse_day("2026-3-5"), None);
        assert_eq!(parse_day("2026-02-30"), None);
        assert_eq!(parse_day("05.03.2026"), None);
        assert_eq!(date_key(day(2026, 3, 5)), "2026-03-05");
    }
}
