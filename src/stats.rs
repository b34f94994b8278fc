use crate::models::{Challenge, DayEntry};
use crate::schedule::{challenge_days, date_key};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Done,
    Missed,
    Pending,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayPoint {
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    pub has_entry: bool,
    pub is_today: bool,
    pub status: DayStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeStats {
    pub days_with_entry: usize,
    pub total_days: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_score_active: Option<f64>,
    pub completion_rate: u32,
    pub longest_streak: usize,
    pub total_actions: usize,
}

fn by_date<'a>(entries: &[&'a DayEntry]) -> BTreeMap<NaiveDate, &'a DayEntry> {
    entries.iter().map(|e| (e.date, *e)).collect()
}

/// One point per challenge day. Scores are omitted when `show_scores` is off.
pub fn build_day_grid(
    challenge: &Challenge,
    entries: &[&DayEntry],
    today: NaiveDate,
    show_scores: bool,
) -> Vec<DayPoint> {
    let entries = by_date(entries);
    challenge_days(challenge)
        .into_iter()
        .map(|date| {
            let entry = entries.get(&date);
            let status = match entry {
                Some(_) => DayStatus::Done,
                None if date < today => DayStatus::Missed,
                None => DayStatus::Pending,
            };
            DayPoint {
                date: date_key(date),
                score: show_scores.then(|| entry.map_or(0, |e| e.total_score)),
                has_entry: entry.is_some(),
                is_today: date == today,
                status,
            }
        })
        .collect()
}

pub fn score_on(entries: &[&DayEntry], date: NaiveDate) -> i64 {
    entries
        .iter()
        .find(|e| e.date == date)
        .map_or(0, |e| e.total_score)
}

/// Start score plus every day's score.
pub fn running_total(challenge: &Challenge, entries: &[&DayEntry]) -> i64 {
    challenge.start_score + entries.iter().map(|e| e.total_score).sum::<i64>()
}

pub fn longest_streak(days: &[NaiveDate], entries: &[&DayEntry]) -> usize {
    let entries = by_date(entries);
    let mut longest = 0;
    let mut current = 0;
    for day in days {
        if entries.contains_key(day) {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// End-of-challenge summary for one participant.
pub fn build_summary(challenge: &Challenge, entries: &[&DayEntry], show_scores: bool) -> ChallengeStats {
    let days = challenge_days(challenge);
    let in_window: Vec<&DayEntry> = entries
        .iter()
        .copied()
        .filter(|e| e.date >= challenge.start_date && e.date <= challenge.end_date)
        .collect();

    let total_days = days.len();
    let days_with_entry = in_window.len();
    let total_score: i64 = in_window.iter().map(|e| e.total_score).sum();
    let avg_score_active = if days_with_entry > 0 {
        (total_score as f64 / days_with_entry as f64 * 10.0).round() / 10.0
    } else {
        0.0
    };
    let completion_rate = if total_days > 0 {
        (days_with_entry as f64 / total_days as f64 * 100.0).round() as u32
    } else {
        0
    };

    ChallengeStats {
        days_with_entry,
        total_days,
        total_score: show_scores.then_some(total_score),
        avg_score_active: show_scores.then_some(avg_score_active),
        completion_rate,
        longest_streak: longest_streak(&days, &in_window),
        total_actions: in_window.iter().map(|e| e.action_ids.len()).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::Value;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn challenge() -> Challenge {
        Challenge {
            id: "c1".into(),
            code: "ABC234".into(),
            title: "Test".into(),
            description: String::new(),
            start_date: day(2026, 3, 1),
            end_date: day(2026, 3, 7),
            start_score: 10,
            ab_enabled: false,
            config: Value::Null,
            created_at: Utc::now(),
        }
    }

    fn entry(date: NaiveDate, score: i64, actions: usize) -> DayEntry {
        DayEntry {
            id: format!("e-{date}"),
            user_id: "u1".into(),
            challenge_id: Some("c1".into()),
            date,
            total_score: score,
            action_ids: (0..actions).map(|i| format!("a{i}")).collect(),
            answers: None,
            markers: Vec::new(),
            first_answer_at: None,
            last_answer_at: None,
            submitted_at: None,
            duration_ms: None,
        }
    }

    #[test]
    fn grid_marks_done_missed_and_pending() {
        let c = challenge();
        let entries = [entry(day(2026, 3, 2), 4, 1)];
        let refs: Vec<&DayEntry> = entries.iter().collect();
        let grid = build_day_grid(&c, &refs, day(2026, 3, 3), true);

        assert_eq!(grid.len(), 7);
        assert_eq!(grid[0].status, DayStatus::Missed);
        assert_eq!(grid[1].status, DayStatus::Done);
        assert_eq!(grid[1].score, Some(4));
        assert_eq!(grid[2].status, DayStatus::Pending);
        assert!(grid[2].is_today);
        assert_eq!(grid[6].status, DayStatus::Pending);
    }

    #[test]
    fn grid_hides_scores_when_requested() {
        let c = challenge();
        let entries = [entry(day(2026, 3, 2), 4, 1)];
        let refs: Vec<&DayEntry> = entries.iter().collect();
        let grid = build_day_grid(&c, &refs, day(2026, 3, 3), false);
        assert!(grid.iter().all(|p| p.score.is_none()));
        assert!(grid[1].has_entry);
    }

    #[test]
    fn summary_computes_rates_and_streaks() {
        let c = challenge();
        let entries: Vec<DayEntry> = [1, 2, 3, 5, 6]
            .into_iter()
            .map(|d| entry(day(2026, 3, d), 3, 2))
            .chain(std::iter::once(entry(day(2026, 3, 1) - Duration::days(3), 100, 9)))
            .collect();
        let refs: Vec<&DayEntry> = entries.iter().collect();
        let stats = build_summary(&c, &refs, true);

        assert_eq!(stats.total_days, 7);
        assert_eq!(stats.days_with_entry, 5);
        assert_eq!(stats.total_score, Some(15));
        assert_eq!(stats.avg_score_active, Some(3.0));
        assert_eq!(stats.completion_rate, 71);
        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.total_actions, 10);
    }

    #[test]
    fn summary_of_empty_challenge() {
        let c = challenge();
        let stats = build_summary(&c, &[], false);
        assert_eq!(stats.days_with_entry, 0);
        assert_eq!(stats.completion_rate, 0);
        assert_eq!(stats.longest_streak, 0);
        assert_eq!(stats.total_score, None);
    }

    #[test]
    fn running_total_starts_from_start_score() {
        let c = challenge();
        let entries = [entry(day(2026, 3, 1), 4, 0), entry(day(2026, 3, 2), -6, 0)];
        let refs: Vec<&DayEntry> = entries.iter().collect();
        assert_eq!(running_total(&c, &refs), 8);
        assert_eq!(score_on(&refs, day(2026, 3, 2)), -6);
        assert_eq!(score_on(&refs, day(2026, 3, 3)), 0);
    }
}
