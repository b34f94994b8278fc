use crate::models::{new_id, AppData, DayEntry};
use crate::payloads::SubmitRequest;
use crate::questions::{answers_touch_quiz, question_weights, quiz_id, quiz_marker, Quiz};
use crate::scoring::{score_day, DayScore};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

/// Timing reported by the client; submission time defaults to the server clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timing {
    pub first_answer_at: Option<DateTime<Utc>>,
    pub last_answer_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
}

impl Timing {
    fn duration(&self) -> Option<i64> {
        self.duration_ms.map(|ms| ms.max(0)).or_else(|| {
            match (self.first_answer_at, self.last_answer_at) {
                (Some(first), Some(last)) => Some((last - first).num_milliseconds().max(0)),
                _ => None,
            }
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub selected: Vec<String>,
    pub answers: Map<String, Value>,
    pub timing: Timing,
}

impl From<SubmitRequest> for Submission {
    fn from(req: SubmitRequest) -> Self {
        Self {
            timing: Timing {
                first_answer_at: req.first_answer_at,
                last_answer_at: req.last_answer_at,
                submitted_at: req.submitted_at,
                duration_ms: req.duration_ms,
            },
            selected: req.selected,
            answers: req.answers,
        }
    }
}

/// Computes the score a submission would get without storing anything.
pub fn preview_score(data: &AppData, challenge_id: &str, selected: &[String], answers: &Map<String, Value>) -> DayScore {
    let weights = data
        .challenges
        .get(challenge_id)
        .map(|c| question_weights(&c.config))
        .unwrap_or_default();
    score_day(&data.actions, selected, &weights, answers)
}

/// Creates or replaces the entry for `(user, challenge, day)` and returns its
/// new total. Quiz markers are added once and never removed.
pub fn record_submission(
    data: &mut AppData,
    user_id: &str,
    challenge_id: &str,
    day: NaiveDate,
    submission: Submission,
    now: DateTime<Utc>,
) -> i64 {
    let Submission {
        selected,
        answers,
        timing,
    } = submission;
    let total = preview_score(data, challenge_id, &selected, &answers).total();

    let mut markers = Vec::new();
    if let Some(config) = data.challenges.get(challenge_id).map(|c| &c.config) {
        for quiz in [Quiz::Pre, Quiz::Post] {
            if answers_touch_quiz(config, quiz, &answers) {
                if let Some(id) = quiz_id(config, quiz) {
                    markers.push(quiz_marker(&id));
                }
            }
        }
    }

    let action_ids: Vec<String> = crate::scoring::resolve_actions(&data.actions, &selected)
        .into_iter()
        .map(|a| a.id.clone())
        .collect();

    let existing = data.entry_for(user_id, challenge_id, day).map(|e| e.id.clone());
    let entry_id = existing.unwrap_or_else(new_id);
    let entry = data.entries.entry(entry_id.clone()).or_insert_with(|| DayEntry {
        id: entry_id,
        user_id: user_id.to_string(),
        challenge_id: Some(challenge_id.to_string()),
        date: day,
        total_score: 0,
        action_ids: Vec::new(),
        answers: None,
        markers: Vec::new(),
        first_answer_at: None,
        last_answer_at: None,
        submitted_at: None,
        duration_ms: None,
    });

    entry.total_score = total;
    entry.action_ids = action_ids;
    entry.answers = (!answers.is_empty()).then_some(answers);
    for marker in markers {
        entry.add_marker(marker);
    }
    entry.first_answer_at = timing.first_answer_at;
    entry.last_answer_at = timing.last_answer_at;
    entry.submitted_at = Some(timing.submitted_at.unwrap_or(now));
    entry.duration_ms = timing.duration();
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed_actions;
    use crate::models::Challenge;
    use crate::questions::default_config;
    use chrono::Duration;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup(config: Value) -> AppData {
        let mut data = AppData::default();
        seed_actions(&mut data);
        data.challenges.insert(
            "c1".into(),
            Challenge {
                id: "c1".into(),
                code: "CIVIC1".into(),
                title: "Civic".into(),
                description: String::new(),
                start_date: day(2026, 3, 1),
                end_date: day(2026, 3, 7),
                start_score: 0,
                ab_enabled: false,
                config,
                created_at: Utc::now(),
            },
        );
        data
    }

    fn action_id(data: &AppData, code: &str) -> String {
        data.actions
            .values()
            .find(|a| a.code == code)
            .map(|a| a.id.clone())
            .unwrap()
    }

    fn answering(value: Value) -> Submission {
        Submission {
            answers: value.as_object().cloned().unwrap(),
            ..Submission::default()
        }
    }

    fn selecting(ids: &[&String]) -> Submission {
        Submission {
            selected: ids.iter().map(|id| id.to_string()).collect(),
            ..Submission::default()
        }
    }

    #[test]
    fn resubmission_replaces_the_day_entry() {
        let mut data = setup(json!({}));
        let donation = action_id(&data, "COMM_DONATION");
        let help = action_id(&data, "PUBLIC_HELP");
        let now = Utc::now();

        let first = record_submission(&mut data, "u1", "c1", day(2026, 3, 2), selecting(&[&donation, &help]), now);
        assert_eq!(first, 5 + 2);

        let second = record_submission(&mut data, "u1", "c1", day(2026, 3, 2), selecting(&[&help, &help]), now);
        assert_eq!(second, 2);
        assert_eq!(data.entries.len(), 1);

        let entry = data.entry_for("u1", "c1", day(2026, 3, 2)).unwrap();
        assert_eq!(entry.action_ids, vec![help]);
        assert_eq!(entry.total_score, 2);
        assert!(entry.answers.is_none());
        assert_eq!(entry.submitted_at, Some(now));
    }

    #[test]
    fn weighted_answers_count_towards_total() {
        let config = json!({
            "daily": { "questions": [
                { "id": "read", "label": "Read?", "type": "boolean", "weight": 2 },
                { "id": "minutes", "label": "Minutes", "type": "number", "weight": 0.5 }
            ] }
        });
        let mut data = setup(config);
        let total = record_submission(
            &mut data,
            "u1",
            "c1",
            day(2026, 3, 3),
            answering(json!({ "read": true, "minutes": 7, "note": "hi" })),
            Utc::now(),
        );
        assert_eq!(total, 2 + 4);
    }

    #[test]
    fn quiz_answers_set_markers() {
        let mut data = setup(default_config());
        record_submission(
            &mut data,
            "u1",
            "c1",
            day(2026, 3, 1),
            answering(json!({ "pre_age": 31 })),
            Utc::now(),
        );
        let entry = data.entry_for("u1", "c1", day(2026, 3, 1)).unwrap();
        assert_eq!(entry.markers, vec!["quiz:pre-001".to_string()]);

        record_submission(
            &mut data,
            "u1",
            "c1",
            day(2026, 3, 1),
            answering(json!({ "post_knowledge": true })),
            Utc::now(),
        );
        let entry = data.entry_for("u1", "c1", day(2026, 3, 1)).unwrap();
        assert_eq!(entry.markers, vec!["quiz:pre-001".to_string(), "quiz:post-001".to_string()]);
    }

    #[test]
    fn duration_is_derived_from_answer_times() {
        let mut data = setup(json!({}));
        let first = Utc::now();
        let timing = Timing {
            first_answer_at: Some(first),
            last_answer_at: Some(first + Duration::seconds(42)),
            submitted_at: None,
            duration_ms: None,
        };
        let submission = Submission {
            timing,
            ..Submission::default()
        };
        record_submission(&mut data, "u1", "c1", day(2026, 3, 4), submission, first);
        let entry = data.entry_for("u1", "c1", day(2026, 3, 4)).unwrap();
        assert_eq!(entry.duration_ms, Some(42_000));

        let backwards = Timing {
            first_answer_at: Some(first),
            last_answer_at: Some(first - Duration::seconds(5)),
            ..Timing::default()
        };
        assert_eq!(backwards.duration(), Some(0));

        let explicit = Timing {
            duration_ms: Some(1234),
            ..timing
        };
        assert_eq!(explicit.duration(), Some(1234));
    }

    #[test]
    fn preview_matches_recorded_total() {
        let mut data = setup(json!({}));
        let donation = action_id(&data, "COMM_DONATION");
        let unknown = "unknown".to_string();
        let submission = selecting(&[&donation, &unknown]);
        let preview = preview_score(&data, "c1", &submission.selected, &Map::new());
        let total = record_submission(&mut data, "u1", "c1", day(2026, 3, 5), submission, Utc::now());
        assert_eq!(preview.total(), total);
        assert_eq!(preview.from_answers, 0);
    }
}
