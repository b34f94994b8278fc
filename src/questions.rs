//! Reading and editing the per-challenge question configuration.
//!
//! The configuration is stored as free-form JSON and has accumulated several
//! shapes over time; every reader here tolerates all of them and never fails.

use crate::schedule::date_key;
use chrono::{DateTime, Datelike, NaiveDate};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};

pub const DEFAULT_SET_KEY: &str = "__default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Text,
    Boolean,
    Number,
    Select,
    Stars,
}

impl QuestionKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "text" => Some(Self::Text),
            "boolean" => Some(Self::Boolean),
            "number" => Some(Self::Number),
            "select" | "radio" => Some(Self::Select),
            "stars" => Some(Self::Stars),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceItem {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ChoiceItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stars: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quiz {
    Pre,
    Post,
}

impl Quiz {
    fn id_paths(self) -> [&'static [&'static str]; 4] {
        match self {
            Self::Pre => [&["quiz", "preId"], &["quizBefore", "id"], &["preQuizId"], &["pre", "id"]],
            Self::Post => [&["quiz", "postId"], &["quizAfter", "id"], &["postQuizId"], &["post", "id"]],
        }
    }

    fn question_paths(self) -> [&'static [&'static str]; 5] {
        match self {
            Self::Pre => [
                &["quiz", "pre", "questions"],
                &["quizBefore", "questions"],
                &["preQuiz", "questions"],
                &["pre", "questions"],
                &["quiz", "pre"],
            ],
            Self::Post => [
                &["quiz", "post", "questions"],
                &["quizAfter", "questions"],
                &["postQuiz", "questions"],
                &["post", "questions"],
                &["quiz", "post"],
            ],
        }
    }

    /// Prefix used by answer keys belonging to this quiz.
    pub fn answer_prefix(self) -> &'static str {
        match self {
            Self::Pre => "pre_",
            Self::Post => "post_",
        }
    }
}

const DAILY_PATHS: [&[&str]; 3] = [&["daily", "questions"], &["questionsDaily"], &["dailyQuestions"]];
const WEEKLY_PATHS: [&[&str]; 3] = [&["weekly", "questions"], &["questionsWeekly"], &["weeklyQuestions"]];

fn lookup<'a>(cfg: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(cfg, |node, key| node.get(*key))
}

fn first_array<'a>(cfg: &'a Value, paths: &[&[&str]]) -> Option<&'a Vec<Value>> {
    paths
        .iter()
        .find_map(|path| lookup(cfg, path).and_then(Value::as_array))
}

fn array_or_empty(value: Option<&Value>) -> &[Value] {
    value.and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

pub fn normalize_questions(raw: &[Value]) -> Vec<Question> {
    normalize_set(raw, "")
}

/// Questions without an explicit id get `{prefix}q{idx}`.
fn normalize_set(raw: &[Value], prefix: &str) -> Vec<Question> {
    raw.iter()
        .enumerate()
        .filter_map(|(idx, q)| normalize_question(idx, q, prefix))
        .collect()
}

fn normalize_question(idx: usize, raw: &Value, prefix: &str) -> Option<Question> {
    let fallback = |label: String| Question {
        id: format!("{prefix}q{idx}"),
        label,
        kind: QuestionKind::Boolean,
        items: Vec::new(),
        stars: None,
        weight: None,
    };

    match raw {
        Value::String(label) => Some(fallback(label.clone())),
        Value::Object(obj) => {
            let typed = (obj.get("id"), obj.get("label"), obj.get("type"));
            if let (Some(id), Some(label), Some(Value::String(kind))) = typed {
                if let Some(kind) = QuestionKind::parse(kind) {
                    return Some(Question {
                        id: scalar_string(id),
                        label: scalar_string(label),
                        kind,
                        items: choice_items(obj.get("items")),
                        stars: obj
                            .get("stars")
                            .and_then(Value::as_u64)
                            .and_then(|s| u8::try_from(s).ok()),
                        weight: obj.get("weight").and_then(Value::as_f64).filter(|w| w.is_finite()),
                    });
                }
            }
            obj.get("text").map(|text| fallback(scalar_string(text)))
        }
        _ => None,
    }
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn choice_items(raw: Option<&Value>) -> Vec<ChoiceItem> {
    array_or_empty(raw)
        .iter()
        .filter_map(|item| {
            Some(ChoiceItem {
                id: scalar_string(item.get("id")?),
                label: scalar_string(item.get("label")?),
            })
        })
        .collect()
}

pub fn quiz_id(cfg: &Value, quiz: Quiz) -> Option<String> {
    quiz.id_paths()
        .iter()
        .find_map(|path| lookup(cfg, path).and_then(Value::as_str))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Marker stored on a day entry once the quiz was answered.
pub fn quiz_marker(quiz_id: &str) -> String {
    format!("quiz:{quiz_id}")
}

/// A quiz exists only when it has at least one usable question.
pub fn has_quiz(cfg: &Value, quiz: Quiz) -> bool {
    !quiz_questions(cfg, quiz).is_empty()
}

/// Quiz questions without an id are keyed under the quiz prefix (`pre_q0`).
pub fn quiz_questions(cfg: &Value, quiz: Quiz) -> Vec<Question> {
    first_array(cfg, &quiz.question_paths())
        .map(|raw| normalize_set(raw, quiz.answer_prefix()))
        .unwrap_or_default()
}

pub fn daily_questions(cfg: &Value) -> Vec<Question> {
    first_array(cfg, &DAILY_PATHS)
        .map(|raw| normalize_questions(raw))
        .unwrap_or_default()
}

pub fn has_weekly_config(cfg: &Value) -> bool {
    first_array(cfg, &WEEKLY_PATHS).is_some()
}

pub fn weekly_questions(cfg: &Value) -> Vec<Question> {
    first_array(cfg, &WEEKLY_PATHS)
        .map(|raw| normalize_questions(raw))
        .unwrap_or_default()
}

/// Weekly questions are due on `weekly.dayOfWeek` (0 = Sunday), Monday by default.
pub fn is_weekly_due(cfg: &Value, date: NaiveDate) -> bool {
    let desired = lookup(cfg, &["weekly", "dayOfWeek"])
        .and_then(Value::as_u64)
        .unwrap_or(1);
    u64::from(date.weekday().num_days_from_sunday()) == desired
}

fn set_days(set: &Value) -> Option<impl Iterator<Item = &str>> {
    set.get("days")
        .and_then(Value::as_array)
        .map(|days| days.iter().filter_map(Value::as_str))
}

fn set_contains(set: &Value, key: &str) -> bool {
    set_days(set).is_some_and(|mut days| days.any(|d| d == key))
}

/// Legacy configurations stored defined days as a flat list of ISO timestamps.
fn legacy_day(raw: &str) -> Option<NaiveDate> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

fn defined_sets(defined: &Map<String, Value>) -> impl Iterator<Item = (&String, &Value)> {
    defined.iter().filter(|(_, value)| value.is_object())
}

pub fn is_defined_day(cfg: &Value, date: NaiveDate) -> bool {
    let key = date_key(date);
    match cfg.get("defined") {
        Some(Value::Array(legacy)) => legacy
            .iter()
            .filter_map(Value::as_str)
            .any(|raw| legacy_day(raw) == Some(date)),
        Some(defined @ Value::Object(sets)) => {
            if defined.get("days").is_some_and(Value::is_array) {
                return set_contains(defined, &key);
            }
            defined_sets(sets).any(|(_, set)| set_contains(set, &key))
        }
        _ => false,
    }
}

pub fn defined_set_key_for_date(cfg: &Value, date: NaiveDate) -> Option<String> {
    let Some(defined @ Value::Object(sets)) = cfg.get("defined") else {
        return None;
    };
    if defined.get("days").is_some_and(Value::is_array) {
        return Some(DEFAULT_SET_KEY.to_string());
    }
    let key = date_key(date);
    defined_sets(sets)
        .find(|(_, set)| set_contains(set, &key))
        .map(|(name, _)| name.clone())
}

/// Questions shown on a defined day.
///
/// For the single-set shape with no root questions, falls back to: the only
/// set that has questions, then a set named `weekly`, then every set's
/// questions merged by id.
pub fn defined_questions_for_date(cfg: &Value, date: NaiveDate) -> Vec<Question> {
    let Some(defined @ Value::Object(sets)) = cfg.get("defined") else {
        return Vec::new();
    };
    let Some(set_key) = defined_set_key_for_date(cfg, date) else {
        return Vec::new();
    };

    if set_key != DEFAULT_SET_KEY {
        return normalize_questions(array_or_empty(
            sets.get(&set_key).and_then(|set| set.get("questions")),
        ));
    }

    let root = array_or_empty(defined.get("questions"));
    if !root.is_empty() {
        return normalize_questions(root);
    }

    let with_questions: Vec<&Value> = defined_sets(sets)
        .map(|(_, set)| set)
        .filter(|set| !array_or_empty(set.get("questions")).is_empty())
        .collect();
    if let [only] = with_questions.as_slice() {
        return normalize_questions(array_or_empty(only.get("questions")));
    }

    let weekly = array_or_empty(sets.get("weekly").and_then(|set| set.get("questions")));
    if !weekly.is_empty() {
        return normalize_questions(weekly);
    }

    let merged = merge_by_id(
        with_questions
            .iter()
            .flat_map(|set| array_or_empty(set.get("questions"))),
    );
    normalize_questions(&merged)
}

fn merge_by_id<'a>(raw: impl Iterator<Item = &'a Value>) -> Vec<Value> {
    let mut seen = HashSet::new();
    raw.filter(|q| match q.get("id").and_then(Value::as_str) {
        Some(id) => seen.insert(id.to_string()),
        None => false,
    })
    .cloned()
    .collect()
}

/// Every defined question across the root and all sets, de-duplicated by id.
pub fn all_defined_questions(cfg: &Value) -> Vec<Question> {
    let Some(defined @ Value::Object(sets)) = cfg.get("defined") else {
        return Vec::new();
    };
    let root = array_or_empty(defined.get("questions")).iter();
    let nested = defined_sets(sets).flat_map(|(_, set)| array_or_empty(set.get("questions")));
    normalize_questions(&merge_by_id(root.chain(nested)))
}

/// Union of all defined days across every supported shape, sorted.
pub fn defined_days(cfg: &Value) -> Vec<String> {
    let mut out = BTreeSet::new();
    match cfg.get("defined") {
        Some(Value::Array(legacy)) => {
            out.extend(
                legacy
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(legacy_day)
                    .map(date_key),
            );
        }
        Some(defined @ Value::Object(sets)) => {
            if let Some(days) = set_days(defined) {
                out.extend(days.map(str::to_string));
            }
            for (_, set) in defined_sets(sets) {
                if let Some(days) = set_days(set) {
                    out.extend(days.map(str::to_string));
                }
            }
        }
        _ => {}
    }
    out.into_iter().collect()
}

/// Weight per question id for every weighted question in the configuration.
pub fn question_weights(cfg: &Value) -> BTreeMap<String, f64> {
    let mut questions = daily_questions(cfg);
    questions.extend(all_defined_questions(cfg));
    questions.extend(weekly_questions(cfg));
    questions.extend(quiz_questions(cfg, Quiz::Pre));
    questions.extend(quiz_questions(cfg, Quiz::Post));

    questions
        .into_iter()
        .filter_map(|q| q.weight.map(|w| (q.id, w)))
        .collect()
}

/// True when any submitted answer belongs to the given quiz.
pub fn answers_touch_quiz(cfg: &Value, quiz: Quiz, answers: &Map<String, Value>) -> bool {
    let ids: HashSet<String> = quiz_questions(cfg, quiz).into_iter().map(|q| q.id).collect();
    answers
        .keys()
        .any(|key| key.starts_with(quiz.answer_prefix()) || ids.contains(key))
}

/// Adds a defined day, migrating the legacy list shape on the way.
pub fn add_defined_day(cfg: &mut Value, date: NaiveDate) {
    if !cfg.is_object() {
        *cfg = json!({});
    }
    let Some(root) = cfg.as_object_mut() else {
        return;
    };

    let migrated = match root.remove("defined") {
        Some(Value::Array(legacy)) => {
            let days: BTreeSet<String> = legacy
                .iter()
                .filter_map(Value::as_str)
                .filter_map(legacy_day)
                .map(date_key)
                .collect();
            json!({ "days": days.into_iter().collect::<Vec<_>>(), "questions": [] })
        }
        Some(obj @ Value::Object(_)) => obj,
        _ => json!({ "days": [], "questions": [] }),
    };
    let defined = root.entry("defined").or_insert(migrated);

    let Some(defined) = defined.as_object_mut() else {
        return;
    };
    let days = defined.entry("days").or_insert_with(|| json!([]));
    if !days.is_array() {
        *days = json!([]);
    }
    if let Some(days) = days.as_array_mut() {
        let key = date_key(date);
        if !days.iter().any(|d| d.as_str() == Some(key.as_str())) {
            days.push(Value::String(key));
        }
    }
}

/// Removes a defined day from every place it may be listed.
pub fn remove_defined_day(cfg: &mut Value, date: NaiveDate) {
    let key = date_key(date);
    let Some(defined) = cfg.get_mut("defined") else {
        return;
    };

    match defined {
        Value::Array(legacy) => {
            legacy.retain(|raw| raw.as_str().and_then(legacy_day) != Some(date));
        }
        Value::Object(sets) => {
            retain_days(sets, &key);
            for set in sets.values_mut() {
                if let Value::Object(set) = set {
                    retain_days(set, &key);
                }
            }
        }
        _ => {}
    }
}

fn retain_days(set: &mut Map<String, Value>, key: &str) {
    if let Some(Value::Array(days)) = set.get_mut("days") {
        days.retain(|d| d.as_str() != Some(key));
    }
}

/// Template used when a challenge is created without a configuration.
pub fn default_config() -> Value {
    json!({
        "quiz": {
            "preId": "pre-001",
            "pre": {
                "questions": [
                    { "id": "pre_age", "label": "Wie alt bist du?", "type": "number" },
                    { "id": "pre_city", "label": "In welcher Stadt lebst du?", "type": "text" },
                    { "id": "pre_vote", "label": "Hast du bereits gewählt?", "type": "boolean" }
                ]
            },
            "postId": "post-001",
            "post": {
                "questions": [
                    { "id": "post_knowledge", "label": "Hast du dein Wissen verbessert?", "type": "boolean" },
                    { "id": "post_comment", "label": "Was hast du gelernt?", "type": "text" }
                ]
            }
        },
        "daily": {
            "questions": [
                { "id": "d_read_news", "label": "Heute Nachrichten gelesen?", "type": "boolean" },
                { "id": "d_minutes", "label": "Wie viele Minuten für Civic-Aktivität?", "type": "number" },
                { "id": "d_note", "label": "Kurze Notiz zum Tag", "type": "text" }
            ]
        },
        "defined": {
            "days": [],
            "questions": [
                { "id": "def_event", "label": "Hast du am Event teilgenommen?", "type": "boolean" },
                { "id": "def_feedback", "label": "Kurzes Feedback zum Event", "type": "text" }
            ]
        }
    })
}
