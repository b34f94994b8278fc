use crate::models::{Action, Challenge};
use crate::questions::Question;
use crate::stats::{ChallengeStats, DayPoint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub password: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub ok: bool,
    pub user_id: String,
    pub username: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub is_logged_in: bool,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsernameSuggestion {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct ActionView {
    pub id: String,
    pub code: String,
    pub label: String,
    pub category: String,
    pub weight: i32,
    pub polarity: &'static str,
}

impl From<&Action> for ActionView {
    fn from(action: &Action) -> Self {
        Self {
            id: action.id.clone(),
            code: action.code.clone(),
            label: action.label.clone(),
            category: action.category.clone(),
            weight: action.weight,
            polarity: action.polarity.as_str(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinResponse {
    pub ok: bool,
    pub challenge_id: String,
    pub code: String,
    pub title: String,
    pub already_member: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ab_group: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SwitcherItem {
    pub id: String,
    pub code: String,
    pub title: String,
    pub open_today: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeSummary {
    pub id: String,
    pub code: String,
    pub title: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub start_score: i64,
    pub ab_enabled: bool,
    pub duration_days: i64,
}

impl From<&Challenge> for ChallengeSummary {
    fn from(c: &Challenge) -> Self {
        Self {
            id: c.id.clone(),
            code: c.code.clone(),
            title: c.title.clone(),
            description: c.description.clone(),
            start_date: c.start_date.to_string(),
            end_date: c.end_date.to_string(),
            start_score: c.start_score,
            ab_enabled: c.ab_enabled,
            duration_days: crate::schedule::duration_days(c),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TodayQuery {
    pub day: Option<String>,
    pub dev: Option<String>,
    pub ab: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct QuestionSets {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pre: Vec<Question>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post: Vec<Question>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub daily: Vec<Question>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub defined: Vec<Question>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub weekly: Vec<Question>,
}

#[derive(Debug, Serialize)]
pub struct TodayView {
    pub day: String,
    pub dev_mode: bool,
    pub challenge: Option<ChallengeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ab_group: Option<String>,
    pub scores_visible: bool,
    pub before_start: bool,
    pub after_end: bool,
    pub days: Vec<DayPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub today_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running_total: Option<i64>,
    pub has_today: bool,
    pub pre_done: bool,
    pub post_done: bool,
    pub is_defined_day: bool,
    pub show_weekly: bool,
    pub last_day: bool,
    pub show_only_pre: bool,
    pub questions: QuestionSets,
    pub selected_actions: Vec<String>,
    pub answers: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ChallengeStats>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub selected: Vec<String>,
    #[serde(default)]
    pub answers: Map<String, Value>,
    pub challenge_code: String,
    #[serde(default)]
    pub first_answer_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_answer_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_ms: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub ok: bool,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub selected: Vec<String>,
    #[serde(default)]
    pub answers: Map<String, Value>,
    pub challenge_code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub from_actions: i64,
    pub from_answers: i64,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct HistoryRow {
    pub entry_id: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_code: Option<String>,
    pub total_score: i64,
    pub positive: usize,
    pub negative: usize,
    pub actions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ChecklistItem {
    pub id: &'static str,
    pub label: &'static str,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct CreateChallengeRequest {
    pub title: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_score: Option<i64>,
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default)]
    pub ab_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct MemberView {
    pub membership_id: String,
    pub user_id: String,
    pub username: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub ab_group: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChallengeDetails {
    pub challenge: ChallengeSummary,
    pub members: Vec<MemberView>,
    pub defined_days: Vec<String>,
    pub pre_quiz_id: Option<String>,
    pub post_quiz_id: Option<String>,
    pub questions: QuestionSets,
    pub config: Value,
}

#[derive(Debug, Deserialize)]
pub struct AbGroupRequest {
    pub id: String,
    pub group: String,
}

#[derive(Debug, Serialize)]
pub struct AbToggleResponse {
    pub ok: bool,
    pub ab_enabled: bool,
    pub assigned: usize,
}

#[derive(Debug, Deserialize)]
pub struct DefinedDayRequest {
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct DefinedDaysResponse {
    pub ok: bool,
    pub defined_days: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PreviewQuery {
    pub day: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub ok: bool,
    pub removed: usize,
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct QuestionPreview {
    pub day: String,
    pub is_defined_day: bool,
    pub show_weekly: bool,
    pub last_day: bool,
    pub questions: QuestionSets,
}
