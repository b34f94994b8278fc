use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }
}

/// A predefined, weighted civic behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub code: String,
    pub label: String,
    pub category: String,
    pub weight: i32,
    pub polarity: Polarity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub start_score: i64,
    #[serde(default)]
    pub ab_enabled: bool,
    #[serde(default)]
    pub config: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbGroup {
    A,
    B,
}

impl AbGroup {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub id: String,
    pub user_id: String,
    pub challenge_id: String,
    pub joined_at: DateTime<Utc>,
    #[serde(default)]
    pub ab_group: Option<AbGroup>,
}

/// One participant's record for a single calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayEntry {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub challenge_id: Option<String>,
    pub date: NaiveDate,
    pub total_score: i64,
    #[serde(default)]
    pub action_ids: Vec<String>,
    #[serde(default)]
    pub answers: Option<Map<String, Value>>,
    #[serde(default)]
    pub markers: Vec<String>,
    #[serde(default)]
    pub first_answer_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_answer_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_ms: Option<i64>,
}

impl DayEntry {
    pub fn has_marker(&self, marker: &str) -> bool {
        self.markers.iter().any(|m| m == marker)
    }

    pub fn add_marker(&mut self, marker: String) {
        if !self.has_marker(&marker) {
            self.markers.push(marker);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub actions: BTreeMap<String, Action>,
    #[serde(default)]
    pub users: BTreeMap<String, User>,
    #[serde(default)]
    pub admin_roles: BTreeSet<String>,
    #[serde(default)]
    pub sessions: BTreeMap<String, AuthSession>,
    #[serde(default)]
    pub challenges: BTreeMap<String, Challenge>,
    #[serde(default)]
    pub memberships: BTreeMap<String, Membership>,
    #[serde(default)]
    pub entries: BTreeMap<String, DayEntry>,
}

impl AppData {
    /// Codes are compared trimmed and case-insensitively.
    pub fn challenge_by_code(&self, code: &str) -> Option<&Challenge> {
        let code = code.trim();
        self.challenges.values().find(|c| c.code.eq_ignore_ascii_case(code))
    }

    pub fn user_by_username(&self, username: &str) -> Option<&User> {
        self.users.values().find(|u| u.username == username)
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin_roles.contains(user_id)
    }

    pub fn membership(&self, user_id: &str, challenge_id: &str) -> Option<&Membership> {
        self.memberships
            .values()
            .find(|m| m.user_id == user_id && m.challenge_id == challenge_id)
    }

    /// Memberships of a user, most recently joined first.
    pub fn memberships_of(&self, user_id: &str) -> Vec<&Membership> {
        let mut out: Vec<&Membership> = self
            .memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .collect();
        out.sort_by(|a, b| b.joined_at.cmp(&a.joined_at));
        out
    }

    /// Memberships of a challenge in join order.
    pub fn members_of(&self, challenge_id: &str) -> Vec<&Membership> {
        let mut out: Vec<&Membership> = self
            .memberships
            .values()
            .filter(|m| m.challenge_id == challenge_id)
            .collect();
        out.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)));
        out
    }

    pub fn entry_for(&self, user_id: &str, challenge_id: &str, date: NaiveDate) -> Option<&DayEntry> {
        self.entries.values().find(|e| {
            e.user_id == user_id && e.challenge_id.as_deref() == Some(challenge_id) && e.date == date
        })
    }

    /// Entries of one user in one challenge, oldest first.
    pub fn entries_of(&self, user_id: &str, challenge_id: &str) -> Vec<&DayEntry> {
        let mut out: Vec<&DayEntry> = self
            .entries
            .values()
            .filter(|e| e.user_id == user_id && e.challenge_id.as_deref() == Some(challenge_id))
            .collect();
        out.sort_by_key(|e| e.date);
        out
    }

    /// All entries recorded in a challenge, oldest first.
    pub fn challenge_entries(&self, challenge_id: &str) -> Vec<&DayEntry> {
        let mut out: Vec<&DayEntry> = self
            .entries
            .values()
            .filter(|e| e.challenge_id.as_deref() == Some(challenge_id))
            .collect();
        out.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.user_id.cmp(&b.user_id)));
        out
    }

    /// Actions ordered by category, then label.
    pub fn sorted_actions(&self) -> Vec<&Action> {
        let mut out: Vec<&Action> = self.actions.values().collect();
        out.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.label.cmp(&b.label)));
        out
    }

    /// Removes a challenge with its memberships and entries.
    pub fn delete_challenge(&mut self, challenge_id: &str) -> Option<Challenge> {
        let removed = self.challenges.remove(challenge_id)?;
        self.entries
            .retain(|_, e| e.challenge_id.as_deref() != Some(challenge_id));
        self.memberships.retain(|_, m| m.challenge_id != challenge_id);
        Some(removed)
    }

    /// Drops entries recorded outside of any challenge and returns how many went.
    pub fn remove_unassigned_entries(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.challenge_id.is_some());
        before - self.entries.len()
    }
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
