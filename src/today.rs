//! The participant's daily view: which challenge is active, which question
//! sets are due and how far the participant has come.

use crate::ab::{effective_group, scores_visible};
use crate::models::{AbGroup, AppData, Challenge, DayEntry, Membership};
use crate::payloads::{ChallengeSummary, QuestionSets, SwitcherItem, TodayView};
use crate::questions::{
    answers_touch_quiz, daily_questions, defined_questions_for_date, has_quiz, has_weekly_config,
    is_defined_day, is_weekly_due, quiz_id, quiz_marker, quiz_questions, weekly_questions, Quiz,
};
use crate::schedule::{date_key, is_last_day, window, ChallengeWindow};
use crate::stats::{build_day_grid, build_summary, running_total, score_on};
use chrono::NaiveDate;
use serde_json::Map;

#[derive(Debug, Clone, Copy)]
pub struct TodayContext<'a> {
    pub user_id: &'a str,
    pub day: NaiveDate,
    pub dev_mode: bool,
    pub ab_override: Option<AbGroup>,
}

/// The selected challenge when the user is a member of it, otherwise the most
/// recently joined one.
pub fn select_membership<'a>(
    data: &'a AppData,
    user_id: &str,
    selected_code: Option<&str>,
) -> Option<&'a Membership> {
    let memberships = data.memberships_of(user_id);
    selected_code
        .and_then(|code| {
            memberships.iter().copied().find(|m| {
                data.challenges
                    .get(&m.challenge_id)
                    .is_some_and(|c| c.code == code)
            })
        })
        .or_else(|| memberships.first().copied())
}

pub fn switcher_items(
    data: &AppData,
    user_id: &str,
    selected_code: Option<&str>,
    day: NaiveDate,
) -> Vec<SwitcherItem> {
    data.memberships_of(user_id)
        .into_iter()
        .filter_map(|m| data.challenges.get(&m.challenge_id))
        .map(|c| SwitcherItem {
            id: c.id.clone(),
            code: c.code.clone(),
            title: c.title.clone(),
            open_today: window(c, day) == ChallengeWindow::Active
                && data.entry_for(user_id, &c.id, day).is_none(),
            selected: selected_code == Some(c.code.as_str()),
        })
        .collect()
}

/// A quiz counts as done once any entry carries its marker or holds answers
/// to its questions.
pub fn quiz_done(challenge: &Challenge, entries: &[&DayEntry], quiz: Quiz) -> bool {
    let marker = quiz_id(&challenge.config, quiz).map(|id| quiz_marker(&id));
    entries.iter().any(|e| {
        marker.as_deref().is_some_and(|m| e.has_marker(m))
            || e
                .answers
                .as_ref()
                .is_some_and(|answers| answers_touch_quiz(&challenge.config, quiz, answers))
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Gates {
    pub pre_done: bool,
    pub post_done: bool,
    pub is_defined_day: bool,
    pub show_weekly: bool,
    pub last_day: bool,
    pub show_only_pre: bool,
}

pub fn gates_for(challenge: &Challenge, entries: &[&DayEntry], day: NaiveDate) -> Gates {
    let cfg = &challenge.config;
    let pre_done = quiz_done(challenge, entries, Quiz::Pre);
    Gates {
        pre_done,
        post_done: quiz_done(challenge, entries, Quiz::Post),
        is_defined_day: is_defined_day(cfg, day),
        show_weekly: has_weekly_config(cfg) && is_weekly_due(cfg, day),
        last_day: is_last_day(challenge, day),
        show_only_pre: has_quiz(cfg, Quiz::Pre) && !pre_done,
    }
}

/// Question sets due on `day`. The pre quiz comes first: until it is done
/// nothing else is offered.
pub fn questions_for_day(challenge: &Challenge, gates: &Gates, day: NaiveDate) -> QuestionSets {
    let cfg = &challenge.config;
    if gates.show_only_pre {
        return QuestionSets {
            pre: quiz_questions(cfg, Quiz::Pre),
            ..QuestionSets::default()
        };
    }
    QuestionSets {
        pre: Vec::new(),
        post: if gates.last_day && !gates.post_done {
            quiz_questions(cfg, Quiz::Post)
        } else {
            Vec::new()
        },
        daily: daily_questions(cfg),
        defined: if gates.is_defined_day {
            defined_questions_for_date(cfg, day)
        } else {
            Vec::new()
        },
        weekly: if gates.show_weekly {
            weekly_questions(cfg)
        } else {
            Vec::new()
        },
    }
}

fn empty_view(ctx: &TodayContext<'_>) -> TodayView {
    TodayView {
        day: date_key(ctx.day),
        dev_mode: ctx.dev_mode,
        challenge: None,
        ab_group: None,
        scores_visible: true,
        before_start: false,
        after_end: false,
        days: Vec::new(),
        today_score: None,
        running_total: None,
        has_today: false,
        pre_done: false,
        post_done: false,
        is_defined_day: false,
        show_weekly: false,
        last_day: false,
        show_only_pre: false,
        questions: QuestionSets::default(),
        selected_actions: Vec::new(),
        answers: Map::new(),
        stats: None,
    }
}

pub fn build_today_view(data: &AppData, membership: Option<&Membership>, ctx: TodayContext<'_>) -> TodayView {
    let Some(challenge) = membership.and_then(|m| data.challenges.get(&m.challenge_id)) else {
        return empty_view(&ctx);
    };

    let group = effective_group(membership, ctx.ab_override);
    let show_scores = scores_visible(challenge.ab_enabled, group);
    let entries = data.entries_of(ctx.user_id, &challenge.id);
    let today_entry = data.entry_for(ctx.user_id, &challenge.id, ctx.day);
    let current = window(challenge, ctx.day);
    let active = current == ChallengeWindow::Active;

    let mut gates = gates_for(challenge, &entries, ctx.day);
    if !active {
        gates.show_only_pre = false;
    }
    let questions = if active {
        questions_for_day(challenge, &gates, ctx.day)
    } else {
        QuestionSets::default()
    };

    TodayView {
        day: date_key(ctx.day),
        dev_mode: ctx.dev_mode,
        challenge: Some(ChallengeSummary::from(challenge)),
        ab_group: group.map(|g| g.as_str().to_string()),
        scores_visible: show_scores,
        before_start: current == ChallengeWindow::BeforeStart,
        after_end: current == ChallengeWindow::AfterEnd,
        days: build_day_grid(challenge, &entries, ctx.day, show_scores),
        today_score: (active && show_scores).then(|| score_on(&entries, ctx.day)),
        running_total: (active && show_scores).then(|| running_total(challenge, &entries)),
        has_today: today_entry.is_some(),
        pre_done: gates.pre_done,
        post_done: gates.post_done,
        is_defined_day: gates.is_defined_day,
        show_weekly: gates.show_weekly,
        last_day: gates.last_day,
        show_only_pre: gates.show_only_pre,
        questions,
        selected_actions: today_entry.map(|e| e.action_ids.clone()).unwrap_or_default(),
        answers: today_entry
            .and_then(|e| e.answers.clone())
            .unwrap_or_default(),
        stats: (current == ChallengeWindow::AfterEnd).then(|| build_summary(challenge, &entries, show_scores)),
    }
}
