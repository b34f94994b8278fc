use crate::ab::group_for_new_member;
use crate::auth::{
    create_session, destroy_session, hash_password, is_admin, removal_cookie, require_user,
    selected_challenge_cookie, session_cookie, session_user, verify_password, SELECTED_CHALLENGE_COOKIE,
    SESSION_COOKIE,
};
use crate::errors::AppError;
use crate::models::{new_id, AbGroup, AppData, Membership, Polarity, User};
use crate::onboarding::checklist;
use crate::payloads::{
    AccountResponse, ActionView, ChecklistItem, CodeRequest, HealthResponse, HistoryRow, JoinResponse,
    LoginRequest, MeResponse, OkResponse, PreviewRequest, PreviewResponse, RegisterRequest, SubmitRequest,
    SubmitResponse, SwitcherItem, TodayQuery, TodayView, UsernameSuggestion,
};
use crate::schedule::{parse_day, today};
use crate::state::AppState;
use crate::storage::persist_data;
use crate::submission::{preview_score, record_submission, Submission};
use crate::today::{build_today_view, select_membership, switcher_items, TodayContext};
use crate::ui::render_index;
use crate::usernames::suggest_unique;
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{Html, Redirect},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use tracing::{info, warn};

const MIN_CREDENTIAL_LEN: usize = 3;

pub async fn index() -> Html<String> {
    Html(render_index(&crate::schedule::date_key(today())))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap, jar: CookieJar) -> Json<MeResponse> {
    let mut data = state.data.lock().await;
    let user = session_user(&mut data, &jar, Utc::now());
    let admin = is_admin(&state.config, &data, user.as_ref(), &headers, &jar);
    Json(MeResponse {
        is_logged_in: user.is_some(),
        is_admin: admin,
        user_id: user.as_ref().map(|u| u.id.clone()),
        username: user.map(|u| u.username),
    })
}

pub async fn suggest_username(State(state): State<AppState>) -> Json<UsernameSuggestion> {
    let data = state.data.lock().await;
    Json(UsernameSuggestion {
        username: suggest_unique(&data),
    })
}

pub async fn list_actions(State(state): State<AppState>) -> Json<Vec<ActionView>> {
    let data = state.data.lock().await;
    Json(data.sorted_actions().into_iter().map(ActionView::from).collect())
}

fn long_enough(value: &str) -> bool {
    value.chars().count() >= MIN_CREDENTIAL_LEN
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<AccountResponse>), AppError> {
    if !long_enough(&payload.password) {
        return Err(AppError::bad_request("password_too_short"));
    }
    let chosen = payload
        .username
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);
    if chosen.as_deref().is_some_and(|name| !long_enough(name)) {
        return Err(AppError::bad_request("username_too_short"));
    }

    let password_hash = hash_password(payload.password, state.config.bcrypt_cost).await?;

    let mut data = state.data.lock().await;
    let username = match chosen {
        Some(name) if data.user_by_username(&name).is_some() => {
            return Err(AppError::conflict("username_taken"));
        }
        Some(name) => name,
        None => suggest_unique(&data),
    };

    let now = Utc::now();
    let user = User {
        id: new_id(),
        username,
        password_hash,
        created_at: now,
    };
    let first_user = data.users.is_empty();
    data.users.insert(user.id.clone(), user.clone());
    if first_user {
        data.admin_roles.insert(user.id.clone());
    }
    let session = create_session(&mut data, &user.id, state.config.session_days, now);
    persist_data(&state.config.data_path, &data).await?;
    info!(user = %user.id, username = %user.username, admin = first_user, "registered");

    Ok((
        jar.add(session_cookie(session.token, &state.config)),
        Json(AccountResponse {
            ok: true,
            user_id: user.id,
            username: user.username,
            is_admin: first_user,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AccountResponse>), AppError> {
    let username = payload.username.trim().to_string();
    if !long_enough(&username) || !long_enough(&payload.password) {
        return Err(AppError::bad_request("invalid_credentials"));
    }

    let (user_id, hash) = {
        let data = state.data.lock().await;
        match data.user_by_username(&username) {
            Some(user) => (user.id.clone(), user.password_hash.clone()),
            None => {
                warn!(username = %username, "login for unknown user");
                return Err(AppError::unauthorized());
            }
        }
    };
    if !verify_password(payload.password, hash).await {
        warn!(user = %user_id, "login with wrong password");
        return Err(AppError::unauthorized());
    }

    let mut data = state.data.lock().await;
    let session = create_session(&mut data, &user_id, state.config.session_days, Utc::now());
    persist_data(&state.config.data_path, &data).await?;
    let admin = data.is_admin(&user_id);
    info!(user = %user_id, "logged in");

    Ok((
        jar.add(session_cookie(session.token, &state.config)),
        Json(AccountResponse {
            ok: true,
            user_id,
            username,
            is_admin: admin,
        }),
    ))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<(CookieJar, Json<OkResponse>), AppError> {
    let mut data = state.data.lock().await;
    if destroy_session(&mut data, &jar) {
        persist_data(&state.config.data_path, &data).await?;
    }
    Ok((jar.remove(removal_cookie(SESSION_COOKIE)), Json(OkResponse::ok())))
}

/// Adds the user to the challenge with `code` unless already a member.
fn join_challenge(data: &mut AppData, user_id: &str, code: &str) -> Result<JoinResponse, AppError> {
    let code = code.trim().to_uppercase();
    let challenge = data
        .challenge_by_code(&code)
        .cloned()
        .ok_or_else(|| AppError::not_found("challenge_not_found"))?;

    if let Some(existing) = data.membership(user_id, &challenge.id) {
        return Ok(JoinResponse {
            ok: true,
            challenge_id: challenge.id.clone(),
            code: challenge.code.clone(),
            title: challenge.title.clone(),
            already_member: true,
            ab_group: existing.ab_group.map(|g| g.as_str().to_string()),
        });
    }

    let ab_group = challenge
        .ab_enabled
        .then(|| group_for_new_member(data, &challenge.id));
    let membership = Membership {
        id: new_id(),
        user_id: user_id.to_string(),
        challenge_id: challenge.id.clone(),
        joined_at: Utc::now(),
        ab_group,
    };
    data.memberships.insert(membership.id.clone(), membership);
    info!(user = %user_id, challenge = %challenge.code, group = ?ab_group, "joined challenge");

    Ok(JoinResponse {
        ok: true,
        challenge_id: challenge.id,
        code: challenge.code,
        title: challenge.title,
        already_member: false,
        ab_group: ab_group.map(|g| g.as_str().to_string()),
    })
}

pub async fn join(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<CodeRequest>,
) -> Result<(CookieJar, Json<JoinResponse>), AppError> {
    let mut data = state.data.lock().await;
    let user = require_user(&mut data, &jar, Utc::now())?;
    let joined = join_challenge(&mut data, &user.id, &payload.code)?;
    if !joined.already_member {
        persist_data(&state.config.data_path, &data).await?;
    }
    Ok((jar.add(selected_challenge_cookie(joined.code.clone())), Json(joined)))
}

/// Join links send visitors without a session to the start page first.
pub async fn join_link(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(code): Path<String>,
) -> Result<(CookieJar, Redirect), AppError> {
    let mut data = state.data.lock().await;
    let Some(user) = session_user(&mut data, &jar, Utc::now()) else {
        let code = code.trim().to_uppercase();
        if data.challenge_by_code(&code).is_none() {
            return Err(AppError::not_found("challenge_not_found"));
        }
        return Ok((jar, Redirect::to(&format!("/?join={code}"))));
    };
    let joined = join_challenge(&mut data, &user.id, &code)?;
    if !joined.already_member {
        persist_data(&state.config.data_path, &data).await?;
    }
    Ok((jar.add(selected_challenge_cookie(joined.code)), Redirect::to("/")))
}

pub async fn select_challenge(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<CodeRequest>,
) -> Result<(CookieJar, Json<OkResponse>), AppError> {
    let mut data = state.data.lock().await;
    let user = require_user(&mut data, &jar, Utc::now())?;
    let challenge = data
        .challenge_by_code(&payload.code)
        .ok_or_else(|| AppError::not_found("challenge_not_found"))?;
    if data.membership(&user.id, &challenge.id).is_none() {
        return Err(AppError::forbidden("not_a_member"));
    }
    Ok((jar.add(selected_challenge_cookie(challenge.code.clone())), Json(OkResponse::ok())))
}

fn selected_code(jar: &CookieJar) -> Option<String> {
    jar.get(SELECTED_CHALLENGE_COOKIE).map(|c| c.value().to_string())
}

pub async fn memberships(State(state): State<AppState>, jar: CookieJar) -> Result<Json<Vec<SwitcherItem>>, AppError> {
    let mut data = state.data.lock().await;
    let user = require_user(&mut data, &jar, Utc::now())?;
    let selected = selected_code(&jar);
    Ok(Json(switcher_items(&data, &user.id, selected.as_deref(), today())))
}

fn dev_flag(raw: Option<&str>) -> bool {
    matches!(raw, Some("1") | Some("true"))
}

pub async fn get_today(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Query(query): Query<TodayQuery>,
) -> Result<(CookieJar, Json<TodayView>), AppError> {
    let mut data = state.data.lock().await;
    let user = require_user(&mut data, &jar, Utc::now())?;
    let dev_mode = dev_flag(query.dev.as_deref()) && is_admin(&state.config, &data, Some(&user), &headers, &jar);

    let day = query
        .day
        .as_deref()
        .filter(|_| dev_mode)
        .and_then(parse_day)
        .unwrap_or_else(today);
    let ab_override = query
        .ab
        .as_deref()
        .filter(|_| dev_mode)
        .and_then(AbGroup::parse);

    let selected = selected_code(&jar);
    let membership = select_membership(&data, &user.id, selected.as_deref());
    let current_code = membership
        .and_then(|m| data.challenges.get(&m.challenge_id))
        .map(|c| c.code.clone());

    let view = build_today_view(
        &data,
        membership,
        TodayContext {
            user_id: &user.id,
            day,
            dev_mode,
            ab_override,
        },
    );

    let jar = match current_code {
        Some(code) if selected.as_deref() != Some(code.as_str()) => jar.add(selected_challenge_cookie(code)),
        _ => jar,
    };
    Ok((jar, Json(view)))
}

pub async fn submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    let now = Utc::now();
    let mut data = state.data.lock().await;
    let user = require_user(&mut data, &jar, now)?;
    let challenge = data
        .challenge_by_code(&payload.challenge_code)
        .map(|c| (c.id.clone(), c.code.clone()))
        .ok_or_else(|| AppError::bad_request("unknown_challenge"))?;
    let (challenge_id, challenge_code) = challenge;
    if data.membership(&user.id, &challenge_id).is_none() {
        return Err(AppError::forbidden("not_a_member"));
    }

    let day = today();
    let total = record_submission(&mut data, &user.id, &challenge_id, day, Submission::from(payload), now);
    persist_data(&state.config.data_path, &data).await?;
    info!(user = %user.id, challenge = %challenge_code, date = %day, total, "day submitted");

    Ok(Json(SubmitResponse { ok: true, total }))
}

pub async fn score_preview(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    let mut data = state.data.lock().await;
    require_user(&mut data, &jar, Utc::now())?;
    let challenge_id = data
        .challenge_by_code(&payload.challenge_code)
        .map(|c| c.id.clone())
        .ok_or_else(|| AppError::bad_request("unknown_challenge"))?;
    let score = preview_score(&data, &challenge_id, &payload.selected, &payload.answers);
    Ok(Json(PreviewResponse {
        from_actions: score.from_actions,
        from_answers: score.from_answers,
        total: score.total(),
    }))
}

pub async fn history(State(state): State<AppState>, jar: CookieJar) -> Result<Json<Vec<HistoryRow>>, AppError> {
    let mut data = state.data.lock().await;
    let user = require_user(&mut data, &jar, Utc::now())?;

    let mut entries: Vec<_> = data.entries.values().filter(|e| e.user_id == user.id).collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.submitted_at.cmp(&a.submitted_at)));

    let rows = entries
        .into_iter()
        .map(|entry| {
            let actions: Vec<_> = entry
                .action_ids
                .iter()
                .filter_map(|id| data.actions.get(id))
                .collect();
            HistoryRow {
                entry_id: entry.id.clone(),
                date: entry.date.to_string(),
                challenge_code: entry
                    .challenge_id
                    .as_ref()
                    .and_then(|id| data.challenges.get(id))
                    .map(|c| c.code.clone()),
                total_score: entry.total_score,
                positive: actions.iter().filter(|a| a.polarity == Polarity::Positive).count(),
                negative: actions.iter().filter(|a| a.polarity == Polarity::Negative).count(),
                actions: actions.iter().map(|a| a.label.clone()).collect(),
            }
        })
        .collect();
    Ok(Json(rows))
}

pub async fn onboarding(State(state): State<AppState>, jar: CookieJar) -> Json<Vec<ChecklistItem>> {
    let mut data = state.data.lock().await;
    let user = session_user(&mut data, &jar, Utc::now());
    Json(checklist(&data, user.as_ref().map(|u| u.id.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn data_with_challenge(ab_enabled: bool) -> AppData {
        let mut data = AppData::default();
        data.challenges.insert(
            "c1".into(),
            crate::models::Challenge {
                id: "c1".into(),
                code: "CIVIC1".into(),
                title: "Civic".into(),
                description: String::new(),
                start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 3, 7).unwrap(),
                start_score: 0,
                ab_enabled,
                config: serde_json::json!({}),
                created_at: Utc::now(),
            },
        );
        data
    }

    #[test]
    fn joining_twice_is_a_no_op() {
        let mut data = data_with_challenge(false);
        let first = join_challenge(&mut data, "u1", " civic1 ").unwrap();
        assert!(!first.already_member);
        assert_eq!(first.code, "CIVIC1");
        assert!(first.ab_group.is_none());

        let second = join_challenge(&mut data, "u1", "CIVIC1").unwrap();
        assert!(second.already_member);
        assert_eq!(data.memberships.len(), 1);
    }

    #[test]
    fn joining_ab_challenge_assigns_a_group() {
        let mut data = data_with_challenge(true);
        let a = join_challenge(&mut data, "u1", "CIVIC1").unwrap();
        let b = join_challenge(&mut data, "u2", "CIVIC1").unwrap();
        let groups = [a.ab_group.unwrap(), b.ab_group.unwrap()];
        assert!(groups.contains(&"A".to_string()));
        assert!(groups.contains(&"B".to_string()));
    }

    #[test]
    fn unknown_code_is_not_found() {
        let mut data = data_with_challenge(false);
        let err = join_challenge(&mut data, "u1", "NOPE42").unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn dev_flag_accepts_one_and_true() {
        assert!(dev_flag(Some("1")));
        assert!(dev_flag(Some("true")));
        assert!(!dev_flag(Some("yes")));
        assert!(!dev_flag(None));
    }
}
