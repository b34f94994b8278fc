//! Administrator routes: challenge management, cohorts and exports.

use crate::ab::assign_unassigned;
use crate::auth::{admin_code_cookie, codes_match, is_admin, removal_cookie, session_user, ADMIN_CODE_COOKIE};
use crate::codes::generate_unique_code;
use crate::errors::AppError;
use crate::export::{build_sheets, export_file_name, render_workbook};
use crate::models::{new_id, AbGroup, AppData, Challenge};
use crate::payloads::{
    AbGroupRequest, AbToggleResponse, ChallengeDetails, ChallengeSummary, CleanupResponse, CodeRequest,
    CreateChallengeRequest, DefinedDayRequest, DefinedDaysResponse, MemberView, OkResponse, PreviewQuery,
    QuestionPreview, QuestionSets, UserView,
};
use crate::questions::{
    add_defined_day, all_defined_questions, daily_questions, default_config, defined_days, quiz_id,
    quiz_questions, remove_defined_day, weekly_questions, Quiz,
};
use crate::schedule::{date_key, parse_day, today};
use crate::state::AppState;
use crate::storage::persist_data;
use crate::today::{gates_for, questions_for_day};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde_json::Value;
use tokio::task;
use tracing::{info, warn};

fn require_admin(state: &AppState, data: &mut AppData, headers: &HeaderMap, jar: &CookieJar) -> Result<(), AppError> {
    let user = session_user(data, jar, Utc::now());
    if is_admin(&state.config, data, user.as_ref(), headers, jar) {
        return Ok(());
    }
    match user {
        Some(_) => Err(AppError::forbidden("admin_only")),
        None => Err(AppError::unauthorized()),
    }
}

pub async fn admin_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<CodeRequest>,
) -> Result<(CookieJar, Json<OkResponse>), AppError> {
    let Some(expected) = state.config.admin_code.as_deref() else {
        return Err(AppError::forbidden("admin_code_disabled"));
    };
    if !codes_match(payload.code.trim(), expected) {
        warn!("admin code rejected");
        return Err(AppError::unauthorized());
    }
    info!("admin code accepted");
    Ok((
        jar.add(admin_code_cookie(payload.code.trim().to_string(), &state.config)),
        Json(OkResponse::ok()),
    ))
}

pub async fn admin_logout(jar: CookieJar) -> (CookieJar, Json<OkResponse>) {
    (jar.remove(removal_cookie(ADMIN_CODE_COOKIE)), Json(OkResponse::ok()))
}

pub async fn list_challenges(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Json<Vec<ChallengeSummary>>, AppError> {
    let mut data = state.data.lock().await;
    require_admin(&state, &mut data, &headers, &jar)?;
    let mut challenges: Vec<&Challenge> = data.challenges.values().collect();
    challenges.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(challenges.into_iter().map(ChallengeSummary::from).collect()))
}

fn validate_new_challenge(payload: CreateChallengeRequest) -> Result<Challenge, AppError> {
    let title = payload.title.trim().to_string();
    if title.chars().count() < 3 {
        return Err(AppError::bad_request("title_too_short"));
    }
    let start_date = parse_day(payload.start.trim()).ok_or_else(|| AppError::bad_request("invalid_start"))?;
    let end_date = parse_day(payload.end.trim()).ok_or_else(|| AppError::bad_request("invalid_end"))?;
    if end_date < start_date {
        return Err(AppError::bad_request("end_before_start"));
    }
    let start_score = payload.start_score.unwrap_or(0);
    if start_score < 0 {
        return Err(AppError::bad_request("negative_start_score"));
    }
    let config = match payload.config {
        None | Some(Value::Null) => default_config(),
        Some(config @ Value::Object(_)) => config,
        Some(_) => return Err(AppError::bad_request("config_must_be_object")),
    };

    Ok(Challenge {
        id: new_id(),
        code: String::new(),
        title,
        description: payload
            .description
            .map(|d| d.trim().to_string())
            .unwrap_or_default(),
        start_date,
        end_date,
        start_score,
        ab_enabled: payload.ab_enabled,
        config,
        created_at: Utc::now(),
    })
}

pub async fn create_challenge(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<CreateChallengeRequest>,
) -> Result<Json<ChallengeSummary>, AppError> {
    let mut challenge = validate_new_challenge(payload)?;
    let mut data = state.data.lock().await;
    require_admin(&state, &mut data, &headers, &jar)?;

    challenge.code = generate_unique_code(&data);
    let summary = ChallengeSummary::from(&challenge);
    data.challenges.insert(challenge.id.clone(), challenge);
    persist_data(&state.config.data_path, &data).await?;
    info!(challenge = %summary.code, start = %summary.start_date, end = %summary.end_date, "challenge created");

    Ok(Json(summary))
}

fn find_challenge<'a>(data: &'a AppData, id: &str) -> Result<&'a Challenge, AppError> {
    data.challenges
        .get(id)
        .ok_or_else(|| AppError::not_found("challenge_not_found"))
}

pub async fn challenge_details(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<Json<ChallengeDetails>, AppError> {
    let mut data = state.data.lock().await;
    require_admin(&state, &mut data, &headers, &jar)?;
    let challenge = find_challenge(&data, &id)?;
    let cfg = &challenge.config;

    let members = data
        .members_of(&challenge.id)
        .into_iter()
        .map(|m| MemberView {
            membership_id: m.id.clone(),
            user_id: m.user_id.clone(),
            username: data.users.get(&m.user_id).map(|u| u.username.clone()),
            joined_at: m.joined_at,
            ab_group: m.ab_group.map(|g| g.as_str().to_string()),
        })
        .collect();

    Ok(Json(ChallengeDetails {
        challenge: ChallengeSummary::from(challenge),
        members,
        defined_days: defined_days(cfg),
        pre_quiz_id: quiz_id(cfg, Quiz::Pre),
        post_quiz_id: quiz_id(cfg, Quiz::Post),
        questions: QuestionSets {
            pre: quiz_questions(cfg, Quiz::Pre),
            post: quiz_questions(cfg, Quiz::Post),
            daily: daily_questions(cfg),
            defined: all_defined_questions(cfg),
            weekly: weekly_questions(cfg),
        },
        config: cfg.clone(),
    }))
}

pub async fn delete_challenge(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, AppError> {
    let mut data = state.data.lock().await;
    require_admin(&state, &mut data, &headers, &jar)?;
    let removed = data
        .delete_challenge(&id)
        .ok_or_else(|| AppError::not_found("challenge_not_found"))?;
    persist_data(&state.config.data_path, &data).await?;
    info!(challenge = %removed.code, "challenge deleted");
    Ok(Json(OkResponse::ok()))
}

pub async fn toggle_ab(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<Json<AbToggleResponse>, AppError> {
    let mut data = state.data.lock().await;
    require_admin(&state, &mut data, &headers, &jar)?;
    let challenge = data
        .challenges
        .get_mut(&id)
        .ok_or_else(|| AppError::not_found("challenge_not_found"))?;
    challenge.ab_enabled = !challenge.ab_enabled;
    let ab_enabled = challenge.ab_enabled;
    let code = challenge.code.clone();

    let assigned = if ab_enabled { assign_unassigned(&mut data, &id) } else { 0 };
    persist_data(&state.config.data_path, &data).await?;
    info!(challenge = %code, ab_enabled, assigned, "a/b testing toggled");

    Ok(Json(AbToggleResponse {
        ok: true,
        ab_enabled,
        assigned,
    }))
}

pub async fn set_ab_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<AbGroupRequest>,
) -> Result<Json<OkResponse>, AppError> {
    let group = AbGroup::parse(payload.group.trim()).ok_or_else(|| AppError::bad_request("invalid_group"))?;
    let mut data = state.data.lock().await;
    require_admin(&state, &mut data, &headers, &jar)?;
    let membership = data
        .memberships
        .get_mut(&payload.id)
        .ok_or_else(|| AppError::not_found("membership_not_found"))?;
    membership.ab_group = Some(group);
    persist_data(&state.config.data_path, &data).await?;
    info!(membership = %payload.id, group = group.as_str(), "a/b group set");
    Ok(Json(OkResponse::ok()))
}

pub async fn add_defined_date(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(id): Path<String>,
    Json(payload): Json<DefinedDayRequest>,
) -> Result<Json<DefinedDaysResponse>, AppError> {
    let date = parse_day(payload.date.trim()).ok_or_else(|| AppError::bad_request("invalid_date"))?;
    let mut data = state.data.lock().await;
    require_admin(&state, &mut data, &headers, &jar)?;
    let challenge = data
        .challenges
        .get_mut(&id)
        .ok_or_else(|| AppError::not_found("challenge_not_found"))?;
    if date < challenge.start_date || date > challenge.end_date {
        return Err(AppError::bad_request("date_out_of_range"));
    }
    add_defined_day(&mut challenge.config, date);
    let days = defined_days(&challenge.config);
    let code = challenge.code.clone();
    persist_data(&state.config.data_path, &data).await?;
    info!(challenge = %code, date = %date, "defined day added");

    Ok(Json(DefinedDaysResponse {
        ok: true,
        defined_days: days,
    }))
}

pub async fn remove_defined_date(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(id): Path<String>,
    Json(payload): Json<DefinedDayRequest>,
) -> Result<Json<DefinedDaysResponse>, AppError> {
    let date = parse_day(payload.date.trim()).ok_or_else(|| AppError::bad_request("invalid_date"))?;
    let mut data = state.data.lock().await;
    require_admin(&state, &mut data, &headers, &jar)?;
    let challenge = data
        .challenges
        .get_mut(&id)
        .ok_or_else(|| AppError::not_found("challenge_not_found"))?;
    remove_defined_day(&mut challenge.config, date);
    let days = defined_days(&challenge.config);
    let code = challenge.code.clone();
    persist_data(&state.config.data_path, &data).await?;
    info!(challenge = %code, date = %date, "defined day removed");

    Ok(Json(DefinedDaysResponse {
        ok: true,
        defined_days: days,
    }))
}

/// Questions for `day` as seen by a participant who already finished the
/// pre quiz; the pre quiz itself is listed alongside.
pub async fn preview_questions(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(id): Path<String>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<QuestionPreview>, AppError> {
    let mut data = state.data.lock().await;
    require_admin(&state, &mut data, &headers, &jar)?;
    let challenge = find_challenge(&data, &id)?;
    let day = query.day.as_deref().and_then(parse_day).unwrap_or_else(today);

    let mut gates = gates_for(challenge, &[], day);
    gates.pre_done = true;
    gates.show_only_pre = false;
    let mut questions = questions_for_day(challenge, &gates, day);
    questions.pre = quiz_questions(&challenge.config, Quiz::Pre);

    Ok(Json(QuestionPreview {
        day: date_key(day),
        is_defined_day: gates.is_defined_day,
        show_weekly: gates.show_weekly,
        last_day: gates.last_day,
        questions,
    }))
}

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub async fn export_challenge(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (sheets, file_name) = {
        let mut data = state.data.lock().await;
        require_admin(&state, &mut data, &headers, &jar)?;
        let challenge = find_challenge(&data, &id)?;
        (build_sheets(&data, challenge, Utc::now()), export_file_name(challenge))
    };

    let bytes = task::spawn_blocking(move || render_workbook(&sheets))
        .await
        .map_err(AppError::internal)??;
    info!(file = %file_name, size = bytes.len(), "challenge exported");

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        bytes,
    ))
}

pub async fn cleanup(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Json<CleanupResponse>, AppError> {
    let mut data = state.data.lock().await;
    require_admin(&state, &mut data, &headers, &jar)?;
    let removed = data.remove_unassigned_entries();
    if removed > 0 {
        persist_data(&state.config.data_path, &data).await?;
    }
    info!(removed, "unassigned entries cleaned up");
    Ok(Json(CleanupResponse { ok: true, removed }))
}

pub async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Json<Vec<UserView>>, AppError> {
    let mut data = state.data.lock().await;
    require_admin(&state, &mut data, &headers, &jar)?;
    let mut users: Vec<UserView> = data
        .users
        .values()
        .map(|u| UserView {
            id: u.id.clone(),
            username: u.username.clone(),
            created_at: u.created_at,
            is_admin: data.is_admin(&u.id),
        })
        .collect();
    users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(Json(users))
}

/// Grants or revokes the admin role. The last remaining admin keeps it.
fn apply_admin_role(data: &mut AppData, id: &str, grant: bool) -> Result<bool, AppError> {
    if !data.users.contains_key(id) {
        return Err(AppError::not_found("user_not_found"));
    }
    if grant {
        return Ok(data.admin_roles.insert(id.to_string()));
    }
    if data.admin_roles.contains(id) && data.admin_roles.len() == 1 {
        return Err(AppError::conflict("last_admin"));
    }
    Ok(data.admin_roles.remove(id))
}

async fn set_admin_role(state: &AppState, headers: &HeaderMap, jar: &CookieJar, id: &str, grant: bool) -> Result<Json<OkResponse>, AppError> {
    let mut data = state.data.lock().await;
    require_admin(state, &mut data, headers, jar)?;
    if apply_admin_role(&mut data, id, grant)? {
        persist_data(&state.config.data_path, &data).await?;
        info!(user = %id, grant, "admin role changed");
    }
    Ok(Json(OkResponse::ok()))
}

pub async fn grant_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, AppError> {
    set_admin_role(&state, &headers, &jar, &id, true).await
}

pub async fn revoke_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, AppError> {
    set_admin_role(&state, &headers, &jar, &id, false).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(title: &str, start: &str, end: &str) -> CreateChallengeRequest {
        CreateChallengeRequest {
            title: title.to_string(),
            start: start.to_string(),
            end: end.to_string(),
            description: None,
            start_score: None,
            config: None,
            ab_enabled: false,
        }
    }

    #[test]
    fn new_challenge_gets_default_config() {
        let challenge = validate_new_challenge(request("  Civic Week ", "2026-03-01", "2026-03-07")).unwrap();
        assert_eq!(challenge.title, "Civic Week");
        assert_eq!(challenge.start_score, 0);
        assert_eq!(quiz_id(&challenge.config, Quiz::Pre).as_deref(), Some("pre-001"));
    }

    #[test]
    fn invalid_challenges_are_rejected() {
        let cases = [
            (request("ab", "2026-03-01", "2026-03-07"), "title_too_short"),
            (request("Civic", "2026-3-1", "2026-03-07"), "invalid_start"),
            (request("Civic", "2026-03-07", "2026-03-01"), "end_before_start"),
            (
                CreateChallengeRequest {
                    start_score: Some(-1),
                    ..request("Civic", "2026-03-01", "2026-03-07")
                },
                "negative_start_score",
            ),
            (
                CreateChallengeRequest {
                    config: Some(json!([1, 2])),
                    ..request("Civic", "2026-03-01", "2026-03-07")
                },
                "config_must_be_object",
            ),
        ];
        for (payload, expected) in cases {
            let err = validate_new_challenge(payload).unwrap_err();
            assert_eq!(err.message, expected);
        }
    }

    #[test]
    fn single_day_challenge_is_valid() {
        let custom = json!({ "daily": { "questions": [] } });
        let challenge = validate_new_challenge(CreateChallengeRequest {
            config: Some(custom.clone()),
            ..request("Civic", "2026-03-01", "2026-03-01")
        })
        .unwrap();
        assert_eq!(challenge.config, custom);
    }

    fn data_with_users(ids: &[&str]) -> AppData {
        let mut data = AppData::default();
        for id in ids {
            data.users.insert(
                id.to_string(),
                crate::models::User {
                    id: id.to_string(),
                    username: format!("user-{id}"),
                    password_hash: String::new(),
                    created_at: Utc::now(),
                },
            );
        }
        data
    }

    #[test]
    fn last_admin_cannot_be_revoked() {
        let mut data = data_with_users(&["u1", "u2"]);
        data.admin_roles.insert("u1".into());

        let err = apply_admin_role(&mut data, "u1", false).unwrap_err();
        assert_eq!(err.message, "last_admin");
        assert!(data.is_admin("u1"));

        assert!(apply_admin_role(&mut data, "u2", true).unwrap());
        assert!(apply_admin_role(&mut data, "u1", false).unwrap());
        assert!(!data.is_admin("u1"));
        assert!(!apply_admin_role(&mut data, "u1", false).unwrap());
        assert_eq!(apply_admin_role(&mut data, "nobody", true).unwrap_err().message, "user_not_found");
    }
}
