//! Accounts, cookie sessions and admin detection.

use crate::config::{Config, MAX_SESSION_DAYS};
use crate::errors::AppError;
use crate::models::{AppData, AuthSession};
use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use subtle::ConstantTimeEq;
use tokio::task;

pub const SESSION_COOKIE: &str = "session_token";
pub const SELECTED_CHALLENGE_COOKIE: &str = "selected_challenge";
pub const ADMIN_CODE_COOKIE: &str = "admin_code";
pub const ADMIN_CODE_HEADER: &str = "x-admin-code";

#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
}

pub async fn hash_password(plain: String, cost: u32) -> Result<String, AppError> {
    task::spawn_blocking(move || bcrypt::hash(plain, cost))
        .await
        .map_err(AppError::internal)?
        .map_err(AppError::internal)
}

/// Any verification failure, including a malformed hash, is a mismatch.
pub async fn verify_password(plain: String, hash: String) -> bool {
    task::spawn_blocking(move || bcrypt::verify(plain, &hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

fn new_token() -> String {
    format!("{}.{}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4())
}

pub fn create_session(data: &mut AppData, user_id: &str, days: i64, now: DateTime<Utc>) -> AuthSession {
    let session = AuthSession {
        token: new_token(),
        user_id: user_id.to_string(),
        expires_at: Duration::try_days(days.clamp(1, MAX_SESSION_DAYS))
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
    };
    data.sessions.insert(session.token.clone(), session.clone());
    session
}

/// Resolves the session cookie to a user. Expired sessions are dropped.
pub fn session_user(data: &mut AppData, jar: &CookieJar, now: DateTime<Utc>) -> Option<SessionUser> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();
    let session = data.sessions.get(&token)?;
    if session.expires_at <= now {
        data.sessions.remove(&token);
        return None;
    }
    let user = data.users.get(&session.user_id)?;
    Some(SessionUser {
        id: user.id.clone(),
        username: user.username.clone(),
    })
}

pub fn require_user(data: &mut AppData, jar: &CookieJar, now: DateTime<Utc>) -> Result<SessionUser, AppError> {
    session_user(data, jar, now).ok_or_else(AppError::unauthorized)
}

pub fn destroy_session(data: &mut AppData, jar: &CookieJar) -> bool {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| data.sessions.remove(cookie.value()))
        .is_some()
}

pub fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .build()
}

pub fn selected_challenge_cookie(code: String) -> Cookie<'static> {
    Cookie::build((SELECTED_CHALLENGE_COOKIE, code))
        .path("/")
        .same_site(SameSite::Lax)
        .build()
}

pub fn admin_code_cookie(code: String, config: &Config) -> Cookie<'static> {
    Cookie::build((ADMIN_CODE_COOKIE, code))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .build()
}

pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// Compares in constant time over equal-length buffers.
pub fn codes_match(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    let len = provided.len().max(expected.len());
    let mut a = vec![0u8; len];
    let mut b = vec![0u8; len];
    a[..provided.len()].copy_from_slice(provided);
    b[..expected.len()].copy_from_slice(expected);
    let same: bool = a.ct_eq(&b).into();
    same && provided.len() == expected.len()
}

fn provided_admin_code<'a>(headers: &'a HeaderMap, jar: &'a CookieJar) -> Option<&'a str> {
    headers
        .get(ADMIN_CODE_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| jar.get(ADMIN_CODE_COOKIE).map(|c| c.value()))
}

pub fn admin_code_valid(config: &Config, headers: &HeaderMap, jar: &CookieJar) -> bool {
    match (&config.admin_code, provided_admin_code(headers, jar)) {
        (Some(expected), Some(provided)) => codes_match(provided, expected),
        _ => false,
    }
}

/// Admin access: an admin role on the session user, or the shared admin code.
pub fn is_admin(
    config: &Config,
    data: &AppData,
    user: Option<&SessionUser>,
    headers: &HeaderMap,
    jar: &CookieJar,
) -> bool {
    user.is_some_and(|u| data.is_admin(&u.id)) || admin_code_valid(config, headers, jar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn data_with_user() -> AppData {
        let mut data = AppData::default();
        data.users.insert(
            "u1".into(),
            User {
                id: "u1".into(),
                username: "mutigerFuchs".into(),
                password_hash: String::new(),
                created_at: Utc::now(),
            },
        );
        data
    }

    #[test]
    fn session_lookup_and_expiry() {
        let mut data = data_with_user();
        let now = Utc::now();
        let session = create_session(&mut data, "u1", 30, now);
        assert!(session.token.contains('.'));

        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, session.token.clone()));
        let user = session_user(&mut data, &jar, now).expect("session user");
        assert_eq!(user.username, "mutigerFuchs");

        let later = now + Duration::days(31);
        assert!(session_user(&mut data, &jar, later).is_none());
        assert!(data.sessions.is_empty());
    }

    #[test]
    fn oversized_session_length_is_capped() {
        let mut data = data_with_user();
        let now = Utc::now();
        let session = create_session(&mut data, "u1", i64::MAX, now);
        assert_eq!(session.expires_at, now + Duration::days(MAX_SESSION_DAYS));
    }

    #[test]
    fn destroy_session_removes_token() {
        let mut data = data_with_user();
        let session = create_session(&mut data, "u1", 1, Utc::now());
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, session.token));
        assert!(destroy_session(&mut data, &jar));
        assert!(!destroy_session(&mut data, &jar));
    }

    #[test]
    fn admin_code_comparison() {
        assert!(codes_match("secret", "secret"));
        assert!(!codes_match("secret", "secret2"));
        assert!(!codes_match("", "secret"));

        let config = Config {
            admin_code: Some("letmein".into()),
            ..Config::default()
        };
        let mut headers = HeaderMap::new();
        let jar = CookieJar::new();
        assert!(!admin_code_valid(&config, &headers, &jar));
        headers.insert(ADMIN_CODE_HEADER, "letmein".parse().unwrap());
        assert!(admin_code_valid(&config, &headers, &jar));

        let cookie_jar = CookieJar::new().add(Cookie::new(ADMIN_CODE_COOKIE, "letmein"));
        assert!(admin_code_valid(&config, &HeaderMap::new(), &cookie_jar));
        assert!(!admin_code_valid(&Config::default(), &HeaderMap::new(), &cookie_jar));
    }

    #[test]
    fn admin_role_grants_access() {
        let mut data = data_with_user();
        let user = SessionUser {
            id: "u1".into(),
            username: "mutigerFuchs".into(),
        };
        let config = Config::default();
        let jar = CookieJar::new();
        assert!(!is_admin(&config, &data, Some(&user), &HeaderMap::new(), &jar));
        data.admin_roles.insert("u1".into());
        assert!(is_admin(&config, &data, Some(&user), &HeaderMap::new(), &jar));
    }

    #[tokio::test]
    async fn password_round_trip() {
        let hash = hash_password("hunter2".into(), 4).await.unwrap();
        assert!(verify_password("hunter2".into(), hash.clone()).await);
        assert!(!verify_password("wrong".into(), hash).await);
        assert!(!verify_password("hunter2".into(), "not-a-hash".into()).await);
    }
}
