use crate::admin;
use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    let participant = Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/me", get(handlers::me))
        .route("/api/username/suggest", get(handlers::suggest_username))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/actions", get(handlers::list_actions))
        .route("/api/join", post(handlers::join))
        .route("/join/:code", get(handlers::join_link))
        .route("/api/challenge/select", post(handlers::select_challenge))
        .route("/api/memberships", get(handlers::memberships))
        .route("/api/today", get(handlers::get_today))
        .route("/api/submit", post(handlers::submit))
        .route("/api/score/preview", post(handlers::score_preview))
        .route("/api/history", get(handlers::history))
        .route("/api/onboarding", get(handlers::onboarding));

    let admin = Router::new()
        .route("/api/admin/login", post(admin::admin_login))
        .route("/api/admin/logout", post(admin::admin_logout))
        .route(
            "/api/admin/challenges",
            get(admin::list_challenges).post(admin::create_challenge),
        )
        .route(
            "/api/admin/challenges/:id",
            get(admin::challenge_details).delete(admin::delete_challenge),
        )
        .route("/api/admin/challenges/:id/ab-toggle", post(admin::toggle_ab))
        .route(
            "/api/admin/challenges/:id/defined-days",
            post(admin::add_defined_date).delete(admin::remove_defined_date),
        )
        .route("/api/admin/challenges/:id/preview", get(admin::preview_questions))
        .route("/api/admin/challenges/:id/export", get(admin::export_challenge))
        .route("/api/admin/memberships/ab-group", post(admin::set_ab_group))
        .route("/api/admin/cleanup", post(admin::cleanup))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/:id/grant", post(admin::grant_admin))
        .route("/api/admin/users/:id/revoke", post(admin::revoke_admin));

    Router::new()
        .route("/", get(handlers::index))
        .merge(participant)
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
