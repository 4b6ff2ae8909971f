pub mod graphql;
pub mod profiles;
pub mod races;
pub mod social;
pub mod videos;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, AppResult};
use crate::extractors::CurrentMember;
use crate::identity::session;
use crate::state::AppState;

/// Full application router. `test_seed` mounts the session seeding endpoint.
pub fn app(state: AppState, test_seed: bool) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/me/session", delete(sign_out))
        .merge(profiles::router())
        .merge(social::router())
        .merge(videos::router())
        .merge(races::router())
        .merge(graphql::router());

    if test_seed {
        app = app.route("/test/seed", get(seed_session));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Drop the caller's session and clear the cookie.
async fn sign_out(
    State(state): State<AppState>,
    member: CurrentMember,
) -> AppResult<impl IntoResponse> {
    session::delete_session(&state.db, &member.token)?;
    tracing::info!("Member {} signed out", member.id);

    let cookie = format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
        state.config.auth.cookie_name
    );
    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]))
}

#[derive(Debug, Deserialize)]
struct SeedQuery {
    member: String,
}

/// Test-only: issue a session for `member` and return it as a cookie.
async fn seed_session(
    State(state): State<AppState>,
    Query(q): Query<SeedQuery>,
) -> AppResult<impl IntoResponse> {
    let member = q.member.trim();
    if member.is_empty() {
        return Err(AppError::BadRequest("member is required".into()));
    }

    let token = session::create_session(&state.db, member, state.config.auth.session_hours)?;
    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        state.config.auth.cookie_name,
        token,
        state.config.auth.session_hours * 3600
    );

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "memberId": member, "token": token })),
    ))
}
