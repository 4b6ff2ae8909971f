use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use qrcode::render::svg;
use qrcode::QrCode;
use serde::{Deserialize, Serialize};

use crate::db::models::Profile;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentMember;
use crate::profiles::{ProfileExtras, ProfilePatch};
use crate::state::AppState;

/// Profile plus its public page, once a handle is claimed
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: Profile,
    pub profile_url: Option<String>,
}

impl ProfileResponse {
    fn new(state: &AppState, profile: Profile) -> Json<Self> {
        let profile_url = profile
            .handle_lower
            .as_deref()
            .map(|h| state.config.profile_url(h));
        Json(Self {
            profile,
            profile_url,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ClaimHandleRequest {
    pub handle: String,
    #[serde(flatten)]
    pub extras: ProfileExtras,
}

#[derive(Debug, Deserialize)]
pub struct ExcludingQuery {
    pub excluding: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Availability {
    pub value: String,
    pub available: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/me/profile",
            post(ensure_profile).get(get_profile).patch(update_profile),
        )
        .route("/me/handle", post(claim_handle))
        .route("/handles/{handle}/available", get(handle_available))
        .route("/display-names/{name}/available", get(display_name_available))
        .route("/profiles/by-handle/{handle}", get(profile_by_handle))
        .route("/profiles/by-handle/{handle}/qr", get(profile_qr))
}

async fn ensure_profile(
    State(state): State<AppState>,
    member: CurrentMember,
) -> AppResult<Json<ProfileResponse>> {
    let profile = state.profiles.ensure_profile(&member.id).await?;
    Ok(ProfileResponse::new(&state, profile))
}

async fn get_profile(
    State(state): State<AppState>,
    member: CurrentMember,
) -> AppResult<Json<ProfileResponse>> {
    let profile = state.profiles.get_profile(&member.id).await?;
    Ok(ProfileResponse::new(&state, profile))
}

async fn update_profile(
    State(state): State<AppState>,
    member: CurrentMember,
    Json(patch): Json<ProfilePatch>,
) -> AppResult<Json<ProfileResponse>> {
    let profile = state.profiles.update_profile(&member.id, patch).await?;
    Ok(ProfileResponse::new(&state, profile))
}

async fn claim_handle(
    State(state): State<AppState>,
    member: CurrentMember,
    Json(req): Json<ClaimHandleRequest>,
) -> AppResult<Json<ProfileResponse>> {
    let profile = state
        .profiles
        .claim_handle(&member.id, &req.handle, req.extras)
        .await?;
    Ok(ProfileResponse::new(&state, profile))
}

async fn handle_available(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Query(q): Query<ExcludingQuery>,
) -> AppResult<Json<Availability>> {
    let available = state
        .profiles
        .is_handle_available(&handle, q.excluding.as_deref())
        .await?;
    Ok(Json(Availability {
        value: handle,
        available,
    }))
}

async fn display_name_available(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<ExcludingQuery>,
) -> AppResult<Json<Availability>> {
    let available = state
        .profiles
        .is_display_name_available(&name, q.excluding.as_deref())
        .await?;
    Ok(Json(Availability {
        value: name,
        available,
    }))
}

async fn profile_by_handle(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> AppResult<Json<ProfileResponse>> {
    let profile = state.profiles.get_profile_by_handle(&handle).await?;
    Ok(ProfileResponse::new(&state, profile))
}

/// SVG QR code pointing at the public profile page.
async fn profile_qr(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> AppResult<Response> {
    let profile = state.profiles.get_profile_by_handle(&handle).await?;
    let handle_lower = profile.handle_lower.ok_or(AppError::NotFound)?;
    let url = state.config.profile_url(&handle_lower);

    let code = QrCode::new(url.as_bytes()).map_err(|e| {
        tracing::error!("QR code generation failed: {}", e);
        AppError::Internal("QR code generation failed".into())
    })?;

    let qr_svg = code
        .render::<svg::Color>()
        .min_dimensions(200, 200)
        .max_dimensions(300, 300)
        .dark_color(svg::Color("#111111"))
        .light_color(svg::Color("#ffffff"))
        .build();

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], qr_svg).into_response())
}
