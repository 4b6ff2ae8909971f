use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::models::Profile;
use crate::error::AppResult;
use crate::extractors::CurrentMember;
use crate::social::{FollowState, ListWindow};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct Following {
    pub following: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/members/{id}/follow",
            get(is_following).put(follow).delete(unfollow),
        )
        .route("/members/{id}/followers", get(list_followers))
        .route("/members/{id}/following", get(list_following))
}

async fn follow(
    State(state): State<AppState>,
    member: CurrentMember,
    Path(followee_id): Path<String>,
) -> AppResult<Json<FollowState>> {
    Ok(Json(state.social.follow(&member.id, &followee_id).await?))
}

async fn unfollow(
    State(state): State<AppState>,
    member: CurrentMember,
    Path(followee_id): Path<String>,
) -> AppResult<Json<FollowState>> {
    Ok(Json(state.social.unfollow(&member.id, &followee_id).await?))
}

async fn is_following(
    State(state): State<AppState>,
    member: CurrentMember,
    Path(followee_id): Path<String>,
) -> AppResult<Json<Following>> {
    let following = state.social.is_following(&member.id, &followee_id).await?;
    Ok(Json(Following { following }))
}

async fn list_followers(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(q): Query<WindowQuery>,
) -> AppResult<Json<Vec<Profile>>> {
    let window = ListWindow::new(q.limit, q.offset);
    Ok(Json(state.social.list_followers(&user_id, window).await?))
}

async fn list_following(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(q): Query<WindowQuery>,
) -> AppResult<Json<Vec<Profile>>> {
    let window = ListWindow::new(q.limit, q.offset);
    Ok(Json(state.social.list_following(&user_id, window).await?))
}
