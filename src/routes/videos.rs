use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::models::{Comment, Video};
use crate::error::AppResult;
use crate::extractors::{CurrentMember, MaybeMember};
use crate::state::AppState;
use crate::videos::{CommentLikes, LikeState, NewVideo, VideoPage};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page_size: Option<u32>,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub display_name: Option<String>,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct Liked {
    pub liked: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/videos", post(create_video))
        .route("/videos/{id}", get(get_video).delete(delete_video))
        .route("/profiles/{profile_id}/videos", get(list_videos))
        .route("/videos/{id}/like", post(toggle_like).get(is_liked))
        .route("/videos/{id}/comments", get(list_comments).post(add_comment))
        .route("/videos/{id}/comments/pending", get(list_pending_comments))
        .route("/comments/{id}", delete(delete_comment))
        .route("/comments/{id}/like", post(like_comment))
        .route("/comments/{id}/approve", post(approve_comment))
}

async fn create_video(
    State(state): State<AppState>,
    member: CurrentMember,
    Json(video): Json<NewVideo>,
) -> AppResult<(StatusCode, Json<Video>)> {
    let video = state.videos.create_video(&member.id, video).await?;
    Ok((StatusCode::CREATED, Json(video)))
}

async fn get_video(
    State(state): State<AppState>,
    viewer: MaybeMember,
    Path(video_id): Path<String>,
) -> AppResult<Json<Video>> {
    Ok(Json(state.videos.get_video(&video_id, viewer.id()).await?))
}

async fn list_videos(
    State(state): State<AppState>,
    viewer: MaybeMember,
    Path(profile_id): Path<String>,
    Query(q): Query<PageQuery>,
) -> AppResult<Json<VideoPage>> {
    let page = state
        .videos
        .list_videos_for_profile(&profile_id, viewer.id(), q.page_size, q.cursor.as_deref())
        .await?;
    Ok(Json(page))
}

async fn delete_video(
    State(state): State<AppState>,
    member: CurrentMember,
    Path(video_id): Path<String>,
) -> AppResult<StatusCode> {
    state.videos.delete_video(&video_id, &member.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_like(
    State(state): State<AppState>,
    member: CurrentMember,
    Path(video_id): Path<String>,
) -> AppResult<Json<LikeState>> {
    Ok(Json(state.videos.toggle_like(&video_id, &member.id).await?))
}

async fn is_liked(
    State(state): State<AppState>,
    member: CurrentMember,
    Path(video_id): Path<String>,
) -> AppResult<Json<Liked>> {
    let liked = state.videos.is_liked(&video_id, &member.id).await?;
    Ok(Json(Liked { liked }))
}

async fn list_comments(
    State(state): State<AppState>,
    viewer: MaybeMember,
    Path(video_id): Path<String>,
    Query(q): Query<LimitQuery>,
) -> AppResult<Json<Vec<Comment>>> {
    let comments = state
        .videos
        .list_comments(&video_id, q.limit, viewer.id())
        .await?;
    Ok(Json(comments))
}

async fn add_comment(
    State(state): State<AppState>,
    member: CurrentMember,
    Path(video_id): Path<String>,
    Json(req): Json<NewComment>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let comment = state
        .videos
        .add_comment(&video_id, &member.id, req.display_name.as_deref(), &req.body)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn list_pending_comments(
    State(state): State<AppState>,
    member: CurrentMember,
    Path(video_id): Path<String>,
) -> AppResult<Json<Vec<Comment>>> {
    Ok(Json(
        state
            .videos
            .list_pending_comments(&video_id, &member.id)
            .await?,
    ))
}

async fn like_comment(
    State(state): State<AppState>,
    member: CurrentMember,
    Path(comment_id): Path<String>,
) -> AppResult<Json<CommentLikes>> {
    Ok(Json(state.videos.like_comment(&comment_id, &member.id).await?))
}

async fn approve_comment(
    State(state): State<AppState>,
    member: CurrentMember,
    Path(comment_id): Path<String>,
) -> AppResult<Json<Comment>> {
    Ok(Json(
        state
            .videos
            .approve_comment(&comment_id, &member.id)
            .await?,
    ))
}

async fn delete_comment(
    State(state): State<AppState>,
    member: CurrentMember,
    Path(comment_id): Path<String>,
) -> AppResult<StatusCode> {
    state.videos.delete_comment(&comment_id, &member.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
