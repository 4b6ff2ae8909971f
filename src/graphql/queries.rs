use async_graphql::*;

use crate::error::AppError;
use crate::graphql::types::{CommentNode, ProfileNode, VideoPageNode};
use crate::graphql::Viewer;
use crate::profiles::ProfileService;
use crate::social::{ListWindow, SocialGraphService};
use crate::videos::VideoService;

impl ErrorExtensions for AppError {
    fn extend(&self) -> Error {
        let message = match self {
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::StoreUnavailable(_) => "Store unavailable, try again".to_string(),
            other => other.to_string(),
        };
        Error::new(message).extend_with(|_, e| e.set("code", self.code()))
    }
}

fn viewer<'a>(ctx: &'a Context<'_>) -> Option<&'a str> {
    ctx.data_opt::<Viewer>().and_then(|v| v.0.as_deref())
}

/// Absent rows are `null` rather than errors
fn optional<T>(result: Result<T, AppError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(AppError::NotFound) => Ok(None),
        Err(e) => Err(e.extend()),
    }
}

fn window(limit: Option<i32>, offset: Option<i32>) -> ListWindow {
    ListWindow::new(
        limit.map(|l| l.max(0) as u32),
        offset.map(|o| o.max(0) as u32),
    )
}

/// Read-only queries over profiles, the follow graph and videos
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// The calling member's profile, if signed in and created
    async fn me(&self, ctx: &Context<'_>) -> Result<Option<ProfileNode>> {
        let Some(member) = viewer(ctx) else {
            return Ok(None);
        };
        let profiles = ctx.data::<ProfileService>()?;
        Ok(optional(profiles.get_profile(member).await)?.map(ProfileNode::from))
    }

    async fn profile(&self, ctx: &Context<'_>, id: String) -> Result<Option<ProfileNode>> {
        let profiles = ctx.data::<ProfileService>()?;
        Ok(optional(profiles.get_profile_by_id(&id).await)?.map(ProfileNode::from))
    }

    /// Case-insensitive handle lookup
    async fn profile_by_handle(
        &self,
        ctx: &Context<'_>,
        handle: String,
    ) -> Result<Option<ProfileNode>> {
        let profiles = ctx.data::<ProfileService>()?;
        Ok(optional(profiles.get_profile_by_handle(&handle).await)?.map(ProfileNode::from))
    }

    async fn handle_available(
        &self,
        ctx: &Context<'_>,
        handle: String,
        excluding_user_id: Option<String>,
    ) -> Result<bool> {
        let profiles = ctx.data::<ProfileService>()?;
        profiles
            .is_handle_available(&handle, excluding_user_id.as_deref())
            .await
            .map_err(|e| e.extend())
    }

    async fn followers(
        &self,
        ctx: &Context<'_>,
        user_id: String,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<ProfileNode>> {
        let social = ctx.data::<SocialGraphService>()?;
        let profiles = social
            .list_followers(&user_id, window(limit, offset))
            .await
            .map_err(|e| e.extend())?;
        Ok(profiles.into_iter().map(ProfileNode::from).collect())
    }

    async fn following(
        &self,
        ctx: &Context<'_>,
        user_id: String,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<ProfileNode>> {
        let social = ctx.data::<SocialGraphService>()?;
        let profiles = social
            .list_following(&user_id, window(limit, offset))
            .await
            .map_err(|e| e.extend())?;
        Ok(profiles.into_iter().map(ProfileNode::from).collect())
    }

    async fn is_following(
        &self,
        ctx: &Context<'_>,
        follower_id: String,
        followee_id: String,
    ) -> Result<bool> {
        let social = ctx.data::<SocialGraphService>()?;
        social
            .is_following(&follower_id, &followee_id)
            .await
            .map_err(|e| e.extend())
    }

    /// Newest first. Private videos appear only for the profile owner.
    async fn videos(
        &self,
        ctx: &Context<'_>,
        profile_id: String,
        page_size: Option<i32>,
        cursor: Option<String>,
    ) -> Result<VideoPageNode> {
        let videos = ctx.data::<VideoService>()?;
        let page = videos
            .list_videos_for_profile(
                &profile_id,
                viewer(ctx),
                page_size.map(|s| s.max(0) as u32),
                cursor.as_deref(),
            )
            .await
            .map_err(|e| e.extend())?;
        Ok(page.into())
    }

    async fn comments(
        &self,
        ctx: &Context<'_>,
        video_id: String,
        limit: Option<i32>,
    ) -> Result<Vec<CommentNode>> {
        let videos = ctx.data::<VideoService>()?;
        let comments = videos
            .list_comments(&video_id, limit.map(|l| l.max(0) as u32), viewer(ctx))
            .await
            .map_err(|e| e.extend())?;
        Ok(comments.into_iter().map(CommentNode::from).collect())
    }
}
