use crate::db::models::{Comment, Profile, Video};
use crate::error::{AppError, AppResult};
use crate::profiles::DynProfileRepository;
use crate::social::DynFollowRepository;
use crate::videos::comments::{CommentDraft, DynCommentRepository};
use crate::videos::domain::{
    self, clamp_comment_limit, clamp_page_size, CommentLikes, Cursor, LikeState, NewVideo,
    VideoPage,
};
use crate::videos::repository::DynVideoRepository;

#[derive(Clone)]
pub struct VideoService {
    videos: DynVideoRepository,
    comments: DynCommentRepository,
    profiles: DynProfileRepository,
    follows: DynFollowRepository,
}

impl VideoService {
    pub fn new(
        videos: DynVideoRepository,
        comments: DynCommentRepository,
        profiles: DynProfileRepository,
        follows: DynFollowRepository,
    ) -> Self {
        Self {
            videos,
            comments,
            profiles,
            follows,
        }
    }

    pub async fn create_video(&self, user_id: &str, mut video: NewVideo) -> AppResult<Video> {
        require_member(user_id)?;

        video.youtube_url = video.youtube_url.trim().to_string();
        if video.youtube_url.is_empty() {
            return Err(AppError::BadRequest("YouTube URL is required".into()));
        }

        let owner = self.profiles.find_by_id(&video.profile_id).await?;
        if owner.map(|p| p.user_id).as_deref() != Some(user_id) {
            tracing::warn!(
                "Member {} tried to post to profile {}",
                user_id,
                video.profile_id
            );
            return Err(AppError::OwnerMismatch);
        }

        let created = self.videos.insert_video(user_id, &video).await?;
        tracing::info!("Member {} posted video {}", user_id, created.id);
        Ok(created)
    }

    /// One page of a profile's videos, newest first. Private videos are
    /// included only when `viewer` owns the profile.
    pub async fn list_videos_for_profile(
        &self,
        profile_id: &str,
        viewer: Option<&str>,
        page_size: Option<u32>,
        cursor: Option<&str>,
    ) -> AppResult<VideoPage> {
        let page_size = clamp_page_size(page_size);
        let after = match cursor.map(str::trim) {
            Some(token) if !token.is_empty() => Some(Cursor::decode(token)?),
            _ => None,
        };

        let include_private = match viewer {
            Some(viewer) => self
                .profiles
                .find_by_id(profile_id)
                .await?
                .is_some_and(|p| p.user_id == viewer),
            None => false,
        };

        let rows = self
            .videos
            .list_for_profile(profile_id, include_private, after.as_ref(), page_size + 1)
            .await?;
        Ok(VideoPage::from_rows(rows, page_size))
    }

    pub async fn get_video(&self, video_id: &str, viewer: Option<&str>) -> AppResult<Video> {
        self.videos
            .find_video(video_id)
            .await?
            .filter(|v| domain::visible_to(v, viewer))
            .ok_or(AppError::NotFound)
    }

    pub async fn delete_video(&self, video_id: &str, requester_id: &str) -> AppResult<()> {
        require_member(requester_id)?;

        let video = self
            .videos
            .find_video(video_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if video.user_id != requester_id {
            tracing::warn!("Member {} may not delete video {}", requester_id, video_id);
            return Err(AppError::Forbidden);
        }

        self.videos.delete_video(video_id).await?;
        tracing::info!("Deleted video {}", video_id);
        Ok(())
    }

    pub async fn toggle_like(&self, video_id: &str, user_id: &str) -> AppResult<LikeState> {
        require_member(user_id)?;
        self.get_video(video_id, Some(user_id)).await?;

        self.videos
            .toggle_like(video_id, user_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn is_liked(&self, video_id: &str, user_id: &str) -> AppResult<bool> {
        self.get_video(video_id, Some(user_id)).await?;
        Ok(self.videos.has_liked(video_id, user_id).await?)
    }

    /// Approval is decided by the video owner's settings at creation time.
    pub async fn add_comment(
        &self,
        video_id: &str,
        user_id: &str,
        display_name: Option<&str>,
        body: &str,
    ) -> AppResult<Comment> {
        require_member(user_id)?;
        let body = domain::comment_body(body)?;
        let video = self.get_video(video_id, Some(user_id)).await?;

        let owner = self.profiles.find_by_user_id(&video.user_id).await?;
        let friends_only = owner.as_ref().is_some_and(|p| p.comments_friends_only);
        if friends_only
            && user_id != video.user_id
            && !self.follows.is_mutual(user_id, &video.user_id).await?
        {
            tracing::warn!("Member {} is not a friend of {}", user_id, video.user_id);
            return Err(AppError::Forbidden);
        }

        let display_name = match display_name {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => self.commenter_name(user_id).await?,
        };

        let draft = CommentDraft {
            video_id: video.id,
            user_id: user_id.to_string(),
            display_name: domain::comment_display_name(Some(display_name.as_str())),
            body,
            approved: !owner.map_or(true, |p| p.comments_require_approval),
        };
        let comment = self.comments.insert_comment(&draft).await?;
        tracing::info!(
            "Comment {} on video {} (approved: {})",
            comment.id,
            video_id,
            comment.approved
        );
        Ok(comment)
    }

    /// Approved comments, newest first.
    pub async fn list_comments(
        &self,
        video_id: &str,
        limit: Option<u32>,
        viewer: Option<&str>,
    ) -> AppResult<Vec<Comment>> {
        self.get_video(video_id, viewer).await?;
        Ok(self
            .comments
            .list_comments(video_id, true, clamp_comment_limit(limit))
            .await?)
    }

    /// The moderation queue, for the video owner only.
    pub async fn list_pending_comments(
        &self,
        video_id: &str,
        requester_id: &str,
    ) -> AppResult<Vec<Comment>> {
        require_member(requester_id)?;
        let video = self.get_video(video_id, Some(requester_id)).await?;
        if video.user_id != requester_id {
            return Err(AppError::Forbidden);
        }
        Ok(self
            .comments
            .list_comments(video_id, false, clamp_comment_limit(None))
            .await?)
    }

    /// Every call counts. Comments the member cannot read look absent.
    pub async fn like_comment(&self, comment_id: &str, user_id: &str) -> AppResult<CommentLikes> {
        require_member(user_id)?;
        let (comment, video) = self.comment_with_video(comment_id).await?;
        if !domain::comment_visible_to(&comment, &video, user_id) {
            return Err(AppError::NotFound);
        }

        let likes = self
            .comments
            .increment_likes(comment_id)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(CommentLikes { likes })
    }

    pub async fn approve_comment(&self, comment_id: &str, requester_id: &str) -> AppResult<Comment> {
        require_member(requester_id)?;
        let (_, video) = self.comment_with_video(comment_id).await?;
        if video.user_id != requester_id {
            tracing::warn!("Member {} may not approve comment {}", requester_id, comment_id);
            return Err(AppError::Forbidden);
        }

        self.comments
            .approve(comment_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn delete_comment(&self, comment_id: &str, requester_id: &str) -> AppResult<()> {
        require_member(requester_id)?;
        let (comment, video) = self.comment_with_video(comment_id).await?;
        if !domain::can_delete_comment(&comment, &video, requester_id) {
            tracing::warn!("Member {} may not delete comment {}", requester_id, comment_id);
            return Err(AppError::Forbidden);
        }

        self.comments.delete_comment(comment_id).await?;
        Ok(())
    }

    async fn comment_with_video(&self, comment_id: &str) -> AppResult<(Comment, Video)> {
        let comment = self
            .comments
            .find_comment(comment_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let video = self
            .videos
            .find_video(&comment.video_id)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok((comment, video))
    }

    async fn commenter_name(&self, user_id: &str) -> AppResult<String> {
        let profile = self.profiles.find_by_user_id(user_id).await?;
        Ok(profile
            .and_then(|p: Profile| p.display_name.or(p.handle))
            .unwrap_or_default())
    }
}

fn require_member(user_id: &str) -> AppResult<()> {
    if user_id.trim().is_empty() {
        return Err(AppError::NotAuthenticated);
    }
    Ok(())
}
