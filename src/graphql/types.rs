use async_graphql::*;
use chrono::{DateTime, Utc};

use crate::db::models::{Comment, Profile, Video};
use crate::videos::VideoPage;

// Stored timestamps are RFC 3339; anything else is reported as "now"
fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Public view of a racer profile
#[derive(Clone, Debug, SimpleObject)]
pub struct ProfileNode {
    pub id: String,
    pub user_id: String,
    pub handle: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub comments_require_approval: bool,
    pub comments_friends_only: bool,
    pub followers_count: i64,
    pub following_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Profile> for ProfileNode {
    fn from(p: Profile) -> Self {
        Self {
            created_at: parse_datetime(&p.created_at),
            id: p.id,
            user_id: p.user_id,
            handle: p.handle,
            display_name: p.display_name,
            avatar_url: p.avatar_url,
            cover_url: p.cover_url,
            comments_require_approval: p.comments_require_approval,
            comments_friends_only: p.comments_friends_only,
            followers_count: p.followers_count,
            following_count: p.following_count,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct VideoNode {
    pub id: String,
    pub profile_id: String,
    pub user_id: String,
    pub youtube_url: String,
    pub title: String,
    pub description: String,
    pub is_public: bool,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Video> for VideoNode {
    fn from(v: Video) -> Self {
        Self {
            created_at: parse_datetime(&v.created_at),
            id: v.id,
            profile_id: v.profile_id,
            user_id: v.user_id,
            youtube_url: v.youtube_url,
            title: v.title,
            description: v.description,
            is_public: v.is_public,
            likes_count: v.likes_count,
            comments_count: v.comments_count,
        }
    }
}

/// One page of videos; pass `nextCursor` back to continue
#[derive(Clone, Debug, SimpleObject)]
pub struct VideoPageNode {
    pub items: Vec<VideoNode>,
    pub next_cursor: Option<String>,
}

impl From<VideoPage> for VideoPageNode {
    fn from(page: VideoPage) -> Self {
        Self {
            items: page.items.into_iter().map(VideoNode::from).collect(),
            next_cursor: page.next_cursor,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct CommentNode {
    pub id: String,
    pub video_id: String,
    pub user_id: String,
    pub display_name: String,
    pub body: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentNode {
    fn from(c: Comment) -> Self {
        Self {
            created_at: parse_datetime(&c.created_at),
            id: c.id,
            video_id: c.video_id,
            user_id: c.user_id,
            display_name: c.display_name,
            body: c.body,
            likes: c.likes,
        }
    }
}
