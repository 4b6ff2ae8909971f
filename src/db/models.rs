use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    pub handle: Option<String>,
    pub handle_lower: Option<String>,
    pub display_name: Option<String>,
    pub display_name_lower: Option<String>,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub marketing_opt_in: bool,
    pub comments_require_approval: bool,
    pub comments_friends_only: bool,
    pub followers_count: i64,
    pub following_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Profile {
    pub const COLUMNS: &'static str = "id, user_id, handle, handle_lower, display_name, \
        display_name_lower, avatar_url, cover_url, marketing_opt_in, comments_require_approval, \
        comments_friends_only, followers_count, following_count, created_at, updated_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            handle: row.get(2)?,
            handle_lower: row.get(3)?,
            display_name: row.get(4)?,
            display_name_lower: row.get(5)?,
            avatar_url: row.get(6)?,
            cover_url: row.get(7)?,
            marketing_opt_in: row.get(8)?,
            comments_require_approval: row.get(9)?,
            comments_friends_only: row.get(10)?,
            followers_count: row.get(11)?,
            following_count: row.get(12)?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowEdge {
    pub follower_id: String,
    pub followee_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub profile_id: String,
    pub user_id: String,
    pub youtube_url: String,
    pub title: String,
    pub description: String,
    pub is_public: bool,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: String,
}

impl Video {
    pub const COLUMNS: &'static str = "id, profile_id, user_id, youtube_url, title, description, \
        is_public, likes_count, comments_count, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            profile_id: row.get(1)?,
            user_id: row.get(2)?,
            youtube_url: row.get(3)?,
            title: row.get(4)?,
            description: row.get(5)?,
            is_public: row.get(6)?,
            likes_count: row.get(7)?,
            comments_count: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub video_id: String,
    pub user_id: String,
    pub display_name: String,
    pub body: String,
    pub likes: i64,
    pub approved: bool,
    pub created_at: String,
}

impl Comment {
    pub const COLUMNS: &'static str =
        "id, video_id, user_id, display_name, body, likes, approved, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            video_id: row.get(1)?,
            user_id: row.get(2)?,
            display_name: row.get(3)?,
            body: row.get(4)?,
            likes: row.get(5)?,
            approved: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}
