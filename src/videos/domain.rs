// Video and comment rules - pure, no store access
use serde::{Deserialize, Serialize};

use crate::db::models::{Comment, Video};
use crate::error::AppError;

pub const DEFAULT_PAGE_SIZE: u32 = 5;
pub const MAX_PAGE_SIZE: u32 = 50;
pub const DEFAULT_COMMENT_LIMIT: u32 = 200;
pub const MAX_COMMENT_LIMIT: u32 = 500;
pub const MAX_COMMENT_CHARS: usize = 1000;
pub const FALLBACK_DISPLAY_NAME: &str = "Racer";

/// Position after the last item of a page, newest-first by
/// `(created_at, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub created_at: String,
    pub id: String,
}

impl Cursor {
    pub fn after(video: &Video) -> Self {
        Self {
            created_at: video.created_at.clone(),
            id: video.id.clone(),
        }
    }

    /// Opaque token handed to clients
    pub fn encode(&self) -> String {
        hex::encode(format!("{}\n{}", self.created_at, self.id))
    }

    pub fn decode(token: &str) -> Result<Self, AppError> {
        let bytes = hex::decode(token.trim()).map_err(|_| AppError::InvalidCursor)?;
        let text = String::from_utf8(bytes).map_err(|_| AppError::InvalidCursor)?;
        let (created_at, id) = text.split_once('\n').ok_or(AppError::InvalidCursor)?;
        if created_at.is_empty() || id.is_empty() {
            return Err(AppError::InvalidCursor);
        }
        Ok(Self {
            created_at: created_at.to_string(),
            id: id.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPage {
    pub items: Vec<Video>,
    pub next_cursor: Option<String>,
}

impl VideoPage {
    /// Build a page from up to `page_size + 1` rows; the extra row only
    /// signals that another page exists.
    pub fn from_rows(mut rows: Vec<Video>, page_size: u32) -> Self {
        let page_size = page_size as usize;
        let has_more = rows.len() > page_size;
        rows.truncate(page_size);
        let next_cursor = if has_more {
            rows.last().map(|v| Cursor::after(v).encode())
        } else {
            None
        };
        Self {
            items: rows,
            next_cursor,
        }
    }
}

pub fn clamp_page_size(page_size: Option<u32>) -> u32 {
    page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

pub fn clamp_comment_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_COMMENT_LIMIT).clamp(1, MAX_COMMENT_LIMIT)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVideo {
    pub profile_id: String,
    pub youtube_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    pub liked: bool,
    pub likes_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommentLikes {
    pub likes: i64,
}

/// Trimmed comment body, or `EmptyBody`.
pub fn comment_body(body: &str) -> Result<String, AppError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(AppError::EmptyBody);
    }
    if body.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::BadRequest(format!(
            "Comment must be {} characters or less",
            MAX_COMMENT_CHARS
        )));
    }
    Ok(body.to_string())
}

pub fn comment_display_name(display_name: Option<&str>) -> String {
    match display_name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => FALLBACK_DISPLAY_NAME.to_string(),
    }
}

/// Private videos exist only for their owner.
pub fn visible_to(video: &Video, viewer: Option<&str>) -> bool {
    video.is_public || viewer == Some(video.user_id.as_str())
}

pub fn can_delete_comment(comment: &Comment, video: &Video, requester: &str) -> bool {
    comment.user_id == requester || video.user_id == requester
}

/// Pending comments are readable by their author and the video owner only.
pub fn comment_visible_to(comment: &Comment, video: &Video, viewer: &str) -> bool {
    visible_to(video, Some(viewer))
        && (comment.approved || can_delete_comment(comment, video, viewer))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn video(id: &str, created_at: &str) -> Video {
        Video {
            id: id.into(),
            profile_id: "p1".into(),
            user_id: "owner".into(),
            youtube_url: "https://youtu.be/abc".into(),
            title: String::new(),
            description: String::new(),
            is_public: true,
            likes_count: 0,
            comments_count: 0,
            created_at: created_at.into(),
        }
    }

    #[test]
    fn cursor_is_opaque_and_decodes() {
        let cursor = Cursor {
            created_at: "2025-06-01T10:00:00.000000Z".into(),
            id: "v-1".into(),
        };
        let token = cursor.encode();
        assert!(!token.contains("2025"));
        assert_eq!(Cursor::decode(&token).unwrap(), cursor);
    }

    #[test]
    fn bad_cursors_are_rejected() {
        let no_separator = hex::encode("no-newline");
        let empty_timestamp = hex::encode("\nid");
        for token in ["zz", "", no_separator.as_str(), empty_timestamp.as_str()] {
            assert!(matches!(Cursor::decode(token), Err(AppError::InvalidCursor)));
        }
    }

    #[test]
    fn page_with_extra_row_has_cursor_of_last_item() {
        let rows = vec![video("c", "3"), video("b", "2"), video("a", "1")];
        let page = VideoPage::from_rows(rows, 2);
        assert_eq!(page.items.len(), 2);
        let cursor = Cursor::decode(page.next_cursor.as_deref().unwrap()).unwrap();
        assert_eq!(cursor.id, "b");
    }

    #[test]
    fn exhausted_page_has_no_cursor() {
        let page = VideoPage::from_rows(vec![video("a", "1")], 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next_cursor, None);

        let empty = VideoPage::from_rows(Vec::new(), 2);
        assert!(empty.items.is_empty());
        assert_eq!(empty.next_cursor, None);
    }

    #[test]
    fn comment_body_validation() {
        assert!(matches!(comment_body("   \n "), Err(AppError::EmptyBody)));
        assert_eq!(comment_body("  nice lap ").unwrap(), "nice lap");
        let long = "x".repeat(MAX_COMMENT_CHARS + 1);
        assert!(matches!(comment_body(&long), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn display_name_falls_back() {
        assert_eq!(comment_display_name(None), "Racer");
        assert_eq!(comment_display_name(Some("  ")), "Racer");
        assert_eq!(comment_display_name(Some(" Max ")), "Max");
    }

    #[test]
    fn private_videos_visible_to_owner_only() {
        let mut v = video("a", "1");
        v.is_public = false;
        assert!(visible_to(&v, Some("owner")));
        assert!(!visible_to(&v, Some("other")));
        assert!(!visible_to(&v, None));
    }

    #[test]
    fn pending_comments_hidden_from_other_members() {
        let v = video("a", "1");
        let mut c = Comment {
            id: "c1".into(),
            video_id: "a".into(),
            user_id: "fan".into(),
            display_name: "fan".into(),
            body: "nice line".into(),
            likes: 0,
            approved: false,
            created_at: "1".into(),
        };
        assert!(comment_visible_to(&c, &v, "fan"));
        assert!(comment_visible_to(&c, &v, "owner"));
        assert!(!comment_visible_to(&c, &v, "other"));

        c.approved = true;
        assert!(comment_visible_to(&c, &v, "other"));
        let mut private = v.clone();
        private.is_public = false;
        assert!(!comment_visible_to(&c, &private, "other"));
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(clamp_page_size(None), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_page_size(Some(0)), 1);
        assert_eq!(clamp_page_size(Some(1000)), MAX_PAGE_SIZE);
        assert_eq!(clamp_comment_limit(None), DEFAULT_COMMENT_LIMIT);
    }
}
