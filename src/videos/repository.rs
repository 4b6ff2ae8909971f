// Video store: videos and their per-member likes
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use std::sync::Arc;

use crate::db::models::Video;
use crate::db::{now_timestamp, RepositoryError};
use crate::state::DbPool;
use crate::videos::domain::{Cursor, LikeState, NewVideo};

#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn insert_video(&self, user_id: &str, video: &NewVideo) -> Result<Video, RepositoryError>;

    async fn find_video(&self, id: &str) -> Result<Option<Video>, RepositoryError>;

    /// Newest first, strictly after `after`, at most `limit` rows.
    async fn list_for_profile(
        &self,
        profile_id: &str,
        include_private: bool,
        after: Option<&Cursor>,
        limit: u32,
    ) -> Result<Vec<Video>, RepositoryError>;

    /// Delete a video with its likes and comments. Returns whether it existed.
    async fn delete_video(&self, id: &str) -> Result<bool, RepositoryError>;

    /// Flip the (video, member) like row and resync the counter from the
    /// rows. `None` when the video does not exist.
    async fn toggle_like(
        &self,
        video_id: &str,
        user_id: &str,
    ) -> Result<Option<LikeState>, RepositoryError>;

    async fn has_liked(&self, video_id: &str, user_id: &str) -> Result<bool, RepositoryError>;
}

pub struct SqliteVideoRepository {
    pool: DbPool,
}

impl SqliteVideoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn select_video(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<Video>> {
    conn.query_row(
        &format!("SELECT {} FROM videos WHERE id = ?1", Video::COLUMNS),
        params![id],
        Video::from_row,
    )
    .optional()
}

#[async_trait]
impl VideoRepository for SqliteVideoRepository {
    async fn insert_video(&self, user_id: &str, video: &NewVideo) -> Result<Video, RepositoryError> {
        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();

        conn.execute(
            "INSERT INTO videos (id, profile_id, user_id, youtube_url, title, description, is_public, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                video.profile_id,
                user_id,
                video.youtube_url,
                video.title,
                video.description,
                video.is_public,
                now_timestamp(),
            ],
        )?;

        select_video(&conn, &id)?
            .ok_or_else(|| RepositoryError::Conflict(format!("video {} vanished after insert", id)))
    }

    async fn find_video(&self, id: &str) -> Result<Option<Video>, RepositoryError> {
        let conn = self.pool.get()?;
        Ok(select_video(&conn, id)?)
    }

    async fn list_for_profile(
        &self,
        profile_id: &str,
        include_private: bool,
        after: Option<&Cursor>,
        limit: u32,
    ) -> Result<Vec<Video>, RepositoryError> {
        let conn = self.pool.get()?;
        let (after_created, after_id) = match after {
            Some(cursor) => (Some(cursor.created_at.as_str()), Some(cursor.id.as_str())),
            None => (None, None),
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM videos
             WHERE profile_id = ?1
               AND (?2 OR is_public = 1)
               AND (?3 IS NULL OR created_at < ?3 OR (created_at = ?3 AND id < ?4))
             ORDER BY created_at DESC, id DESC
             LIMIT ?5",
            Video::COLUMNS
        ))?;
        let videos = stmt
            .query_map(
                params![profile_id, include_private, after_created, after_id, limit],
                Video::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(videos)
    }

    async fn delete_video(&self, id: &str) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute("DELETE FROM video_likes WHERE video_id = ?1", params![id])?;
        tx.execute("DELETE FROM comments WHERE video_id = ?1", params![id])?;
        let removed = tx.execute("DELETE FROM videos WHERE id = ?1", params![id])? == 1;

        tx.commit()?;
        Ok(removed)
    }

    async fn toggle_like(
        &self,
        video_id: &str,
        user_id: &str,
    ) -> Result<Option<LikeState>, RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if select_video(&tx, video_id)?.is_none() {
            return Ok(None);
        }

        // The (video, member) row is the source of truth, the counter follows it
        let unliked = tx.execute(
            "DELETE FROM video_likes WHERE video_id = ?1 AND user_id = ?2",
            params![video_id, user_id],
        )? == 1;
        if !unliked {
            tx.execute(
                "INSERT INTO video_likes (video_id, user_id, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(video_id, user_id) DO NOTHING",
                params![video_id, user_id, now_timestamp()],
            )?;
        }

        let likes_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM video_likes WHERE video_id = ?1",
            params![video_id],
            |row| row.get(0),
        )?;
        tx.execute(
            "UPDATE videos SET likes_count = ?2 WHERE id = ?1",
            params![video_id, likes_count],
        )?;

        tx.commit()?;
        Ok(Some(LikeState {
            liked: !unliked,
            likes_count,
        }))
    }

    async fn has_liked(&self, video_id: &str, user_id: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let liked: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM video_likes WHERE video_id = ?1 AND user_id = ?2",
            params![video_id, user_id],
            |row| row.get(0),
        )?;
        Ok(liked)
    }
}

/// Type alias for Arc-wrapped repository (for AppState)
pub type DynVideoRepository = Arc<dyn VideoRepository>;
