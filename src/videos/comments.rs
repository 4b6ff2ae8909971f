// Comment store
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Transaction, TransactionBehavior};
use std::sync::Arc;

use crate::db::models::Comment;
use crate::db::{now_timestamp, RepositoryError};
use crate::state::DbPool;

/// Fields of a comment as written by the service.
#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub video_id: String,
    pub user_id: String,
    pub display_name: String,
    pub body: String,
    pub approved: bool,
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert_comment(&self, draft: &CommentDraft) -> Result<Comment, RepositoryError>;

    async fn find_comment(&self, id: &str) -> Result<Option<Comment>, RepositoryError>;

    /// Comments of one approval state, newest first.
    async fn list_comments(
        &self,
        video_id: &str,
        approved: bool,
        limit: u32,
    ) -> Result<Vec<Comment>, RepositoryError>;

    /// Bump the like counter. `None` when the comment does not exist.
    async fn increment_likes(&self, id: &str) -> Result<Option<i64>, RepositoryError>;

    async fn approve(&self, id: &str) -> Result<Option<Comment>, RepositoryError>;

    async fn delete_comment(&self, id: &str) -> Result<bool, RepositoryError>;
}

pub struct SqliteCommentRepository {
    pool: DbPool,
}

impl SqliteCommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn select_comment(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<Comment>> {
    conn.query_row(
        &format!("SELECT {} FROM comments WHERE id = ?1", Comment::COLUMNS),
        params![id],
        Comment::from_row,
    )
    .optional()
}

/// `comments_count` tracks visible comments only.
fn refresh_comments_count(tx: &Transaction<'_>, video_id: &str) -> rusqlite::Result<()> {
    tx.execute(
        "UPDATE videos SET comments_count =
             (SELECT COUNT(*) FROM comments WHERE video_id = ?1 AND approved = 1)
         WHERE id = ?1",
        params![video_id],
    )?;
    Ok(())
}

#[async_trait]
impl CommentRepository for SqliteCommentRepository {
    async fn insert_comment(&self, draft: &CommentDraft) -> Result<Comment, RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let id = uuid::Uuid::now_v7().to_string();

        tx.execute(
            "INSERT INTO comments (id, video_id, user_id, display_name, body, approved, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                draft.video_id,
                draft.user_id,
                draft.display_name,
                draft.body,
                draft.approved,
                now_timestamp(),
            ],
        )?;
        refresh_comments_count(&tx, &draft.video_id)?;

        let comment = select_comment(&tx, &id)?
            .ok_or_else(|| RepositoryError::Conflict(format!("comment {} vanished after insert", id)))?;
        tx.commit()?;
        Ok(comment)
    }

    async fn find_comment(&self, id: &str) -> Result<Option<Comment>, RepositoryError> {
        let conn = self.pool.get()?;
        Ok(select_comment(&conn, id)?)
    }

    async fn list_comments(
        &self,
        video_id: &str,
        approved: bool,
        limit: u32,
    ) -> Result<Vec<Comment>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM comments
             WHERE video_id = ?1 AND approved = ?2
             ORDER BY created_at DESC, id DESC
             LIMIT ?3",
            Comment::COLUMNS
        ))?;
        let comments = stmt
            .query_map(params![video_id, approved, limit], Comment::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    async fn increment_likes(&self, id: &str) -> Result<Option<i64>, RepositoryError> {
        let conn = self.pool.get()?;
        let likes = conn
            .query_row(
                "UPDATE comments SET likes = likes + 1 WHERE id = ?1 RETURNING likes",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(likes)
    }

    async fn approve(&self, id: &str) -> Result<Option<Comment>, RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(comment) = select_comment(&tx, id)? else {
            return Ok(None);
        };
        if !comment.approved {
            tx.execute("UPDATE comments SET approved = 1 WHERE id = ?1", params![id])?;
            refresh_comments_count(&tx, &comment.video_id)?;
        }

        let approved = select_comment(&tx, id)?;
        tx.commit()?;
        Ok(approved)
    }

    async fn delete_comment(&self, id: &str) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(comment) = select_comment(&tx, id)? else {
            return Ok(false);
        };
        tx.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        refresh_comments_count(&tx, &comment.video_id)?;

        tx.commit()?;
        Ok(true)
    }
}

/// Type alias for Arc-wrapped repository (for AppState)
pub type DynCommentRepository = Arc<dyn CommentRepository>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::test_pool;
    use crate::videos::repository::tests::{new_video, seed_profile};
    use crate::videos::repository::{SqliteVideoRepository, VideoRepository};

    async fn video_with_pool() -> (DbPool, tempfile::TempDir, String) {
        let (pool, tmp) = test_pool();
        seed_profile(&pool, "p1", "owner");
        let video = SqliteVideoRepository::new(pool.clone())
            .insert_video("owner", &new_video("p1", true))
            .await
            .unwrap();
        (pool, tmp, video.id)
    }

    fn draft(video_id: &str, body: &str, approved: bool) -> CommentDraft {
        CommentDraft {
            video_id: video_id.into(),
            user_id: "fan".into(),
            display_name: "Fan".into(),
            body: body.into(),
            approved,
        }
    }

    fn comments_count(pool: &DbPool, video_id: &str) -> i64 {
        pool.get()
            .unwrap()
            .query_row(
                "SELECT comments_count FROM videos WHERE id = ?1",
                params![video_id],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[tokio::test]
    async fn only_approved_comments_are_counted() {
        let (pool, _tmp, video_id) = video_with_pool().await;
        let repo = SqliteCommentRepository::new(pool.clone());

        repo.insert_comment(&draft(&video_id, "visible", true)).await.unwrap();
        let pending = repo.insert_comment(&draft(&video_id, "queued", false)).await.unwrap();
        assert_eq!(comments_count(&pool, &video_id), 1);

        let approved = repo.approve(&pending.id).await.unwrap().unwrap();
        assert!(approved.approved);
        assert_eq!(comments_count(&pool, &video_id), 2);

        // Approving twice is a no-op
        repo.approve(&pending.id).await.unwrap();
        assert_eq!(comments_count(&pool, &video_id), 2);

        assert!(repo.delete_comment(&pending.id).await.unwrap());
        assert!(!repo.delete_comment(&pending.id).await.unwrap());
        assert_eq!(comments_count(&pool, &video_id), 1);
    }

    #[tokio::test]
    async fn list_filters_by_approval() {
        let (pool, _tmp, video_id) = video_with_pool().await;
        let repo = SqliteCommentRepository::new(pool);

        repo.insert_comment(&draft(&video_id, "first", true)).await.unwrap();
        repo.insert_comment(&draft(&video_id, "second", true)).await.unwrap();
        repo.insert_comment(&draft(&video_id, "hidden", false)).await.unwrap();

        let visible = repo.list_comments(&video_id, true, 10).await.unwrap();
        let bodies: Vec<&str> = visible.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["second", "first"]);

        assert_eq!(repo.list_comments(&video_id, true, 1).await.unwrap().len(), 1);
        assert_eq!(repo.list_comments(&video_id, false, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn likes_increment_without_dedup() {
        let (pool, _tmp, video_id) = video_with_pool().await;
        let repo = SqliteCommentRepository::new(pool);
        let comment = repo.insert_comment(&draft(&video_id, "nice", true)).await.unwrap();

        assert_eq!(repo.increment_likes(&comment.id).await.unwrap(), Some(1));
        assert_eq!(repo.increment_likes(&comment.id).await.unwrap(), Some(2));
        assert_eq!(repo.increment_likes("missing").await.unwrap(), None);
    }
}
