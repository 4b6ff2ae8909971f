// Follow graph store
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use std::sync::Arc;

use crate::db::models::FollowEdge;
use crate::db::{now_timestamp, RepositoryError};
use crate::state::DbPool;

/// Slice of a follower/following listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListWindow {
    pub limit: u32,
    pub offset: u32,
}

impl ListWindow {
    pub const MAX_LIMIT: u32 = 500;

    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(Self::MAX_LIMIT).clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for ListWindow {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Create the edge unless present. Returns the edge and whether this call
    /// created it. Profile counters move only when it did.
    async fn insert_edge(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<(FollowEdge, bool), RepositoryError>;

    /// Remove the edge. Returns whether a row was removed.
    async fn delete_edge(&self, follower_id: &str, followee_id: &str)
        -> Result<bool, RepositoryError>;

    async fn find_edge(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<Option<FollowEdge>, RepositoryError>;

    /// Member ids following `user_id`.
    async fn follower_ids(&self, user_id: &str, window: ListWindow)
        -> Result<Vec<String>, RepositoryError>;

    /// Member ids `user_id` follows.
    async fn following_ids(&self, user_id: &str, window: ListWindow)
        -> Result<Vec<String>, RepositoryError>;

    /// Both directions exist between `a` and `b`.
    async fn is_mutual(&self, a: &str, b: &str) -> Result<bool, RepositoryError>;
}

pub struct SqliteFollowRepository {
    pool: DbPool,
}

impl SqliteFollowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn ids(
        &self,
        sql: &str,
        user_id: &str,
        window: ListWindow,
    ) -> Result<Vec<String>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(sql)?;
        let ids = stmt
            .query_map(params![user_id, window.limit, window.offset], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}

fn select_edge(
    conn: &rusqlite::Connection,
    follower_id: &str,
    followee_id: &str,
) -> rusqlite::Result<Option<FollowEdge>> {
    conn.query_row(
        "SELECT follower_id, followee_id, created_at FROM follows
         WHERE follower_id = ?1 AND followee_id = ?2",
        params![follower_id, followee_id],
        |row| {
            Ok(FollowEdge {
                follower_id: row.get(0)?,
                followee_id: row.get(1)?,
                created_at: row.get(2)?,
            })
        },
    )
    .optional()
}

/// Insert an edge and bump both counters on the caller's connection, so it
/// can join a wider transaction. Returns whether the edge is new.
pub(crate) fn insert_edge_in(
    conn: &rusqlite::Connection,
    follower_id: &str,
    followee_id: &str,
) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT INTO follows (follower_id, followee_id, created_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(follower_id, followee_id) DO NOTHING",
        params![follower_id, followee_id, now_timestamp()],
    )? == 1;

    if inserted {
        conn.execute(
            "UPDATE profiles SET following_count = following_count + 1 WHERE user_id = ?1",
            params![follower_id],
        )?;
        conn.execute(
            "UPDATE profiles SET followers_count = followers_count + 1 WHERE user_id = ?1",
            params![followee_id],
        )?;
    }
    Ok(inserted)
}

#[async_trait]
impl FollowRepository for SqliteFollowRepository {
    async fn insert_edge(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<(FollowEdge, bool), RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let inserted = insert_edge_in(&tx, follower_id, followee_id)?;
        let edge = select_edge(&tx, follower_id, followee_id)?
            .ok_or_else(|| RepositoryError::Conflict("follow edge vanished".into()))?;
        tx.commit()?;
        Ok((edge, inserted))
    }

    async fn delete_edge(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let removed = tx.execute(
            "DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
            params![follower_id, followee_id],
        )? == 1;

        if removed {
            tx.execute(
                "UPDATE profiles SET following_count = MAX(following_count - 1, 0) WHERE user_id = ?1",
                params![follower_id],
            )?;
            tx.execute(
                "UPDATE profiles SET followers_count = MAX(followers_count - 1, 0) WHERE user_id = ?1",
                params![followee_id],
            )?;
        }

        tx.commit()?;
        Ok(removed)
    }

    async fn find_edge(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<Option<FollowEdge>, RepositoryError> {
        let conn = self.pool.get()?;
        Ok(select_edge(&conn, follower_id, followee_id)?)
    }

    async fn follower_ids(
        &self,
        user_id: &str,
        window: ListWindow,
    ) -> Result<Vec<String>, RepositoryError> {
        self.ids(
            "SELECT follower_id FROM follows WHERE followee_id = ?1
             ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
            user_id,
            window,
        )
    }

    async fn following_ids(
        &self,
        user_id: &str,
        window: ListWindow,
    ) -> Result<Vec<String>, RepositoryError> {
        self.ids(
            "SELECT followee_id FROM follows WHERE follower_id = ?1
             ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
            user_id,
            window,
        )
    }

    async fn is_mutual(&self, a: &str, b: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows
             WHERE (follower_id = ?1 AND followee_id = ?2)
                OR (follower_id = ?2 AND followee_id = ?1)",
            params![a, b],
            |row| row.get(0),
        )?;
        Ok(count == 2)
    }
}

/// Type alias for Arc-wrapped repository (for AppState)
pub type DynFollowRepository = Arc<dyn FollowRepository>;
