// Repository pattern - isolates all profile store access
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use std::sync::Arc;

use crate::config::MediaConfig;
use crate::db::models::Profile;
use crate::db::{now_timestamp, RepositoryError};
use crate::profiles::domain::{self, apply_extras, Handle, ProfileExtras, ProfilePatch};
use crate::social::repository::insert_edge_in;
use crate::state::DbPool;

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Profile>, RepositoryError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Profile>, RepositoryError>;

    async fn find_by_handle_lower(&self, handle_lower: &str)
        -> Result<Option<Profile>, RepositoryError>;

    /// Insert a default row unless one exists for `user_id`, together with
    /// mutual follow edges to `founder` when given. Returns true when this
    /// call created the row.
    async fn insert_default(
        &self,
        user_id: &str,
        avatar_url: &str,
        cover_url: &str,
        founder: Option<&str>,
    ) -> Result<bool, RepositoryError>;

    /// Owner of a lowercase handle, if claimed.
    async fn handle_owner(&self, handle_lower: &str) -> Result<Option<String>, RepositoryError>;

    /// Whether another member already uses this lowercase display name.
    async fn display_name_in_use(
        &self,
        display_name_lower: &str,
        excluding_user_id: Option<&str>,
    ) -> Result<bool, RepositoryError>;

    /// Re-check availability and write the handle in one transaction.
    /// `Conflict` when another member holds it; `None` when no row exists.
    async fn claim_handle(
        &self,
        user_id: &str,
        handle: &Handle,
        extras: &ProfileExtras,
    ) -> Result<Option<Profile>, RepositoryError>;

    /// Apply an owner patch to the stored row. `handle` is the validated
    /// form of `patch.handle`. `None` when no row exists.
    async fn update_owned_fields(
        &self,
        user_id: &str,
        patch: &ProfilePatch,
        handle: Option<&Handle>,
    ) -> Result<Option<Profile>, RepositoryError>;

    /// Fill in missing media and stale lowercase keys on the stored row.
    async fn backfill_defaults(
        &self,
        user_id: &str,
        media: &MediaConfig,
    ) -> Result<Option<Profile>, RepositoryError>;

    /// Profiles for a set of member ids (missing ids are skipped).
    async fn find_many_by_user_ids(&self, user_ids: &[String]) -> Result<Vec<Profile>, RepositoryError>;
}

pub struct SqliteProfileRepository {
    pool: DbPool,
}

impl SqliteProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Read, edit and write one row under a single write lock so concurrent
    /// writers never see their columns reverted. `edit` reports whether it
    /// changed anything.
    fn rewrite(
        &self,
        user_id: &str,
        edit: impl FnOnce(&mut Profile) -> bool,
    ) -> Result<Option<Profile>, RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(mut profile) = select_one(&tx, "user_id", user_id)? else {
            return Ok(None);
        };
        if !edit(&mut profile) {
            return Ok(Some(profile));
        }

        tx.execute(
            "UPDATE profiles SET handle = ?2, handle_lower = ?3, display_name = ?4,
                 display_name_lower = ?5, avatar_url = ?6, cover_url = ?7, marketing_opt_in = ?8,
                 comments_require_approval = ?9, comments_friends_only = ?10, updated_at = ?11
             WHERE user_id = ?1",
            params![
                profile.user_id,
                profile.handle,
                profile.handle_lower,
                profile.display_name,
                profile.display_name_lower,
                profile.avatar_url,
                profile.cover_url,
                profile.marketing_opt_in,
                profile.comments_require_approval,
                profile.comments_friends_only,
                now_timestamp(),
            ],
        )?;

        let saved = select_one(&tx, "user_id", user_id)?;
        tx.commit()?;
        Ok(saved)
    }
}

fn select_one(
    conn: &rusqlite::Connection,
    column: &str,
    value: &str,
) -> rusqlite::Result<Option<Profile>> {
    conn.query_row(
        &format!("SELECT {} FROM profiles WHERE {} = ?1", Profile::COLUMNS, column),
        params![value],
        Profile::from_row,
    )
    .optional()
}

#[async_trait]
impl ProfileRepository for SqliteProfileRepository {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Profile>, RepositoryError> {
        let conn = self.pool.get()?;
        Ok(select_one(&conn, "user_id", user_id)?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Profile>, RepositoryError> {
        let conn = self.pool.get()?;
        Ok(select_one(&conn, "id", id)?)
    }

    async fn find_by_handle_lower(
        &self,
        handle_lower: &str,
    ) -> Result<Option<Profile>, RepositoryError> {
        let conn = self.pool.get()?;
        Ok(select_one(&conn, "handle_lower", handle_lower)?)
    }

    async fn insert_default(
        &self,
        user_id: &str,
        avatar_url: &str,
        cover_url: &str,
        founder: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = now_timestamp();
        let id = uuid::Uuid::now_v7().to_string();

        // A concurrent first call may win the race; that is not an error
        let created = tx.execute(
            "INSERT INTO profiles (id, user_id, avatar_url, cover_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(user_id) DO NOTHING",
            params![id, user_id, avatar_url, cover_url, now],
        )? == 1;

        if created {
            if let Some(founder) = founder.filter(|f| *f != user_id) {
                insert_edge_in(&tx, user_id, founder)?;
                insert_edge_in(&tx, founder, user_id)?;
            }
        }

        tx.commit()?;
        Ok(created)
    }

    async fn handle_owner(&self, handle_lower: &str) -> Result<Option<String>, RepositoryError> {
        let conn = self.pool.get()?;
        let owner = conn
            .query_row(
                "SELECT user_id FROM profiles WHERE handle_lower = ?1",
                params![handle_lower],
                |row| row.get(0),
            )
            .optional()?;
        Ok(owner)
    }

    async fn display_name_in_use(
        &self,
        display_name_lower: &str,
        excluding_user_id: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let taken: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM profiles
             WHERE display_name_lower = ?1 AND (?2 IS NULL OR user_id <> ?2)",
            params![display_name_lower, excluding_user_id],
            |row| row.get(0),
        )?;
        Ok(taken)
    }

    async fn claim_handle(
        &self,
        user_id: &str,
        handle: &Handle,
        extras: &ProfileExtras,
    ) -> Result<Option<Profile>, RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let owner: Option<String> = tx
            .query_row(
                "SELECT user_id FROM profiles WHERE handle_lower = ?1",
                params![handle.lower()],
                |row| row.get(0),
            )
            .optional()?;
        if owner.as_deref().is_some_and(|owner| owner != user_id) {
            return Err(RepositoryError::Conflict(format!(
                "handle '{}' is taken",
                handle.lower()
            )));
        }

        let Some(mut profile) = select_one(&tx, "user_id", user_id)? else {
            return Ok(None);
        };
        apply_extras(&mut profile, extras);

        // The unique index still guards the write if the check above raced
        tx.execute(
            "UPDATE profiles SET handle = ?2, handle_lower = ?3, marketing_opt_in = ?4,
                 comments_require_approval = ?5, comments_friends_only = ?6, updated_at = ?7
             WHERE user_id = ?1",
            params![
                user_id,
                handle.as_str(),
                handle.lower(),
                profile.marketing_opt_in,
                profile.comments_require_approval,
                profile.comments_friends_only,
                now_timestamp(),
            ],
        )?;

        let updated = select_one(&tx, "user_id", user_id)?;
        tx.commit()?;
        Ok(updated)
    }

    async fn update_owned_fields(
        &self,
        user_id: &str,
        patch: &ProfilePatch,
        handle: Option<&Handle>,
    ) -> Result<Option<Profile>, RepositoryError> {
        self.rewrite(user_id, |profile| {
            domain::apply_patch(profile, patch, handle);
            true
        })
    }

    async fn backfill_defaults(
        &self,
        user_id: &str,
        media: &MediaConfig,
    ) -> Result<Option<Profile>, RepositoryError> {
        self.rewrite(user_id, |profile| domain::normalize(profile, media))
    }

    async fn find_many_by_user_ids(
        &self,
        user_ids: &[String],
    ) -> Result<Vec<Profile>, RepositoryError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.pool.get()?;
        let placeholders = vec!["?"; user_ids.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM profiles WHERE user_id IN ({})",
            Profile::COLUMNS,
            placeholders
        ))?;
        let profiles = stmt
            .query_map(rusqlite::params_from_iter(user_ids.iter()), Profile::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }
}

/// Type alias for Arc-wrapped repository (for AppState)
pub type DynProfileRepository = Arc<dyn ProfileRepository>;
