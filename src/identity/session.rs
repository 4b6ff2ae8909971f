use async_trait::async_trait;
use rand::Rng;
use rusqlite::{params, OptionalExtension};

use crate::db::RepositoryError;
use crate::identity::IdentityProvider;
use crate::state::DbPool;

/// Create a new session for a member. Returns the session token.
pub fn create_session(pool: &DbPool, member_id: &str, hours: u64) -> Result<String, RepositoryError> {
    let conn = pool.get()?;
    let token = generate_token();

    conn.execute(
        "INSERT INTO sessions (token, member_id, expires_at) VALUES (?1, ?2, datetime('now', ?3))",
        params![token, member_id, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Delete a session by token.
pub fn delete_session(pool: &DbPool, token: &str) -> Result<(), RepositoryError> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

/// Resolves tokens against the `sessions` table.
pub struct SessionIdentityProvider {
    pool: DbPool,
}

impl SessionIdentityProvider {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityProvider for SessionIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<Option<String>, RepositoryError> {
        if token.is_empty() {
            return Ok(None);
        }
        let conn = self.pool.get()?;
        let member_id = conn
            .query_row(
                "SELECT member_id FROM sessions WHERE token = ?1 AND expires_at > datetime('now')",
                params![token],
                |row| row.get(0),
            )
            .optional()?;
        Ok(member_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::test_pool;

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[tokio::test]
    async fn resolves_live_session() {
        let (pool, _tmp) = test_pool();
        let token = create_session(&pool, "member-1", 1).unwrap();
        let provider = SessionIdentityProvider::new(pool);
        assert_eq!(
            provider.resolve(&token).await.unwrap().as_deref(),
            Some("member-1")
        );
        assert_eq!(provider.resolve("nope").await.unwrap(), None);
        assert_eq!(provider.resolve("").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_and_deleted_sessions_are_anonymous() {
        let (pool, _tmp) = test_pool();
        {
            let conn = pool.get().unwrap();
            conn.execute(
                "INSERT INTO sessions (token, member_id, expires_at) VALUES ('old', 'm', datetime('now', '-1 hours'))",
                [],
            )
            .unwrap();
        }
        let token = create_session(&pool, "member-2", 1).unwrap();
        delete_session(&pool, &token).unwrap();

        let provider = SessionIdentityProvider::new(pool);
        assert_eq!(provider.resolve("old").await.unwrap(), None);
        assert_eq!(provider.resolve(&token).await.unwrap(), None);
    }
}
