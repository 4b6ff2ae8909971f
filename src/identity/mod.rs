//! Member identity. Sessions are issued by the external member/auth provider;
//! this service only maps an opaque token to a member id.

pub mod session;

use async_trait::async_trait;
use std::sync::Arc;

use crate::db::RepositoryError;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Member id behind a session token, or `None` for anonymous/expired.
    async fn resolve(&self, token: &str) -> Result<Option<String>, RepositoryError>;
}

pub type DynIdentityProvider = Arc<dyn IdentityProvider>;

pub use session::SessionIdentityProvider;
