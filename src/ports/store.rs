use async_trait::async_trait;

use crate::domain::{Result, Session};

/// Client-local session persistence. The store holds at most one session;
/// `set` replaces it wholesale and `clear` removes base URL, token and
/// user record together.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self) -> Result<Option<Session>>;

    async fn set(&self, session: Session) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}
