use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::domain::{ApiError, Result, Session};
use crate::ports::SessionStore;

/// Session store for tests and embedded composition.
pub struct MemorySessionStore {
    inner: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self) -> Result<Option<Session>> {
        Ok(self.inner.read().await.clone())
    }

    async fn set(&self, session: Session) -> Result<()> {
        *self.inner.write().await = Some(session);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.inner.write().await = None;
        Ok(())
    }
}

// TOML cannot represent a bare top-level Option, hence the wrapper.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    session: Option<Session>,
}

/// File-backed session store for the CLI binary. The whole session is one
/// value on disk; `clear` rewrites the file with nothing in it.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<StoredSession> {
        confy::load_path(&self.path).map_err(|e| ApiError::Store(e.to_string()))
    }

    fn save(&self, stored: StoredSession) -> Result<()> {
        confy::store_path(&self.path, stored).map_err(|e| ApiError::Store(e.to_string()))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self) -> Result<Option<Session>> {
        Ok(self.load()?.session)
    }

    async fn set(&self, session: Session) -> Result<()> {
        self.save(StoredSession {
            session: Some(session),
        })
    }

    async fn clear(&self) -> Result<()> {
        self.save(StoredSession::default())
    }
}
