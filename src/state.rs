use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::repo::{CredentialStore, SqliteCredentialStore};
use crate::auth::session::SessionManager;
use crate::config::AppConfig;
use crate::db;
use crate::news::repo::{NewsStore, SqliteNewsStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn CredentialStore>,
    pub news: Arc<dyn NewsStore>,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let pool = db::connect(&config.database_url).await?;
        Ok(Self::from_parts(pool, Arc::new(config)))
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>) -> Self {
        let sessions = Arc::new(SessionManager::new(&config.session));
        Self {
            users: Arc::new(SqliteCredentialStore::new(db.clone())) as Arc<dyn CredentialStore>,
            news: Arc::new(SqliteNewsStore::new(db)) as Arc<dyn NewsStore>,
            sessions,
            config,
        }
    }

    /// State over a fresh in-memory database with test settings.
    #[cfg(test)]
    pub async fn fake() -> Self {
        Self::from_parts(db::memory().await, Arc::new(AppConfig::for_tests()))
    }
}
