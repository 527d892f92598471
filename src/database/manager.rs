use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::{AppConfig, DatabaseConfig, StoreBackend};

use super::memory::MemoryStore;
use super::postgres::PgStore;
use super::repository::Store;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Idempotent schema for the document collections. `seq` keeps natural
/// insertion order for listings.
const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        seq BIGSERIAL,
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        image TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
        is_banned BOOLEAN NOT NULL DEFAULT FALSE,
        playlists UUID[] NOT NULL DEFAULT '{}'
    )"#,
    r#"CREATE TABLE IF NOT EXISTS categories (
        seq BIGSERIAL,
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        tracks UUID[] NOT NULL DEFAULT '{}'
    )"#,
    r#"CREATE TABLE IF NOT EXISTS audios (
        seq BIGSERIAL,
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        artist TEXT NOT NULL,
        track TEXT NOT NULL,
        image TEXT NOT NULL,
        views BIGINT NOT NULL DEFAULT 0 CHECK (views >= 0),
        likes BIGINT NOT NULL DEFAULT 0 CHECK (likes >= 0),
        comments UUID[] NOT NULL DEFAULT '{}',
        category UUID NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS playlists (
        seq BIGSERIAL,
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        tracks UUID[] NOT NULL DEFAULT '{}',
        owner UUID NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS comments (
        seq BIGSERIAL,
        id UUID PRIMARY KEY,
        text TEXT NOT NULL,
        author UUID NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS playlists_owner_name_idx ON playlists (owner, name)",
    "CREATE INDEX IF NOT EXISTS audios_title_idx ON audios (title)",
];

/// Builds the configured store backend
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open the store selected by `storage.backend`
    pub async fn open(config: &AppConfig) -> Result<Arc<dyn Store>, DatabaseError> {
        match config.storage.backend {
            StoreBackend::Memory => {
                info!("Using in-memory store; data is lost on restart");
                Ok(Arc::new(MemoryStore::new()))
            }
            StoreBackend::Postgres => {
                let pool = Self::connect(&config.database).await?;
                Self::bootstrap(&pool).await?;
                Ok(Arc::new(PgStore::new(pool)))
            }
        }
    }

    /// Create the connection pool
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool for: {}", Self::redact(url)?);
        Ok(pool)
    }

    /// Create collections and indexes if they are missing
    pub async fn bootstrap(pool: &PgPool) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        info!("Database schema ready");
        Ok(())
    }

    /// Connection string with the password removed, safe for logs
    fn redact(url: &str) -> Result<String, DatabaseError> {
        let mut parsed = url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if parsed.password().is_some() {
            parsed
                .set_password(Some("****"))
                .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        }
        Ok(parsed.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_hides_password() {
        let redacted = DatabaseManager::redact("postgres://app:hunter2@db:5432/tunehub").unwrap();
        assert_eq!(redacted, "postgres://app:****@db:5432/tunehub");
    }

    #[test]
    fn redact_rejects_garbage() {
        assert!(matches!(
            DatabaseManager::redact("not a url"),
            Err(DatabaseError::InvalidDatabaseUrl)
        ));
    }

    #[tokio::test]
    async fn open_memory_backend() {
        let config = AppConfig::testing(std::env::temp_dir());
        let store = DatabaseManager::open(&config).await.unwrap();
        assert_eq!(store.backend_name(), "memory");
        assert!(store.ping().await.is_ok());
    }
}
