use std::sync::Arc;

use crate::auth::{hash_password, AuthError, TokenIssuer};
use crate::config::AppConfig;
use crate::database::Store;
use crate::services::{FileStorage, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Upload directory unusable: {0}")]
    Storage(#[from] StorageError),
}

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub tokens: TokenIssuer,
    pub files: FileStorage,
    /// Hash at the configured cost, verified when a login names no account
    pub login_decoy: Arc<str>,
}

impl AppState {
    /// Wire the state and create the upload directories
    pub async fn new(config: AppConfig, store: Arc<dyn Store>) -> Result<Self, StateError> {
        let tokens = TokenIssuer::new(&config.security)?;
        let files = FileStorage::new(config.storage.upload_dir.clone());
        files.initialize().await?;
        let login_decoy = hash_password(&uuid::Uuid::new_v4().to_string(), config.security.bcrypt_cost).await?;

        Ok(Self {
            config: Arc::new(config),
            store,
            tokens,
            files,
            login_decoy: login_decoy.into(),
        })
    }
}
