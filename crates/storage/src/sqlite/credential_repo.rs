use async_trait::async_trait;
use wordiamo_core::model::Credentials;

use super::SqliteRepository;
use crate::repository::{AUTH_CREDENTIALS_KEY, CredentialRepository, StorageError};

#[async_trait]
impl CredentialRepository for SqliteRepository {
    async fn save_credentials(&self, credentials: &Credentials) -> Result<(), StorageError> {
        self.put_json(AUTH_CREDENTIALS_KEY, credentials).await
    }

    async fn load_credentials(&self) -> Result<Option<Credentials>, StorageError> {
        self.get_json(AUTH_CREDENTIALS_KEY).await
    }

    async fn clear_credentials(&self) -> Result<(), StorageError> {
        self.delete_key(AUTH_CREDENTIALS_KEY).await
    }
}
