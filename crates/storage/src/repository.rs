use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use wordiamo_core::model::{Credentials, QuizResults};

/// Well-known key of the quiz hand-off snapshot.
pub const LAST_QUIZ_RESULTS_KEY: &str = "last_quiz_results";

/// Well-known key of the signed-in user's credentials.
pub const AUTH_CREDENTIALS_KEY: &str = "auth_credentials";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Single-slot store for the snapshot of the most recently completed quiz.
///
/// Not a log: each save overwrites the previous snapshot.
#[async_trait]
pub trait HandoffRepository: Send + Sync {
    /// Overwrite the slot with a new snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save_results(&self, results: &QuizResults) -> Result<(), StorageError>;

    /// Read and clear the slot in one step.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; an empty slot is `Ok(None)`.
    async fn take_results(&self) -> Result<Option<QuizResults>, StorageError>;

    /// Read the slot without clearing it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn peek_results(&self) -> Result<Option<QuizResults>, StorageError>;
}

#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the credentials cannot be stored.
    async fn save_credentials(&self, credentials: &Credentials) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; signed-out is `Ok(None)`.
    async fn load_credentials(&self) -> Result<Option<Credentials>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn clear_credentials(&self) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    results: Arc<Mutex<Option<QuizResults>>>,
    credentials: Arc<Mutex<Option<Credentials>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> StorageError {
    StorageError::Connection(err.to_string())
}

#[async_trait]
impl HandoffRepository for InMemoryRepository {
    async fn save_results(&self, results: &QuizResults) -> Result<(), StorageError> {
        let mut guard = self.results.lock().map_err(poisoned)?;
        *guard = Some(results.clone());
        Ok(())
    }

    async fn take_results(&self) -> Result<Option<QuizResults>, StorageError> {
        let mut guard = self.results.lock().map_err(poisoned)?;
        Ok(guard.take())
    }

    async fn peek_results(&self) -> Result<Option<QuizResults>, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl CredentialRepository for InMemoryRepository {
    async fn save_credentials(&self, credentials: &Credentials) -> Result<(), StorageError> {
        let mut guard = self.credentials.lock().map_err(poisoned)?;
        *guard = Some(credentials.clone());
        Ok(())
    }

    async fn load_credentials(&self) -> Result<Option<Credentials>, StorageError> {
        let guard = self.credentials.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }

    async fn clear_credentials(&self) -> Result<(), StorageError> {
        let mut guard = self.credentials.lock().map_err(poisoned)?;
        *guard = None;
        Ok(())
    }
}

/// Aggregates client-side repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub handoff: Arc<dyn HandoffRepository>,
    pub credentials: Arc<dyn CredentialRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let handoff: Arc<dyn HandoffRepository> = Arc::new(repo.clone());
        let credentials: Arc<dyn CredentialRepository> = Arc::new(repo);
        Self {
            handoff,
            credentials,
        }
    }
}
