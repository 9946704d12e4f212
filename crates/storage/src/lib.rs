#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    AUTH_CREDENTIALS_KEY, CredentialRepository, HandoffRepository, InMemoryRepository,
    LAST_QUIZ_RESULTS_KEY, Storage, StorageError,
};
