use async_trait::async_trait;
use wordiamo_core::model::QuizResults;

use super::SqliteRepository;
use crate::repository::{HandoffRepository, LAST_QUIZ_RESULTS_KEY, StorageError};

#[async_trait]
impl HandoffRepository for SqliteRepository {
    async fn save_results(&self, results: &QuizResults) -> Result<(), StorageError> {
        self.put_json(LAST_QUIZ_RESULTS_KEY, results).await
    }

    async fn take_results(&self) -> Result<Option<QuizResults>, StorageError> {
        self.take_json(LAST_QUIZ_RESULTS_KEY).await
    }

    async fn peek_results(&self) -> Result<Option<QuizResults>, StorageError> {
        self.get_json(LAST_QUIZ_RESULTS_KEY).await
    }
}
