use std::sync::Arc;

use storage::repository::HandoffRepository;
use wordiamo_core::model::QuizResults;

use crate::error::ResultsError;

/// Reads the snapshot left behind by the most recently completed quiz.
#[derive(Clone)]
pub struct ResultsService {
    handoff: Arc<dyn HandoffRepository>,
}

impl ResultsService {
    #[must_use]
    pub fn new(handoff: Arc<dyn HandoffRepository>) -> Self {
        Self { handoff }
    }

    /// Read the snapshot once; the slot is empty afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ResultsError::Missing` when there is nothing to show.
    pub async fn take_last_results(&self) -> Result<QuizResults, ResultsError> {
        self.handoff
            .take_results()
            .await?
            .ok_or(ResultsError::Missing)
    }

    /// # Errors
    ///
    /// Returns `ResultsError::Storage` on backend failures.
    pub async fn peek_last_results(&self) -> Result<Option<QuizResults>, ResultsError> {
        Ok(self.handoff.peek_results().await?)
    }
}
