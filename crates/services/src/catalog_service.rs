use std::sync::Arc;

use wordiamo_core::model::{AttemptRecord, LessonAccess, LessonId, Level, LevelId};

use crate::api::{CatalogApi, LessonListing, ProgressReport};
use crate::error::CatalogError;

/// Default number of attempts shown in score history.
pub const DEFAULT_HISTORY_LIMIT: u32 = 10;

/// Read-only access to levels, lessons and the learner's record.
#[derive(Clone)]
pub struct CatalogService {
    api: Arc<dyn CatalogApi>,
}

impl CatalogService {
    #[must_use]
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Api` if the request fails.
    pub async fn levels(&self) -> Result<Vec<Level>, CatalogError> {
        Ok(self.api.levels().await?)
    }

    /// Lessons of a level with access as reported in the listing.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Api` if the request fails.
    pub async fn lessons(&self, level_id: LevelId) -> Result<LessonListing, CatalogError> {
        Ok(self.api.lessons(level_id).await?)
    }

    /// Lessons of a level with every unreported access flag checked one by one.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Api` if the listing or an access check fails.
    pub async fn lessons_with_access(
        &self,
        level_id: LevelId,
    ) -> Result<LessonListing, CatalogError> {
        let mut listing = self.api.lessons(level_id).await?;
        for lesson in listing
            .lessons
            .iter_mut()
            .filter(|lesson| lesson.access == LessonAccess::Unreported)
        {
            lesson.access = self.api.lesson_access(lesson.id).await?;
        }
        Ok(listing)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Api` if the check fails.
    pub async fn lesson_access(&self, lesson_id: LessonId) -> Result<LessonAccess, CatalogError> {
        Ok(self.api.lesson_access(lesson_id).await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Api` if the request fails.
    pub async fn progress(&self) -> Result<ProgressReport, CatalogError> {
        Ok(self.api.progress().await?)
    }

    /// Most recent attempts first, at most `limit` (at least one).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Api` if the request fails.
    pub async fn history(&self, limit: u32) -> Result<Vec<AttemptRecord>, CatalogError> {
        let limit = limit.max(1);
        let mut records = self.api.history(limit).await?;
        records.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(records)
    }
}
