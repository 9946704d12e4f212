//! Remote WORDIAMO API: the contract services depend on, plus the HTTP client.

mod http;
mod wire;

use async_trait::async_trait;

use wordiamo_core::model::{
    AttemptRecord, Credentials, Judgement, Lesson, LessonAccess, LessonId, Level, LevelId,
    LevelUpgrade, Login, OptionId, PasswordChange, ProfileUpdate, Question, QuestionId,
    Registration, ServerSummary, UserProfile, UserProgress,
};

use crate::error::ApiError;

pub use http::{ApiConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS, HttpApiClient};

/// The answer sent for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerSubmission {
    pub question_id: QuestionId,
    pub option_id: OptionId,
}

/// What the server returns when a quiz starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedQuiz {
    pub lesson_id: LessonId,
    pub lesson_name: String,
    pub total_questions: u32,
    pub estimated_minutes: Option<u32>,
    pub first_question: Question,
}

/// Decoded reply to an answer submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The quiz goes on; the next question is included when the server streams it.
    Continue {
        judgement: Judgement,
        next_question: Option<Question>,
    },
    /// The server declared the quiz complete and returned the aggregate.
    Complete {
        judgement: Judgement,
        summary: ServerSummary,
        level_upgrade: Option<LevelUpgrade>,
    },
}

impl SubmitOutcome {
    #[must_use]
    pub fn judgement(&self) -> &Judgement {
        match self {
            Self::Continue { judgement, .. } | Self::Complete { judgement, .. } => judgement,
        }
    }
}

/// Lessons of one level as listed by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonListing {
    pub level: Level,
    pub lessons: Vec<Lesson>,
}

/// Progress stats plus the identity the server reports with them.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub username: Option<String>,
    pub current_level_id: Option<LevelId>,
    pub progress: UserProgress,
}

#[async_trait]
pub trait QuizApi: Send + Sync {
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, rejection, or an undecodable reply.
    async fn start_quiz(&self, lesson_id: LessonId) -> Result<StartedQuiz, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, rejection, or an undecodable reply.
    async fn submit_answer(&self, answer: AnswerSubmission) -> Result<SubmitOutcome, ApiError>;
}

#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// # Errors
    ///
    /// Returns `ApiError` if the levels cannot be fetched.
    async fn levels(&self) -> Result<Vec<Level>, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the lessons cannot be fetched.
    async fn lessons(&self, level_id: LevelId) -> Result<LessonListing, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the access check fails.
    async fn lesson_access(&self, lesson_id: LessonId) -> Result<LessonAccess, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if progress cannot be fetched.
    async fn progress(&self) -> Result<ProgressReport, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the history cannot be fetched.
    async fn history(&self, limit: u32) -> Result<Vec<AttemptRecord>, ApiError>;
}

#[async_trait]
pub trait AccountApi: Send + Sync {
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` for bad credentials.
    async fn login(&self, login: &Login) -> Result<Credentials, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when the account cannot be created.
    async fn register(&self, registration: &Registration) -> Result<Credentials, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the server could not be told.
    async fn logout(&self) -> Result<(), ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the profile cannot be fetched.
    async fn profile(&self) -> Result<UserProfile, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the update is rejected.
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when the current password is wrong.
    async fn change_password(&self, change: &PasswordChange) -> Result<(), ApiError>;
}
