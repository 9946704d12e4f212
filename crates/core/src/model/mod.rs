mod ids;
mod lesson;
mod progress;
mod question;
mod results;
mod user;

pub use ids::{AttemptId, LessonId, LevelId, OptionId, ParseIdError, QuestionId, UserId};

pub use lesson::{Lesson, LessonAccess, Level};
pub use progress::{AttemptRecord, UserProgress};
pub use question::{Question, QuestionError, QuestionType, QuizOption};
pub use results::{
    AnswerRef, DetailedResult, Judgement, LevelUpgrade, QuizResults, QuizResultsError,
    ReviewedQuestion, ServerSummary, score_percentage,
};
pub use user::{
    AuthToken, Credentials, Login, LoginDraft, PasswordChange, ProfileUpdate, Registration,
    RegistrationDraft, SessionContext, UserProfile, ValidationError,
};
