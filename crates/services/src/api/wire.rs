//! JSON shapes of the remote API and their conversion into domain types.
//!
//! Everything here is lenient about absent optional fields and strict about
//! the ones a caller depends on: a missing required field is `ApiError::Malformed`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use wordiamo_core::model::{
    AnswerRef, AttemptId, AttemptRecord, AuthToken, Credentials, DetailedResult, Judgement,
    Lesson, LessonAccess, LessonId, Level, LevelId, LevelUpgrade, OptionId, Question, QuestionId,
    QuestionType, QuizOption, ServerSummary, UserId, UserProfile, UserProgress,
};

use super::{AnswerSubmission, LessonListing, ProgressReport, StartedQuiz, SubmitOutcome};
use crate::error::ApiError;

//
// ─── ENVELOPE ──────────────────────────────────────────────────────────────────
//

/// Common `{success, message, error}` wrapper around every reply body.
#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    body: T,
}

impl<T> Envelope<T> {
    pub(super) fn into_body(self) -> Result<T, ApiError> {
        if let Some(error) = self.error {
            return Err(ApiError::Rejected(error));
        }
        if self.success == Some(false) {
            let message = self.message.unwrap_or_else(|| "request failed".to_owned());
            return Err(ApiError::Rejected(message));
        }
        Ok(self.body)
    }
}

/// Body of an error reply, used to recover a message from non-2xx statuses.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub(super) error: Option<String>,
    #[serde(default)]
    pub(super) message: Option<String>,
}

impl ErrorBody {
    pub(super) fn into_message(self) -> Option<String> {
        self.error.or(self.message).filter(|m| !m.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct Empty {}

//
// ─── REQUESTS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
pub(super) struct StartRequest {
    pub(super) lesson_id: LessonId,
}

#[derive(Debug, Serialize)]
pub(super) struct SubmitRequest {
    pub(super) question_id: QuestionId,
    pub(super) option_id: OptionId,
}

impl From<AnswerSubmission> for SubmitRequest {
    fn from(answer: AnswerSubmission) -> Self {
        Self {
            question_id: answer.question_id,
            option_id: answer.option_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct LoginRequest<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct RegisterRequest<'a> {
    pub(super) username: &'a str,
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct PasswordRequest<'a> {
    pub(super) current_password: &'a str,
    pub(super) new_password: &'a str,
}

//
// ─── HELPERS ───────────────────────────────────────────────────────────────────
//

/// Numbers the server sometimes sends as strings (`"82.5"`, `"82%"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(super) enum LenientNumber {
    Number(f64),
    Text(String),
}

impl LenientNumber {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(text) => text.trim().trim_end_matches('%').trim().parse().ok(),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_u32(value: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Accepts RFC 3339, naive ISO 8601 (taken as UTC) and RFC 2822 dates.
pub(super) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn malformed(what: &str) -> ApiError {
    ApiError::Malformed(what.to_owned())
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(super) struct OptionDto {
    option_id: OptionId,
    option_text: String,
    #[serde(default)]
    option_order: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct QuestionDto {
    question_id: QuestionId,
    question_text: String,
    #[serde(default)]
    question_type: Option<String>,
    #[serde(default)]
    difficulty_level: Option<String>,
    #[serde(default)]
    options: Vec<OptionDto>,
}

impl TryFrom<QuestionDto> for Question {
    type Error = ApiError;

    fn try_from(dto: QuestionDto) -> Result<Self, Self::Error> {
        let options = dto
            .options
            .into_iter()
            .zip(1u32..)
            .map(|(option, position)| {
                QuizOption::new(
                    option.option_id,
                    option.option_text,
                    option.option_order.unwrap_or(position),
                )
            })
            .collect();
        let question = Question::new(
            dto.question_id,
            dto.question_text,
            dto.question_type.map(QuestionType::new).unwrap_or_default(),
            dto.difficulty_level,
            options,
        )?;
        Ok(question)
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SessionDataDto {
    lesson_id: LessonId,
    lesson_name: String,
    total_questions: u32,
    #[serde(default)]
    current_question_index: u32,
    #[serde(default)]
    estimated_time: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct StartBody {
    #[serde(default)]
    session_data: Option<SessionDataDto>,
    #[serde(default)]
    question: Option<QuestionDto>,
}

impl StartBody {
    pub(super) fn into_started(self) -> Result<StartedQuiz, ApiError> {
        let data = self
            .session_data
            .ok_or_else(|| malformed("start response carried no session data"))?;
        let question = self
            .question
            .ok_or_else(|| malformed("start response carried no question"))?;
        if data.total_questions == 0 {
            return Err(malformed("start response reports zero questions"));
        }
        if data.current_question_index != 0 {
            return Err(ApiError::Malformed(format!(
                "new quiz starts at question index {}",
                data.current_question_index
            )));
        }
        Ok(StartedQuiz {
            lesson_id: data.lesson_id,
            lesson_name: data.lesson_name,
            total_questions: data.total_questions,
            estimated_minutes: data.estimated_time,
            first_question: question.try_into()?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct AnswerDto {
    #[serde(default)]
    option_id: Option<OptionId>,
    #[serde(default)]
    option_text: Option<String>,
}

impl From<AnswerDto> for AnswerRef {
    fn from(dto: AnswerDto) -> Self {
        Self {
            option_id: dto.option_id,
            text: dto.option_text,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct DetailedResultDto {
    question_id: QuestionId,
    #[serde(default)]
    question_text: String,
    #[serde(default)]
    question_type: Option<String>,
    #[serde(default)]
    submitted_answer: Option<AnswerDto>,
    #[serde(default)]
    correct_answer: Option<AnswerDto>,
    is_correct: bool,
}

impl From<DetailedResultDto> for DetailedResult {
    fn from(dto: DetailedResultDto) -> Self {
        Self {
            question_id: dto.question_id,
            question_text: dto.question_text,
            question_type: dto.question_type.map(QuestionType::new).unwrap_or_default(),
            submitted: dto.submitted_answer.unwrap_or_default().into(),
            correct: dto.correct_answer.unwrap_or_default().into(),
            is_correct: dto.is_correct,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ResultsDto {
    #[serde(default)]
    attempt_id: Option<AttemptId>,
    #[serde(default)]
    score_percentage: Option<LenientNumber>,
    correct_answers: u32,
    total_questions: u32,
    #[serde(default)]
    completion_time_minutes: Option<LenientNumber>,
    #[serde(default)]
    passing_score: Option<bool>,
    #[serde(default)]
    detailed_results: Vec<DetailedResultDto>,
}

impl ResultsDto {
    fn into_summary(self) -> Result<ServerSummary, ApiError> {
        if self.correct_answers > self.total_questions {
            return Err(ApiError::Malformed(format!(
                "summary reports {} correct of {} questions",
                self.correct_answers, self.total_questions
            )));
        }
        Ok(ServerSummary {
            attempt_id: self.attempt_id,
            correct_answers: self.correct_answers,
            total_questions: self.total_questions,
            score_percentage: self
                .score_percentage
                .as_ref()
                .and_then(LenientNumber::as_f64)
                .map(round_u32),
            passing: self.passing_score,
            completion_time_minutes: self
                .completion_time_minutes
                .as_ref()
                .and_then(LenientNumber::as_f64)
                .map(round_u32),
            detailed_results: self.detailed_results.into_iter().map(Into::into).collect(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct CompletionProgressDto {
    #[serde(default)]
    completed_lessons: Option<u32>,
    #[serde(default)]
    total_lessons: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LevelUpgradeDto {
    #[serde(default)]
    upgraded: bool,
    #[serde(default)]
    new_level_id: Option<LevelId>,
    #[serde(default)]
    new_level_name: Option<String>,
    #[serde(default)]
    previous_level_name: Option<String>,
    #[serde(default)]
    completion_progress: Option<CompletionProgressDto>,
}

impl From<LevelUpgradeDto> for LevelUpgrade {
    fn from(dto: LevelUpgradeDto) -> Self {
        let progress = dto.completion_progress.unwrap_or_default();
        Self {
            upgraded: dto.upgraded,
            new_level_id: dto.new_level_id,
            new_level_name: dto.new_level_name,
            previous_level_name: dto.previous_level_name,
            completed_lessons: progress.completed_lessons,
            total_lessons: progress.total_lessons,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SubmitBody {
    #[serde(default)]
    is_correct: Option<bool>,
    #[serde(default)]
    correct_option_id: Option<OptionId>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    quiz_complete: bool,
    #[serde(default)]
    question: Option<QuestionDto>,
    #[serde(default)]
    level_upgrade: Option<LevelUpgradeDto>,
    #[serde(default)]
    results: Option<ResultsDto>,
}

impl SubmitBody {
    /// Decode into the tagged outcome for the answer that was sent.
    pub(super) fn into_outcome(self, answer: &AnswerSubmission) -> Result<SubmitOutcome, ApiError> {
        if !self.quiz_complete {
            let is_correct = self
                .is_correct
                .ok_or_else(|| malformed("submit response carried no judgement"))?;
            let next_question = self.question.map(Question::try_from).transpose()?;
            return Ok(SubmitOutcome::Continue {
                judgement: Judgement {
                    is_correct,
                    correct_option_id: self.correct_option_id,
                    explanation: self.explanation,
                },
                next_question,
            });
        }

        let summary = self
            .results
            .ok_or_else(|| malformed("completed quiz carried no results"))?
            .into_summary()?;
        let detail = summary
            .detailed_results
            .iter()
            .find(|detail| detail.question_id == answer.question_id);
        let is_correct = self
            .is_correct
            .or_else(|| detail.map(|d| d.is_correct))
            .ok_or_else(|| malformed("completed quiz carried no judgement for the last answer"))?;
        let correct_option_id = self
            .correct_option_id
            .or_else(|| detail.and_then(|d| d.correct.option_id));

        Ok(SubmitOutcome::Complete {
            judgement: Judgement {
                is_correct,
                correct_option_id,
                explanation: self.explanation,
            },
            summary,
            level_upgrade: self.level_upgrade.map(Into::into),
        })
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(super) struct LevelDto {
    level_id: LevelId,
    level_name: String,
    #[serde(default)]
    level_description: Option<String>,
    #[serde(default)]
    level_order: Option<u32>,
    #[serde(default)]
    lesson_count: Option<u32>,
}

impl From<LevelDto> for Level {
    fn from(dto: LevelDto) -> Self {
        Self {
            id: dto.level_id,
            name: dto.level_name,
            description: dto.level_description,
            order: dto.level_order.unwrap_or(0),
            lesson_count: dto.lesson_count.unwrap_or(0),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct LevelsBody {
    #[serde(default)]
    levels: Vec<LevelDto>,
}

impl LevelsBody {
    pub(super) fn into_levels(self) -> Vec<Level> {
        let mut levels: Vec<Level> = self.levels.into_iter().map(Into::into).collect();
        levels.sort_by_key(|level| level.order);
        levels
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct LessonDto {
    lesson_id: LessonId,
    #[serde(default)]
    level_id: Option<LevelId>,
    lesson_name: String,
    #[serde(default)]
    lesson_description: Option<String>,
    #[serde(default)]
    lesson_order: Option<u32>,
    #[serde(default)]
    estimated_time_minutes: Option<u32>,
    #[serde(default)]
    question_count: u32,
    #[serde(default)]
    average_score: Option<LenientNumber>,
    #[serde(default)]
    can_access: Option<bool>,
    #[serde(default)]
    access_reason: Option<String>,
}

impl LessonDto {
    fn into_lesson(self, level_id: LevelId) -> Lesson {
        Lesson {
            id: self.lesson_id,
            level_id: self.level_id.unwrap_or(level_id),
            name: self.lesson_name,
            description: self.lesson_description,
            order: self.lesson_order.unwrap_or(0),
            estimated_minutes: self.estimated_time_minutes,
            question_count: self.question_count,
            average_score: self.average_score.as_ref().and_then(LenientNumber::as_f64),
            access: LessonAccess::from_flag(self.can_access, self.access_reason),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct LessonsBody {
    level: LevelDto,
    #[serde(default)]
    lessons: Vec<LessonDto>,
}

impl LessonsBody {
    pub(super) fn into_listing(self) -> LessonListing {
        let mut level: Level = self.level.into();
        let mut lessons: Vec<Lesson> = self
            .lessons
            .into_iter()
            .map(|lesson| lesson.into_lesson(level.id))
            .collect();
        lessons.sort_by_key(|lesson| lesson.order);
        if level.lesson_count == 0 {
            level.lesson_count = u32::try_from(lessons.len()).unwrap_or(u32::MAX);
        }
        LessonListing { level, lessons }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AccessDto {
    #[serde(default)]
    can_access: Option<bool>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AccessBody {
    #[serde(default)]
    access: Option<AccessDto>,
}

impl AccessBody {
    pub(super) fn into_access(self) -> Result<LessonAccess, ApiError> {
        let access = self
            .access
            .ok_or_else(|| malformed("access check carried no access block"))?;
        Ok(LessonAccess::from_flag(access.can_access, access.reason))
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ProgressUserDto {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    current_level_id: Option<LevelId>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ProgressDto {
    #[serde(default, alias = "current_level_name")]
    current_level: Option<String>,
    #[serde(default)]
    completed_lessons: Option<u32>,
    #[serde(default)]
    average_score: Option<LenientNumber>,
    #[serde(default)]
    last_activity: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProgressBody {
    #[serde(default)]
    user: Option<ProgressUserDto>,
    #[serde(default)]
    progress: Option<ProgressDto>,
}

impl ProgressBody {
    pub(super) fn into_report(self) -> ProgressReport {
        let user = self.user.unwrap_or_default();
        let progress = self.progress.unwrap_or_default();
        ProgressReport {
            username: user.username,
            current_level_id: user.current_level_id,
            progress: UserProgress {
                current_level_name: progress.current_level,
                completed_lessons: progress.completed_lessons.unwrap_or(0),
                average_score: progress.average_score.as_ref().and_then(LenientNumber::as_f64),
                last_activity: progress.last_activity.as_deref().and_then(parse_timestamp),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AttemptDto {
    attempt_id: AttemptId,
    lesson_id: LessonId,
    #[serde(default)]
    lesson_name: Option<String>,
    #[serde(default)]
    score_percentage: Option<LenientNumber>,
    #[serde(default)]
    correct_answers: u32,
    #[serde(default)]
    total_questions: u32,
    #[serde(default)]
    completion_time_minutes: Option<LenientNumber>,
    #[serde(default)]
    attempt_date: Option<String>,
    #[serde(default)]
    passing_score: bool,
}

impl From<AttemptDto> for AttemptRecord {
    fn from(dto: AttemptDto) -> Self {
        Self {
            attempt_id: dto.attempt_id,
            lesson_id: dto.lesson_id,
            lesson_name: dto.lesson_name.unwrap_or_else(|| "Unknown".to_owned()),
            score_percentage: dto
                .score_percentage
                .as_ref()
                .and_then(LenientNumber::as_f64)
                .map_or(0, round_u32),
            correct_answers: dto.correct_answers,
            total_questions: dto.total_questions,
            completion_time_minutes: dto
                .completion_time_minutes
                .as_ref()
                .and_then(LenientNumber::as_f64)
                .map(round_u32),
            attempted_at: dto.attempt_date.as_deref().and_then(parse_timestamp),
            passing: dto.passing_score,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryBody {
    #[serde(default)]
    quiz_history: Vec<AttemptDto>,
}

impl HistoryBody {
    pub(super) fn into_records(self) -> Vec<AttemptRecord> {
        self.quiz_history.into_iter().map(Into::into).collect()
    }
}

//
// ─── ACCOUNT ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(super) struct UserDto {
    user_id: UserId,
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    current_level_id: Option<LevelId>,
    #[serde(default)]
    full_name: Option<String>,
}

impl From<UserDto> for UserProfile {
    fn from(dto: UserDto) -> Self {
        Self {
            id: dto.user_id,
            username: dto.username,
            email: dto.email,
            current_level_id: dto.current_level_id.unwrap_or(LevelId::new(1)),
            full_name: dto.full_name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AuthBody {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<UserDto>,
}

impl AuthBody {
    pub(super) fn into_credentials(self) -> Result<Credentials, ApiError> {
        let token = self
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| malformed("auth response carried no token"))?;
        let user = self
            .user
            .ok_or_else(|| malformed("auth response carried no user"))?;
        Ok(Credentials {
            token: AuthToken::new(token),
            user: user.into(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ProfileBody {
    #[serde(default)]
    user: Option<UserDto>,
}

impl ProfileBody {
    pub(super) fn into_profile(self) -> Result<UserProfile, ApiError> {
        self.user
            .map(Into::into)
            .ok_or_else(|| malformed("profile response carried no user"))
    }
}
