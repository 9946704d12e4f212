use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AttemptId, LessonId, LevelId, OptionId, Question, QuestionId, QuestionType};

/// Round `100 * correct / total` half-up; an empty quiz scores 0.
#[must_use]
pub fn score_percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let correct = u64::from(correct.min(total));
    let total = u64::from(total);
    let rounded = (200 * correct + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(100)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizResultsError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("correct answers ({correct}) exceed total questions ({total})")]
    CountMismatch { correct: u32, total: u32 },
}

/// The server's verdict on one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgement {
    pub is_correct: bool,
    pub correct_option_id: Option<OptionId>,
    pub explanation: Option<String>,
}

/// An answer as echoed back in the server's detailed results.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnswerRef {
    pub option_id: Option<OptionId>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedResult {
    pub question_id: QuestionId,
    pub question_text: String,
    pub question_type: QuestionType,
    pub submitted: AnswerRef,
    pub correct: AnswerRef,
    pub is_correct: bool,
}

/// Authoritative aggregate returned when the server declares a quiz complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSummary {
    pub attempt_id: Option<AttemptId>,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub score_percentage: Option<u32>,
    pub passing: Option<bool>,
    pub completion_time_minutes: Option<u32>,
    pub detailed_results: Vec<DetailedResult>,
}

/// Reported when completing a quiz crossed a proficiency threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpgrade {
    pub upgraded: bool,
    pub new_level_id: Option<LevelId>,
    pub new_level_name: Option<String>,
    pub previous_level_name: Option<String>,
    pub completed_lessons: Option<u32>,
    pub total_lessons: Option<u32>,
}

/// One question of a finished quiz together with what happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewedQuestion {
    pub question: Question,
    pub selected: Option<OptionId>,
    pub judgement: Option<Judgement>,
}

impl ReviewedQuestion {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.judgement.as_ref().is_some_and(|j| j.is_correct)
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.selected.is_none() || self.judgement.is_none()
    }
}

/// Terminal snapshot of a quiz, handed from the quiz flow to the results view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResults {
    lesson_id: LessonId,
    lesson_name: String,
    questions: Vec<ReviewedQuestion>,
    correct_answers: u32,
    total_questions: u32,
    score_percentage: u32,
    elapsed_seconds: u64,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    level_upgrade: Option<LevelUpgrade>,
    detailed_results: Option<Vec<DetailedResult>>,
}

impl QuizResults {
    /// Build the snapshot, preferring the server's counts over local ones.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultsError::InvalidTimeRange` if `completed_at` is before `started_at`.
    /// Returns `QuizResultsError::CountMismatch` if the chosen correct count exceeds the total.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        lesson_id: LessonId,
        lesson_name: impl Into<String>,
        questions: Vec<ReviewedQuestion>,
        local_score: u32,
        summary: Option<&ServerSummary>,
        level_upgrade: Option<LevelUpgrade>,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, QuizResultsError> {
        if completed_at < started_at {
            return Err(QuizResultsError::InvalidTimeRange);
        }

        let (correct_answers, total_questions) = match summary {
            Some(summary) => (summary.correct_answers, summary.total_questions),
            None => {
                let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);
                (local_score, total)
            }
        };
        if correct_answers > total_questions {
            return Err(QuizResultsError::CountMismatch {
                correct: correct_answers,
                total: total_questions,
            });
        }

        let elapsed_seconds = u64::try_from((completed_at - started_at).num_seconds()).unwrap_or(0);
        let detailed_results = summary
            .map(|s| s.detailed_results.clone())
            .filter(|results| !results.is_empty());

        Ok(Self {
            lesson_id,
            lesson_name: lesson_name.into(),
            questions,
            correct_answers,
            total_questions,
            score_percentage: score_percentage(correct_answers, total_questions),
            elapsed_seconds,
            started_at,
            completed_at,
            level_upgrade,
            detailed_results,
        })
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn lesson_name(&self) -> &str {
        &self.lesson_name
    }

    #[must_use]
    pub fn questions(&self) -> &[ReviewedQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn incorrect_answers(&self) -> u32 {
        self.total_questions.saturating_sub(self.correct_answers)
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn score_percentage(&self) -> u32 {
        self.score_percentage
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn level_upgrade(&self) -> Option<&LevelUpgrade> {
        self.level_upgrade.as_ref()
    }

    #[must_use]
    pub fn detailed_results(&self) -> Option<&[DetailedResult]> {
        self.detailed_results.as_deref()
    }
}
