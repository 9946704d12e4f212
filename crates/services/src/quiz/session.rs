use std::fmt;

use chrono::{DateTime, Utc};
use wordiamo_core::model::{
    Judgement, LessonId, LevelUpgrade, OptionId, Question, QuizResults, ReviewedQuestion,
    ServerSummary,
};

use super::progress::QuizProgress;
use crate::api::{AnswerSubmission, StartedQuiz, SubmitOutcome};
use crate::error::QuizError;

/// Where a quiz session stands.
///
/// `Idle` and `Loading` are not represented: a session only exists once the
/// server has handed out its first question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    AwaitingAnswer,
    /// An answer is in flight; submit is disabled.
    Submitting,
    Submitted,
    Completed,
    Abandoned,
}

impl QuizPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingAnswer => "awaiting an answer",
            Self::Submitting => "submitting",
            Self::Submitted => "submitted",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }
}

/// One user's attempt at a lesson quiz, from first question to completion.
///
/// Pure state: no I/O, no clock. Times are passed in by the caller.
pub struct QuizSession {
    lesson_id: LessonId,
    lesson_name: String,
    total_questions: u32,
    estimated_minutes: Option<u32>,
    questions: Vec<Question>,
    answers: Vec<Option<OptionId>>,
    judgements: Vec<Option<Judgement>>,
    current: usize,
    score: u32,
    phase: QuizPhase,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    summary: Option<ServerSummary>,
    level_upgrade: Option<LevelUpgrade>,
    results_saved: bool,
}

impl QuizSession {
    /// Open a session on the first question the server handed out.
    #[must_use]
    pub fn start(started: StartedQuiz, started_at: DateTime<Utc>) -> Self {
        Self {
            lesson_id: started.lesson_id,
            lesson_name: started.lesson_name,
            total_questions: started.total_questions,
            estimated_minutes: started.estimated_minutes,
            questions: vec![started.first_question],
            answers: vec![None],
            judgements: vec![None],
            current: 0,
            score: 0,
            phase: QuizPhase::AwaitingAnswer,
            started_at,
            completed_at: None,
            summary: None,
            level_upgrade: None,
            results_saved: false,
        }
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
    pub fn estimated_minutes(&self) -> Option<u32> {
        self.estimated_minutes
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    /// The option recorded for the current question, pending or submitted.
    #[must_use]
    pub fn selected_option(&self) -> Option<OptionId> {
        self.answers.get(self.current).copied().flatten()
    }

    /// The server's verdict on the current question once submitted.
    #[must_use]
    pub fn current_judgement(&self) -> Option<&Judgement> {
        self.judgements.get(self.current).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<OptionId>] {
        &self.answers
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Total announced by the server at start.
    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn server_summary(&self) -> Option<&ServerSummary> {
        self.summary.as_ref()
    }

    #[must_use]
    pub fn level_upgrade(&self) -> Option<&LevelUpgrade> {
        self.level_upgrade.as_ref()
    }

    #[must_use]
    pub fn results_saved(&self) -> bool {
        self.results_saved
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == QuizPhase::Completed
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        let announced = usize::try_from(self.total_questions).unwrap_or(usize::MAX);
        QuizProgress {
            position: (self.current + 1).min(self.questions.len().max(announced)),
            total: announced.max(self.questions.len()),
            answered: self.judgements.iter().flatten().count(),
            score: self.score,
            is_complete: self.is_complete(),
        }
    }

    fn require(&self, phase: QuizPhase) -> Result<(), QuizError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(QuizError::InvalidPhase(self.phase.as_str()))
        }
    }

    /// Record the pending choice for the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidPhase` unless awaiting an answer, or
    /// `QuizError::UnknownOption` if the option is not offered by the current question.
    pub fn select(&mut self, option: OptionId) -> Result<(), QuizError> {
        self.require(QuizPhase::AwaitingAnswer)?;
        let offered = self
            .current_question()
            .is_some_and(|question| question.has_option(option));
        if !offered {
            return Err(QuizError::UnknownOption(option));
        }
        self.answers[self.current] = Some(option);
        Ok(())
    }

    /// Lock the session for one submission of the current selection.
    ///
    /// The returned guard must be settled with the server's reply; dropping it
    /// unsettled returns the session to `AwaitingAnswer` untouched.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidPhase` unless awaiting an answer, or
    /// `QuizError::NoSelection` if nothing is selected.
    pub fn begin_submission(&mut self) -> Result<SubmissionAttempt<'_>, QuizError> {
        self.require(QuizPhase::AwaitingAnswer)?;
        let question_id = self
            .current_question()
            .map(Question::id)
            .ok_or(QuizError::InvalidPhase(self.phase.as_str()))?;
        let option_id = self.selected_option().ok_or(QuizError::NoSelection)?;
        self.phase = QuizPhase::Submitting;
        Ok(SubmissionAttempt {
            session: self,
            answer: AnswerSubmission {
                question_id,
                option_id,
            },
            settled: false,
        })
    }

    /// Move past a submitted question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidPhase` unless the current answer was submitted.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<QuizPhase, QuizError> {
        self.require(QuizPhase::Submitted)?;
        self.current += 1;
        if self.current < self.questions.len() {
            self.phase = QuizPhase::AwaitingAnswer;
        } else {
            self.phase = QuizPhase::Completed;
            self.completed_at = Some(now.max(self.started_at));
        }
        Ok(self.phase)
    }

    /// Discard the session without completing it.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidPhase` if the session already ended.
    pub fn abandon(&mut self) -> Result<(), QuizError> {
        if self.phase.is_terminal() {
            return Err(QuizError::InvalidPhase(self.phase.as_str()));
        }
        self.phase = QuizPhase::Abandoned;
        Ok(())
    }

    /// Build the hand-off snapshot of a completed session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidPhase` if the session is not completed, or
    /// `QuizError::Results` if the aggregate is inconsistent.
    pub fn build_results(&self) -> Result<QuizResults, QuizError> {
        self.require(QuizPhase::Completed)?;
        let completed_at = self
            .completed_at
            .ok_or(QuizError::InvalidPhase(self.phase.as_str()))?;
        let reviewed = self
            .questions
            .iter()
            .zip(&self.answers)
            .zip(&self.judgements)
            .map(|((question, selected), judgement)| ReviewedQuestion {
                question: question.clone(),
                selected: *selected,
                judgement: judgement.clone(),
            })
            .collect();
        Ok(QuizResults::new(
            self.lesson_id,
            self.lesson_name.clone(),
            reviewed,
            self.score,
            self.summary.as_ref(),
            self.level_upgrade.clone(),
            self.started_at,
            completed_at,
        )?)
    }

    pub(crate) fn mark_results_saved(&mut self) {
        self.results_saved = true;
    }

    fn apply(&mut self, outcome: SubmitOutcome, now: DateTime<Utc>) -> Result<QuizPhase, QuizError> {
        let (judgement, step) = match outcome {
            SubmitOutcome::Continue {
                judgement,
                next_question,
            } => {
                match &next_question {
                    Some(next) => self.check_next_question(next)?,
                    None => self.check_stream_end()?,
                }
                (judgement, Step::Continue(next_question))
            }
            SubmitOutcome::Complete {
                judgement,
                summary,
                level_upgrade,
            } => {
                let judged = self.judgements.iter().flatten().count() + 1;
                let reported = usize::try_from(summary.total_questions).unwrap_or(usize::MAX);
                if reported < judged {
                    return Err(QuizError::Integrity(format!(
                        "summary reports {reported} questions after {judged} answers"
                    )));
                }
                (judgement, Step::Finish(summary, level_upgrade))
            }
        };

        if judgement.is_correct {
            self.score += 1;
        }
        self.judgements[self.current] = Some(judgement);

        match step {
            Step::Continue(next_question) => {
                if let Some(next) = next_question {
                    self.questions.push(next);
                    self.answers.push(None);
                    self.judgements.push(None);
                }
                self.phase = QuizPhase::Submitted;
            }
            Step::Finish(summary, level_upgrade) => {
                self.summary = Some(summary);
                self.level_upgrade = level_upgrade;
                self.phase = QuizPhase::Completed;
                self.completed_at = Some(now.max(self.started_at));
            }
        }
        Ok(self.phase)
    }

    fn check_next_question(&self, next: &Question) -> Result<(), QuizError> {
        if self.questions.iter().any(|q| q.id() == next.id()) {
            return Err(QuizError::Integrity(format!(
                "question {} was already served",
                next.id()
            )));
        }
        let announced = usize::try_from(self.total_questions).unwrap_or(usize::MAX);
        if self.questions.len() >= announced {
            return Err(QuizError::Integrity(format!(
                "server sent more than the {announced} announced questions"
            )));
        }
        Ok(())
    }

    fn check_stream_end(&self) -> Result<(), QuizError> {
        let announced = usize::try_from(self.total_questions).unwrap_or(usize::MAX);
        if self.questions.len() < announced {
            return Err(QuizError::Integrity(format!(
                "no question after {} of {announced} announced",
                self.questions.len()
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("lesson_id", &self.lesson_id)
            .field("questions_len", &self.questions.len())
            .field("total_questions", &self.total_questions)
            .field("current", &self.current)
            .field("score", &self.score)
            .field("phase", &self.phase)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

enum Step {
    Continue(Option<Question>),
    Finish(ServerSummary, Option<LevelUpgrade>),
}

/// An answer in flight. Holds the session exclusively until settled.
#[derive(Debug)]
#[must_use = "an unsettled submission reverts the session when dropped"]
pub struct SubmissionAttempt<'a> {
    session: &'a mut QuizSession,
    answer: AnswerSubmission,
    settled: bool,
}

impl SubmissionAttempt<'_> {
    #[must_use]
    pub fn answer(&self) -> AnswerSubmission {
        self.answer
    }

    /// Apply the server's reply.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Integrity` if the reply contradicts the session; the
    /// session then reverts to `AwaitingAnswer` unchanged.
    pub fn settle(mut self, outcome: SubmitOutcome, now: DateTime<Utc>) -> Result<QuizPhase, QuizError> {
        let phase = self.session.apply(outcome, now)?;
        self.settled = true;
        Ok(phase)
    }
}

impl Drop for SubmissionAttempt<'_> {
    fn drop(&mut self) {
        if !self.settled && self.session.phase == QuizPhase::Submitting {
            self.session.phase = QuizPhase::AwaitingAnswer;
        }
    }
}
