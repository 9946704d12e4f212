use std::sync::Arc;
use std::time::Duration;

use storage::repository::HandoffRepository;
use tokio::time::timeout;
use wordiamo_core::model::{LessonId, OptionId, QuizResults};

use super::session::{QuizPhase, QuizSession};
use super::timer::SessionTimer;
use crate::Clock;
use crate::api::{DEFAULT_TIMEOUT_SECS, QuizApi};
use crate::error::{ApiError, QuizError};

/// A started quiz together with its display timer.
#[derive(Debug)]
pub struct ActiveQuiz {
    session: QuizSession,
    timer: SessionTimer,
}

impl ActiveQuiz {
    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.session.phase()
    }
}

/// Orchestrates quiz start, answering, and the completion hand-off.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    api: Arc<dyn QuizApi>,
    handoff: Arc<dyn HandoffRepository>,
    request_timeout: Duration,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, api: Arc<dyn QuizApi>, handoff: Arc<dyn HandoffRepository>) -> Self {
        Self {
            clock,
            api,
            handoff,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Start a quiz for the given lesson.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::MissingLesson` for a zero id, `QuizError::Start` when the
    /// server is unreachable or refuses, and `QuizError::Integrity` for a bad reply.
    pub async fn start(&self, lesson_id: LessonId) -> Result<ActiveQuiz, QuizError> {
        if lesson_id.value() == 0 {
            return Err(QuizError::MissingLesson);
        }

        let started = match timeout(self.request_timeout, self.api.start_quiz(lesson_id)).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(self.request_timeout)),
        }
        .map_err(QuizError::from_start)?;

        if started.lesson_id != lesson_id {
            return Err(QuizError::Integrity(format!(
                "asked for lesson {lesson_id}, server started lesson {}",
                started.lesson_id
            )));
        }

        let session = QuizSession::start(started, self.clock.now());
        tracing::info!(
            lesson_id = %lesson_id,
            total_questions = session.total_questions(),
            "quiz started"
        );
        Ok(ActiveQuiz {
            session,
            timer: SessionTimer::start(),
        })
    }

    /// Record the pending choice for the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the option is unknown or no answer is expected.
    pub fn select(&self, quiz: &mut ActiveQuiz, option: OptionId) -> Result<(), QuizError> {
        quiz.session.select(option)
    }

    /// Send the current selection and apply the server's verdict.
    ///
    /// Completing the quiz here also stops the timer and writes the hand-off.
    /// Dropping the returned future before it resolves leaves the session
    /// awaiting an answer.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Submit` on network failure (retry allowed),
    /// `QuizError::Integrity` for a bad reply, and `QuizError::Storage` if the
    /// hand-off could not be written (see `finalize_results`).
    pub async fn submit(&self, quiz: &mut ActiveQuiz) -> Result<QuizPhase, QuizError> {
        let attempt = quiz.session.begin_submission()?;
        let answer = attempt.answer();

        let reply = match timeout(self.request_timeout, self.api.submit_answer(answer)).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(self.request_timeout)),
        };
        let outcome = match reply {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    question_id = %answer.question_id,
                    error = %err,
                    "answer submission failed"
                );
                return Err(QuizError::from_submit(err));
            }
        };

        let phase = attempt.settle(outcome, self.clock.now())?;
        if phase == QuizPhase::Completed {
            self.complete(quiz).await?;
        }
        Ok(phase)
    }

    /// Move to the next question, completing the quiz when none is left.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidPhase` unless the answer was submitted, and
    /// `QuizError::Storage` if the completion hand-off fails.
    pub async fn advance(&self, quiz: &mut ActiveQuiz) -> Result<QuizPhase, QuizError> {
        let phase = quiz.session.advance(self.clock.now())?;
        if phase == QuizPhase::Completed {
            self.complete(quiz).await?;
        }
        Ok(phase)
    }

    /// Leave the quiz. Nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidPhase` if the quiz already ended.
    pub fn abandon(&self, quiz: &mut ActiveQuiz) -> Result<(), QuizError> {
        quiz.session.abandon()?;
        quiz.timer.stop();
        tracing::info!(
            lesson_id = %quiz.session.lesson_id(),
            answered = quiz.session.progress().answered,
            "quiz abandoned"
        );
        Ok(())
    }

    /// Build and persist the hand-off snapshot of a completed quiz.
    ///
    /// Safe to call again after a storage failure.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidPhase` if the quiz is not completed and
    /// `QuizError::Storage` if the snapshot cannot be written.
    pub async fn finalize_results(&self, quiz: &mut ActiveQuiz) -> Result<QuizResults, QuizError> {
        let results = quiz.session.build_results()?;
        if quiz.session.results_saved() {
            return Ok(results);
        }

        self.handoff.save_results(&results).await?;
        quiz.session.mark_results_saved();
        tracing::info!(
            lesson_id = %results.lesson_id(),
            correct = results.correct_answers(),
            total = results.total_questions(),
            percentage = results.score_percentage(),
            elapsed_seconds = results.elapsed_seconds(),
            "quiz completed"
        );
        Ok(results)
    }

    async fn complete(&self, quiz: &mut ActiveQuiz) -> Result<QuizResults, QuizError> {
        if let Some(ticks) = quiz.timer.stop() {
            tracing::debug!(ticks, "quiz timer stopped");
        }
        self.finalize_results(quiz).await
    }
}
