use services::{ActiveQuiz, CatalogService, QuizErrorKind, QuizLoopService, QuizPhase};
use wordiamo_core::model::{LessonAccess, LessonId, OptionId, Question};

use crate::state::ViewError;
use crate::vm::time_fmt::format_elapsed;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizIntent {
    Select(OptionId),
    Submit,
    Next,
    Exit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizOutcome {
    Continue,
    /// Results are saved and ready to show.
    Completed,
    Exited,
}

/// How one option should be drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionMark {
    Neutral,
    Selected,
    Correct,
    Incorrect,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionVm {
    pub id: OptionId,
    pub text: String,
    pub mark: OptionMark,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedbackVm {
    pub is_correct: bool,
    pub headline: &'static str,
    pub explanation: Option<String>,
    pub correct_answer: Option<String>,
}

pub struct QuizVm {
    quiz: ActiveQuiz,
    notice: Option<ViewError>,
}

impl QuizVm {
    #[must_use]
    pub fn new(quiz: ActiveQuiz) -> Self {
        Self { quiz, notice: None }
    }

    #[must_use]
    pub fn quiz(&self) -> &ActiveQuiz {
        &self.quiz
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.quiz.phase()
    }

    /// Last recoverable failure, cleared by the next successful action.
    #[must_use]
    pub fn notice(&self) -> Option<&ViewError> {
        self.notice.as_ref()
    }

    #[must_use]
    pub fn lesson_name(&self) -> &str {
        self.quiz.session().lesson_name()
    }

    fn question(&self) -> Option<&Question> {
        self.quiz.session().current_question()
    }

    #[must_use]
    pub fn question_text(&self) -> Option<&str> {
        self.question().map(Question::text)
    }

    #[must_use]
    pub fn question_type_label(&self) -> Option<&'static str> {
        self.question().map(|question| question.question_type().label())
    }

    #[must_use]
    pub fn options(&self) -> Vec<OptionVm> {
        let Some(question) = self.question() else {
            return Vec::new();
        };
        let session = self.quiz.session();
        let selected = session.selected_option();
        let judgement = session.current_judgement();

        question
            .options()
            .iter()
            .map(|option| {
                let is_selected = selected == Some(option.id);
                let mark = match judgement {
                    None if is_selected => OptionMark::Selected,
                    None => OptionMark::Neutral,
                    Some(j) if j.correct_option_id == Some(option.id) => OptionMark::Correct,
                    Some(j) if is_selected && j.is_correct => OptionMark::Correct,
                    Some(_) if is_selected => OptionMark::Incorrect,
                    Some(_) => OptionMark::Neutral,
                };
                OptionVm {
                    id: option.id,
                    text: option.text.clone(),
                    mark,
                }
            })
            .collect()
    }

    /// "Question X of Y".
    #[must_use]
    pub fn position_label(&self) -> String {
        let progress = self.quiz.session().progress();
        format!("Question {} of {}", progress.position, progress.total)
    }

    #[must_use]
    pub fn progress_percent(&self) -> u32 {
        self.quiz.session().progress().percent_answered()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.quiz.session().score()
    }

    #[must_use]
    pub fn elapsed(&self) -> String {
        format_elapsed(self.quiz.timer().elapsed_seconds())
    }

    #[must_use]
    pub fn feedback(&self) -> Option<FeedbackVm> {
        let question = self.question()?;
        let judgement = self.quiz.session().current_judgement()?;
        let correct_answer = judgement
            .correct_option_id
            .and_then(|id| question.option(id))
            .map(|option| option.text.clone());
        Some(FeedbackVm {
            is_correct: judgement.is_correct,
            headline: if judgement.is_correct {
                "Correct!"
            } else {
                "Incorrect"
            },
            explanation: judgement.explanation.clone(),
            correct_answer: if judgement.is_correct {
                None
            } else {
                correct_answer
            },
        })
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.phase() == QuizPhase::AwaitingAnswer && self.quiz.session().selected_option().is_some()
    }

    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.phase() == QuizPhase::Submitted
    }

    #[must_use]
    pub fn next_label(&self) -> &'static str {
        let session = self.quiz.session();
        if session.current_index() + 1 < session.questions().len() {
            "Next Question"
        } else {
            "Finish Quiz"
        }
    }

    /// A submit failed in flight and the kept answer can be sent again.
    #[must_use]
    pub fn can_resend(&self) -> bool {
        self.phase() == QuizPhase::AwaitingAnswer && self.notice.is_some()
    }

    /// Results are complete but the hand-off has not been written yet.
    #[must_use]
    pub fn needs_save(&self) -> bool {
        self.phase() == QuizPhase::Completed && !self.quiz.session().results_saved()
    }

    /// # Errors
    ///
    /// Returns a `ViewError` for rejected actions and failed requests. Network
    /// failures on submit also set `notice` and leave the answer ready to resend.
    pub async fn dispatch(
        &mut self,
        quiz_loop: &QuizLoopService,
        intent: QuizIntent,
    ) -> Result<QuizOutcome, ViewError> {
        let result = match intent {
            QuizIntent::Select(option) => quiz_loop
                .select(&mut self.quiz, option)
                .map(|()| QuizOutcome::Continue),
            QuizIntent::Submit => quiz_loop.submit(&mut self.quiz).await.map(outcome_of),
            QuizIntent::Next => quiz_loop.advance(&mut self.quiz).await.map(outcome_of),
            QuizIntent::Exit if self.phase().is_terminal() => Ok(QuizOutcome::Exited),
            QuizIntent::Exit => quiz_loop
                .abandon(&mut self.quiz)
                .map(|()| QuizOutcome::Exited),
        };

        match result {
            Ok(outcome) => {
                self.notice = None;
                Ok(outcome)
            }
            Err(err) => {
                let view = ViewError::from(&err);
                if matches!(err.kind(), QuizErrorKind::Submission | QuizErrorKind::Storage) {
                    self.notice = Some(view.clone());
                }
                Err(view)
            }
        }
    }

    /// Write the completion hand-off again after a storage failure.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Unknown` if it still cannot be written.
    pub async fn retry_save(&mut self, quiz_loop: &QuizLoopService) -> Result<QuizOutcome, ViewError> {
        match quiz_loop.finalize_results(&mut self.quiz).await {
            Ok(_) => {
                self.notice = None;
                Ok(QuizOutcome::Completed)
            }
            Err(err) => {
                let view = ViewError::from(&err);
                self.notice = Some(view.clone());
                Err(view)
            }
        }
    }
}

fn outcome_of(phase: QuizPhase) -> QuizOutcome {
    if phase == QuizPhase::Completed {
        QuizOutcome::Completed
    } else {
        QuizOutcome::Continue
    }
}

/// Open a quiz for `lesson_id`, asking the server about access first when a
/// catalog is given.
///
/// # Errors
///
/// Returns `ViewError::LessonLocked` when the server reports the lesson locked
/// and the mapped start failure otherwise.
pub async fn start_quiz(
    quiz_loop: &QuizLoopService,
    catalog: Option<&CatalogService>,
    lesson_id: LessonId,
) -> Result<QuizVm, ViewError> {
    if let Some(catalog) = catalog {
        match catalog.lesson_access(lesson_id).await {
            Ok(LessonAccess::Locked { reason }) => return Err(ViewError::LessonLocked(reason)),
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(lesson_id = %lesson_id, error = %err, "access check failed");
            }
        }
    }

    let quiz = quiz_loop
        .start(lesson_id)
        .await
        .map_err(|err| ViewError::from(&err))?;
    Ok(QuizVm::new(quiz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use services::api::{
        AnswerSubmission, CatalogApi, LessonListing, ProgressReport, QuizApi, StartedQuiz,
        SubmitOutcome,
    };
    use services::ApiError;
    use storage::repository::{HandoffRepository, Storage, StorageError};
    use wordiamo_core::time::fixed_clock;
    use wordiamo_core::model::{
        AttemptRecord, Judgement, Level, LevelId, QuestionId, QuestionType, QuizOption,
        QuizResults, ServerSummary,
    };

    fn question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Pick the greeting {id}"),
            QuestionType::new("vocabulary"),
            None,
            vec![
                QuizOption::new(OptionId::new(id * 10), "Ciao", 1),
                QuizOption::new(OptionId::new(id * 10 + 1), "Grazie", 2),
            ],
        )
        .unwrap()
    }

    struct ScriptedQuiz {
        replies: Mutex<VecDeque<Result<SubmitOutcome, ApiError>>>,
    }

    #[async_trait]
    impl QuizApi for ScriptedQuiz {
        async fn start_quiz(&self, lesson_id: LessonId) -> Result<StartedQuiz, ApiError> {
            Ok(StartedQuiz {
                lesson_id,
                lesson_name: "Greetings".into(),
                total_questions: 2,
                estimated_minutes: Some(5),
                first_question: question(1),
            })
        }

        async fn submit_answer(&self, _: AnswerSubmission) -> Result<SubmitOutcome, ApiError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ApiError::Rejected("no reply scripted".into())))
        }
    }

    struct AccessOnly(LessonAccess);

    #[async_trait]
    impl CatalogApi for AccessOnly {
        async fn levels(&self) -> Result<Vec<Level>, ApiError> {
            Ok(Vec::new())
        }
        async fn lessons(&self, _: LevelId) -> Result<LessonListing, ApiError> {
            Err(ApiError::Rejected("unused".into()))
        }
        async fn lesson_access(&self, _: LessonId) -> Result<LessonAccess, ApiError> {
            match &self.0 {
                LessonAccess::Unreported => Err(ApiError::Timeout(Duration::from_secs(1))),
                access => Ok(access.clone()),
            }
        }
        async fn progress(&self) -> Result<ProgressReport, ApiError> {
            Err(ApiError::Rejected("unused".into()))
        }
        async fn history(&self, _: u32) -> Result<Vec<AttemptRecord>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn judged(correct: bool) -> Judgement {
        Judgement {
            is_correct: correct,
            correct_option_id: Some(OptionId::new(10)),
            explanation: Some("Ciao is informal".into()),
        }
    }

    struct ReadOnlyHandoff;

    #[async_trait]
    impl HandoffRepository for ReadOnlyHandoff {
        async fn save_results(&self, _: &QuizResults) -> Result<(), StorageError> {
            Err(StorageError::Connection("read-only".into()))
        }
        async fn take_results(&self) -> Result<Option<QuizResults>, StorageError> {
            Ok(None)
        }
        async fn peek_results(&self) -> Result<Option<QuizResults>, StorageError> {
            Ok(None)
        }
    }

    fn service(replies: Vec<Result<SubmitOutcome, ApiError>>) -> (QuizLoopService, Storage) {
        let storage = Storage::in_memory();
        let api = Arc::new(ScriptedQuiz {
            replies: Mutex::new(replies.into()),
        });
        let service = QuizLoopService::new(fixed_clock(), api, Arc::clone(&storage.handoff));
        (service, storage)
    }

    #[tokio::test]
    async fn answering_marks_options_and_completes() {
        let (quiz_loop, storage) = service(vec![
            Ok(SubmitOutcome::Continue {
                judgement: judged(false),
                next_question: Some(question(2)),
            }),
            Ok(SubmitOutcome::Complete {
                judgement: Judgement {
                    is_correct: true,
                    correct_option_id: Some(OptionId::new(20)),
                    explanation: None,
                },
                summary: ServerSummary {
                    attempt_id: None,
                    correct_answers: 1,
                    total_questions: 2,
                    score_percentage: Some(50),
                    passing: Some(false),
                    completion_time_minutes: None,
                    detailed_results: Vec::new(),
                },
                level_upgrade: None,
            }),
        ]);
        let mut vm = start_quiz(&quiz_loop, None, LessonId::new(3)).await.unwrap();

        assert_eq!(vm.position_label(), "Question 1 of 2");
        assert_eq!(vm.elapsed(), "00:00");
        assert!(!vm.can_submit());

        vm.dispatch(&quiz_loop, QuizIntent::Select(OptionId::new(11)))
            .await
            .unwrap();
        assert!(vm.can_submit());
        assert_eq!(vm.options()[1].mark, OptionMark::Selected);

        let outcome = vm.dispatch(&quiz_loop, QuizIntent::Submit).await.unwrap();
        assert_eq!(outcome, QuizOutcome::Continue);
        assert!(vm.can_advance());
        assert_eq!(vm.next_label(), "Next Question");
        let marks: Vec<_> = vm.options().iter().map(|o| o.mark).collect();
        assert_eq!(marks, vec![OptionMark::Correct, OptionMark::Incorrect]);
        let feedback = vm.feedback().unwrap();
        assert_eq!(feedback.headline, "Incorrect");
        assert_eq!(feedback.correct_answer.as_deref(), Some("Ciao"));
        assert_eq!(vm.progress_percent(), 50);

        vm.dispatch(&quiz_loop, QuizIntent::Next).await.unwrap();
        assert_eq!(vm.position_label(), "Question 2 of 2");
        vm.dispatch(&quiz_loop, QuizIntent::Select(OptionId::new(20)))
            .await
            .unwrap();
        let outcome = vm.dispatch(&quiz_loop, QuizIntent::Submit).await.unwrap();
        assert_eq!(outcome, QuizOutcome::Completed);
        assert!(!vm.needs_save());
        assert!(storage.handoff.peek_results().await.unwrap().is_some());

        let exit = vm.dispatch(&quiz_loop, QuizIntent::Exit).await.unwrap();
        assert_eq!(exit, QuizOutcome::Exited);
    }

    #[tokio::test]
    async fn network_failure_sets_notice_and_keeps_selection() {
        let (quiz_loop, _storage) = service(vec![
            Err(ApiError::Timeout(Duration::from_secs(15))),
            Ok(SubmitOutcome::Continue {
                judgement: judged(true),
                next_question: Some(question(2)),
            }),
        ]);
        let mut vm = start_quiz(&quiz_loop, None, LessonId::new(3)).await.unwrap();
        vm.dispatch(&quiz_loop, QuizIntent::Select(OptionId::new(10)))
            .await
            .unwrap();

        let err = vm.dispatch(&quiz_loop, QuizIntent::Submit).await.unwrap_err();
        assert_eq!(err, ViewError::Offline);
        assert_eq!(vm.notice(), Some(&ViewError::Offline));
        assert!(vm.can_submit());
        assert!(vm.can_resend());

        vm.dispatch(&quiz_loop, QuizIntent::Submit).await.unwrap();
        assert!(vm.notice().is_none());
        assert_eq!(vm.score(), 1);
        assert_eq!(vm.feedback().unwrap().headline, "Correct!");
    }

    #[tokio::test]
    async fn exit_abandons_without_saving() {
        let (quiz_loop, storage) = service(Vec::new());
        let mut vm = start_quiz(&quiz_loop, None, LessonId::new(3)).await.unwrap();

        let outcome = vm.dispatch(&quiz_loop, QuizIntent::Exit).await.unwrap();
        assert_eq!(outcome, QuizOutcome::Exited);
        assert_eq!(vm.phase(), QuizPhase::Abandoned);
        assert!(storage.handoff.peek_results().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn locked_lessons_do_not_start() {
        let (quiz_loop, _storage) = service(Vec::new());
        let catalog = CatalogService::new(Arc::new(AccessOnly(LessonAccess::Locked {
            reason: Some("Finish Beginner first".into()),
        })));

        let err = start_quiz(&quiz_loop, Some(&catalog), LessonId::new(3))
            .await
            .err()
            .unwrap();
        assert_eq!(
            err,
            ViewError::LessonLocked(Some("Finish Beginner first".into()))
        );
    }

    #[tokio::test]
    async fn failed_access_check_still_starts() {
        let (quiz_loop, _storage) = service(Vec::new());
        let catalog = CatalogService::new(Arc::new(AccessOnly(LessonAccess::Unreported)));

        let vm = start_quiz(&quiz_loop, Some(&catalog), LessonId::new(3))
            .await
            .unwrap();
        assert_eq!(vm.lesson_name(), "Greetings");
        assert_eq!(vm.question_type_label(), Some("Vocabulary"));
    }

    #[tokio::test]
    async fn unsaved_completion_asks_for_save_not_resend() {
        let api = Arc::new(ScriptedQuiz {
            replies: Mutex::new(
                vec![
                    Ok(SubmitOutcome::Continue {
                        judgement: judged(true),
                        next_question: Some(question(2)),
                    }),
                    Ok(SubmitOutcome::Complete {
                        judgement: judged(true),
                        summary: ServerSummary {
                            attempt_id: None,
                            correct_answers: 2,
                            total_questions: 2,
                            score_percentage: Some(100),
                            passing: Some(true),
                            completion_time_minutes: None,
                            detailed_results: Vec::new(),
                        },
                        level_upgrade: None,
                    }),
                ]
                .into(),
            ),
        });
        let quiz_loop = QuizLoopService::new(fixed_clock(), api, Arc::new(ReadOnlyHandoff));
        let mut vm = start_quiz(&quiz_loop, None, LessonId::new(3)).await.unwrap();

        vm.dispatch(&quiz_loop, QuizIntent::Select(OptionId::new(10)))
            .await
            .unwrap();
        vm.dispatch(&quiz_loop, QuizIntent::Submit).await.unwrap();
        vm.dispatch(&quiz_loop, QuizIntent::Next).await.unwrap();
        vm.dispatch(&quiz_loop, QuizIntent::Select(OptionId::new(20)))
            .await
            .unwrap();

        assert!(vm.dispatch(&quiz_loop, QuizIntent::Submit).await.is_err());
        assert_eq!(vm.phase(), QuizPhase::Completed);
        assert!(vm.notice().is_some());
        assert!(vm.needs_save());
        assert!(!vm.can_resend());
        assert!(!vm.can_submit());
    }
}
