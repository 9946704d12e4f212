use services::ResultsService;
use wordiamo_core::model::{
    DetailedResult, LessonId, OptionId, QuestionType, QuizResults, ReviewedQuestion,
};

use crate::state::ViewError;
use crate::vm::time_fmt::{format_datetime, format_elapsed};

/// Score band shown next to the percentage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PerformanceBand {
    Excellent,
    Great,
    Good,
    Fair,
    NeedsImprovement,
}

impl PerformanceBand {
    #[must_use]
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            90.. => Self::Excellent,
            80..=89 => Self::Great,
            70..=79 => Self::Good,
            60..=69 => Self::Fair,
            _ => Self::NeedsImprovement,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Great => "Great",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }

    #[must_use]
    pub fn completion_message(self) -> &'static str {
        match self {
            Self::Excellent => "Outstanding performance! You are mastering this material.",
            Self::Great => "Great job! You have a solid understanding of the concepts.",
            Self::Good => "Good work! A few areas to review and you'll be excellent.",
            Self::Fair => "You're on the right track. Keep practicing to improve.",
            Self::NeedsImprovement => "Don't worry! Review the material and try again.",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewStatus {
    Correct,
    Incorrect,
    Skipped,
}

impl ReviewStatus {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Correct => "Correct",
            Self::Incorrect => "Incorrect",
            Self::Skipped => "Skipped",
        }
    }
}

/// Per question-type tally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryBreakdownVm {
    pub category: QuestionType,
    pub label: &'static str,
    pub correct: u32,
    pub total: u32,
    pub percentage: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewItemVm {
    pub number: usize,
    pub question_text: String,
    pub category_label: &'static str,
    pub user_answer: Option<String>,
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
    pub status: ReviewStatus,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelUpgradeVm {
    pub new_level_name: String,
    pub completed_lessons: Option<u32>,
    pub total_lessons: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultsVm {
    pub lesson_id: LessonId,
    pub lesson_name: String,
    pub score_percentage: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub total: u32,
    pub time_taken: String,
    pub completed_at_str: String,
    pub performance: PerformanceBand,
    pub breakdown: Vec<CategoryBreakdownVm>,
    pub review: Vec<ReviewItemVm>,
    pub level_upgrade: Option<LevelUpgradeVm>,
}

impl ResultsVm {
    #[must_use]
    pub fn performance_label(&self) -> &'static str {
        self.performance.label()
    }

    #[must_use]
    pub fn completion_message(&self) -> &'static str {
        self.performance.completion_message()
    }

    /// Lesson to open for "retake quiz".
    #[must_use]
    pub fn retake_lesson_id(&self) -> LessonId {
        self.lesson_id
    }
}

impl From<&QuizResults> for ResultsVm {
    fn from(results: &QuizResults) -> Self {
        let (breakdown, review) = match results.detailed_results() {
            Some(details) => (
                breakdown(details.iter().map(|d| (&d.question_type, d.is_correct))),
                details.iter().enumerate().map(review_from_detail).collect(),
            ),
            None => (
                breakdown(
                    results
                        .questions()
                        .iter()
                        .map(|q| (q.question.question_type(), q.is_correct())),
                ),
                results
                    .questions()
                    .iter()
                    .enumerate()
                    .map(review_from_local)
                    .collect(),
            ),
        };

        let level_upgrade = results
            .level_upgrade()
            .filter(|upgrade| upgrade.upgraded)
            .map(|upgrade| LevelUpgradeVm {
                new_level_name: upgrade
                    .new_level_name
                    .clone()
                    .unwrap_or_else(|| "the next level".to_owned()),
                completed_lessons: upgrade.completed_lessons,
                total_lessons: upgrade.total_lessons,
            });

        Self {
            lesson_id: results.lesson_id(),
            lesson_name: results.lesson_name().to_owned(),
            score_percentage: results.score_percentage(),
            correct: results.correct_answers(),
            incorrect: results.incorrect_answers(),
            total: results.total_questions(),
            time_taken: format_elapsed(results.elapsed_seconds()),
            completed_at_str: format_datetime(results.completed_at()),
            performance: PerformanceBand::from_percentage(results.score_percentage()),
            breakdown,
            review,
            level_upgrade,
        }
    }
}

fn breakdown<'a>(
    items: impl Iterator<Item = (&'a QuestionType, bool)>,
) -> Vec<CategoryBreakdownVm> {
    let mut rows: Vec<CategoryBreakdownVm> = Vec::new();
    for (category, is_correct) in items {
        let index = match rows.iter().position(|row| &row.category == category) {
            Some(index) => index,
            None => {
                rows.push(CategoryBreakdownVm {
                    category: category.clone(),
                    label: category.label(),
                    correct: 0,
                    total: 0,
                    percentage: 0,
                });
                rows.len() - 1
            }
        };
        let row = &mut rows[index];
        row.total += 1;
        if is_correct {
            row.correct += 1;
        }
    }
    for row in &mut rows {
        row.percentage = wordiamo_core::model::score_percentage(row.correct, row.total);
    }
    rows
}

fn review_from_detail((index, detail): (usize, &DetailedResult)) -> ReviewItemVm {
    let status = if detail.is_correct {
        ReviewStatus::Correct
    } else if detail.submitted.option_id.is_none() && detail.submitted.text.is_none() {
        ReviewStatus::Skipped
    } else {
        ReviewStatus::Incorrect
    };
    ReviewItemVm {
        number: index + 1,
        question_text: detail.question_text.clone(),
        category_label: detail.question_type.label(),
        user_answer: detail.submitted.text.clone(),
        correct_answer: detail.correct.text.clone(),
        explanation: None,
        status,
    }
}

fn review_from_local((index, reviewed): (usize, &ReviewedQuestion)) -> ReviewItemVm {
    let question = &reviewed.question;
    let option_text = |id: Option<OptionId>| {
        id.and_then(|id| question.option(id))
            .map(|option| option.text.clone())
    };
    let status = if reviewed.is_skipped() {
        ReviewStatus::Skipped
    } else if reviewed.is_correct() {
        ReviewStatus::Correct
    } else {
        ReviewStatus::Incorrect
    };
    let judgement = reviewed.judgement.as_ref();
    let correct_id = judgement.and_then(|j| j.correct_option_id).or_else(|| {
        // a correct answer is its own correct option
        reviewed.is_correct().then_some(reviewed.selected).flatten()
    });

    ReviewItemVm {
        number: index + 1,
        question_text: question.text().to_owned(),
        category_label: question.question_type().label(),
        user_answer: option_text(reviewed.selected),
        correct_answer: option_text(correct_id),
        explanation: judgement.and_then(|j| j.explanation.clone()),
        status,
    }
}

/// Load the last results once for display.
///
/// # Errors
///
/// Returns `ViewError::NoResults` when there is no snapshot to show.
pub async fn load_last_results(results: &ResultsService) -> Result<ResultsVm, ViewError> {
    let snapshot = results.take_last_results().await?;
    Ok(ResultsVm::from(&snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use wordiamo_core::model::{
        AnswerRef, Judgement, LevelUpgrade, Question, QuestionId, QuizOption, ServerSummary,
    };
    use wordiamo_core::time::fixed_now;

    fn question(id: u64, kind: &str) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Question {id}"),
            QuestionType::new(kind),
            None,
            vec![
                QuizOption::new(OptionId::new(id * 10), "right", 1),
                QuizOption::new(OptionId::new(id * 10 + 1), "wrong", 2),
            ],
        )
        .unwrap()
    }

    fn reviewed(id: u64, kind: &str, answer: Option<bool>) -> ReviewedQuestion {
        let question = question(id, kind);
        let selected = answer.map(|right| OptionId::new(if right { id * 10 } else { id * 10 + 1 }));
        ReviewedQuestion {
            question,
            selected,
            judgement: answer.map(|right| Judgement {
                is_correct: right,
                correct_option_id: Some(OptionId::new(id * 10)),
                explanation: Some(format!("Explanation {id}")),
            }),
        }
    }

    fn results(questions: Vec<ReviewedQuestion>, summary: Option<&ServerSummary>) -> QuizResults {
        let score = u32::try_from(questions.iter().filter(|q| q.is_correct()).count()).unwrap();
        QuizResults::new(
            LessonId::new(12),
            "Greetings",
            questions,
            score,
            summary,
            Some(LevelUpgrade {
                upgraded: true,
                new_level_id: None,
                new_level_name: Some("Elementary".into()),
                previous_level_name: None,
                completed_lessons: Some(5),
                total_lessons: Some(5),
            }),
            fixed_now(),
            fixed_now() + Duration::seconds(95),
        )
        .unwrap()
    }

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(PerformanceBand::from_percentage(100).label(), "Excellent");
        assert_eq!(PerformanceBand::from_percentage(90).label(), "Excellent");
        assert_eq!(PerformanceBand::from_percentage(89).label(), "Great");
        assert_eq!(PerformanceBand::from_percentage(70).label(), "Good");
        assert_eq!(PerformanceBand::from_percentage(60).label(), "Fair");
        assert_eq!(
            PerformanceBand::from_percentage(59).label(),
            "Needs Improvement"
        );
        assert_eq!(
            PerformanceBand::from_percentage(0).completion_message(),
            "Don't worry! Review the material and try again."
        );
    }

    #[test]
    fn local_results_build_breakdown_in_first_seen_order() {
        let vm = ResultsVm::from(&results(
            vec![
                reviewed(1, "grammar", Some(true)),
                reviewed(2, "vocabulary", Some(false)),
                reviewed(3, "grammar", Some(false)),
                reviewed(4, "grammar", None),
            ],
            None,
        ));

        assert_eq!(vm.score_percentage, 25);
        assert_eq!(vm.time_taken, "01:35");
        assert_eq!(vm.performance_label(), "Needs Improvement");

        assert_eq!(vm.breakdown.len(), 2);
        assert_eq!(vm.breakdown[0].label, "Grammar");
        assert_eq!((vm.breakdown[0].correct, vm.breakdown[0].total), (1, 3));
        assert_eq!(vm.breakdown[0].percentage, 33);
        assert_eq!(vm.breakdown[1].label, "Vocabulary");

        assert_eq!(vm.review[0].status, ReviewStatus::Correct);
        assert_eq!(vm.review[0].correct_answer.as_deref(), Some("right"));
        assert_eq!(vm.review[1].status, ReviewStatus::Incorrect);
        assert_eq!(vm.review[1].user_answer.as_deref(), Some("wrong"));
        assert_eq!(vm.review[1].explanation.as_deref(), Some("Explanation 2"));
        assert_eq!(vm.review[3].status, ReviewStatus::Skipped);
        assert_eq!(vm.review[3].number, 4);

        let upgrade = vm.level_upgrade.unwrap();
        assert_eq!(upgrade.new_level_name, "Elementary");
    }

    #[test]
    fn server_details_take_precedence() {
        let summary = ServerSummary {
            attempt_id: None,
            correct_answers: 1,
            total_questions: 2,
            score_percentage: Some(50),
            passing: Some(false),
            completion_time_minutes: Some(2),
            detailed_results: vec![
                DetailedResult {
                    question_id: QuestionId::new(1),
                    question_text: "Server question 1".into(),
                    question_type: QuestionType::new("error_correction"),
                    submitted: AnswerRef {
                        option_id: Some(OptionId::new(10)),
                        text: Some("right".into()),
                    },
                    correct: AnswerRef {
                        option_id: Some(OptionId::new(10)),
                        text: Some("right".into()),
                    },
                    is_correct: true,
                },
                DetailedResult {
                    question_id: QuestionId::new(2),
                    question_text: "Server question 2".into(),
                    question_type: QuestionType::new("error_correction"),
                    submitted: AnswerRef::default(),
                    correct: AnswerRef {
                        option_id: Some(OptionId::new(20)),
                        text: Some("right".into()),
                    },
                    is_correct: false,
                },
            ],
        };
        let vm = ResultsVm::from(&results(
            vec![reviewed(1, "grammar", Some(false))],
            Some(&summary),
        ));

        assert_eq!(vm.total, 2);
        assert_eq!(vm.incorrect, 1);
        assert_eq!(vm.breakdown.len(), 1);
        assert_eq!(vm.breakdown[0].label, "Error Correction");
        assert_eq!(vm.breakdown[0].percentage, 50);
        assert_eq!(vm.review[0].question_text, "Server question 1");
        assert_eq!(vm.review[0].status, ReviewStatus::Correct);
        assert_eq!(vm.review[1].status, ReviewStatus::Skipped);
        assert_eq!(vm.completion_message(), "Don't worry! Review the material and try again.");
    }
}
