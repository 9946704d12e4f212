use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{OptionId, QuestionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text is empty")]
    EmptyText,

    #[error("question {0} has no options")]
    NoOptions(QuestionId),

    #[error("question {question} lists option {option} more than once")]
    DuplicateOption {
        question: QuestionId,
        option: OptionId,
    },
}

/// Category tag of a question (vocabulary, grammar, ...).
///
/// The server owns the vocabulary of tags; unknown tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionType(String);

impl QuestionType {
    pub const VOCABULARY: &'static str = "vocabulary";

    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return Self::default();
        }
        Self(trimmed.to_ascii_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human readable label for the tag.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self.0.as_str() {
            "vocabulary" => "Vocabulary",
            "grammar" => "Grammar",
            "sentence_formation" => "Sentence Formation",
            "fill_in_blank" => "Fill in the Blank",
            "error_correction" => "Error Correction",
            "general" => "General",
            _ => "Question",
        }
    }
}

impl Default for QuestionType {
    fn default() -> Self {
        Self(Self::VOCABULARY.to_owned())
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One selectable answer. Correctness is never known client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: OptionId,
    pub text: String,
    pub order: u32,
}

impl QuizOption {
    #[must_use]
    pub fn new(id: OptionId, text: impl Into<String>, order: u32) -> Self {
        Self {
            id,
            text: text.into(),
            order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    question_type: QuestionType,
    difficulty: Option<String>,
    options: Vec<QuizOption>,
}

impl Question {
    /// Build a question, ordering options by their `order` field.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, there are no options,
    /// or an option id repeats.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        question_type: QuestionType,
        difficulty: Option<String>,
        mut options: Vec<QuizOption>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if options.is_empty() {
            return Err(QuestionError::NoOptions(id));
        }

        let mut seen = HashSet::with_capacity(options.len());
        for option in &options {
            if !seen.insert(option.id) {
                return Err(QuestionError::DuplicateOption {
                    question: id,
                    option: option.id,
                });
            }
        }

        options.sort_by_key(|option| option.order);

        Ok(Self {
            id,
            text,
            question_type,
            difficulty,
            options,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn question_type(&self) -> &QuestionType {
        &self.question_type
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<&str> {
        self.difficulty.as_deref()
    }

    #[must_use]
    pub fn options(&self) -> &[QuizOption] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, id: OptionId) -> Option<&QuizOption> {
        self.options.iter().find(|option| option.id == id)
    }

    #[must_use]
    pub fn has_option(&self, id: OptionId) -> bool {
        self.option(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(id: u64, order: u32) -> QuizOption {
        QuizOption::new(OptionId::new(id), format!("opt {id}"), order)
    }

    #[test]
    fn options_are_sorted_by_order() {
        let q = Question::new(
            QuestionId::new(1),
            "Pick one",
            QuestionType::default(),
            None,
            vec![option(10, 3), option(11, 1), option(12, 2)],
        )
        .unwrap();

        let ids: Vec<u64> = q.options().iter().map(|o| o.id.value()).collect();
        assert_eq!(ids, vec![11, 12, 10]);
        assert!(q.has_option(OptionId::new(12)));
        assert!(!q.has_option(OptionId::new(99)));
    }

    #[test]
    fn rejects_blank_text_and_missing_options() {
        let blank = Question::new(
            QuestionId::new(1),
            "   ",
            QuestionType::default(),
            None,
            vec![option(1, 1)],
        );
        assert_eq!(blank.unwrap_err(), QuestionError::EmptyText);

        let empty = Question::new(
            QuestionId::new(2),
            "Q",
            QuestionType::default(),
            None,
            Vec::new(),
        );
        assert_eq!(empty.unwrap_err(), QuestionError::NoOptions(QuestionId::new(2)));
    }

    #[test]
    fn rejects_duplicate_option_ids() {
        let err = Question::new(
            QuestionId::new(3),
            "Q",
            QuestionType::default(),
            None,
            vec![option(1, 1), option(1, 2)],
        )
        .unwrap_err();
        assert!(matches!(err, QuestionError::DuplicateOption { .. }));
    }

    #[test]
    fn question_type_labels() {
        assert_eq!(QuestionType::new("fill_in_blank").label(), "Fill in the Blank");
        assert_eq!(QuestionType::new(" Grammar ").as_str(), "grammar");
        assert_eq!(QuestionType::new("").as_str(), "vocabulary");
        assert_eq!(QuestionType::new("listening").label(), "Question");
    }
}
