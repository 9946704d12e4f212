use serde::{Deserialize, Serialize};

use crate::model::{LessonId, LevelId};

/// A proficiency tier grouping lessons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub id: LevelId,
    pub name: String,
    pub description: Option<String>,
    pub order: u32,
    pub lesson_count: u32,
}

/// Whether the signed-in user may open a lesson.
///
/// Eligibility is decided by the server. The client never derives it from
/// level ids; a listing that carries no flag is `Unreported`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LessonAccess {
    Open,
    Locked {
        reason: Option<String>,
    },
    #[default]
    Unreported,
}

impl LessonAccess {
    #[must_use]
    pub fn from_flag(can_access: Option<bool>, reason: Option<String>) -> Self {
        match can_access {
            Some(true) => Self::Open,
            Some(false) => Self::Locked { reason },
            None => Self::Unreported,
        }
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }
}

/// A named unit of learning content with a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub level_id: LevelId,
    pub name: String,
    pub description: Option<String>,
    pub order: u32,
    pub estimated_minutes: Option<u32>,
    pub question_count: u32,
    pub average_score: Option<f64>,
    pub access: LessonAccess,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_mirrors_server_flag() {
        assert_eq!(LessonAccess::from_flag(Some(true), None), LessonAccess::Open);
        assert_eq!(
            LessonAccess::from_flag(Some(false), Some("finish level 1".into())),
            LessonAccess::Locked {
                reason: Some("finish level 1".into())
            }
        );
        assert_eq!(LessonAccess::from_flag(None, None), LessonAccess::Unreported);
        assert!(!LessonAccess::Unreported.is_locked());
    }
}
