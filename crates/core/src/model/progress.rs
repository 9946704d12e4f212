use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{AttemptId, LessonId};

/// Aggregate learning stats shown on the dashboard and profile.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserProgress {
    pub current_level_name: Option<String>,
    pub completed_lessons: u32,
    pub average_score: Option<f64>,
    pub last_activity: Option<DateTime<Utc>>,
}

/// One stored quiz attempt from the score history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt_id: AttemptId,
    pub lesson_id: LessonId,
    pub lesson_name: String,
    pub score_percentage: u32,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub completion_time_minutes: Option<u32>,
    pub attempted_at: Option<DateTime<Utc>>,
    pub passing: bool,
}
