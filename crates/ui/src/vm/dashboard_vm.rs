use services::api::ProgressReport;
use services::{CatalogService, DEFAULT_HISTORY_LIMIT};
use wordiamo_core::model::{AttemptRecord, LessonId};

use crate::state::ViewError;
use crate::vm::time_fmt::format_date;

pub const DEFAULT_LEVEL_NAME: &str = "Beginner";
pub const NO_ACTIVITY_MESSAGE: &str =
    "No recent activity yet. Start learning to see your progress here!";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityCardVm {
    pub lesson_id: LessonId,
    pub lesson_name: String,
    pub score: String,
    pub detail: String,
    pub date: String,
    pub passing: bool,
}

impl From<&AttemptRecord> for ActivityCardVm {
    fn from(record: &AttemptRecord) -> Self {
        Self {
            lesson_id: record.lesson_id,
            lesson_name: record.lesson_name.clone(),
            score: format!("{}%", record.score_percentage),
            detail: format!(
                "{}/{} correct",
                record.correct_answers, record.total_questions
            ),
            date: record
                .attempted_at
                .map(format_date)
                .unwrap_or_else(|| "Unknown date".to_owned()),
            passing: record.passing,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardVm {
    pub greeting: String,
    pub current_level: String,
    pub completed_lessons: u32,
    pub average_score: String,
    pub last_activity: Option<String>,
    pub recent: Vec<ActivityCardVm>,
}

impl DashboardVm {
    #[must_use]
    pub fn new(report: &ProgressReport, history: &[AttemptRecord]) -> Self {
        let progress = &report.progress;
        let greeting = match &report.username {
            Some(name) => format!("Welcome back, {name}!"),
            None => "Welcome back!".to_owned(),
        };
        Self {
            greeting,
            current_level: progress
                .current_level_name
                .clone()
                .unwrap_or_else(|| DEFAULT_LEVEL_NAME.to_owned()),
            completed_lessons: progress.completed_lessons,
            average_score: format!("{:.0}%", progress.average_score.unwrap_or(0.0)),
            last_activity: progress.last_activity.map(format_date),
            recent: history.iter().map(ActivityCardVm::from).collect(),
        }
    }

    #[must_use]
    pub fn empty_message(&self) -> Option<&'static str> {
        self.recent.is_empty().then_some(NO_ACTIVITY_MESSAGE)
    }
}

/// # Errors
///
/// Returns the mapped `ViewError` if progress cannot be fetched. A failed
/// history request only empties the activity list.
pub async fn load_dashboard(catalog: &CatalogService) -> Result<DashboardVm, ViewError> {
    let report = catalog.progress().await?;
    let history = match catalog.history(DEFAULT_HISTORY_LIMIT).await {
        Ok(history) => history,
        Err(err) => {
            tracing::warn!(error = %err, "score history unavailable");
            Vec::new()
        }
    };
    Ok(DashboardVm::new(&report, &history))
}
