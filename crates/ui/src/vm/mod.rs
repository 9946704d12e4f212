mod dashboard_vm;
mod lessons_vm;
mod profile_vm;
mod quiz_vm;
mod results_vm;
mod time_fmt;

pub use dashboard_vm::{
    ActivityCardVm, DEFAULT_LEVEL_NAME, DashboardVm, NO_ACTIVITY_MESSAGE, load_dashboard,
};
pub use lessons_vm::{LessonCardVm, LessonListVm, LevelCardVm, load_lessons, load_levels};
pub use profile_vm::{
    PASSWORD_CHANGED, PROFILE_SAVED, ProfileForm, ProfileVm, change_password, load_profile,
    save_profile, sign_in, sign_up,
};
pub use quiz_vm::{
    FeedbackVm, OptionMark, OptionVm, QuizIntent, QuizOutcome, QuizVm, start_quiz,
};
pub use results_vm::{
    CategoryBreakdownVm, LevelUpgradeVm, PerformanceBand, ResultsVm, ReviewItemVm, ReviewStatus,
    load_last_results,
};
pub use time_fmt::{format_date, format_datetime, format_elapsed};
