mod progress;
mod session;
mod timer;
mod workflow;

// Public API of the quiz subsystem.
pub use crate::error::{QuizError, QuizErrorKind};
pub use progress::QuizProgress;
pub use session::{QuizPhase, QuizSession, SubmissionAttempt};
pub use timer::SessionTimer;
pub use workflow::{ActiveQuiz, QuizLoopService};
