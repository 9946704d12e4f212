/// Aggregated view of quiz progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizProgress {
    /// One-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    pub score: u32,
    pub is_complete: bool,
}

impl QuizProgress {
    /// Share of announced questions already answered, 0..=100.
    #[must_use]
    pub fn percent_answered(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let answered = self.answered.min(self.total) * 100 / self.total;
        u32::try_from(answered).unwrap_or(100)
    }
}
