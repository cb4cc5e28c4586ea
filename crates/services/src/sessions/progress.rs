use quiz_core::scoring::percent_round_half_up;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    /// Zero-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_first: bool,
    pub is_last: bool,
    pub is_complete: bool,
}

impl SessionProgress {
    /// Share of questions with a recorded answer, rounded half up.
    #[must_use]
    pub fn completion_percentage(&self) -> u32 {
        percent_round_half_up(self.answered, self.total)
    }
}
