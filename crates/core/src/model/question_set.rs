use std::ops::Index;

use crate::model::ids::QuestionId;
use crate::model::question::Question;

/// The fixed, ordered questions of one attempt.
///
/// Remembers how many questions were asked for so a short dataset can be
/// reported instead of passing unnoticed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    questions: Vec<Question>,
    requested: usize,
}

impl QuestionSet {
    #[must_use]
    pub fn new(questions: Vec<Question>, requested: usize) -> Self {
        Self {
            questions,
            requested,
        }
    }

    /// Wrap an already chosen list; the requested count is its length.
    #[must_use]
    pub fn from_questions(questions: Vec<Question>) -> Self {
        let requested = questions.len();
        Self::new(questions, requested)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Question> {
        self.questions.get(position)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.questions.iter()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<QuestionId> {
        self.questions.iter().map(Question::id).collect()
    }

    #[must_use]
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// True when fewer questions were available than requested.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.questions.len() < self.requested
    }
}

impl Index<usize> for QuestionSet {
    type Output = Question;

    fn index(&self, position: usize) -> &Self::Output {
        &self.questions[position]
    }
}

impl<'a> IntoIterator for &'a QuestionSet {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.questions.iter()
    }
}
