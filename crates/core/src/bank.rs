//! The validated question pool for a dataset and unbiased sampling from it.

use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::error::{LoadError, UsageError};
use crate::model::{Question, QuestionId, QuestionSet};

/// All valid questions from one dataset.
///
/// Never empty; construction fails with `LoadError::Empty` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
    dropped: usize,
}

impl QuestionBank {
    /// Build a bank from already validated questions, dropping repeated ids.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Empty` if no questions remain.
    pub fn new(questions: Vec<Question>) -> Result<Self, LoadError> {
        Self::with_dropped(questions, 0)
    }

    fn with_dropped(questions: Vec<Question>, mut dropped: usize) -> Result<Self, LoadError> {
        let mut seen = HashSet::with_capacity(questions.len());
        let mut unique = Vec::with_capacity(questions.len());
        for question in questions {
            if seen.insert(question.id()) {
                unique.push(question);
            } else {
                dropped += 1;
            }
        }

        if unique.is_empty() {
            return Err(LoadError::Empty);
        }

        Ok(Self {
            questions: unique,
            dropped,
        })
    }

    /// Parse a `{ "questions": [...] }` dataset body.
    ///
    /// Records that fail validation are skipped and counted in `dropped()`.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Malformed` if the body is not JSON or has no `questions`
    /// array, and `LoadError::Empty` if no record is valid.
    pub fn from_json(body: &str) -> Result<Self, LoadError> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| LoadError::Malformed(e.to_string()))?;
        let records = value
            .get("questions")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                LoadError::Malformed("expected an object with a `questions` array".into())
            })?;

        let mut questions = Vec::with_capacity(records.len());
        let mut dropped = 0;
        for record in records {
            match Question::deserialize(record) {
                Ok(question) => questions.push(question),
                Err(_) => dropped += 1,
            }
        }

        Self::with_dropped(questions, dropped)
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
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Number of records skipped while loading (invalid or duplicate id).
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    /// Sample `count` questions without replacement.
    ///
    /// Shuffles a copy of the pool and takes the first `min(count, len)`; the bank
    /// itself is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `UsageError::InvalidCount` when `count` is zero.
    pub fn select<R: Rng>(&self, count: usize, rng: &mut R) -> Result<QuestionSet, UsageError> {
        if count == 0 {
            return Err(UsageError::InvalidCount { requested: 0 });
        }

        let mut pool = self.questions.clone();
        shuffle(&mut pool, rng);
        pool.truncate(count);

        Ok(QuestionSet::new(pool, count))
    }

    /// Like `select`, for a count read from configuration.
    ///
    /// # Errors
    ///
    /// Returns `UsageError::InvalidCount` for zero or negative counts.
    pub fn select_configured<R: Rng>(
        &self,
        count: i64,
        rng: &mut R,
    ) -> Result<QuestionSet, UsageError> {
        let n = usize::try_from(count)
            .ok()
            .filter(|&n| n > 0)
            .ok_or(UsageError::InvalidCount { requested: count })?;
        self.select(n, rng)
    }

    /// Rebuild a previously sampled set from its ids, in order.
    ///
    /// Returns `None` if any id is no longer in the bank.
    #[must_use]
    pub fn set_from_ids(&self, ids: &[QuestionId]) -> Option<QuestionSet> {
        let questions = ids
            .iter()
            .map(|id| self.get(*id).cloned())
            .collect::<Option<Vec<_>>>()?;
        Some(QuestionSet::from_questions(questions))
    }
}

/// Fisher–Yates, right to left: at step `i` swap with a uniform `j` in `[0, i]`.
pub fn shuffle<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionKind;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeSet;

    fn question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            QuestionKind::Single,
            format!("Question {id}"),
            vec!["a".into(), "b".into(), "c".into()],
            [0],
            "because",
        )
        .unwrap()
    }

    fn bank(n: u64) -> QuestionBank {
        QuestionBank::new((1..=n).map(question).collect()).unwrap()
    }

    #[test]
    fn select_more_than_available_returns_all_without_duplicates() {
        let bank = bank(5);
        let mut rng = StdRng::seed_from_u64(1);
        let set = bank.select(10, &mut rng).unwrap();

        assert_eq!(set.len(), 5);
        assert_eq!(set.requested(), 10);
        assert!(set.is_truncated());
        let ids: BTreeSet<_> = set.ids().into_iter().collect();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn select_full_size_is_a_permutation() {
        let bank = bank(8);
        let mut rng = StdRng::seed_from_u64(42);
        let set = bank.select(8, &mut rng).unwrap();

        let mut picked: Vec<_> = set.ids().iter().map(QuestionId::value).collect();
        picked.sort_unstable();
        assert_eq!(picked, (1..=8).collect::<Vec<_>>());
        assert!(!set.is_truncated());
    }

    #[test]
    fn select_subset_comes_from_bank_and_leaves_bank_untouched() {
        let bank = bank(20);
        let before = bank.clone();
        let mut rng = StdRng::seed_from_u64(3);
        let set = bank.select(7, &mut rng).unwrap();

        assert_eq!(set.len(), 7);
        assert!(set.iter().all(|q| bank.get(q.id()).is_some()));
        let ids: BTreeSet<_> = set.ids().into_iter().collect();
        assert_eq!(ids.len(), 7);
        assert_eq!(bank, before);
    }

    #[test]
    fn zero_or_negative_count_is_a_usage_error() {
        let bank = bank(3);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            bank.select(0, &mut rng).unwrap_err(),
            UsageError::InvalidCount { requested: 0 }
        );
        assert_eq!(
            bank.select_configured(-4, &mut rng).unwrap_err(),
            UsageError::InvalidCount { requested: -4 }
        );
        assert_eq!(bank.select_configured(2, &mut rng).unwrap().len(), 2);
    }

    #[test]
    fn shuffle_puts_each_item_first_about_equally_often() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut firsts = [0_u32; 3];
        for _ in 0..3000 {
            let mut items = [0_usize, 1, 2];
            shuffle(&mut items, &mut rng);
            firsts[items[0]] += 1;
        }
        for count in firsts {
            assert!((800..=1200).contains(&count), "skewed: {firsts:?}");
        }
    }

    #[test]
    fn from_json_drops_invalid_records() {
        let body = r#"{
            "questions": [
                {"id": 1, "type": "single", "question": "Q1",
                  "options": ["a", "b"], "correct": [1], "explanation": "E"},
                {"id": 2, "question": "Q2",
                  "options": ["a", "b"], "correct": [5], "explanation": "E"},
                {"id": 3, "question": "Q3", "options": ["a", "b"], "correct": 0},
                {"question": "Q4", "options": ["a"], "correct": 0, "explanation": "E"},
                {"id": 1, "question": "dup", "options": ["a"], "correct": 0, "explanation": "E"},
                {"id": 6, "type": "multiple", "question": "Q6",
                  "options": ["a", "b", "c"], "correct": [0, 2], "explanation": "E"}
            ]
        }"#;

        let bank = QuestionBank::from_json(body).unwrap();
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.dropped(), 4);
        assert_eq!(bank.get(QuestionId::new(1)).unwrap().text(), "Q1");
        assert!(bank.get(QuestionId::new(6)).is_some());
    }

    #[test]
    fn from_json_rejects_wrong_top_level() {
        assert!(matches!(
            QuestionBank::from_json(r#"[{"id": 1}]"#),
            Err(LoadError::Malformed(_))
        ));
        assert!(matches!(
            QuestionBank::from_json(r#"{"questions": {"id": 1}}"#),
            Err(LoadError::Malformed(_))
        ));
        assert!(matches!(
            QuestionBank::from_json("not json"),
            Err(LoadError::Malformed(_))
        ));
    }

    #[test]
    fn from_json_with_no_valid_records_is_empty() {
        assert_eq!(
            QuestionBank::from_json(r#"{"questions": [{"id": 1}]}"#),
            Err(LoadError::Empty)
        );
        assert_eq!(
            QuestionBank::from_json(r#"{"questions": []}"#),
            Err(LoadError::Empty)
        );
    }

    #[test]
    fn set_from_ids_preserves_order_and_detects_missing() {
        let bank = bank(4);
        let ids = [QuestionId::new(3), QuestionId::new(1)];
        let set = bank.set_from_ids(&ids).unwrap();
        assert_eq!(set.ids(), ids.to_vec());
        assert!(bank.set_from_ids(&[QuestionId::new(99)]).is_none());
    }
}
