//! Wall-clock timing for a whole attempt and for each question position.
//!
//! Elapsed values are always `now - start`, never accumulated from ticks. Display
//! refresh (and `pause`) has no effect on the numbers.

use chrono::serde::ts_milliseconds_option;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::elapsed_ms;

/// State of the attempt-wide timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalTimer {
    Idle,
    Running { since: DateTime<Utc> },
    Stopped { elapsed_ms: u64 },
}

/// State of the per-question timer. At most one position runs at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionTimer {
    Idle,
    Running { position: usize, since: DateTime<Utc> },
}

/// Persisted timer state for resuming after a restart (`timerState`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    #[serde(with = "ts_milliseconds_option", default)]
    pub total_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub question_times: Vec<Option<u64>>,
    #[serde(with = "ts_milliseconds_option", default)]
    pub current_question_start: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingEngine {
    total: TotalTimer,
    question: QuestionTimer,
    question_elapsed: Vec<Option<u64>>,
    paused: bool,
}

impl TimingEngine {
    /// Engine with idle timers and one empty slot per question position.
    #[must_use]
    pub fn new(positions: usize) -> Self {
        Self {
            total: TotalTimer::Idle,
            question: QuestionTimer::Idle,
            question_elapsed: vec![None; positions],
            paused: false,
        }
    }

    /// Rebuild from a persisted snapshot. The question timer starts idle.
    ///
    /// The total timer keeps its original start so time before the restart still
    /// counts; it starts at `now` if the snapshot never recorded one.
    #[must_use]
    pub fn restore(snapshot: &TimerSnapshot, positions: usize, now: DateTime<Utc>) -> Self {
        let mut question_elapsed = snapshot.question_times.clone();
        question_elapsed.resize(positions, None);
        Self {
            total: TotalTimer::Running {
                since: snapshot.total_start_time.unwrap_or(now),
            },
            question: QuestionTimer::Idle,
            question_elapsed,
            paused: false,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> TimerSnapshot {
        let total_start_time = match self.total {
            TotalTimer::Running { since } => Some(since),
            TotalTimer::Idle | TotalTimer::Stopped { .. } => None,
        };
        let current_question_start = match self.question {
            QuestionTimer::Running { since, .. } => Some(since),
            QuestionTimer::Idle => None,
        };
        TimerSnapshot {
            total_start_time,
            question_times: self.question_elapsed.clone(),
            current_question_start,
        }
    }

    //
    // ─── TOTAL ─────────────────────────────────────────────────────────────────
    //

    /// Idle → Running. Calling again while running (or after stop) does nothing.
    pub fn start_total(&mut self, now: DateTime<Utc>) {
        if self.total == TotalTimer::Idle {
            self.total = TotalTimer::Running { since: now };
        }
    }

    /// Running → Stopped, returning the total elapsed milliseconds.
    ///
    /// Once stopped, returns the stored value again; `None` if never started.
    pub fn stop_total(&mut self, now: DateTime<Utc>) -> Option<u64> {
        match self.total {
            TotalTimer::Idle => None,
            TotalTimer::Running { since } => {
                let elapsed = elapsed_ms(since, now);
                self.total = TotalTimer::Stopped {
                    elapsed_ms: elapsed,
                };
                Some(elapsed)
            }
            TotalTimer::Stopped { elapsed_ms } => Some(elapsed_ms),
        }
    }

    #[must_use]
    pub fn total(&self) -> TotalTimer {
        self.total
    }

    /// Live total reading for display.
    #[must_use]
    pub fn total_elapsed(&self, now: DateTime<Utc>) -> u64 {
        match self.total {
            TotalTimer::Idle => 0,
            TotalTimer::Running { since } => elapsed_ms(since, now),
            TotalTimer::Stopped { elapsed_ms } => elapsed_ms,
        }
    }

    //
    // ─── PER QUESTION ──────────────────────────────────────────────────────────
    //

    /// Start timing `position`.
    ///
    /// Does not stop a different running position; whatever was running is
    /// discarded. Use `switch_to` for navigation. Positions outside the set are
    /// ignored.
    pub fn start_question(&mut self, position: usize, now: DateTime<Utc>) {
        if position < self.question_elapsed.len() {
            self.question = QuestionTimer::Running {
                position,
                since: now,
            };
        }
    }

    /// Record the running position's time (replacing any earlier value for a
    /// revisited position) and go idle.
    ///
    /// Returns the position and its elapsed time; `None` if nothing was running.
    pub fn stop_question(&mut self, now: DateTime<Utc>) -> Option<(usize, u64)> {
        let QuestionTimer::Running { position, since } = self.question else {
            return None;
        };
        let elapsed = elapsed_ms(since, now);
        if let Some(slot) = self.question_elapsed.get_mut(position) {
            *slot = Some(elapsed);
        }
        self.question = QuestionTimer::Idle;
        Some((position, elapsed))
    }

    /// Stop whatever is running, then start `position`, as one step.
    pub fn switch_to(&mut self, position: usize, now: DateTime<Utc>) {
        self.stop_question(now);
        self.start_question(position, now);
    }

    #[must_use]
    pub fn active_question(&self) -> Option<usize> {
        match self.question {
            QuestionTimer::Running { position, .. } => Some(position),
            QuestionTimer::Idle => None,
        }
    }

    /// Live reading of the running question timer, if any.
    #[must_use]
    pub fn current_question_elapsed(&self, now: DateTime<Utc>) -> Option<u64> {
        match self.question {
            QuestionTimer::Running { since, .. } => Some(elapsed_ms(since, now)),
            QuestionTimer::Idle => None,
        }
    }

    #[must_use]
    pub fn question_elapsed(&self, position: usize) -> Option<u64> {
        self.question_elapsed.get(position).copied().flatten()
    }

    #[must_use]
    pub fn question_times(&self) -> &[Option<u64>] {
        &self.question_elapsed
    }

    //
    // ─── DISPLAY ───────────────────────────────────────────────────────────────
    //

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Whether the display should stop refreshing. Elapsed math ignores this.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn start_total_twice_does_not_reset() {
        let t0 = fixed_now();
        let mut timing = TimingEngine::new(2);
        timing.start_total(t0);
        timing.start_total(t0 + Duration::seconds(30));
        assert_eq!(timing.stop_total(t0 + Duration::seconds(60)), Some(60_000));
    }

    #[test]
    fn stopping_idle_timers_is_a_no_op() {
        let mut timing = TimingEngine::new(2);
        assert_eq!(timing.stop_question(fixed_now()), None);
        assert_eq!(timing.stop_total(fixed_now()), None);
        assert_eq!(timing.question_times(), &[None, None]);
    }

    #[test]
    fn stop_total_twice_keeps_first_value() {
        let t0 = fixed_now();
        let mut timing = TimingEngine::new(1);
        timing.start_total(t0);
        assert_eq!(timing.stop_total(t0 + Duration::seconds(5)), Some(5_000));
        assert_eq!(timing.stop_total(t0 + Duration::seconds(50)), Some(5_000));
        assert_eq!(timing.total_elapsed(t0 + Duration::seconds(99)), 5_000);
    }

    #[test]
    fn switch_to_records_outgoing_question() {
        let t0 = fixed_now();
        let mut timing = TimingEngine::new(3);
        timing.switch_to(0, t0);
        timing.switch_to(2, t0 + Duration::seconds(4));

        assert_eq!(timing.question_elapsed(0), Some(4_000));
        assert_eq!(timing.active_question(), Some(2));
        assert_eq!(
            timing.current_question_elapsed(t0 + Duration::seconds(5)),
            Some(1_000)
        );
    }

    #[test]
    fn revisit_overwrites_previous_time() {
        let t0 = fixed_now();
        let mut timing = TimingEngine::new(2);
        timing.switch_to(0, t0);
        timing.switch_to(1, t0 + Duration::seconds(10));
        timing.switch_to(0, t0 + Duration::seconds(12));
        timing.stop_question(t0 + Duration::seconds(15));

        assert_eq!(timing.question_elapsed(0), Some(3_000));
        assert_eq!(timing.question_elapsed(1), Some(2_000));
    }

    #[test]
    fn out_of_range_start_is_ignored() {
        let mut timing = TimingEngine::new(2);
        timing.start_question(5, fixed_now());
        assert_eq!(timing.active_question(), None);
    }

    #[test]
    fn question_times_never_exceed_total() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut now = fixed_now();
        let mut timing = TimingEngine::new(6);
        timing.start_total(now);
        timing.switch_to(0, now);

        for _ in 0..200 {
            now += Duration::milliseconds(rng.random_range(0..5_000));
            timing.switch_to(rng.random_range(0..6), now);
            assert!(timing.active_question().is_some());
        }
        now += Duration::milliseconds(700);
        timing.stop_question(now);
        let total = timing.stop_total(now).unwrap();

        let sum: u64 = timing.question_times().iter().flatten().sum();
        assert!(sum <= total, "sum {sum} > total {total}");
        assert_eq!(timing.active_question(), None);
    }

    #[test]
    fn pause_does_not_change_elapsed() {
        let t0 = fixed_now();
        let mut timing = TimingEngine::new(1);
        timing.start_total(t0);
        timing.switch_to(0, t0);
        timing.pause();
        assert!(timing.is_paused());
        assert_eq!(timing.total_elapsed(t0 + Duration::seconds(8)), 8_000);
        timing.resume();
        assert!(!timing.is_paused());
        assert_eq!(timing.stop_question(t0 + Duration::seconds(8)), Some((0, 8_000)));
    }

    #[test]
    fn snapshot_restores_total_start_and_question_times() {
        let t0 = fixed_now();
        let mut timing = TimingEngine::new(3);
        timing.start_total(t0);
        timing.switch_to(0, t0);
        timing.switch_to(1, t0 + Duration::seconds(20));

        let snapshot = timing.snapshot();
        assert_eq!(snapshot.total_start_time, Some(t0));
        assert_eq!(
            snapshot.current_question_start,
            Some(t0 + Duration::seconds(20))
        );

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["totalStartTime"], t0.timestamp_millis());

        let back: TimerSnapshot = serde_json::from_value(json).unwrap();
        let later = t0 + Duration::hours(1);
        let restored = TimingEngine::restore(&back, 3, later);
        assert_eq!(restored.question_elapsed(0), Some(20_000));
        assert_eq!(restored.active_question(), None);
        assert_eq!(restored.total_elapsed(later), 3_600_000);
    }

    #[test]
    fn empty_snapshot_json_restores_from_now() {
        let snapshot: TimerSnapshot = serde_json::from_str("{}").unwrap();
        let now = fixed_now();
        let restored = TimingEngine::restore(&snapshot, 2, now);
        assert_eq!(restored.total(), TotalTimer::Running { since: now });
        assert_eq!(restored.question_times(), &[None, None]);
    }
}
