//! Attempt configuration handed over by the entry screen, plus named presets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Directory the datasets are served from, relative to the data root.
pub const DATA_DIR: &str = "data";

/// Dataset used when a configuration names none.
pub const DEFAULT_DATA_FILE: &str = "questions.json";

/// Seconds to wait for the dataset before giving up.
pub const DATASET_TIMEOUT_SECS: u64 = 5;

/// Named quiz lengths offered on the entry screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizLength {
    Quick,
    Standard,
    Extended,
    FullExam,
}

impl QuizLength {
    pub const ALL: [QuizLength; 4] = [
        QuizLength::Quick,
        QuizLength::Standard,
        QuizLength::Extended,
        QuizLength::FullExam,
    ];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            QuizLength::Quick => "quick",
            QuizLength::Standard => "standard",
            QuizLength::Extended => "extended",
            QuizLength::FullExam => "exam",
        }
    }

    #[must_use]
    pub fn question_count(self) -> u32 {
        match self {
            QuizLength::Quick => 10,
            QuizLength::Standard => 20,
            QuizLength::Extended => 30,
            QuizLength::FullExam => 65,
        }
    }
}

/// Configuration for one attempt (`quizConfig`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizConfig {
    /// Requested number of questions. Kept signed so bad values reach sampling
    /// and are reported there.
    pub question_count: i64,
    #[serde(default = "default_data_file")]
    pub data_file: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
}

fn default_data_file() -> String {
    DEFAULT_DATA_FILE.to_string()
}

impl QuizConfig {
    #[must_use]
    pub fn new(
        question_count: i64,
        data_file: impl Into<String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            question_count,
            data_file: data_file.into(),
            start_time,
        }
    }

    #[must_use]
    pub fn from_preset(preset: QuizPreset, start_time: DateTime<Utc>) -> Self {
        Self::new(
            i64::from(preset.question_count()),
            preset.data_file(),
            start_time,
        )
    }

    #[must_use]
    pub fn from_length(length: QuizLength, start_time: DateTime<Utc>) -> Self {
        Self::new(
            i64::from(length.question_count()),
            DEFAULT_DATA_FILE,
            start_time,
        )
    }
}

/// The fixed quizzes offered on the entry screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPreset {
    Quiz1,
    Quiz2,
    Quiz3,
    Full,
}

impl QuizPreset {
    pub const ALL: [QuizPreset; 4] = [
        QuizPreset::Quiz1,
        QuizPreset::Quiz2,
        QuizPreset::Quiz3,
        QuizPreset::Full,
    ];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            QuizPreset::Quiz1 => "quiz1",
            QuizPreset::Quiz2 => "quiz2",
            QuizPreset::Quiz3 => "quiz3",
            QuizPreset::Full => "full",
        }
    }

    #[must_use]
    pub fn question_count(self) -> u32 {
        match self {
            QuizPreset::Quiz1 | QuizPreset::Quiz2 => 20,
            QuizPreset::Quiz3 => 25,
            QuizPreset::Full => QuizLength::FullExam.question_count(),
        }
    }

    #[must_use]
    pub fn data_file(self) -> &'static str {
        match self {
            QuizPreset::Quiz1 => "quiz1-20questions.json",
            QuizPreset::Quiz2 => "quiz2-20questions.json",
            QuizPreset::Quiz3 => "quiz3-25questions.json",
            QuizPreset::Full => DEFAULT_DATA_FILE,
        }
    }
}

impl fmt::Display for QuizPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPreset(pub String);

impl fmt::Display for UnknownPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown quiz preset: {}", self.0)
    }
}

impl std::error::Error for UnknownPreset {}

impl FromStr for QuizPreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.key() == key)
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLength(pub String);

impl fmt::Display for UnknownLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown quiz length: {}", self.0)
    }
}

impl std::error::Error for UnknownLength {}

impl FromStr for QuizLength {
    type Err = UnknownLength;

    /// Accepts the length name or its question count (`quick` or `10`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|l| l.key() == key || l.question_count().to_string() == key)
            .ok_or_else(|| UnknownLength(s.to_string()))
    }
}
