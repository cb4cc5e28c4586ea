#![forbid(unsafe_code)]

pub mod bank;
pub mod config;
pub mod error;
pub mod model;
pub mod scoring;
pub mod time;
pub mod timing;

pub use error::{LoadError, UsageError};
pub use time::Clock;
