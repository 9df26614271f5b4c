//! Queue configuration.
//!
//! Defines the delay and clock source a queue is built with, loadable from JSON.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::clock::{ConfiguredClock, QuantaClock, SystemClock};
use super::error::{Error, Result};

/// Which [`Clock`](super::Clock) implementation a queue should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockSource {
    /// `SystemClock`: wall-clock time.
    #[default]
    System,
    /// `QuantaClock`: TSC-based, monotonic.
    Quanta,
}

impl ClockSource {
    pub fn build(self) -> ConfiguredClock {
        match self {
            ClockSource::System => ConfiguredClock::System(SystemClock),
            ClockSource::Quanta => ConfiguredClock::Quanta(QuantaClock::new()),
        }
    }
}

/// Configuration for a delay queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Minimum time a message waits after arrival before it can be delivered.
    /// Signed so that a negative value in a config file is reported rather
    /// than failing to parse.
    /// Default: 1000 ms
    pub delay_ms: i64,

    /// Clock the queue reads arrival and operation times from.
    /// Default: system
    pub clock: ClockSource,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1000,
            clock: ClockSource::System,
        }
    }
}

impl QueueConfig {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay_ms: i64::try_from(delay.as_millis()).unwrap_or(i64::MAX),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// # Errors
    ///
    /// Returns `Error::InvalidDelay` if `delay_ms` is negative.
    pub fn validate(&self) -> Result<()> {
        self.delay().map(|_| ())
    }

    /// The configured delay, or `Error::InvalidDelay` if it is negative.
    pub fn delay(&self) -> Result<Duration> {
        u64::try_from(self.delay_ms)
            .map(Duration::from_millis)
            .map_err(|_| Error::InvalidDelay(self.delay_ms))
    }
}
