use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure
    pub retry_count: u32,
    #[serde(rename = "retry_delay_seconds", deserialize_with = "duration_from_secs")]
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(retry_count: u32, retry_delay: Duration) -> Self {
        RetryPolicy {
            retry_count,
            retry_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(3, Duration::from_secs(2))
    }
}

fn duration_from_secs<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Duration, D::Error> {
    u64::deserialize(d).map(Duration::from_secs)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "usize")]
pub struct RateLimit {
    max_threads: usize,
}

impl RateLimit {
    pub fn new(max_threads: usize) -> Result<Self> {
        if max_threads == 0 {
            return Err(Error::Policy(
                "max_threads must be greater than zero".to_string(),
            ));
        }

        Ok(RateLimit { max_threads })
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
    }
}

impl TryFrom<usize> for RateLimit {
    type Error = Error;

    fn try_from(max_threads: usize) -> Result<Self> {
        RateLimit::new(max_threads)
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        RateLimit { max_threads: 1 }
    }
}
