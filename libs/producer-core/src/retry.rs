//! Bounded retry around [`Producer`]. Kept outside the core: the core
//! surfaces every failure unchanged, this wrapper decides what to resubmit.

use std::time::Duration;

use serde::Deserialize;

use producer_api::{DeliveryReport, Message, ProducerError};

use crate::producer::Producer;

#[derive(Debug, Clone, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    100
}
fn default_max_backoff_ms() -> u64 {
    5000
}
fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// Pause after the `failed_attempt`-th failure (1-based), capped at `max_backoff_ms`.
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        let exp = failed_attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let ms = self.initial_backoff_ms as f64 * self.multiplier.max(1.0).powi(exp);
        Duration::from_millis(ms.min(self.max_backoff_ms as f64) as u64)
    }
}

pub struct RetryProducer<'a> {
    producer: &'a Producer,
    policy: RetryPolicy,
}

impl<'a> RetryProducer<'a> {
    pub fn new(producer: &'a Producer, policy: RetryPolicy) -> Self {
        Self { producer, policy }
    }

    pub async fn produce(&self, payload: impl Into<Vec<u8>>, topic: &str) -> Result<(), ProducerError> {
        self.produce_message(Message::new(topic, payload)).await.map(|_| ())
    }

    /// Only errors with `is_retryable()` are resubmitted. Everything else,
    /// including `UnknownOutcome` and a produce timeout, is returned on the
    /// first occurrence.
    pub async fn produce_message(&self, message: Message) -> Result<DeliveryReport, ProducerError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.producer.produce_message(message.clone()).await {
                Ok(report) => return Ok(report),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let backoff = self.policy.backoff(attempt);
                    tracing::warn!(
                        topic = %message.topic,
                        attempt,
                        max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "produce failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
