use crate::error::{Error, Result};
use crate::policy::RateLimit;
use crate::transport::BrokerTransport;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::sleep;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[async_trait]
pub trait Consumer: Send + Sync {
    /// Polls until a message is delivered. Empty queues and transient errors
    /// are retried every poll interval without bound.
    async fn consume_async(&self, endpoint: &str) -> Result<String>;

    fn max_threads(&self) -> usize;
}

#[derive(Debug)]
pub struct DefaultConsumer<T> {
    transport: T,
    rate_limit: RateLimit,
    poll_interval: Duration,
    slots: Semaphore,
}

impl<T: BrokerTransport> DefaultConsumer<T> {
    pub fn new(transport: T, rate_limit: RateLimit, poll_interval: Duration) -> Self {
        DefaultConsumer {
            transport,
            rate_limit,
            poll_interval,
            slots: Semaphore::new(rate_limit.max_threads()),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    async fn poll_until_delivered(&self, endpoint: &str) -> Result<String> {
        loop {
            match self.transport.receive(endpoint).await {
                Ok(Some(message)) => {
                    log::info!("[Consumer] Received message: {message}");
                    return Ok(message);
                }
                Ok(None) => {
                    log::debug!("[Consumer] No messages available. Retrying...");
                }
                Err(e) if e.is_transient() => {
                    log::warn!("[Consumer] Error receiving message: {e}. Retrying...");
                }
                Err(e) => {
                    log::error!("[Consumer] Giving up on {endpoint}: {e}");
                    return Err(e);
                }
            }

            sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl<T: BrokerTransport> Consumer for DefaultConsumer<T> {
    async fn consume_async(&self, endpoint: &str) -> Result<String> {
        let _permit = self
            .slots
            .acquire()
            .await
            .map_err(|e| Error::Policy(format!("consumer slots closed: {e}")))?;

        log::info!("[Consumer] Attempting to receive message from {endpoint}");

        self.poll_until_delivered(endpoint).await
    }

    fn max_threads(&self) -> usize {
        self.rate_limit.max_threads()
    }
}
