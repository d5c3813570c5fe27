use crate::error::Error;
use crate::policy::{RateLimit, RetryPolicy};
use crate::transport::BrokerTransport;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered { attempts: u32 },
    Failed { attempts: u32 },
    Rejected,
}

impl SendOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SendOutcome::Delivered { .. })
    }
}

#[async_trait]
pub trait Producer: Send + Sync {
    /// Failures are logged and reported in the outcome, never raised.
    async fn send_async(&self, message: &str, endpoint: &str) -> SendOutcome;

    fn retry_count(&self) -> u32;

    fn retry_delay(&self) -> Duration;

    fn max_threads(&self) -> usize;
}

#[derive(Debug)]
pub struct DefaultProducer<T> {
    transport: T,
    retry: RetryPolicy,
    rate_limit: RateLimit,
    slots: Semaphore,
}

impl<T: BrokerTransport> DefaultProducer<T> {
    pub fn new(transport: T, retry: RetryPolicy, rate_limit: RateLimit) -> Self {
        DefaultProducer {
            transport,
            retry,
            rate_limit,
            slots: Semaphore::new(rate_limit.max_threads()),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn send_with_retries(&self, message: &str, endpoint: &str) -> SendOutcome {
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            log::info!("[Producer] Attempt {attempt}/{max_attempts} to send message to {endpoint}");

            let err = match self.transport.send(endpoint, message).await {
                Ok(()) => {
                    log::info!("[Producer] Message sent successfully!");
                    return SendOutcome::Delivered { attempts: attempt };
                }
                Err(e) => e,
            };

            log::warn!("[Producer] Attempt {attempt} failed: {err}");

            if attempt >= max_attempts {
                log::error!("[Producer] All retry attempts failed. Aborting send.");
                return SendOutcome::Failed { attempts: attempt };
            }

            log::info!(
                "[Producer] Waiting {:?} before retry...",
                self.retry.retry_delay
            );
            sleep(self.retry.retry_delay).await;
        }
    }
}

#[async_trait]
impl<T: BrokerTransport> Producer for DefaultProducer<T> {
    async fn send_async(&self, message: &str, endpoint: &str) -> SendOutcome {
        if message.is_empty() {
            log::error!("[Producer] {}", Error::EmptyMessage);
            return SendOutcome::Rejected;
        }

        let _permit = match self.slots.acquire().await {
            Ok(p) => p,
            Err(e) => {
                log::error!("[Producer] Could not acquire a send slot: {e}");
                return SendOutcome::Failed { attempts: 0 };
            }
        };

        self.send_with_retries(message, endpoint).await
    }

    fn retry_count(&self) -> u32 {
        self.retry.retry_count
    }

    fn retry_delay(&self) -> Duration {
        self.retry.retry_delay
    }

    fn max_threads(&self) -> usize {
        self.rate_limit.max_threads()
    }
}
