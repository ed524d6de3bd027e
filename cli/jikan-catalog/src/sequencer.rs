//! Serialized, rate-limit spaced execution of catalog requests.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::{debug, instrument, trace};

use crate::config::CatalogClientConfig;
use crate::descriptor::RequestDescriptor;
use crate::error::{FetchError, SequenceError};
use crate::transport::{Transport, TransportTrait};

/// Issues requests one at a time, keeping at least `inter_request_delay`
/// between one request settling and the next being dispatched.
///
/// The spacing holds across calls: the time the last request settled is the
/// only state kept between invocations. Dropping a returned future abandons
/// the request in flight and everything queued behind it.
#[derive(Debug)]
pub struct RequestSequencer {
    transport: Transport,
    inter_request_delay: Duration,
    request_timeout: Option<Duration>,
    network_retries: u8,
    last_settled: Mutex<Option<Instant>>,
}

impl RequestSequencer {
    pub fn new(transport: Transport, config: &CatalogClientConfig) -> Self {
        Self {
            transport,
            inter_request_delay: config.inter_request_delay,
            request_timeout: config.request_timeout,
            network_retries: config.network_retries,
            last_settled: Mutex::new(None),
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn inter_request_delay(&self) -> Duration {
        self.inter_request_delay
    }

    /// Execute a single request.
    ///
    /// Network failures are retried up to `network_retries` times, every
    /// attempt paced like any other request. Status and decode errors are
    /// returned as they are.
    #[instrument(skip_all, fields(request = %descriptor))]
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<Value, FetchError> {
        let mut attempt = 0;
        loop {
            match self.dispatch(descriptor).await {
                Err(err) if err.is_transient() && attempt < self.network_retries => {
                    attempt += 1;
                    debug!(attempt, error = %err, "retrying after network failure");
                },
                result => return result,
            }
        }
    }

    /// Execute `descriptors` in order, stopping at the first failure.
    ///
    /// On failure the error carries the failing index and the payloads of all
    /// requests before it; later requests are never dispatched.
    pub async fn execute_sequence(
        &self,
        descriptors: &[RequestDescriptor],
    ) -> Result<Vec<Value>, SequenceError> {
        let mut completed = Vec::with_capacity(descriptors.len());
        for (index, descriptor) in descriptors.iter().enumerate() {
            match self.execute(descriptor).await {
                Ok(payload) => completed.push(payload),
                Err(source) => {
                    debug!(index, error = %source, "sequence aborted");
                    return Err(SequenceError {
                        index,
                        completed,
                        source,
                    });
                },
            }
        }
        Ok(completed)
    }

    async fn dispatch(&self, descriptor: &RequestDescriptor) -> Result<Value, FetchError> {
        let gate = SettleOnDrop(self.last_settled.lock().await);

        if let Some(settled) = *gate.0 {
            let ready_at = settled + self.inter_request_delay;
            if ready_at > Instant::now() {
                trace!(wait_ms = (ready_at - Instant::now()).as_millis(), "pacing");
                tokio::time::sleep_until(ready_at).await;
            }
        }

        let result = match self.request_timeout {
            Some(after) => tokio::time::timeout(after, self.transport.send(descriptor))
                .await
                .unwrap_or_else(|_| {
                    Err(FetchError::Timeout {
                        endpoint: descriptor.endpoint().to_string(),
                        after,
                    })
                }),
            None => self.transport.send(descriptor).await,
        };

        drop(gate);
        result
    }
}

/// Records the settle time when released, also if the request was abandoned.
struct SettleOnDrop<'a>(MutexGuard<'a, Option<Instant>>);

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        *self.0 = Some(Instant::now());
    }
}
