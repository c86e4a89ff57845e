//! The governed-call loop: circuit gate, bounded retry, cancellable backoff.
//!
//! One [`Governor`] exists per (downstream, operation group); the breaker it
//! holds is the shared per-downstream circuit, the retry policy is optional.
//! The governor owns every cross-attempt concern — the operation it wraps
//! performs exactly one network attempt and nothing else.

use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::retry::RetryPolicy;
use crate::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, warn};

pub struct Governor {
    breaker: Arc<CircuitBreaker>,
    retry: Option<RetryPolicy>,
}

impl Governor {
    pub fn new(breaker: Arc<CircuitBreaker>, retry: Option<RetryPolicy>) -> Self {
        Self { breaker, retry }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Runs `operation` under the circuit breaker and retry policy, with no
    /// outer deadline.
    pub async fn guard<T, F, Fut>(&self, operation: &str, f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.guard_until(operation, None, f).await
    }

    /// Runs `operation` under the circuit breaker and retry policy.
    ///
    /// Protocol, per attempt:
    /// 1. Consult the circuit. An open circuit fails immediately with
    ///    [`Error::CircuitOpen`] — no network I/O.
    /// 2. Invoke the operation, bounded by the remaining deadline budget.
    /// 3. On success, record it (half-open probes count toward closing).
    /// 4. On failure, record it (may open the circuit), then retry only if a
    ///    policy is attached, attempts remain, and the failure is retryable.
    ///    The backoff sleep is cancellable: a deadline expiring mid-sleep or
    ///    mid-attempt surfaces as [`Error::Cancelled`], which is neither a
    ///    breaker failure nor a downstream-health statement.
    pub async fn guard_until<T, F, Fut>(
        &self,
        operation: &str,
        deadline: Option<Instant>,
        mut f: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.retry.as_ref().map_or(1, RetryPolicy::max_attempts);
        let mut attempt: u32 = 0;

        loop {
            self.breaker.allow()?;

            let result = match deadline {
                None => f().await,
                Some(d) => {
                    let now = Instant::now();
                    if d <= now {
                        return Err(Error::Cancelled {
                            operation: operation.to_string(),
                        });
                    }
                    match tokio::time::timeout(d - now, f()).await {
                        Ok(res) => res,
                        Err(_) => {
                            return Err(Error::Cancelled {
                                operation: operation.to_string(),
                            })
                        }
                    }
                }
            };

            match result {
                Ok(value) => {
                    self.breaker.on_success();
                    return Ok(value);
                }
                Err(err) => {
                    // Cancellation is a caller decision, not a downstream
                    // outcome; it must not trip the circuit.
                    if matches!(err, Error::Cancelled { .. }) {
                        return Err(err);
                    }
                    self.breaker.on_failure();
                    attempt += 1;

                    let policy = match &self.retry {
                        Some(p) if err.retryable() && attempt < max_attempts => p,
                        _ => {
                            warn!(
                                circuit = self.breaker.name(),
                                operation,
                                attempt,
                                retryable = err.retryable(),
                                error = %err,
                                "governed call failed"
                            );
                            return Err(err);
                        }
                    };

                    let delay = policy.delay(attempt - 1);
                    info!(
                        circuit = self.breaker.name(),
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure, backing off before retry"
                    );

                    match deadline {
                        None => tokio::time::sleep(delay).await,
                        Some(d) => {
                            tokio::select! {
                                _ = tokio::time::sleep(delay) => {}
                                _ = tokio::time::sleep_until(d) => {
                                    return Err(Error::Cancelled {
                                        operation: operation.to_string(),
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
