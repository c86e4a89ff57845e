//! Process-wide registry of named circuits and retry policies.
//!
//! Built explicitly at startup from configuration and injected by reference
//! into each orchestrator — there are no lazily created circuits and no
//! global singletons. Looking up an unregistered name is a wiring bug and
//! fails loudly.

use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::governor::Governor;
use crate::resilience::retry::RetryPolicy;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct ResilienceRegistry {
    breakers: HashMap<String, Arc<CircuitBreaker>>,
    retries: HashMap<String, RetryPolicy>,
}

impl ResilienceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_breaker(mut self, breaker: CircuitBreaker) -> Self {
        self.breakers
            .insert(breaker.name().to_string(), Arc::new(breaker));
        self
    }

    pub fn register_retry(mut self, policy: RetryPolicy) -> Self {
        self.retries.insert(policy.name().to_string(), policy);
        self
    }

    pub fn breaker(&self, name: &str) -> Result<Arc<CircuitBreaker>> {
        self.breakers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::internal(format!("no circuit breaker registered as '{name}'")))
    }

    pub fn retry(&self, name: &str) -> Result<RetryPolicy> {
        self.retries
            .get(name)
            .cloned()
            .ok_or_else(|| Error::internal(format!("no retry policy registered as '{name}'")))
    }

    /// Assembles a governor from a named circuit and an optional named retry
    /// policy. The breaker is shared; the policy is copied (it is immutable
    /// configuration).
    pub fn governor(&self, circuit: &str, retry: Option<&str>) -> Result<Governor> {
        let breaker = self.breaker(circuit)?;
        let retry = match retry {
            Some(name) => Some(self.retry(name)?),
            None => None,
        };
        Ok(Governor::new(breaker, retry))
    }

    /// Snapshots of every registered circuit, for operational visibility.
    pub fn circuit_snapshots(&self) -> Vec<crate::resilience::circuit_breaker::CircuitSnapshot> {
        self.breakers.values().map(|b| b.snapshot()).collect()
    }
}
