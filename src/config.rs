//! Startup configuration: downstream address, circuit and retry parameters.
//!
//! Loaded once (YAML), validated, and turned into the immutable runtime
//! pieces — descriptor, breaker, retry policy, client. Nothing here is
//! reloadable at runtime.
//!
//! ```yaml
//! downstream:
//!   name: product-catalog
//!   base-url: http://localhost:8081/products
//!   attempt-timeout-ms: 3000
//! circuit:
//!   failure-rate-threshold: 50.0
//!   window-size: 10
//!   cooldown-ms: 30000
//!   half-open-trials: 3
//! retry:
//!   max-attempts: 3
//!   backoff: exponential
//!   base-delay-ms: 100
//!   max-delay-ms: 2000
//! ```

use crate::orchestrator::Orchestrator;
use crate::resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::resilience::registry::ResilienceRegistry;
use crate::resilience::retry::{Backoff, RetryPolicy};
use crate::transport::{DownstreamClient, DownstreamDescriptor};
use crate::{Error, Result};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AggregatorConfig {
    pub downstream: DownstreamSettings,
    #[serde(default)]
    pub circuit: CircuitSettings,
    #[serde(default)]
    pub retry: Option<RetrySettings>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DownstreamSettings {
    pub name: String,
    pub base_url: String,
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CircuitSettings {
    #[serde(default = "default_failure_rate")]
    pub failure_rate_threshold: f64,
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    #[serde(default = "default_half_open_trials")]
    pub half_open_trials: u32,
}

impl Default for CircuitSettings {
    fn default() -> Self {
        Self {
            failure_rate_threshold: default_failure_rate(),
            window_size: default_window_size(),
            cooldown_ms: default_cooldown_ms(),
            half_open_trials: default_half_open_trials(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub backoff: BackoffMode,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BackoffMode {
    Constant,
    #[default]
    Exponential,
}

fn default_attempt_timeout_ms() -> u64 {
    5_000
}
fn default_failure_rate() -> f64 {
    50.0
}
fn default_window_size() -> usize {
    10
}
fn default_cooldown_ms() -> u64 {
    30_000
}
fn default_half_open_trials() -> u32 {
    3
}
fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    100
}
fn default_max_delay_ms() -> u64 {
    2_000
}

impl AggregatorConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw)
            .map_err(|e| Error::internal(format!("invalid configuration: {e}")))
    }

    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::internal(format!(
                "unable to read configuration '{}': {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn descriptor(&self) -> Result<DownstreamDescriptor> {
        DownstreamDescriptor::new(&self.downstream.name, &self.downstream.base_url)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.downstream.attempt_timeout_ms)
    }

    /// A breaker named after the downstream it protects.
    pub fn circuit_breaker(&self) -> CircuitBreaker {
        CircuitBreaker::new(
            self.downstream.name.clone(),
            CircuitBreakerConfig::new()
                .with_failure_rate_threshold(self.circuit.failure_rate_threshold)
                .with_window_size(self.circuit.window_size)
                .with_cooldown(Duration::from_millis(self.circuit.cooldown_ms))
                .with_half_open_trials(self.circuit.half_open_trials),
        )
    }

    pub fn retry_policy(&self) -> Option<RetryPolicy> {
        self.retry.as_ref().map(|r| {
            let backoff = match r.backoff {
                BackoffMode::Constant => Backoff::Constant(Duration::from_millis(r.base_delay_ms)),
                BackoffMode::Exponential => Backoff::Exponential {
                    base: Duration::from_millis(r.base_delay_ms),
                    cap: Duration::from_millis(r.max_delay_ms),
                },
            };
            RetryPolicy::new(
                format!("{}-retry", self.downstream.name),
                r.max_attempts,
                backoff,
            )
        })
    }

    /// A registry holding this tier's breaker and retry policy under the
    /// downstream's name.
    pub fn resilience_registry(&self) -> ResilienceRegistry {
        let mut registry = ResilienceRegistry::new().register_breaker(self.circuit_breaker());
        if let Some(policy) = self.retry_policy() {
            registry = registry.register_retry(policy);
        }
        registry
    }

    /// Wires the whole tier: client, registry, governor, orchestrator. The
    /// registry is returned alongside so callers can snapshot circuit state.
    pub fn build(&self) -> Result<(Orchestrator, ResilienceRegistry)> {
        let registry = self.resilience_registry();
        let retry_name = self
            .retry
            .as_ref()
            .map(|_| format!("{}-retry", self.downstream.name));
        let governor = registry.governor(&self.downstream.name, retry_name.as_deref())?;
        let client = DownstreamClient::new(self.descriptor()?, self.attempt_timeout())?;
        Ok((Orchestrator::new(Arc::new(client), governor), registry))
    }

    pub fn build_orchestrator(&self) -> Result<Orchestrator> {
        self.build().map(|(orchestrator, _)| orchestrator)
    }
}
