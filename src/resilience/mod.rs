//! Resilience primitives for governed downstream calls.
//!
//! A *governed call* is a downstream invocation wrapped by a named circuit
//! breaker and an optional named retry policy. The pieces compose as:
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`circuit_breaker`] | Per-downstream failure isolation (CLOSED / OPEN / HALF_OPEN) |
//! | [`retry`] | Bounded attempts with constant or exponential backoff |
//! | [`registry`] | Startup-built map of named breakers and policies |
//! | [`governor`] | The call-wrapping loop combining the above |
//!
//! ```rust,no_run
//! use product_aggregator::resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
//! use product_aggregator::resilience::retry::{Backoff, RetryPolicy};
//! use product_aggregator::resilience::registry::ResilienceRegistry;
//! use std::time::Duration;
//!
//! let registry = ResilienceRegistry::new()
//!     .register_breaker(CircuitBreaker::new("product-catalog", CircuitBreakerConfig::default()))
//!     .register_retry(RetryPolicy::new(
//!         "product-catalog-retry",
//!         3,
//!         Backoff::Exponential { base: Duration::from_millis(100), cap: Duration::from_secs(2) },
//!     ));
//! let governor = registry.governor("product-catalog", Some("product-catalog-retry")).unwrap();
//! ```

pub mod circuit_breaker;
pub mod governor;
pub mod registry;
pub mod retry;
