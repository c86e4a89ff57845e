//! # product-aggregator
//!
//! Resilient downstream-call orchestration for a multi-tier product
//! aggregator. Every downstream invocation runs through a governed loop
//! (circuit breaker gate, per-attempt timeout, bounded retry), and every
//! failure is classified into one canonical taxonomy before it reaches a
//! caller, so clients see stable response envelopes no matter which tier
//! or which failure mode produced the error.
//!
//! ## Core Ideas
//!
//! - **Governed calls**: the [`resilience::governor::Governor`] wraps each
//!   attempt with the breaker gate, records the outcome, and decides
//!   whether another attempt is allowed.
//! - **Canonical taxonomy**: [`CanonicalCode`] is the closed set of error
//!   codes callers can observe; [`classify::classify`] maps any internal
//!   [`Error`] onto it deterministically.
//! - **Stable envelopes**: [`ResponseEnvelope`] carries either data or a
//!   non-empty error list, never both, at every tier.
//! - **Error chaining**: a [`CanonicalError`] raised several hops down
//!   survives re-classification intact — each hop prefixes its own
//!   context and links the upstream error as `cause`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use product_aggregator::config::AggregatorConfig;
//!
//! #[tokio::main]
//! async fn main() -> product_aggregator::Result<()> {
//!     product_aggregator::telemetry::init_tracing();
//!
//!     let cfg = AggregatorConfig::from_yaml_file("aggregator.yaml")?;
//!     let orchestrator = cfg.build_orchestrator()?;
//!
//!     let envelope = orchestrator.fetch_one("sku-1001").await;
//!     println!("status {}: {:?}", envelope.http_status(), envelope.data);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error_code`] | Canonical error taxonomy and HTTP status mapping |
//! | [`error`] | Internal error type threaded through the call path |
//! | [`envelope`] | Response envelope and canonical error payloads |
//! | [`transport`] | Downstream API abstraction and the HTTP client |
//! | [`resilience`] | Circuit breaker, retry policy, governed call loop |
//! | [`classify`] | Deterministic failure-to-canonical-error mapping |
//! | [`catalog`] | Product catalog feed parsing and lookups |
//! | [`orchestrator`] | Public fetch operations returning envelopes |
//! | [`config`] | YAML startup configuration and wiring |
//! | [`telemetry`] | Structured logging bootstrap |

pub mod catalog;
pub mod classify;
pub mod config;
pub mod envelope;
pub mod error;
pub mod error_code;
pub mod orchestrator;
pub mod resilience;
pub mod telemetry;
pub mod transport;

// Re-export main types for convenience
pub use envelope::{CanonicalError, FieldError, ResponseEnvelope};
pub use error::Error;
pub use error_code::CanonicalCode;
pub use orchestrator::{Orchestrator, ProductDto};
pub use resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use resilience::governor::Governor;
pub use resilience::registry::ResilienceRegistry;
pub use resilience::retry::{Backoff, RetryPolicy};
pub use transport::{DownstreamApi, DownstreamClient, DownstreamDescriptor, Operation};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
