//! Outbound call surface: one network attempt per invocation.
//!
//! The transport is pure plumbing. Retries, circuit breaking, and failure
//! classification all live above it ([`crate::resilience`], [`crate::classify`]);
//! this module only knows how to issue a single GET against a named downstream
//! and report exactly what went wrong with that one attempt.

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

mod http;
pub use http::DownstreamClient;

/// The ways a single network attempt can fail.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established or broke mid-flight.
    #[error("connection failure: {message}")]
    Connection { message: String },

    /// The per-attempt timeout elapsed before a response arrived.
    #[error("attempt timed out during {operation}")]
    Timeout { operation: String },

    /// The downstream answered with a non-2xx status. The raw body is kept
    /// verbatim so the classifier can inspect structured error envelopes.
    #[error("downstream returned status {status}")]
    Status { status: u16, body: String },

    /// The response arrived but its body could not be decoded.
    #[error("failed to decode downstream response: {message}")]
    Decode { message: String, raw: String },
}

/// Logical operations a downstream exposes, with their bounded path templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `GET ""` — the whole collection.
    FetchAll,
    /// `GET "/{id}"` — one entity.
    FetchOne,
    /// `GET "/{id}/price"` — one entity's price.
    FetchPrice,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FetchAll => "fetch-all",
            Self::FetchOne => "fetch-one",
            Self::FetchPrice => "fetch-price",
        }
    }

    /// Per-item operations require a subject identifier; collection
    /// operations forbid one.
    pub fn requires_subject(&self) -> bool {
        !matches!(self, Self::FetchAll)
    }

    /// Renders the path template. Arity is the caller's contract: the
    /// orchestrator validates subjects before any call is attempted.
    pub fn path(&self, subject: Option<&str>) -> String {
        debug_assert_eq!(self.requires_subject(), subject.is_some());
        match self {
            Self::FetchAll => String::new(),
            Self::FetchOne => format!("/{}", subject.unwrap_or_default()),
            Self::FetchPrice => format!("/{}/price", subject.unwrap_or_default()),
        }
    }
}

/// A named backing service, resolved once at startup and injected.
#[derive(Debug, Clone)]
pub struct DownstreamDescriptor {
    name: String,
    base_url: String,
}

impl DownstreamDescriptor {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> crate::Result<Self> {
        let base_url = base_url.into();
        Url::parse(&base_url).map_err(|e| {
            crate::Error::internal(format!("invalid base url '{base_url}': {e}"))
        })?;
        Ok(Self {
            name: name.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// The seam between orchestrators and the wire.
///
/// Production code uses [`DownstreamClient`]; tests substitute spies to prove
/// that short-circuited paths never touch the network.
#[async_trait]
pub trait DownstreamApi: Send + Sync {
    fn descriptor(&self) -> &DownstreamDescriptor;

    /// Performs exactly one network attempt for `operation`.
    async fn call(
        &self,
        operation: Operation,
        subject: Option<&str>,
    ) -> Result<serde_json::Value, TransportError>;
}
