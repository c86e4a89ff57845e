//! Unified failure type for governed downstream calls.
//!
//! This is the *pre-classification* taxonomy: every way a governed call can
//! fail is a tagged variant here, and the retry decision is an explicit
//! attribute ([`Error::retryable`]) inspected by the resilience governor —
//! not something inferred from exception types at catch sites.
//! [`crate::classify`] maps these variants to canonical wire errors.

use crate::envelope::FieldError;
use crate::transport::TransportError;
use thiserror::Error;

/// Unified error type for governed downstream calls.
#[derive(Debug, Error)]
pub enum Error {
    /// A transport-level failure from a single network attempt.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The named circuit is open; no network call was attempted.
    #[error("circuit breaker '{circuit}' is open")]
    CircuitOpen { circuit: String },

    /// The caller's deadline expired before the governed call completed.
    ///
    /// Distinct from a per-attempt timeout: cancellation is a caller
    /// decision, never a statement about downstream health.
    #[error("call '{operation}' cancelled by caller deadline")]
    Cancelled { operation: String },

    /// Malformed input rejected before any downstream call was made.
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        field_errors: Vec<FieldError>,
    },

    /// A per-item lookup found no matching entity.
    #[error("{subject} not found")]
    NotFound { subject: String },

    /// The backing data source is unloaded or empty.
    #[error("data unavailable: {detail}")]
    DataUnavailable { detail: String },

    /// Anything that could not be classified more precisely.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Whether the resilience governor may schedule another attempt for this
    /// failure.
    ///
    /// Only transient conditions qualify: connection failures, attempt
    /// timeouts, and 5xx downstream statuses. Definitive outcomes (not-found,
    /// validation, 4xx) are never retried — retrying them wastes attempts and
    /// delays the correct error.
    pub fn retryable(&self) -> bool {
        match self {
            Error::Transport(TransportError::Connection { .. }) => true,
            Error::Transport(TransportError::Timeout { .. }) => true,
            Error::Transport(TransportError::Status { status, .. }) => *status >= 500,
            Error::Transport(TransportError::Decode { .. }) => false,
            Error::CircuitOpen { .. }
            | Error::Cancelled { .. }
            | Error::Validation { .. }
            | Error::NotFound { .. }
            | Error::DataUnavailable { .. }
            | Error::Internal { .. } => false,
        }
    }

    /// Shorthand for a single-field validation failure.
    pub fn validation_field(
        field: impl Into<String>,
        rejected: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        Error::Validation {
            message: message.clone(),
            field_errors: vec![FieldError {
                field: field.into(),
                rejected: Some(rejected.into()),
                message,
            }],
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }
}
