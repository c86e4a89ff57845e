//! Canonical error codes shared by every tier of the aggregation chain.
//!
//! All failure sources — transport errors, non-2xx downstream responses,
//! malformed payloads, local validation — are normalized into one of these
//! codes before crossing a service boundary. Each code carries its wire
//! string, the HTTP status it projects to, and its default retry semantics.
//!
//! ## Example
//!
//! ```rust
//! use product_aggregator::error_code::CanonicalCode;
//!
//! let code = CanonicalCode::from_http_status(404);
//! assert_eq!(code.as_str(), "NOT_FOUND");
//! assert_eq!(code.http_status(), 404);
//! assert!(!code.retryable());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical error code.
///
/// The five members cover every failure path in the system; there is no
/// catch-all beyond [`CanonicalCode::InternalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalCode {
    /// Malformed input rejected before any downstream call was made.
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError,
    /// A per-item lookup found no matching entity.
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    /// The backing data source is unloaded or empty; distinct from a
    /// per-item lookup miss.
    #[serde(rename = "DATA_UNAVAILABLE")]
    DataUnavailable,
    /// The downstream could not be reached: connection failure, timeout,
    /// gateway errors, or an open circuit.
    #[serde(rename = "DOWNSTREAM_UNAVAILABLE")]
    DownstreamUnavailable,
    /// Anything that could not be classified more precisely.
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl CanonicalCode {
    /// Returns the wire string (e.g. `"NOT_FOUND"`).
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::DataUnavailable => "DATA_UNAVAILABLE",
            Self::DownstreamUnavailable => "DOWNSTREAM_UNAVAILABLE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status this code projects to at a service boundary.
    #[inline]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ValidationError => 400,
            Self::NotFound => 404,
            Self::DownstreamUnavailable => 503,
            Self::DataUnavailable | Self::InternalError => 500,
        }
    }

    /// Returns whether a failure with this code is worth retrying.
    ///
    /// Retries are reserved for transient conditions. A definitive
    /// not-found or validation failure will not change on a second attempt.
    #[inline]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::DownstreamUnavailable)
    }

    /// Maps an HTTP status from a downstream response to the most likely code.
    ///
    /// Statuses without a specific mapping collapse to
    /// [`CanonicalCode::InternalError`]; notably a 400 from a downstream is a
    /// defect of the calling tier (a malformed outbound request), not caller
    /// validation.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            502 | 503 | 504 => Self::DownstreamUnavailable,
            _ => Self::InternalError,
        }
    }
}

impl fmt::Display for CanonicalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_strings_are_stable() {
        assert_eq!(CanonicalCode::ValidationError.as_str(), "VALIDATION_ERROR");
        assert_eq!(CanonicalCode::NotFound.as_str(), "NOT_FOUND");
        assert_eq!(CanonicalCode::DataUnavailable.as_str(), "DATA_UNAVAILABLE");
        assert_eq!(
            CanonicalCode::DownstreamUnavailable.as_str(),
            "DOWNSTREAM_UNAVAILABLE"
        );
        assert_eq!(CanonicalCode::InternalError.as_str(), "INTERNAL_ERROR");
    }

    #[test]
    fn http_status_projection() {
        assert_eq!(CanonicalCode::ValidationError.http_status(), 400);
        assert_eq!(CanonicalCode::NotFound.http_status(), 404);
        assert_eq!(CanonicalCode::DownstreamUnavailable.http_status(), 503);
        assert_eq!(CanonicalCode::DataUnavailable.http_status(), 500);
        assert_eq!(CanonicalCode::InternalError.http_status(), 500);
    }

    #[test]
    fn only_unavailability_is_retryable() {
        assert!(CanonicalCode::DownstreamUnavailable.retryable());
        assert!(!CanonicalCode::ValidationError.retryable());
        assert!(!CanonicalCode::NotFound.retryable());
        assert!(!CanonicalCode::DataUnavailable.retryable());
        assert!(!CanonicalCode::InternalError.retryable());
    }

    #[test]
    fn status_mapping_covers_gateway_errors() {
        assert_eq!(
            CanonicalCode::from_http_status(404),
            CanonicalCode::NotFound
        );
        for s in [502, 503, 504] {
            assert_eq!(
                CanonicalCode::from_http_status(s),
                CanonicalCode::DownstreamUnavailable
            );
        }
        // 400 from a downstream is our malformed request, not caller validation
        assert_eq!(
            CanonicalCode::from_http_status(400),
            CanonicalCode::InternalError
        );
        assert_eq!(
            CanonicalCode::from_http_status(500),
            CanonicalCode::InternalError
        );
    }

    #[test]
    fn serde_round_trip_uses_wire_strings() {
        let json = serde_json::to_string(&CanonicalCode::NotFound).unwrap();
        assert_eq!(json, "\"NOT_FOUND\"");
        let back: CanonicalCode = serde_json::from_str("\"DATA_UNAVAILABLE\"").unwrap();
        assert_eq!(back, CanonicalCode::DataUnavailable);
    }
}
