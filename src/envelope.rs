//! Response envelope and canonical error wire types.
//!
//! Every tier returns the same JSON shape: a success flag, a timestamp, a
//! payload-or-null, and a list of structured errors. The two sides are
//! mutually exclusive — `success == true` iff `data` is present and `errors`
//! is empty. Callers always receive a well-formed envelope, never raw text.
//!
//! Canonical errors are recursive: when one tier classifies the error body of
//! another, the upstream error is retained as `cause` instead of being
//! re-parsed out of a stringified body later.

use crate::error_code::CanonicalCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One invalid field paired with its message, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    /// The rejected input value, when it is safe and useful to echo back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected: Option<String>,
    pub message: String,
}

/// The single internal error representation all failure sources are
/// normalized into before crossing a service boundary.
///
/// Immutable once constructed: created at the point of classification,
/// consumed by the envelope builder, never mutated afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalError {
    pub code: CanonicalCode,
    pub message: String,
    /// The subject identifier the failing operation was about, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
    /// Raw contextual metadata (upstream status, raw body excerpts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_details: Option<serde_json::Map<String, serde_json::Value>>,
    /// The prior hop's error, preserved verbatim when this error was produced
    /// by re-classifying a nested envelope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<CanonicalError>>,
}

impl CanonicalError {
    pub fn new(code: CanonicalCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            subject: None,
            field_errors: Vec::new(),
            raw_details: None,
            cause: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_field_errors(mut self, field_errors: Vec<FieldError>) -> Self {
        self.field_errors = field_errors;
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.raw_details
            .get_or_insert_with(serde_json::Map::new)
            .insert(key.into(), value);
        self
    }

    pub fn with_cause(mut self, cause: CanonicalError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Walks the `cause` chain to the originating error.
    pub fn root_cause(&self) -> &CanonicalError {
        let mut current = self;
        while let Some(cause) = current.cause.as_deref() {
            current = cause;
        }
        current
    }
}

/// The uniform success/error wrapper returned to every caller.
///
/// Created once per inbound request, never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ResponseEnvelope<T> {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<CanonicalError>,
}

impl<T> ResponseEnvelope<T> {
    /// Wraps a successful payload: `success = true`, no errors.
    pub fn success(payload: T) -> Self {
        Self {
            success: true,
            timestamp: Utc::now(),
            data: Some(payload),
            errors: Vec::new(),
        }
    }

    /// Wraps classified errors: `success = false`, no payload.
    ///
    /// `errors` must be non-empty; an error envelope with nothing in it would
    /// violate the mutual-exclusion invariant.
    pub fn failure(errors: Vec<CanonicalError>) -> Self {
        debug_assert!(!errors.is_empty(), "error envelope requires at least one error");
        Self {
            success: false,
            timestamp: Utc::now(),
            data: None,
            errors,
        }
    }

    /// Single-error convenience for the common one-failure-per-call case.
    pub fn failure_one(error: CanonicalError) -> Self {
        Self::failure(vec![error])
    }

    /// The HTTP status this envelope projects to at a service boundary:
    /// 200 on success, otherwise the first error's canonical status.
    pub fn http_status(&self) -> u16 {
        match self.errors.first() {
            None => 200,
            Some(err) => err.code.http_status(),
        }
    }

    /// Checks the envelope invariant: `success ⇔ data present ⇔ errors empty`.
    pub fn is_well_formed(&self) -> bool {
        if self.success {
            self.data.is_some() && self.errors.is_empty()
        } else {
            self.data.is_none() && !self.errors.is_empty()
        }
    }
}
