//! Failure classification: one canonical error per failed governed call.
//!
//! The classifier is the single place heterogeneous failures — transport
//! errors, non-2xx responses, nested error envelopes from downstream tiers,
//! local validation, open circuits — become a [`CanonicalError`]. Rules are
//! ordered; the first match wins. Classification happens exactly once per
//! hop: a tier re-classifying another tier's envelope prefixes its own
//! context and keeps the upstream error as `cause`, never discarding it.

use crate::envelope::{CanonicalError, FieldError, ResponseEnvelope};
use crate::error::Error;
use crate::error_code::CanonicalCode;
use crate::transport::{Operation, TransportError};
use std::collections::HashSet;

/// What the failing call was about, carried into messages and `subject`.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub operation: String,
    pub subject: Option<String>,
}

impl CallContext {
    pub fn new(operation: impl Into<String>, subject: Option<&str>) -> Self {
        Self {
            operation: operation.into(),
            subject: subject.map(str::to_string),
        }
    }

    pub fn for_operation(operation: Operation, subject: Option<&str>) -> Self {
        Self::new(operation.name(), subject)
    }

    fn describe(&self) -> String {
        match &self.subject {
            Some(s) => format!("{} for '{}'", self.operation, s),
            None => self.operation.clone(),
        }
    }

    fn subject_label(&self) -> String {
        self.subject
            .clone()
            .unwrap_or_else(|| self.operation.clone())
    }
}

/// Maps a failed call to exactly one canonical error.
pub fn classify(ctx: &CallContext, failure: &Error) -> CanonicalError {
    match failure {
        Error::Transport(TransportError::Status { status, body }) => {
            classify_status(ctx, *status, body)
        }
        Error::CircuitOpen { circuit } => CanonicalError::new(
            CanonicalCode::DownstreamUnavailable,
            format!(
                "downstream unavailable during {}: circuit '{}' is open",
                ctx.describe(),
                circuit
            ),
        )
        .with_detail("circuit", serde_json::Value::String(circuit.clone()))
        .apply_subject(ctx),
        Error::Transport(TransportError::Timeout { .. }) => CanonicalError::new(
            CanonicalCode::DownstreamUnavailable,
            format!("downstream unavailable during {}: attempt timed out", ctx.describe()),
        )
        .apply_subject(ctx),
        Error::Transport(TransportError::Connection { .. }) => CanonicalError::new(
            CanonicalCode::DownstreamUnavailable,
            format!(
                "downstream unavailable during {}: connection failure",
                ctx.describe()
            ),
        )
        .apply_subject(ctx),
        Error::Validation {
            message,
            field_errors,
        } => CanonicalError::new(CanonicalCode::ValidationError, message.clone())
            .with_field_errors(dedup_first_wins(field_errors))
            .apply_subject(ctx),
        Error::NotFound { subject } => {
            CanonicalError::new(CanonicalCode::NotFound, format!("{subject} not found"))
                .with_subject(subject.clone())
        }
        Error::DataUnavailable { detail } => CanonicalError::new(
            CanonicalCode::DataUnavailable,
            format!("data unavailable: {detail}"),
        ),
        Error::Transport(TransportError::Decode { message, raw }) => CanonicalError::new(
            CanonicalCode::InternalError,
            format!(
                "failed to decode downstream response during {}: {}",
                ctx.describe(),
                message
            ),
        )
        .with_detail("rawBody", serde_json::Value::String(excerpt(raw)))
        .apply_subject(ctx),
        Error::Cancelled { operation } => CanonicalError::new(
            CanonicalCode::InternalError,
            format!("call '{operation}' was cancelled before completion"),
        )
        .apply_subject(ctx),
        Error::Internal { message } => {
            CanonicalError::new(CanonicalCode::InternalError, message.clone()).apply_subject(ctx)
        }
    }
}

/// Non-2xx responses: unwrap a nested envelope when the downstream already
/// classified its failure, otherwise synthesize from the status table.
fn classify_status(ctx: &CallContext, status: u16, body: &str) -> CanonicalError {
    if let Some(upstream) = parse_upstream_error(body) {
        // Re-wrap: preserve the upstream code and field errors, prefix our
        // own context, keep the original as cause.
        return CanonicalError::new(
            upstream.code,
            format!(
                "downstream error during {}: {}",
                ctx.describe(),
                upstream.message
            ),
        )
        .with_field_errors(upstream.field_errors.clone())
        .with_detail("upstreamStatus", serde_json::Value::from(status))
        .with_cause(upstream)
        .apply_subject(ctx);
    }

    let message = match status {
        400 => "bad request to downstream".to_string(),
        404 => format!("{} not found downstream", ctx.subject_label()),
        502 | 503 | 504 => "downstream unavailable".to_string(),
        n => format!("unexpected downstream error (status={n})"),
    };

    CanonicalError::new(CanonicalCode::from_http_status(status), message)
        .with_detail("upstreamStatus", serde_json::Value::from(status))
        .with_detail("rawBody", serde_json::Value::String(excerpt(body)))
        .apply_subject(ctx)
}

/// Tries to read a structured error envelope out of a raw response body.
fn parse_upstream_error(body: &str) -> Option<CanonicalError> {
    let envelope: ResponseEnvelope<serde_json::Value> = serde_json::from_str(body).ok()?;
    if envelope.success {
        return None;
    }
    envelope.errors.into_iter().next()
}

/// One entry per field; when two failures name the same field, the first wins.
fn dedup_first_wins(field_errors: &[FieldError]) -> Vec<FieldError> {
    let mut seen: HashSet<&str> = HashSet::new();
    field_errors
        .iter()
        .filter(|fe| seen.insert(fe.field.as_str()))
        .cloned()
        .collect()
}

fn excerpt(body: &str) -> String {
    const MAX: usize = 256;
    if body.chars().count() <= MAX {
        body.to_string()
    } else {
        body.chars().take(MAX).collect()
    }
}

trait ApplySubject {
    fn apply_subject(self, ctx: &CallContext) -> Self;
}

impl ApplySubject for CanonicalError {
    fn apply_subject(self, ctx: &CallContext) -> Self {
        match &ctx.subject {
            Some(s) if self.subject.is_none() => self.with_subject(s.clone()),
            _ => self,
        }
    }
}
