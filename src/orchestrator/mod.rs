//! Per-request composition: validate, run one governed call, envelope the result.
//!
//! One orchestrator serves one downstream tier. Each inbound request maps to a
//! single governed call (no fan-out); the orchestrator validates the subject
//! identifier locally *before* touching the resilience layer, classifies any
//! failure exactly once, and always hands back a well-formed
//! [`ResponseEnvelope`].

use crate::classify::{classify, CallContext};
use crate::envelope::ResponseEnvelope;
use crate::error::Error;
use crate::resilience::governor::Governor;
use crate::transport::{DownstreamApi, Operation, TransportError};
use crate::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::info;

/// The product shape this tier exposes and expects from its downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

pub struct Orchestrator {
    downstream: Arc<dyn DownstreamApi>,
    governor: Governor,
}

impl Orchestrator {
    pub fn new(downstream: Arc<dyn DownstreamApi>, governor: Governor) -> Self {
        Self {
            downstream,
            governor,
        }
    }

    pub async fn fetch_one(&self, id: &str) -> ResponseEnvelope<ProductDto> {
        self.fetch_one_until(id, None).await
    }

    pub async fn fetch_one_until(
        &self,
        id: &str,
        deadline: Option<Instant>,
    ) -> ResponseEnvelope<ProductDto> {
        info!(id, "fetching product");
        self.run(Operation::FetchOne, Some(id), deadline).await
    }

    pub async fn fetch_all(&self) -> ResponseEnvelope<Vec<ProductDto>> {
        self.fetch_all_until(None).await
    }

    pub async fn fetch_all_until(
        &self,
        deadline: Option<Instant>,
    ) -> ResponseEnvelope<Vec<ProductDto>> {
        info!("fetching all products");
        let envelope: ResponseEnvelope<Vec<ProductDto>> =
            self.run(Operation::FetchAll, None, deadline).await;

        // An empty collection is a data-readiness failure, not a success.
        if envelope.data.as_ref().is_some_and(|p| p.is_empty()) {
            let ctx = CallContext::for_operation(Operation::FetchAll, None);
            return ResponseEnvelope::failure_one(classify(
                &ctx,
                &Error::DataUnavailable {
                    detail: "downstream returned an empty product collection".to_string(),
                },
            ));
        }
        envelope
    }

    pub async fn fetch_price(&self, id: &str) -> ResponseEnvelope<f64> {
        self.fetch_price_until(id, None).await
    }

    pub async fn fetch_price_until(
        &self,
        id: &str,
        deadline: Option<Instant>,
    ) -> ResponseEnvelope<f64> {
        info!(id, "fetching product price");
        self.run(Operation::FetchPrice, Some(id), deadline).await
    }

    /// One governed call end to end: validate → guard → extract → envelope.
    async fn run<T: DeserializeOwned>(
        &self,
        operation: Operation,
        subject: Option<&str>,
        deadline: Option<Instant>,
    ) -> ResponseEnvelope<T> {
        let ctx = CallContext::for_operation(operation, subject);

        // Local validation never touches the network or the circuit.
        if let Err(err) = validate_subject(operation, subject) {
            return ResponseEnvelope::failure_one(classify(&ctx, &err));
        }

        let outcome = self
            .governor
            .guard_until(operation.name(), deadline, || {
                let downstream = Arc::clone(&self.downstream);
                async move {
                    let value = downstream.call(operation, subject).await?;
                    Ok::<_, Error>(value)
                }
            })
            .await;

        match outcome.and_then(extract_payload::<T>) {
            Ok(payload) => ResponseEnvelope::success(payload),
            Err(err) => ResponseEnvelope::failure_one(classify(&ctx, &err)),
        }
    }
}

fn validate_subject(operation: Operation, subject: Option<&str>) -> Result<()> {
    if !operation.requires_subject() {
        return Ok(());
    }
    match subject {
        Some(id) if !id.trim().is_empty() => Ok(()),
        other => Err(Error::validation_field(
            "id",
            other.unwrap_or_default(),
            "must not be blank",
        )),
    }
}

/// Pulls the payload out of a successful downstream body.
///
/// Downstreams of this system answer with the standard envelope; bare
/// payloads are accepted too so the innermost tier can face plain sources.
fn extract_payload<T: DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    let is_envelope = value
        .as_object()
        .map(|obj| obj.contains_key("success"))
        .unwrap_or(false);

    if is_envelope {
        let raw = value.to_string();
        let envelope: ResponseEnvelope<T> =
            serde_json::from_value(value).map_err(|e| decode_failure(e, &raw))?;
        if !envelope.success {
            // A 2xx status carrying an error envelope breaks the downstream's
            // own contract.
            return Err(Error::internal(
                "downstream returned an error envelope with a success status",
            ));
        }
        return envelope
            .data
            .ok_or_else(|| Error::internal("downstream success envelope carried no data"));
    }

    let raw = value.to_string();
    serde_json::from_value(value).map_err(|e| decode_failure(e, &raw))
}

fn decode_failure(e: serde_json::Error, raw: &str) -> Error {
    Error::Transport(TransportError::Decode {
        message: e.to_string(),
        raw: raw.to_string(),
    })
}
