//! Cross-tier classification: canonical errors must survive re-classification
//! hop by hop, and data-readiness failures must map to the right code.

use async_trait::async_trait;
use product_aggregator::transport::{DownstreamApi, Operation, TransportError};
use product_aggregator::{
    Backoff, CanonicalCode, CircuitBreaker, CircuitBreakerConfig, DownstreamClient,
    DownstreamDescriptor, Governor, Orchestrator, RetryPolicy,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn orchestrator(base_url: &str, retry: Option<RetryPolicy>) -> Orchestrator {
    let descriptor = DownstreamDescriptor::new("catalog", base_url).unwrap();
    let client = DownstreamClient::new(descriptor, Duration::from_secs(2)).unwrap();
    let breaker = Arc::new(CircuitBreaker::new(
        "catalog",
        CircuitBreakerConfig::new().with_window_size(100),
    ));
    Orchestrator::new(Arc::new(client), Governor::new(breaker, retry))
}

/// A downstream that times out on every attempt and counts them.
struct TimingOutDownstream {
    descriptor: DownstreamDescriptor,
    attempts: AtomicU32,
}

#[async_trait]
impl DownstreamApi for TimingOutDownstream {
    fn descriptor(&self) -> &DownstreamDescriptor {
        &self.descriptor
    }

    async fn call(
        &self,
        operation: Operation,
        _subject: Option<&str>,
    ) -> Result<serde_json::Value, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(TransportError::Timeout {
            operation: operation.name().to_string(),
        })
    }
}

#[tokio::test]
async fn not_found_survives_a_second_hop_with_its_cause_attached() {
    // First tier: a downstream that has never heard of sku-9.
    let mut inner = mockito::Server::new_async().await;
    inner
        .mock("GET", "/sku-9")
        .with_status(404)
        .with_body("no such product")
        .create_async()
        .await;

    let first_tier = orchestrator(&inner.url(), None);
    let first_envelope = first_tier.fetch_one("sku-9").await;
    assert_eq!(first_envelope.errors[0].code, CanonicalCode::NotFound);
    assert_eq!(first_envelope.http_status(), 404);

    // Second tier: consumes the first tier's envelope verbatim.
    let body = serde_json::to_string(&first_envelope).unwrap();
    let mut outer = mockito::Server::new_async().await;
    outer
        .mock("GET", "/sku-9")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(&body)
        .create_async()
        .await;

    let second_tier = orchestrator(&outer.url(), None);
    let second_envelope = second_tier.fetch_one("sku-9").await;

    assert!(!second_envelope.success);
    assert!(second_envelope.is_well_formed());
    let err = &second_envelope.errors[0];

    // The canonical code crosses the hop unchanged and still maps to 404.
    assert_eq!(err.code, CanonicalCode::NotFound);
    assert_eq!(second_envelope.http_status(), 404);

    // This hop prefixed its own context and kept the upstream error as cause.
    assert!(err.message.starts_with("downstream error during fetch-one for 'sku-9'"));
    let cause = err.cause.as_deref().unwrap();
    assert_eq!(cause.code, CanonicalCode::NotFound);
    assert_eq!(err.root_cause().code, CanonicalCode::NotFound);
}

#[tokio::test]
async fn validation_details_survive_a_hop() {
    let mut inner = mockito::Server::new_async().await;
    // An upstream tier rejected the request and reported a field error.
    let upstream_body = r#"{
        "success": false,
        "timestamp": "2026-08-29T12:00:00Z",
        "errors": [{
            "code": "VALIDATION_ERROR",
            "message": "Invalid input",
            "fieldErrors": [{"field": "id", "rejected": "!!", "message": "must be alphanumeric"}]
        }]
    }"#;
    inner
        .mock("GET", "/!!")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(upstream_body)
        .create_async()
        .await;

    let tier = orchestrator(&inner.url(), None);
    let envelope = tier.fetch_one("!!").await;

    let err = &envelope.errors[0];
    assert_eq!(err.code, CanonicalCode::ValidationError);
    assert_eq!(envelope.http_status(), 400);
    assert_eq!(err.field_errors.len(), 1);
    assert_eq!(err.field_errors[0].field, "id");
    assert_eq!(err.field_errors[0].message, "must be alphanumeric");
}

#[tokio::test]
async fn empty_collection_classifies_as_data_unavailable() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let tier = orchestrator(&server.url(), None);
    let envelope = tier.fetch_all().await;

    assert!(!envelope.success);
    assert!(envelope.is_well_formed());
    assert_eq!(envelope.errors[0].code, CanonicalCode::DataUnavailable);
    assert_eq!(envelope.http_status(), 500);
}

#[tokio::test]
async fn three_timeouts_spend_three_attempts_and_classify_as_unavailable() {
    let downstream = Arc::new(TimingOutDownstream {
        descriptor: DownstreamDescriptor::new("catalog", "http://localhost:9").unwrap(),
        attempts: AtomicU32::new(0),
    });
    let breaker = Arc::new(CircuitBreaker::new(
        "catalog",
        CircuitBreakerConfig::new().with_window_size(100),
    ));
    let retry = RetryPolicy::new(
        "catalog-retry",
        3,
        Backoff::Constant(Duration::from_millis(1)),
    );
    let tier = Orchestrator::new(
        Arc::clone(&downstream) as Arc<dyn DownstreamApi>,
        Governor::new(breaker, Some(retry)),
    );

    let envelope = tier.fetch_price("sku-1").await;

    assert_eq!(downstream.attempts.load(Ordering::SeqCst), 3);
    assert!(!envelope.success);
    assert_eq!(envelope.errors[0].code, CanonicalCode::DownstreamUnavailable);
    assert_eq!(envelope.http_status(), 503);
}
