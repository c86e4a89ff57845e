//! End-to-end governed-call behavior against a mock downstream: retry
//! budgets, no-retry classes, circuit short-circuiting, and local
//! validation that never reaches the wire.

use product_aggregator::{
    Backoff, CanonicalCode, CircuitBreaker, CircuitBreakerConfig, DownstreamClient,
    DownstreamDescriptor, Governor, Orchestrator, RetryPolicy,
};
use std::sync::Arc;
use std::time::Duration;

fn orchestrator(
    base_url: &str,
    breaker_cfg: CircuitBreakerConfig,
    retry: Option<RetryPolicy>,
) -> Orchestrator {
    let descriptor = DownstreamDescriptor::new("catalog", base_url).unwrap();
    let client = DownstreamClient::new(descriptor, Duration::from_secs(2)).unwrap();
    let breaker = Arc::new(CircuitBreaker::new("catalog", breaker_cfg));
    Orchestrator::new(Arc::new(client), Governor::new(breaker, retry))
}

fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(
        "catalog-retry",
        max_attempts,
        Backoff::Constant(Duration::from_millis(1)),
    )
}

#[tokio::test]
async fn successful_fetch_returns_a_well_formed_envelope() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/sku-7")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"productId":"sku-7","productDisplayName":"Widget","price":199.99}"#)
        .create_async()
        .await;

    let orchestrator = orchestrator(&server.url(), CircuitBreakerConfig::new(), None);
    let envelope = orchestrator.fetch_one("sku-7").await;

    mock.assert_async().await;
    assert!(envelope.success);
    assert!(envelope.is_well_formed());
    assert_eq!(envelope.http_status(), 200);
    let product = envelope.data.unwrap();
    assert_eq!(product.product_id, "sku-7");
    assert_eq!(product.price, Some(199.99));
}

#[tokio::test]
async fn repeated_503_exhausts_the_retry_budget() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/sku-1")
        .with_status(503)
        .with_body("downstream down")
        .expect(3)
        .create_async()
        .await;

    let orchestrator = orchestrator(
        &server.url(),
        CircuitBreakerConfig::new().with_window_size(100),
        Some(fast_retry(3)),
    );
    let envelope = orchestrator.fetch_one("sku-1").await;

    // Every attempt of the budget was spent, none beyond it.
    mock.assert_async().await;
    assert!(!envelope.success);
    assert!(envelope.is_well_formed());
    assert_eq!(envelope.errors[0].code, CanonicalCode::DownstreamUnavailable);
    assert_eq!(envelope.http_status(), 503);
}

#[tokio::test]
async fn not_found_is_never_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/missing")
        .with_status(404)
        .with_body("no such product")
        .expect(1)
        .create_async()
        .await;

    let orchestrator = orchestrator(
        &server.url(),
        CircuitBreakerConfig::new().with_window_size(100),
        Some(fast_retry(3)),
    );
    let envelope = orchestrator.fetch_one("missing").await;

    mock.assert_async().await;
    assert!(!envelope.success);
    assert_eq!(envelope.errors[0].code, CanonicalCode::NotFound);
    assert_eq!(envelope.http_status(), 404);
}

#[tokio::test]
async fn open_circuit_short_circuits_without_touching_the_network() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/sku-1")
        .with_status(503)
        .with_body("downstream down")
        .expect(2)
        .create_async()
        .await;

    // A two-slot window at 50% opens after the second recorded failure.
    let cfg = CircuitBreakerConfig::new()
        .with_window_size(2)
        .with_failure_rate_threshold(50.0)
        .with_cooldown(Duration::from_secs(60));
    let orchestrator = orchestrator(&server.url(), cfg, None);

    for _ in 0..2 {
        let envelope = orchestrator.fetch_one("sku-1").await;
        assert!(!envelope.success);
    }

    let envelope = orchestrator.fetch_one("sku-1").await;
    assert!(!envelope.success);
    assert_eq!(envelope.errors[0].code, CanonicalCode::DownstreamUnavailable);
    assert!(envelope.errors[0].message.contains("circuit"));

    // Only the two window-filling calls hit the server.
    mock.assert_async().await;
}

#[tokio::test]
async fn blank_identifier_is_rejected_before_any_downstream_call() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let orchestrator = orchestrator(&server.url(), CircuitBreakerConfig::new(), Some(fast_retry(3)));

    for id in ["", "   ", "\t"] {
        let envelope = orchestrator.fetch_one(id).await;
        assert!(!envelope.success);
        assert_eq!(envelope.errors[0].code, CanonicalCode::ValidationError);
        assert_eq!(envelope.http_status(), 400);
        assert_eq!(envelope.errors[0].field_errors[0].field, "id");

        let envelope = orchestrator.fetch_price(id).await;
        assert_eq!(envelope.errors[0].code, CanonicalCode::ValidationError);
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn price_path_targets_the_price_resource() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/sku-3/price")
        .with_status(200)
        .with_body("849.99")
        .create_async()
        .await;

    let orchestrator = orchestrator(&server.url(), CircuitBreakerConfig::new(), None);
    let envelope = orchestrator.fetch_price("sku-3").await;

    mock.assert_async().await;
    assert!(envelope.success);
    assert_eq!(envelope.data, Some(849.99));
}
