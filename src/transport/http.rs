use super::{DownstreamApi, DownstreamDescriptor, Operation, TransportError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// reqwest-backed downstream client.
///
/// Carries the per-attempt timeout on the built client so every attempt is
/// individually bounded; the cumulative budget of a governed call is the
/// governor's concern.
pub struct DownstreamClient {
    client: reqwest::Client,
    descriptor: DownstreamDescriptor,
}

impl DownstreamClient {
    pub fn new(descriptor: DownstreamDescriptor, attempt_timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(attempt_timeout)
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| crate::Error::internal(format!("failed to build http client: {e}")))?;

        Ok(Self { client, descriptor })
    }

    fn map_send_error(operation: Operation, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                operation: operation.name().to_string(),
            }
        } else {
            // Strip the error chain down to its display form; full transport
            // stack traces must never reach a caller-facing message.
            TransportError::Connection {
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl DownstreamApi for DownstreamClient {
    fn descriptor(&self) -> &DownstreamDescriptor {
        &self.descriptor
    }

    async fn call(
        &self,
        operation: Operation,
        subject: Option<&str>,
    ) -> Result<serde_json::Value, TransportError> {
        let url = format!("{}{}", self.descriptor.base_url(), operation.path(subject));
        let request_id = Uuid::new_v4().to_string();

        debug!(
            downstream = self.descriptor.name(),
            operation = operation.name(),
            subject = subject.unwrap_or(""),
            request_id = request_id.as_str(),
            "issuing downstream call"
        );

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .header("x-request-id", &request_id)
            .send()
            .await
            .map_err(|e| Self::map_send_error(operation, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Self::map_send_error(operation, e))?;

        if !(200..300).contains(&status) {
            return Err(TransportError::Status { status, body });
        }

        serde_json::from_str(&body).map_err(|e| TransportError::Decode {
            message: e.to_string(),
            raw: body,
        })
    }
}
