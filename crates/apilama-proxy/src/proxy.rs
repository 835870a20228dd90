//! RemoteProxyAdapter - CapabilityAdapter that forwards to a remote backend

use std::time::Duration;

use apilama_core::envelope::payload_from_remote;
use apilama_core::{
    AdapterError, ArgumentSource, Arguments, AvailabilityState, BackendDescriptor,
    CapabilityAdapter, HttpMethod, Operation, OperationOutcome, DEFAULT_COMMAND_TIMEOUT,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::ProxyError;

/// Health-check timeout, kept short so probes fail fast
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Extra time granted on top of the command timeout so the backend can
/// report its own timeout before ours fires.
const COMMAND_TIMEOUT_GRACE: Duration = Duration::from_secs(5);

#[derive(Deserialize)]
struct UpstreamErrorResp {
    #[serde(default)]
    message: String,
    #[serde(default)]
    error: String,
}

/// A `CapabilityAdapter` that serializes each operation into an HTTP
/// request against the capability's endpoint.
///
/// Method and path come from [`Operation::route`]; reads send their
/// arguments as a query string, writes as a JSON body.
pub struct RemoteProxyAdapter {
    capability: String,
    client: Client,
    endpoint: Url,
    operation_timeout: Duration,
    probe_timeout: Duration,
}

impl RemoteProxyAdapter {
    /// Create an adapter for a `remote_http` descriptor
    pub fn new(descriptor: &BackendDescriptor) -> Result<Self, ProxyError> {
        let endpoint = descriptor
            .endpoint()
            .cloned()
            .ok_or_else(|| ProxyError::NotRemote(descriptor.name().to_string()))?;

        // No client-wide timeout: probes and operations each set their own.
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;

        Ok(Self {
            capability: descriptor.name().to_string(),
            client,
            endpoint,
            operation_timeout: descriptor.operation_timeout(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        })
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build a full URL for `path` on the backend.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.as_str().trim_end_matches('/'), path)
    }

    /// Per-call timeout. Commands may ask for more time than the default.
    fn timeout_for(&self, operation: Operation, arguments: &Arguments) -> Duration {
        if operation != Operation::ExecuteCommand {
            return self.operation_timeout;
        }

        let requested = match arguments.get("timeout_ms") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        let command = requested
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_COMMAND_TIMEOUT);
        (command + COMMAND_TIMEOUT_GRACE).max(self.operation_timeout)
    }

    fn request(&self, operation: Operation, arguments: &Arguments) -> RequestBuilder {
        let route = operation.route();
        let url = self.url(route.path);

        let builder = match route.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        let builder = match route.arguments {
            ArgumentSource::Query => builder.query(&query_pairs(arguments)),
            ArgumentSource::JsonBody => builder.json(arguments),
        };

        builder.timeout(self.timeout_for(operation, arguments))
    }

    /// Map a transport failure. The backend was never heard from.
    fn map_send_error(&self, e: reqwest::Error) -> AdapterError {
        let reason = if e.is_timeout() {
            "request timed out".to_string()
        } else if e.is_connect() {
            format!("connection failed: {}", e)
        } else {
            e.to_string()
        };
        AdapterError::Unavailable(format!(
            "Capability '{}' at {}: {}",
            self.capability, self.endpoint, reason
        ))
    }

    /// Map an HTTP error response to AdapterError.
    async fn map_response_error(response: Response) -> AdapterError {
        let status = response.status().as_u16();
        let message = match response.json::<UpstreamErrorResp>().await {
            Ok(err) if !err.message.is_empty() => err.message,
            Ok(err) if !err.error.is_empty() => err.error,
            _ => format!("HTTP {}", status),
        };
        match status {
            404 => AdapterError::NotFound(message),
            400..=499 => AdapterError::InvalidInput(message),
            _ => AdapterError::upstream(Some(status), message),
        }
    }
}

/// Flatten arguments into query pairs. Strings are sent verbatim, other
/// scalars in their JSON form; nulls are dropped.
fn query_pairs(arguments: &Arguments) -> Vec<(String, String)> {
    arguments
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), value))
        })
        .collect()
}

#[async_trait]
impl CapabilityAdapter for RemoteProxyAdapter {
    fn capability(&self) -> &str {
        &self.capability
    }

    async fn probe(&self) -> AvailabilityState {
        let url = self.url("/health");
        let result = self
            .client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => AvailabilityState::Available,
            Ok(response) => {
                tracing::debug!(
                    capability = %self.capability,
                    url = %url,
                    status = response.status().as_u16(),
                    "Health probe rejected"
                );
                AvailabilityState::Unavailable
            }
            Err(e) => {
                tracing::debug!(
                    capability = %self.capability,
                    url = %url,
                    error = %e,
                    "Health probe failed"
                );
                AvailabilityState::Unavailable
            }
        }
    }

    async fn execute(&self, operation: Operation, arguments: &Arguments) -> OperationOutcome {
        tracing::debug!(
            capability = %self.capability,
            operation = %operation,
            endpoint = %self.endpoint,
            "Proxy: forwarding operation"
        );

        let response = self
            .request(operation, arguments)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::map_response_error(response).await);
        }

        let body: Value = response.json().await.map_err(|e| {
            AdapterError::upstream(
                Some(status.as_u16()),
                format!("Failed to parse backend response: {}", e),
            )
        })?;

        payload_from_remote(body)
    }
}
