//! Network transport backed by `reqwest`.

use super::{ApiRequest, Transport};
use crate::client::ClientConfig;
use crate::error::TransportError;
use crate::protocol::constants::headers;
use crate::protocol::{format_bearer, parse_body, ResponseEnvelope};
use async_trait::async_trait;
use std::time::Duration;

/// Transport that issues real HTTP requests against `base_address + endpoint`.
///
/// Every request carries `Content-Type: application/json` and, when a token
/// is set, `Authorization: Bearer <token>`.
#[derive(Clone, Debug)]
pub struct RealTransport {
    client: reqwest::Client,
    base_address: String,
}

impl RealTransport {
    /// Create a transport for `base_address` using the timeouts in `config`.
    pub fn new(base_address: &str, config: &ClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .unwrap_or_default();

        RealTransport {
            client,
            base_address: base_address.trim_end_matches('/').to_string(),
        }
    }

    /// The base address requests are resolved against.
    pub fn base_address(&self) -> &str {
        &self.base_address
    }

    /// Absolute URL for an endpoint.
    pub fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_address, endpoint)
        } else {
            format!("{}/{}", self.base_address, endpoint)
        }
    }
}

#[async_trait]
impl Transport for RealTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ResponseEnvelope, TransportError> {
        let url = self.url_for(&request.endpoint);
        let mut req_builder = self
            .client
            .request(request.method().clone(), &url)
            .header(headers::CONTENT_TYPE, headers::APPLICATION_JSON);

        if !request.token.is_empty() {
            req_builder = req_builder.header(headers::AUTHORIZATION, format_bearer(&request.token));
        }

        for (k, v) in &request.options.headers {
            req_builder = req_builder.header(k.as_str(), v.as_str());
        }

        if let Some(body) = &request.options.body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            req_builder = req_builder.body(bytes);
        }

        let response = req_builder.send().await?;
        let status = response.status().as_u16();

        if status == 204 {
            return Ok(ResponseEnvelope::no_content());
        }

        let body = response.bytes().await?;

        Ok(parse_body(status, &body).unwrap_or_else(|e| {
            tracing::warn!(%url, status, "rejected response body: {}", e);
            e.into_envelope(status)
        }))
    }

    fn name(&self) -> &'static str {
        "real"
    }
}
