//! Interchangeable transport strategies.
//!
//! A [`Transport`] turns an [`ApiRequest`] into a [`ResponseEnvelope`]. The
//! client picks one per call based on its [`AppMode`](crate::AppMode):
//!
//! ```text
//! AppMode::Test ──▶ SimulatedTransport ──▶ SimulatedStore (in memory)
//! AppMode::Prod ──▶ RealTransport      ──▶ reqwest ──▶ base_address + endpoint
//! ```
//!
//! Both strategies answer the same endpoints with equivalent envelopes, so
//! callers cannot tell which one is active.
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Transport`] | Async strategy trait |
//! | [`RequestOptions`] | Method, body and extra headers for a call |
//! | [`SimulatedTransport`] | In-memory backend with latency and failure injection |
//! | [`SimulatedStore`] | Shared collections behind the simulated backend |
//! | [`RealTransport`] | HTTP backend |

mod real;
mod simulated;
mod store;

pub use real::RealTransport;
pub use simulated::SimulatedTransport;
pub use store::{Collection, SimulatedStore};

use crate::error::TransportError;
use crate::protocol::ResponseEnvelope;
use async_trait::async_trait;
use http::Method;
use serde_json::Value;
use std::collections::BTreeMap;

/// Per-call request options.
///
/// # Examples
///
/// ```
/// use console_client::transport::RequestOptions;
/// use serde_json::json;
///
/// let options = RequestOptions::patch(json!({"name": "orders"}))
///     .with_header("X-Request-Source", "schema-editor");
/// assert_eq!(options.method, http::Method::PATCH);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// HTTP method, `GET` by default
    pub method: Method,
    /// JSON body
    pub body: Option<Value>,
    /// Extra headers sent alongside the defaults
    pub headers: BTreeMap<String, String>,
}

impl RequestOptions {
    /// `GET` with no body.
    pub fn get() -> Self {
        Self::default()
    }

    /// `POST` with a JSON body.
    pub fn post(body: Value) -> Self {
        RequestOptions {
            method: Method::POST,
            body: Some(body),
            ..Default::default()
        }
    }

    /// `PATCH` with a JSON body.
    pub fn patch(body: Value) -> Self {
        RequestOptions {
            method: Method::PATCH,
            body: Some(body),
            ..Default::default()
        }
    }

    /// `DELETE` with no body.
    pub fn delete() -> Self {
        RequestOptions {
            method: Method::DELETE,
            ..Default::default()
        }
    }

    /// Add an extra header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// A fully resolved request handed to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Endpoint path, optionally with a query string
    pub endpoint: String,
    /// Caller options
    pub options: RequestOptions,
    /// Bearer credential, empty when unauthenticated
    pub token: String,
}

impl ApiRequest {
    /// Build a request.
    pub fn new(endpoint: impl Into<String>, options: RequestOptions, token: impl Into<String>) -> Self {
        ApiRequest {
            endpoint: endpoint.into(),
            options,
            token: token.into(),
        }
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.options.method
    }
}

/// A strategy that produces a [`ResponseEnvelope`] for a request.
///
/// Implementations return `Err` only when no response was obtained at all;
/// every answer from the backend, including failures, is an envelope.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute the request.
    async fn send(&self, request: &ApiRequest) -> Result<ResponseEnvelope, TransportError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
