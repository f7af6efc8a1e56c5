//! The console API client.
//!
//! # Examples
//!
//! ## Simulated backend
//!
//! ```
//! use console_client::{ApiClient, AppMode, TableMetadata};
//! use console_client::client::ClientConfig;
//! use console_client::transport::RequestOptions;
//!
//! # tokio_test::block_on(async {
//! let client = ApiClient::builder("session-token")
//!     .mode(AppMode::Test)
//!     .config(ClientConfig::instant())
//!     .build();
//!
//! let tables: Vec<TableMetadata> = client.call("/api/v1/tables", RequestOptions::get()).await?;
//! assert_eq!(tables.len(), 3);
//! # Ok::<(), console_client::ApiError>(())
//! # }).unwrap();
//! ```
//!
//! ## Reacting to failures
//!
//! ```ignore
//! use console_client::{ApiClient, ErrorKind};
//!
//! let client = ApiClient::builder(token)
//!     .mode(AppMode::Prod)
//!     .base_address("https://api.example.com")
//!     .on_unauthorized(|| session.clear())
//!     .on_error(|message, severity| toasts.push(severity.as_str(), message))
//!     .build();
//!
//! match client.list_tables().await {
//!     Ok(tables) => render(tables),
//!     Err(e) if e.kind == ErrorKind::Unauthorized => show_login(),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

use super::cancel::CancelToken;
use super::config::ClientConfig;
use super::guard::LoopGuard;
use super::utils::classify_status;
use crate::error::{ApiError, ConfigError, ErrorKind, Result};
use crate::protocol::constants::{LOOP_GUARD_MESSAGE, SYNTHETIC_FAILURE_STATUS};
use crate::protocol::ResponseEnvelope;
use crate::transport::{ApiRequest, RealTransport, RequestOptions, SimulatedStore, SimulatedTransport, Transport};
use crate::types::AppMode;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Severity passed to the error hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A call failed
    Error,
}

impl Severity {
    /// Label used by notification layers (`"error"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
        }
    }
}

/// Hook invoked on 401/403.
pub type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;

/// Hook invoked on every other failure.
pub type ErrorHook = Arc<dyn Fn(&str, Severity) + Send + Sync>;

/// Where a failed envelope came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Service,
    Network,
    Storm,
}

/// Transport configuration swapped as a unit by [`ApiClient::update_mode`].
struct ActiveTransport {
    mode: AppMode,
    base_address: String,
    transport: Arc<dyn Transport>,
}

/// The console API client
///
/// Selects a transport by [`AppMode`], guards against request storms,
/// classifies failures into [`ErrorKind`]s and hands authentication failures
/// to a single hook.
///
/// # Lifecycle
///
/// Rebuild the client when the mode or base address changes, or call
/// [`update_mode`](Self::update_mode) on the one authoritative instance.
/// Either way the transport is replaced whole.
pub struct ApiClient {
    token: String,
    config: Arc<ClientConfig>,
    simulated: Arc<SimulatedTransport>,
    transport_override: Option<Arc<dyn Transport>>,
    active: RwLock<ActiveTransport>,
    guard: LoopGuard,
    on_unauthorized: Option<UnauthorizedHook>,
    on_error: Option<ErrorHook>,
}

impl ApiClient {
    /// Start building a client for a bearer credential.
    pub fn builder(token: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder::new(token)
    }

    /// A `Test`-mode client with default configuration.
    pub fn new(token: impl Into<String>) -> Self {
        ApiClientBuilder::new(token).build()
    }

    /// Perform a call and decode the envelope data into `T`.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::Storm`] when the loop guard trips; no transport runs
    /// - [`ErrorKind::Network`] when the transport got no response
    /// - [`ErrorKind::Unauthorized`] on 401/403, after `on_unauthorized`
    /// - [`ErrorKind::Application`] for any other failed envelope
    /// - [`ErrorKind::Decode`] when `data` does not match `T`
    pub async fn call<T: DeserializeOwned>(&self, endpoint: &str, options: RequestOptions) -> Result<T> {
        let (origin, envelope) = self.exchange(endpoint, options).await;
        self.settle(endpoint, origin, envelope)
    }

    /// Like [`call`](Self::call), abandoning the call once `cancel` fires.
    ///
    /// A cancelled call returns [`ErrorKind::Cancelled`] and invokes no hook.
    pub async fn call_with_cancel<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
        cancel: &CancelToken,
    ) -> Result<T> {
        if cancel.is_cancelled() {
            return Err(ApiError::cancelled());
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(endpoint, "call cancelled");
                Err(ApiError::cancelled())
            }
            result = self.call(endpoint, options) => result,
        }
    }

    /// Switch mode and, optionally, base address in place.
    pub fn update_mode(&self, mode: AppMode, base_address: Option<&str>) {
        let mut active = self.active.write();
        let base_address = base_address
            .map(str::to_string)
            .unwrap_or_else(|| active.base_address.clone());
        let transport = self.select_transport(mode, &base_address);

        tracing::info!(
            from = %active.mode,
            to = %mode,
            %base_address,
            transport = transport.name(),
            "switching client mode"
        );

        *active = ActiveTransport {
            mode,
            base_address,
            transport,
        };
    }

    /// Current mode.
    pub fn mode(&self) -> AppMode {
        self.active.read().mode
    }

    /// Current base address.
    pub fn base_address(&self) -> String {
        self.active.read().base_address.clone()
    }

    /// Name of the transport the next call will use.
    pub fn transport_name(&self) -> &'static str {
        self.active.read().transport.name()
    }

    /// Store behind the simulated transport.
    pub fn simulated_store(&self) -> &SimulatedStore {
        self.simulated.store()
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn select_transport(&self, mode: AppMode, base_address: &str) -> Arc<dyn Transport> {
        if let Some(transport) = &self.transport_override {
            return transport.clone();
        }
        match mode {
            AppMode::Test => self.simulated.clone(),
            AppMode::Prod => Arc::new(RealTransport::new(base_address, &self.config)),
        }
    }

    /// Run the loop guard and the active transport.
    async fn exchange(&self, endpoint: &str, options: RequestOptions) -> (Origin, ResponseEnvelope) {
        if !self.guard.admit() {
            if self.config.enable_logging {
                tracing::warn!(
                    endpoint,
                    outstanding = self.guard.outstanding(),
                    ceiling = self.guard.ceiling(),
                    "loop guard refused call"
                );
            }
            return (
                Origin::Storm,
                ResponseEnvelope::failure(SYNTHETIC_FAILURE_STATUS, LOOP_GUARD_MESSAGE),
            );
        }

        let transport = self.active.read().transport.clone();
        let request = ApiRequest::new(endpoint, options, self.token.clone());

        tracing::debug!(
            method = %request.method(),
            endpoint,
            transport = transport.name(),
            "api call"
        );

        match transport.send(&request).await {
            Ok(envelope) => (Origin::Service, envelope),
            Err(e) => (Origin::Network, ResponseEnvelope::from_transport_error(&e)),
        }
    }

    /// Turn an envelope into the caller's result, firing hooks on failure.
    fn settle<T: DeserializeOwned>(&self, endpoint: &str, origin: Origin, envelope: ResponseEnvelope) -> Result<T> {
        if envelope.is_success() {
            let status = envelope.status;
            return serde_json::from_value(envelope.data).map_err(|e| {
                self.fail(
                    endpoint,
                    ApiError::new(ErrorKind::Decode, status, format!("unexpected response data: {}", e)),
                )
            });
        }

        let kind = match origin {
            Origin::Storm => ErrorKind::Storm,
            Origin::Network => ErrorKind::Network,
            Origin::Service => classify_status(envelope.status),
        };
        let err = ApiError::new(kind, envelope.status, envelope.failure_message());
        Err(self.fail(endpoint, err))
    }

    pub(super) fn fail(&self, endpoint: &str, err: ApiError) -> ApiError {
        if self.config.enable_logging {
            tracing::warn!(
                endpoint,
                kind = %err.kind,
                status = err.status,
                "API call failed: {}",
                err.message
            );
        }

        match err.kind {
            // Unauthorized goes to its own hook only, so a logout flow does
            // not also raise a generic error toast.
            ErrorKind::Unauthorized => {
                if let Some(hook) = &self.on_unauthorized {
                    hook();
                }
            }
            ErrorKind::Cancelled => {}
            _ => {
                if let Some(hook) = &self.on_error {
                    hook(&err.message, Severity::Error);
                }
            }
        }
        err
    }
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    token: String,
    mode: AppMode,
    base_address: String,
    config: ClientConfig,
    store: Option<SimulatedStore>,
    transport: Option<Arc<dyn Transport>>,
    on_unauthorized: Option<UnauthorizedHook>,
    on_error: Option<ErrorHook>,
}

impl ApiClientBuilder {
    fn new(token: impl Into<String>) -> Self {
        ApiClientBuilder {
            token: token.into(),
            mode: AppMode::default(),
            base_address: String::new(),
            config: ClientConfig::default(),
            store: None,
            transport: None,
            on_unauthorized: None,
            on_error: None,
        }
    }

    /// Transport mode, `Test` by default.
    pub fn mode(mut self, mode: AppMode) -> Self {
        self.mode = mode;
        self
    }

    /// Base address for `Prod` mode.
    pub fn base_address(mut self, base_address: impl Into<String>) -> Self {
        self.base_address = base_address.into();
        self
    }

    /// Client configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a simulated store, e.g. across client rebuilds. A seeded store
    /// is created otherwise.
    pub fn store(mut self, store: SimulatedStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Use `transport` regardless of mode.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Hook for 401/403 responses.
    pub fn on_unauthorized(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_unauthorized = Some(Arc::new(hook));
        self
    }

    /// Hook for every other failure.
    pub fn on_error(mut self, hook: impl Fn(&str, Severity) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Build the client, rejecting an invalid configuration.
    pub fn try_build(self) -> std::result::Result<ApiClient, ConfigError> {
        self.config.validate()?;
        Ok(self.assemble())
    }

    /// Build the client.
    ///
    /// An invalid configuration is logged and used as given; see
    /// [`try_build`](Self::try_build) to reject it instead.
    pub fn build(self) -> ApiClient {
        if let Err(e) = self.config.validate() {
            tracing::warn!("building client with invalid config: {}", e);
        }
        self.assemble()
    }

    fn assemble(self) -> ApiClient {
        let store = self.store.unwrap_or_else(SimulatedStore::seeded);
        let simulated = Arc::new(SimulatedTransport::new(store, &self.config));
        let guard = LoopGuard::new(
            self.config.loop_guard_ceiling,
            Duration::from_millis(self.config.loop_guard_window_ms),
        );

        let mut client = ApiClient {
            token: self.token,
            config: Arc::new(self.config),
            simulated: simulated.clone(),
            transport_override: self.transport,
            active: RwLock::new(ActiveTransport {
                mode: self.mode,
                base_address: self.base_address.clone(),
                transport: simulated,
            }),
            guard,
            on_unauthorized: self.on_unauthorized,
            on_error: self.on_error,
        };

        let transport = client.select_transport(self.mode, &self.base_address);
        client.active.get_mut().transport = transport;
        client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    /// Transport answering every request with a fixed envelope.
    struct FixedTransport {
        envelope: ResponseEnvelope,
        calls: AtomicUsize,
    }

    impl FixedTransport {
        fn new(envelope: ResponseEnvelope) -> Arc<Self> {
            Arc::new(FixedTransport {
                envelope,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Transport for FixedTransport {
        async fn send(&self, _request: &ApiRequest) -> std::result::Result<ResponseEnvelope, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.envelope.clone())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl Transport for FailingTransport {
        async fn send(&self, _request: &ApiRequest) -> std::result::Result<ResponseEnvelope, TransportError> {
            Err(TransportError::Network("connection reset".to_string()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct SlowTransport;

    #[async_trait]
    impl Transport for SlowTransport {
        async fn send(&self, _request: &ApiRequest) -> std::result::Result<ResponseEnvelope, TransportError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(ResponseEnvelope::success(200, Value::Null))
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    /// Counters for hook invocations.
    #[derive(Default)]
    struct Hooks {
        unauthorized: AtomicUsize,
        errors: AtomicUsize,
    }

    fn client_with(transport: Arc<dyn Transport>, hooks: &Arc<Hooks>) -> ApiClient {
        let h1 = hooks.clone();
        let h2 = hooks.clone();
        ApiClient::builder("tok")
            .config(ClientConfig::instant())
            .transport(transport)
            .on_unauthorized(move || {
                h1.unauthorized.fetch_add(1, Ordering::SeqCst);
            })
            .on_error(move |_, severity| {
                assert_eq!(severity.as_str(), "error");
                h2.errors.fetch_add(1, Ordering::SeqCst);
            })
            .build()
    }

    #[test]
    fn test_client_creation() {
        let client = ApiClient::new("tok");
        assert_eq!(client.mode(), AppMode::Test);
        assert_eq!(client.transport_name(), "simulated");
        assert_eq!(client.config().loop_guard_ceiling, 100);
    }

    #[tokio::test]
    async fn test_success_returns_data_only() {
        let hooks = Arc::new(Hooks::default());
        let transport = FixedTransport::new(ResponseEnvelope::success(200, json!({"id": "1"})));
        let client = client_with(transport, &hooks);

        let data: Value = assert_ok!(client.call("/api/v1/tables/1", RequestOptions::get()).await);
        assert_eq!(data, json!({"id": "1"}));
        assert_eq!(hooks.errors.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_forbidden_invokes_only_unauthorized_hook() {
        let hooks = Arc::new(Hooks::default());
        let transport = FixedTransport::new(ResponseEnvelope::failure(403, "forbidden"));
        let client = client_with(transport, &hooks);

        let err = assert_err!(client.call::<Value>("/api/v1/admins", RequestOptions::get()).await);
        assert_eq!(err.kind, ErrorKind::Unauthorized);
        assert_eq!(err.status, 403);
        assert_eq!(hooks.unauthorized.load(Ordering::SeqCst), 1);
        assert_eq!(hooks.errors.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unauthorized_without_error_message() {
        let hooks = Arc::new(Hooks::default());
        let transport = FixedTransport::new(ResponseEnvelope {
            data: Value::Null,
            error: String::new(),
            status: 401,
        });
        let client = client_with(transport, &hooks);

        let err = assert_err!(client.call::<Value>("/api/v1/tables", RequestOptions::get()).await);
        assert_eq!(err.kind, ErrorKind::Unauthorized);
        assert_eq!(err.message, "Unauthorized");
    }

    #[tokio::test]
    async fn test_application_error_invokes_error_hook() {
        let hooks = Arc::new(Hooks::default());
        let transport = FixedTransport::new(ResponseEnvelope::failure(422, "name is required"));
        let client = client_with(transport, &hooks);

        let err = assert_err!(client.call::<Value>("/api/v1/tables", RequestOptions::post(json!({}))).await);
        assert_eq!(err.kind, ErrorKind::Application);
        assert_eq!(err.message, "name is required");
        assert_eq!(hooks.errors.load(Ordering::SeqCst), 1);
        assert_eq!(hooks.unauthorized.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_error_text_fails_despite_ok_status() {
        let hooks = Arc::new(Hooks::default());
        let transport = FixedTransport::new(ResponseEnvelope {
            data: json!([]),
            error: "partial outage".to_string(),
            status: 200,
        });
        let client = client_with(transport, &hooks);

        let err = assert_err!(client.call::<Value>("/api/v1/tables", RequestOptions::get()).await);
        assert_eq!(err.kind, ErrorKind::Application);
        assert_eq!(err.status, 200);
    }

    #[tokio::test]
    async fn test_network_failure_is_synthetic_500() {
        let hooks = Arc::new(Hooks::default());
        let client = client_with(Arc::new(FailingTransport), &hooks);

        let err = assert_err!(client.call::<Value>("/api/v1/tables", RequestOptions::get()).await);
        assert_eq!(err.kind, ErrorKind::Network);
        assert_eq!(err.status, 500);
        assert!(err.message.contains("connection reset"));
        assert_eq!(hooks.errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_decode_failure() {
        let hooks = Arc::new(Hooks::default());
        let transport = FixedTransport::new(ResponseEnvelope::success(200, json!("not a list")));
        let client = client_with(transport, &hooks);

        let err = assert_err!(client.call::<Vec<String>>("/api/v1/tables", RequestOptions::get()).await);
        assert_eq!(err.kind, ErrorKind::Decode);
        assert_eq!(hooks.errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_loop_guard_short_circuits_transport() {
        let hooks = Arc::new(Hooks::default());
        let transport = FixedTransport::new(ResponseEnvelope::success(200, Value::Null));
        let client = {
            let h = hooks.clone();
            ApiClient::builder("tok")
                .config(ClientConfig {
                    loop_guard_ceiling: 5,
                    loop_guard_window_ms: 60_000,
                    ..ClientConfig::instant()
                })
                .transport(transport.clone())
                .on_error(move |_, _| {
                    h.errors.fetch_add(1, Ordering::SeqCst);
                })
                .build()
        };

        for _ in 0..5 {
            assert_ok!(client.call::<Value>("/api/v1/tables", RequestOptions::get()).await);
        }
        let err = assert_err!(client.call::<Value>("/api/v1/tables", RequestOptions::get()).await);
        assert_eq!(err.kind, ErrorKind::Storm);
        assert_eq!(err.status, 500);
        assert_eq!(err.message, LOOP_GUARD_MESSAGE);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 5);
        assert_eq!(hooks.errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_call() {
        let hooks = Arc::new(Hooks::default());
        let client = client_with(Arc::new(SlowTransport), &hooks);
        let cancel = CancelToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = assert_err!(
            client
                .call_with_cancel::<Value>("/api/v1/tables", RequestOptions::get(), &cancel)
                .await
        );
        assert_eq!(err.kind, ErrorKind::Cancelled);
        assert_eq!(hooks.errors.load(Ordering::SeqCst), 0);
        assert_eq!(hooks.unauthorized.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_precancelled_call_skips_transport() {
        let hooks = Arc::new(Hooks::default());
        let transport = FixedTransport::new(ResponseEnvelope::success(200, Value::Null));
        let client = client_with(transport.clone(), &hooks);
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = client
            .call_with_cancel::<Value>("/api/v1/tables", RequestOptions::get(), &cancel)
            .await;
        assert_eq!(result.unwrap_err().kind, ErrorKind::Cancelled);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_mode_swaps_transport() {
        let client = ApiClient::builder("tok").config(ClientConfig::instant()).build();
        assert_eq!(client.transport_name(), "simulated");

        client.update_mode(AppMode::Prod, Some("https://api.example.com"));
        assert_eq!(client.mode(), AppMode::Prod);
        assert_eq!(client.base_address(), "https://api.example.com");
        assert_eq!(client.transport_name(), "real");

        client.update_mode(AppMode::Test, None);
        assert_eq!(client.transport_name(), "simulated");
        assert_eq!(client.base_address(), "https://api.example.com");
    }

    #[tokio::test]
    async fn test_simulated_store_survives_mode_round_trip() {
        let client = ApiClient::builder("tok").config(ClientConfig::instant()).build();
        let _: Value = client
            .call("/api/v1/tables", RequestOptions::post(json!({"name": "orders"})))
            .await
            .unwrap();

        client.update_mode(AppMode::Prod, Some("https://api.example.com"));
        client.update_mode(AppMode::Test, None);

        let tables: Vec<Value> = client.call("/api/v1/tables", RequestOptions::get()).await.unwrap();
        assert_eq!(tables.len(), 4);
    }

    #[tokio::test]
    async fn test_try_build_rejects_invalid_config() {
        let config = ClientConfig {
            loop_guard_ceiling: 0,
            ..ClientConfig::instant()
        };
        let err = ApiClient::builder("tok")
            .config(config)
            .try_build()
            .err()
            .expect("zero ceiling accepted");
        assert!(matches!(err, ConfigError::Invalid { field: "loop_guard_ceiling", .. }));

        let client = assert_ok!(ApiClient::builder("tok").config(ClientConfig::instant()).try_build());
        assert_eq!(client.transport_name(), "simulated");
    }
}
