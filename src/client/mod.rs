//! Console API client.
//!
//! This module provides the client the console's screens call into. It:
//!
//! - **Selects a transport** from the application mode
//! - **Guards against request storms** with a sliding-window counter
//! - **Classifies failures** and routes them to the right hook
//! - **Cancels superseded calls** on request
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── fetch     - ApiClient, its builder and the call pipeline
//! ├── resources - Typed helpers per endpoint
//! ├── guard     - Loop guard
//! ├── cancel    - Per-call cancellation token
//! ├── config    - Client configuration
//! └── utils     - Status classification
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ApiClient`] | The client |
//! | [`ApiClientBuilder`] | Token, mode, base address and hooks |
//! | [`ClientConfig`] | Timeouts, guard and simulation knobs |
//! | [`CancelToken`] | Abandons in-flight calls |
//! | [`LoopGuard`] | Request-rate circuit breaker |
//!
//! # Examples
//!
//! ## Creating a Client
//!
//! ```
//! use console_client::client::{ApiClient, ClientConfig};
//! use console_client::AppMode;
//!
//! // Simulated backend, default configuration
//! let client = ApiClient::new("session-token");
//! assert_eq!(client.transport_name(), "simulated");
//!
//! // Real backend with a tighter guard
//! let config = ClientConfig {
//!     loop_guard_ceiling: 20,
//!     ..Default::default()
//! };
//! let client = ApiClient::builder("session-token")
//!     .mode(AppMode::Prod)
//!     .base_address("https://api.example.com")
//!     .config(config)
//!     .build();
//! assert_eq!(client.transport_name(), "real");
//! ```
//!
//! ## Typed Calls
//!
//! ```
//! use console_client::client::{ApiClient, ClientConfig, LogQuery};
//! use console_client::types::LogLevel;
//!
//! # tokio_test::block_on(async {
//! let client = ApiClient::builder("session-token")
//!     .config(ClientConfig::instant())
//!     .build();
//!
//! let errors = client
//!     .list_logs(&LogQuery { level: Some(LogLevel::Error), search: None })
//!     .await?;
//! assert!(errors.iter().all(|e| e.level == LogLevel::Error));
//! # Ok::<(), console_client::ApiError>(())
//! # }).unwrap();
//! ```

mod cancel;
mod config;
mod fetch;
mod guard;
mod resources;
mod utils;

pub use cancel::CancelToken;
pub use config::ClientConfig;
pub use fetch::{ApiClient, ApiClientBuilder, ErrorHook, Severity, UnauthorizedHook};
pub use guard::LoopGuard;
pub use resources::LogQuery;
pub use utils::{classify_status, is_access_denied_status};
