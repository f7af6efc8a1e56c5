//! # console-client: data access and navigation for an admin console
//!
//! This crate is the client-side core of a backend-as-a-service admin
//! console. Every screen of the console reads and writes through it.
//!
//! ## Overview
//!
//! The crate is composed of four pieces:
//!
//! 1. **API client** - One `call` entry point that returns typed data or a classified error
//! 2. **Transports** - A simulated in-memory backend and a real HTTP backend, chosen by mode
//! 3. **Router** - Fragment-based routes (`#/path?key=value`) kept in sync with a location
//! 4. **App state** - The persisted `TEST`/`PROD` mode switch
//!
//! ## Key Features
//!
//! - **Uniform envelopes**: every response, success or failure, is `{ data, error, status }`
//! - **Loop guard**: a request storm fails fast instead of hammering the backend
//! - **Auth hook**: 401/403 go to `on_unauthorized`, everything else to `on_error`
//! - **Mode switching**: the transport is replaced whole, the simulated data survives
//! - **Cancellation**: superseded calls can be abandoned
//! - **Error kinds**:
//!   - `Unauthorized` - 401 or 403
//!   - `Storm` - loop guard tripped, synthetic 500
//!   - `Network` - no response obtained, synthetic 500
//!   - `Application` - any other failed envelope
//!   - `Decode` - `data` did not match the requested type
//!   - `Cancelled` - abandoned by the caller
//!
//! ## Client Usage
//!
//! ```ignore
//! use console_client::{ApiClient, AppMode, ErrorKind};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = ApiClient::builder(token)
//!         .mode(AppMode::Prod)
//!         .base_address("https://api.example.com")
//!         .on_unauthorized(|| println!("session expired"))
//!         .build();
//!
//!     match client.list_tables().await {
//!         Ok(tables) => println!("{} tables", tables.len()),
//!         Err(e) if e.kind == ErrorKind::Unauthorized => println!("log in again"),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! ## Navigation
//!
//! ```ignore
//! use console_client::router::{MemoryLocation, Router, RouteParams};
//! use futures::StreamExt;
//!
//! let router = Router::new(Arc::new(MemoryLocation::new("#/tables")));
//! let mut routes = router.subscribe();
//!
//! let mut params = RouteParams::new();
//! params.insert("table".into(), "users".into());
//! router.navigate("/records", Some(&params));
//!
//! while let Some(route) = routes.next().await {
//!     println!("now at {} {:?}", route.path, route.params);
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`client`] - `ApiClient`, loop guard, cancellation and typed helpers
//! - [`transport`] - `Transport` trait with simulated and real strategies
//! - [`protocol`] - Envelope parsing, endpoints and header helpers
//! - [`router`] - Route codec, location seam and `Router`
//! - [`state`] - `AppState` and its storage backends
//! - [`types`] - Payload types
//! - [`error`] - Error types

pub mod client;
pub mod error;
pub mod protocol;
pub mod router;
pub mod state;
pub mod transport;
pub mod types;

pub use client::{ApiClient, CancelToken, ClientConfig, Severity};
pub use error::{ApiError, ErrorKind, Result};
pub use protocol::ResponseEnvelope;
pub use router::{ParsedRoute, Router};
pub use state::AppState;
pub use types::{Admin, AppMode, AppSettings, LogEntry, TableMetadata};
