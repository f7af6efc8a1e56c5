//! Fragment-based navigation.
//!
//! The [`Router`] keeps the current [`ParsedRoute`] in sync with a
//! [`Location`]. Navigation goes through the location; the router only
//! updates its own state from the events the location emits, so the address
//! bar stays the single source of truth.
//!
//! ```text
//! navigate(path, params) ──▶ codec::build ──▶ Location::assign
//!                                                  │
//!                      HashChange / PopState ◀─────┘
//!                                │
//!                                ▼
//!            codec::parse ──▶ watch channel ──▶ route() / watch() / subscribe()
//! ```
//!
//! # Examples
//!
//! ```
//! use console_client::router::{MemoryLocation, Router};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let router = Router::new(Arc::new(MemoryLocation::new("#/admins")));
//! assert_eq!(router.route().path, "/admins");
//!
//! let mut routes = router.watch();
//! router.navigate("/logs", None);
//! routes.changed().await.unwrap();
//! assert_eq!(routes.borrow().path, "/logs");
//! # });
//! ```

pub mod codec;
mod location;
mod subscription;

pub use codec::{ParsedRoute, RouteParams, DEFAULT_PATH};
pub use location::{Location, MemoryLocation, NavigationEvent};
pub use subscription::RouteStream;

use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// Tracks the route held by a [`Location`].
///
/// Must be created inside a tokio runtime. Dropping the router stops its
/// listener task and ends every [`RouteStream`].
pub struct Router {
    location: Arc<dyn Location>,
    route: watch::Receiver<ParsedRoute>,
    listener: JoinHandle<()>,
}

impl Router {
    /// Read the current location and start listening for changes.
    pub fn new(location: Arc<dyn Location>) -> Self {
        // Subscribe before the first read so no change slips in between.
        let events = location.events();
        let initial = current_route(location.as_ref());
        tracing::debug!(path = %initial.path, "router started");

        let (tx, route) = watch::channel(initial);
        let listener = tokio::spawn(listen(location.clone(), events, tx));

        Router {
            location,
            route,
            listener,
        }
    }

    /// The current route.
    pub fn route(&self) -> ParsedRoute {
        self.route.borrow().clone()
    }

    /// A receiver notified on every route change.
    pub fn watch(&self) -> watch::Receiver<ParsedRoute> {
        self.route.clone()
    }

    /// A stream of routes starting with the current one.
    pub fn subscribe(&self) -> RouteStream {
        RouteStream::new(self.route.clone())
    }

    /// Move to `path` with optional query parameters.
    ///
    /// Does nothing when the location already shows the same fragment.
    /// The new route becomes visible once the location reports the change.
    pub fn navigate(&self, path: &str, params: Option<&RouteParams>) {
        let fragment = codec::build(path, params);
        if self.location.fragment().as_deref() == Some(fragment.as_str()) {
            return;
        }
        tracing::debug!(%fragment, "navigate");
        self.location.assign(&fragment);
    }
}

impl Drop for Router {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

fn current_route(location: &dyn Location) -> ParsedRoute {
    location
        .fragment()
        .map(|fragment| codec::parse(&fragment))
        .unwrap_or_default()
}

async fn listen(
    location: Arc<dyn Location>,
    mut events: broadcast::Receiver<NavigationEvent>,
    tx: watch::Sender<ParsedRoute>,
) {
    loop {
        match events.recv().await {
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                // Only the latest fragment matters.
                tracing::trace!(skipped, "navigation events lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }

        let next = current_route(location.as_ref());
        tx.send_if_modified(|route| {
            if *route == next {
                false
            } else {
                tracing::debug!(path = %next.path, "route changed");
                *route = next;
                true
            }
        });
    }
}
