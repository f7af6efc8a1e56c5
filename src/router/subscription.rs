//! Route change streams.
//!
//! # Examples
//!
//! ```ignore
//! use futures::StreamExt;
//!
//! let mut routes = router.subscribe();
//! while let Some(route) = routes.next().await {
//!     render(&route.path, &route.params);
//! }
//! ```

use super::codec::ParsedRoute;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A stream of routes published by a [`Router`](super::Router).
///
/// Yields the current route first, then every later change. Intermediate
/// routes may be skipped when the consumer falls behind; the latest one is
/// always delivered. Ends when the router is dropped.
pub struct RouteStream {
    inner: WatchStream<ParsedRoute>,
}

impl RouteStream {
    pub(crate) fn new(receiver: watch::Receiver<ParsedRoute>) -> Self {
        RouteStream {
            inner: WatchStream::new(receiver),
        }
    }
}

impl Stream for RouteStream {
    type Item = ParsedRoute;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
