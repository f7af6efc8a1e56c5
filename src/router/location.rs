//! The address-bar seam.
//!
//! A [`Location`] exposes the current fragment, accepts new ones and announces
//! every change on a broadcast channel. [`MemoryLocation`] keeps an in-process
//! history stack for tests and headless hosts.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;

/// Why the location changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationEvent {
    /// The fragment was assigned
    HashChange,
    /// History moved back or forward
    PopState,
}

/// A source of the current fragment and of change notifications.
pub trait Location: Send + Sync {
    /// Current fragment including its `#`, or `None` without a browsing
    /// context.
    fn fragment(&self) -> Option<String>;

    /// Push a new fragment. Implementations emit [`NavigationEvent::HashChange`]
    /// when the fragment actually changes.
    fn assign(&self, fragment: &str);

    /// Subscribe to change notifications.
    fn events(&self) -> broadcast::Receiver<NavigationEvent>;
}

struct History {
    entries: Vec<String>,
    cursor: usize,
}

/// In-memory [`Location`] with back/forward history.
pub struct MemoryLocation {
    history: Option<Mutex<History>>,
    events: broadcast::Sender<NavigationEvent>,
    emitted: AtomicUsize,
}

impl MemoryLocation {
    /// Start at `fragment`.
    pub fn new(fragment: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        MemoryLocation {
            history: Some(Mutex::new(History {
                entries: vec![fragment.into()],
                cursor: 0,
            })),
            events,
            emitted: AtomicUsize::new(0),
        }
    }

    /// A location with no browsing context. It reports no fragment and
    /// ignores assignments.
    pub fn detached() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        MemoryLocation {
            history: None,
            events,
            emitted: AtomicUsize::new(0),
        }
    }

    /// Step back in history. Returns false at the start.
    pub fn back(&self) -> bool {
        self.step(|cursor, _| cursor.checked_sub(1))
    }

    /// Step forward in history. Returns false at the end.
    pub fn forward(&self) -> bool {
        self.step(|cursor, len| (cursor + 1 < len).then_some(cursor + 1))
    }

    /// Events emitted so far.
    pub fn event_count(&self) -> usize {
        self.emitted.load(Ordering::SeqCst)
    }

    fn step(&self, next: impl FnOnce(usize, usize) -> Option<usize>) -> bool {
        let Some(history) = &self.history else {
            return false;
        };
        {
            let mut history = history.lock();
            match next(history.cursor, history.entries.len()) {
                Some(cursor) => history.cursor = cursor,
                None => return false,
            }
        }
        self.emit(NavigationEvent::PopState);
        true
    }

    fn emit(&self, event: NavigationEvent) {
        self.emitted.fetch_add(1, Ordering::SeqCst);
        // No receivers is fine.
        let _ = self.events.send(event);
    }
}

impl Default for MemoryLocation {
    fn default() -> Self {
        Self::new("")
    }
}

impl Location for MemoryLocation {
    fn fragment(&self) -> Option<String> {
        let history = self.history.as_ref()?.lock();
        history.entries.get(history.cursor).cloned()
    }

    fn assign(&self, fragment: &str) {
        let Some(history) = &self.history else {
            return;
        };
        {
            let mut history = history.lock();
            if history.entries[history.cursor] == fragment {
                return;
            }
            let cursor = history.cursor;
            history.entries.truncate(cursor + 1);
            history.entries.push(fragment.to_string());
            history.cursor += 1;
        }
        self.emit(NavigationEvent::HashChange);
    }

    fn events(&self) -> broadcast::Receiver<NavigationEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_pushes_history() {
        let location = MemoryLocation::new("#/tables");
        location.assign("#/admins");
        location.assign("#/settings");
        assert_eq!(location.fragment().as_deref(), Some("#/settings"));
        assert_eq!(location.event_count(), 2);

        assert!(location.back());
        assert_eq!(location.fragment().as_deref(), Some("#/admins"));
        assert!(location.forward());
        assert!(!location.forward());
        assert_eq!(location.fragment().as_deref(), Some("#/settings"));
    }

    #[test]
    fn test_assign_same_fragment_is_silent() {
        let location = MemoryLocation::new("#/tables");
        location.assign("#/tables");
        assert_eq!(location.event_count(), 0);
    }

    #[test]
    fn test_assign_after_back_drops_forward_entries() {
        let location = MemoryLocation::new("#/a");
        location.assign("#/b");
        location.back();
        location.assign("#/c");
        assert!(!location.forward());
        assert!(location.back());
        assert_eq!(location.fragment().as_deref(), Some("#/a"));
    }

    #[test]
    fn test_detached() {
        let location = MemoryLocation::detached();
        location.assign("#/admins");
        assert_eq!(location.fragment(), None);
        assert!(!location.back());
        assert_eq!(location.event_count(), 0);
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let location = MemoryLocation::new("");
        let mut events = location.events();
        location.assign("#/logs");
        location.back();
        assert_eq!(events.recv().await.unwrap(), NavigationEvent::HashChange);
        assert_eq!(events.recv().await.unwrap(), NavigationEvent::PopState);
    }
}
