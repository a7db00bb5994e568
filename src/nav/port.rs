use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

use crate::nav::location::Location;

/// The navigation manager's view of the address bar and history stack.
pub trait NavigationPort: Send {
    fn read(&self) -> Location;

    /// Mirror `location` into the address bar. With `push_history` a new
    /// entry is pushed (skipped when the URL would not change), otherwise
    /// the current entry is replaced.
    fn write(&mut self, location: &Location, push_history: bool);

    /// Back/forward events; each carries the location now shown.
    fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Location>;
}

struct HistoryInner {
    entries: Vec<String>,
    cursor: usize,
    listeners: Vec<mpsc::UnboundedSender<Location>>,
}

impl HistoryInner {
    fn current(&self) -> &str {
        &self.entries[self.cursor]
    }

    fn notify(&mut self) {
        let location = Location::parse(self.current());
        self.listeners.retain(|tx| tx.send(location.clone()).is_ok());
    }
}

/// In-process address bar with a back/forward stack.
///
/// Clones share the same history, so the host can drive back/forward while
/// the navigation manager owns its own handle.
#[derive(Clone)]
pub struct MemoryHistory {
    inner: Arc<Mutex<HistoryInner>>,
}

impl MemoryHistory {
    pub fn new(initial: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HistoryInner {
                entries: vec![initial.to_string()],
                cursor: 0,
                listeners: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HistoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current query string.
    pub fn current(&self) -> String {
        self.lock().current().to_string()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn can_go_back(&self) -> bool {
        self.lock().cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        let inner = self.lock();
        inner.cursor + 1 < inner.entries.len()
    }

    pub fn back(&self) -> bool {
        let mut inner = self.lock();
        if inner.cursor == 0 {
            return false;
        }
        inner.cursor -= 1;
        inner.notify();
        true
    }

    pub fn forward(&self) -> bool {
        let mut inner = self.lock();
        if inner.cursor + 1 >= inner.entries.len() {
            return false;
        }
        inner.cursor += 1;
        inner.notify();
        true
    }
}

impl NavigationPort for MemoryHistory {
    fn read(&self) -> Location {
        Location::parse(self.lock().current())
    }

    fn write(&mut self, location: &Location, push_history: bool) {
        let mut inner = self.lock();
        let url = location.to_query_string(inner.current());

        if url == inner.current() {
            return;
        }

        if push_history {
            let keep = inner.cursor + 1;
            inner.entries.truncate(keep);
            inner.entries.push(url);
            inner.cursor += 1;
        } else {
            let cursor = inner.cursor;
            inner.entries[cursor] = url;
        }
    }

    fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Location> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().listeners.push(tx);
        rx
    }
}
