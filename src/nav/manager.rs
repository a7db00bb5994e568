//! Navigation state machine over `{prefix, panel_open}`.
//!
//! Every transition returns the listing it needs (if any) instead of running
//! it. The host dispatches the request and feeds the result back through
//! [`NavigationManager::apply_listing`], which enforces that only a response
//! for the current prefix can replace the table.

use tokio::sync::mpsc;

use crate::breadcrumb::{normalize_segment, parent};
use crate::listing::{Hint, ListMode, ListRequest, Listing, ListingRow};
use crate::nav::location::Location;
use crate::nav::port::NavigationPort;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    pub prefix: String,
    pub panel_open: bool,
    /// Set on every prefix change until the matching browse listing lands.
    pub listing_stale: bool,
    pub hints: Vec<Hint>,
}

impl NavigationState {
    /// A non-root prefix without its trailing separator means the terminal
    /// crumb is being renamed.
    pub fn is_editing(&self) -> bool {
        !self.prefix.is_empty() && !self.prefix.ends_with(crate::breadcrumb::SEPARATOR)
    }

    pub fn location(&self) -> Location {
        Location::new(self.prefix.clone(), self.panel_open)
    }
}

pub struct NavigationManager<P: NavigationPort> {
    state: NavigationState,
    table: Option<Vec<ListingRow>>,
    notice: Option<String>,
    port: P,
    pops: mpsc::UnboundedReceiver<Location>,
}

impl<P: NavigationPort> NavigationManager<P> {
    /// Initialise from the address bar. Returns the first listing when the
    /// panel starts open.
    pub fn mount(mut port: P) -> (Self, Option<ListRequest>) {
        let location = port.read();
        let pops = port.subscribe();
        tracing::info!(prefix = %location.prefix, panel_open = location.panel_open, "mount");

        let manager = Self {
            state: NavigationState {
                prefix: location.prefix.clone(),
                panel_open: location.panel_open,
                listing_stale: true,
                hints: Vec::new(),
            },
            table: None,
            notice: None,
            port,
            pops,
        };

        let request = manager.state.panel_open.then(|| manager.refresh());
        (manager, request)
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn prefix(&self) -> &str {
        &self.state.prefix
    }

    /// The table to render; hidden while the listing is stale.
    pub fn table(&self) -> Option<&[ListingRow]> {
        if self.state.listing_stale {
            None
        } else {
            self.table.as_deref()
        }
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn open_panel(&mut self) -> Option<ListRequest> {
        self.state.panel_open = true;
        self.port.write(&self.state.location(), true);
        Some(self.refresh())
    }

    pub fn close_panel(&mut self) {
        self.state.panel_open = false;
        self.port.write(&self.state.location(), true);
    }

    pub fn navigate(&mut self, prefix: &str) -> Option<ListRequest> {
        if prefix == self.state.prefix {
            return None;
        }
        tracing::info!(from = %self.state.prefix, to = %prefix, "navigate");

        self.enter_prefix(prefix);
        self.port.write(&self.state.location(), true);
        Some(self.refresh())
    }

    /// Switch the terminal crumb into rename mode: `prefix` loses its
    /// trailing separator and hints are fetched for `parent`. The table and
    /// the address bar are left alone.
    pub fn begin_edit(&mut self, prefix: &str) -> ListRequest {
        self.state.prefix = prefix.to_string();
        ListRequest::hints(parent(prefix))
    }

    /// Browse listing for the folder on display. While a crumb is being
    /// edited that is the folder the edit started from.
    pub fn refresh(&self) -> ListRequest {
        ListRequest::browse(self.displayed_prefix())
    }

    /// Drain pending back/forward events and reconcile with the address bar.
    pub fn poll_history(&mut self) -> Option<ListRequest> {
        let mut popped = false;
        while self.pops.try_recv().is_ok() {
            popped = true;
        }
        if popped {
            self.on_history_pop()
        } else {
            None
        }
    }

    /// Re-read the address bar after back/forward. Nothing is pushed.
    pub fn on_history_pop(&mut self) -> Option<ListRequest> {
        let location = self.port.read();
        let prefix_changed = location.prefix != self.state.prefix;
        let opened = location.panel_open && !self.state.panel_open;

        if !prefix_changed && location.panel_open == self.state.panel_open {
            return None;
        }
        tracing::info!(prefix = %location.prefix, panel_open = location.panel_open, "history pop");

        if prefix_changed {
            self.enter_prefix(&location.prefix);
        }
        self.state.panel_open = location.panel_open;

        if location.panel_open && (prefix_changed || opened) {
            Some(self.refresh())
        } else {
            None
        }
    }

    /// Apply a listing response. Returns `false` when it was stale and dropped.
    pub fn apply_listing(&mut self, listing: Listing) -> bool {
        match listing.request.mode {
            ListMode::Browse => {
                if listing.request.prefix != self.displayed_prefix() {
                    tracing::debug!(prefix = %listing.request.prefix, "dropping stale listing");
                    return false;
                }
                self.table = Some(listing.rows);
                // The crumb editor keeps its sibling hints
                if !self.state.is_editing() {
                    self.state.hints = listing.hints;
                }
                self.state.listing_stale = false;
            }
            ListMode::Hints => {
                if !self.state.is_editing() || parent(&self.state.prefix) != listing.request.prefix {
                    tracing::debug!(prefix = %listing.request.prefix, "dropping stale hints");
                    return false;
                }
                self.state.hints = listing.hints;
            }
        }
        true
    }

    /// Record a failed listing without touching the navigation state.
    pub fn listing_failed(&mut self, request: &ListRequest, error: &anyhow::Error) {
        tracing::warn!(prefix = %request.prefix, mode = ?request.mode, "listing failed: {:#}", error);
        if request.mode == ListMode::Browse && request.prefix == self.displayed_prefix() {
            self.notice = Some(format!("Listing '{}' failed: {:#}", request.prefix, error));
        }
    }

    /// A delete finished; the current prefix is re-listed either way.
    pub fn delete_finished(&mut self, key: &str, result: anyhow::Result<()>) -> ListRequest {
        if let Err(error) = result {
            tracing::warn!(%key, "delete failed: {:#}", error);
            self.notice = Some(format!("Delete '{}' failed: {:#}", key, error));
        }
        self.refresh()
    }

    fn displayed_prefix(&self) -> String {
        normalize_segment(&self.state.prefix)
    }

    fn enter_prefix(&mut self, prefix: &str) {
        self.state.prefix = prefix.to_string();
        self.state.listing_stale = true;
        self.state.hints.clear();
    }
}
