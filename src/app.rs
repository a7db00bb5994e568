use ratatui::widgets::TableState;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};

use crate::breadcrumb::{self, crumbs};
use crate::config::Settings;
use crate::datasource::{QueryBackend, TransferBackend};
use crate::listing::{ListRequest, Listing, ListingProjector, ListingRow};
use crate::nav::{MemoryHistory, NavigationManager};
use crate::upload::{BatchReport, UploadPipeline, UploadState, UploadTask};

pub enum AppMode {
    Normal,
    EditSegment,  // Renaming the terminal crumb, with hints
    UploadPrompt, // Entering local paths to upload
    ConfirmDelete,
}

/// Results of spawned work, applied on the UI loop.
pub enum BackgroundEvent {
    Listed(Listing),
    ListFailed(ListRequest, anyhow::Error),
    Deleted { key: String, result: anyhow::Result<()> },
    Refresh,
    UploadFinished(BatchReport),
}

pub struct App {
    pub nav: NavigationManager<MemoryHistory>,
    pub history: MemoryHistory,
    pub projector: ListingProjector,
    pub uploads: Arc<Mutex<UploadPipeline>>,
    pub upload_state: watch::Receiver<UploadState>,
    pub title: String,
    pub mode: AppMode,
    pub table_state: TableState,
    pub input: String,
    pub hint_cursor: Option<usize>,
    pub delete_target: Option<ListingRow>,
    pub message: String,
    pub should_quit: bool,
    events_tx: mpsc::UnboundedSender<BackgroundEvent>,
    events_rx: mpsc::UnboundedReceiver<BackgroundEvent>,
}

impl App {
    /// Must run inside a tokio runtime: the initial listing is spawned.
    pub fn new(
        query: Arc<dyn QueryBackend>,
        transfer: Arc<dyn TransferBackend>,
        settings: &Settings,
        location: &str,
        title: String,
    ) -> Self {
        let history = MemoryHistory::new(location);
        let (nav, initial) = NavigationManager::mount(history.clone());

        let pipeline = UploadPipeline::new(Arc::clone(&query), transfer, &settings.bucket)
            .with_credential_lifetime(settings.session_duration());
        let upload_state = pipeline.subscribe();

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let app = Self {
            nav,
            history,
            projector: ListingProjector::new(query),
            uploads: Arc::new(Mutex::new(pipeline)),
            upload_state,
            title,
            mode: AppMode::Normal,
            table_state: TableState::default(),
            input: String::new(),
            hint_cursor: None,
            delete_target: None,
            message: "Press 'o' to open the file explorer".to_string(),
            should_quit: false,
            events_tx,
            events_rx,
        };

        app.dispatch(initial);
        app
    }

    /// Run a listing on a background task.
    pub fn dispatch(&self, request: Option<ListRequest>) {
        let Some(request) = request else {
            return;
        };
        tracing::debug!(prefix = %request.prefix, mode = ?request.mode, "dispatch listing");

        let projector = self.projector.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let event = match projector.list(request.clone()).await {
                Ok(listing) => BackgroundEvent::Listed(listing),
                Err(err) => BackgroundEvent::ListFailed(request, err),
            };
            let _ = tx.send(event);
        });
    }

    /// Apply finished background work and history pops (non-blocking)
    pub fn poll_background(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                BackgroundEvent::Listed(listing) => {
                    if self.nav.apply_listing(listing) {
                        self.clamp_selection();
                    }
                }
                BackgroundEvent::ListFailed(request, err) => {
                    self.nav.listing_failed(&request, &err);
                }
                BackgroundEvent::Deleted { key, result } => {
                    let ok = result.is_ok();
                    let request = self.nav.delete_finished(&key, result);
                    if ok {
                        self.message = format!("Deleted {}", key);
                    }
                    self.dispatch(Some(request));
                }
                BackgroundEvent::Refresh => {
                    let request = self.nav.refresh();
                    self.dispatch(Some(request));
                }
                BackgroundEvent::UploadFinished(report) => {
                    self.message = format!(
                        "Upload finished: {} succeeded, {} failed",
                        report.succeeded(),
                        report.failed()
                    );
                }
            }
        }

        let request = self.nav.poll_history();
        self.dispatch(request);
    }

    pub fn upload_snapshot(&self) -> UploadState {
        self.upload_state.borrow().clone()
    }

    pub fn open_panel(&mut self) {
        let request = self.nav.open_panel();
        self.dispatch(request);
    }

    pub fn close_panel(&mut self) {
        self.nav.close_panel();
        self.mode = AppMode::Normal;
    }

    pub fn refresh(&mut self) {
        self.nav.dismiss_notice();
        let request = self.nav.refresh();
        self.dispatch(Some(request));
    }

    pub fn back(&mut self) {
        if self.history.can_go_back() {
            self.history.back();
        } else {
            self.message = "No earlier location".to_string();
        }
    }

    pub fn forward(&mut self) {
        if self.history.can_go_forward() {
            self.history.forward();
        } else {
            self.message = "No later location".to_string();
        }
    }

    pub fn selected_row(&self) -> Option<&ListingRow> {
        let rows = self.nav.table()?;
        self.table_state.selected().and_then(|i| rows.get(i))
    }

    pub fn select_next(&mut self) {
        let len = self.nav.table().map(|rows| rows.len()).unwrap_or(0);
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        let len = self.nav.table().map(|rows| rows.len()).unwrap_or(0);
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    fn clamp_selection(&mut self) {
        let len = self.nav.table().map(|rows| rows.len()).unwrap_or(0);
        let selected = match (len, self.table_state.selected()) {
            (0, _) => None,
            (len, Some(i)) if i >= len => Some(len - 1),
            (_, None) => Some(0),
            (_, selected) => selected,
        };
        self.table_state.select(selected);
    }

    /// Follow the selected row's folder link.
    pub fn enter_selected(&mut self) {
        let Some(row) = self.selected_row() else {
            self.message = "No entry selected".to_string();
            return;
        };
        let Some(target) = row.link().map(str::to_string) else {
            self.message = format!("'{}' is not a folder", row.entry.display_name);
            return;
        };

        let request = self.nav.navigate(&target);
        self.table_state.select(None);
        self.dispatch(request);
    }

    /// Click the crumb before the terminal one.
    pub fn go_parent(&mut self) {
        let chain = crumbs(self.nav.prefix());
        if chain.len() < 2 {
            self.message = "Already at root".to_string();
            return;
        }
        let value = chain[chain.len() - 2].value.clone();
        let request = breadcrumb::click(&mut self.nav, &value);
        self.dispatch(request);
    }

    /// Click the terminal crumb, switching it into edit mode.
    pub fn edit_terminal_crumb(&mut self) {
        let Some(terminal) = crumbs(self.nav.prefix()).pop() else {
            return;
        };
        if terminal.is_root() {
            self.message = "The root crumb cannot be renamed".to_string();
            return;
        }

        let request = breadcrumb::click(&mut self.nav, &terminal.value);
        self.input = terminal.label;
        self.hint_cursor = None;
        self.mode = AppMode::EditSegment;
        self.dispatch(request);
    }

    /// Cycle the editor input through the current hints.
    pub fn cycle_hint(&mut self) {
        let hints = &self.nav.state().hints;
        if hints.is_empty() {
            return;
        }
        let next = match self.hint_cursor {
            Some(i) if i + 1 < hints.len() => i + 1,
            _ => 0,
        };
        self.input = hints[next].value.clone();
        self.hint_cursor = Some(next);
    }

    pub fn accept_segment(&mut self) {
        let input = std::mem::take(&mut self.input);
        let request = breadcrumb::select_segment(&mut self.nav, &input);
        self.mode = AppMode::Normal;
        self.hint_cursor = None;
        self.table_state.select(None);
        self.dispatch(request);
    }

    /// Leave edit mode by navigating back to the segment being edited.
    pub fn cancel_edit(&mut self) {
        let prefix = breadcrumb::normalize_segment(self.nav.prefix());
        let request = self.nav.navigate(&prefix);
        self.input.clear();
        self.mode = AppMode::Normal;
        self.dispatch(request);
    }

    pub fn begin_delete(&mut self) {
        match self.selected_row() {
            Some(row) if row.delete_request().is_some() => {
                self.delete_target = Some(row.clone());
                self.mode = AppMode::ConfirmDelete;
            }
            Some(row) => {
                self.message = format!("'{}' cannot be deleted", row.entry.display_name);
            }
            None => {
                self.message = "No entry selected".to_string();
            }
        }
    }

    pub fn confirm_delete(&mut self) {
        self.mode = AppMode::Normal;
        let Some(row) = self.delete_target.take() else {
            return;
        };

        let projector = self.projector.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let key = row.entry.key.clone();
            let result = projector.delete(&row).await.map(|_| ());
            let _ = tx.send(BackgroundEvent::Deleted { key, result });
        });
    }

    pub fn begin_upload(&mut self) {
        if self.upload_snapshot().busy {
            self.message = "An upload is already running".to_string();
            return;
        }
        self.input.clear();
        self.mode = AppMode::UploadPrompt;
    }

    /// Start a batch from the `;`-separated paths in the input buffer.
    pub fn start_upload(&mut self) {
        self.mode = AppMode::Normal;
        let tasks: Vec<UploadTask> = std::mem::take(&mut self.input)
            .split(';')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(UploadTask::from_path)
            .collect();

        if tasks.is_empty() {
            self.message = "Nothing to upload".to_string();
            return;
        }

        let prefix = self.nav.prefix().to_string();
        let pipeline = Arc::clone(&self.uploads);
        let tx = self.events_tx.clone();
        self.message = format!("Uploading {} file(s) to '{}'", tasks.len(), prefix);

        tokio::spawn(async move {
            let refresh_tx = tx.clone();
            let report = pipeline
                .lock()
                .await
                .upload_batch(&prefix, tasks, move || {
                    let _ = refresh_tx.send(BackgroundEvent::Refresh);
                })
                .await;
            let _ = tx.send(BackgroundEvent::UploadFinished(report));
        });
    }
}
