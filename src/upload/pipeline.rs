//! Sequential, progress-tracked batch upload.
//!
//! A batch is a queue of [`UploadTask`]s consumed one at a time. Each file
//! authenticates (reusing the cached credential while it is valid), streams
//! its body through the transfer backend, and triggers a listing refresh.
//! A failing file is recorded and the batch moves on.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::datasource::{AccessControl, QueryBackend, QueryRequest, TransferBackend, TransferRequest};
use crate::upload::credential::{Credential, CredentialCache};

const AUTHENTICATING: &str = "Authenticating";
const DONE: &str = "Done";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPhase {
    #[default]
    Idle,
    Authenticating,
    Uploading { index: usize, total: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadState {
    pub busy: bool,
    pub message: String,
    /// 0..=100, for the file currently in flight.
    pub percent: f64,
    /// `"<filename>: <message>"` per failed file of the last batch.
    pub errors: Vec<String>,
    pub phase: UploadPhase,
}

impl Default for UploadState {
    fn default() -> Self {
        Self {
            busy: false,
            message: DONE.to_string(),
            percent: 100.0,
            errors: Vec::new(),
            phase: UploadPhase::Idle,
        }
    }
}

#[derive(Debug, Clone)]
pub enum UploadSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct UploadTask {
    pub name: String,
    pub source: UploadSource,
}

impl UploadTask {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Self { name, source: UploadSource::Path(path) }
    }

    pub fn from_bytes(name: impl Into<String>, body: Vec<u8>) -> Self {
        Self { name: name.into(), source: UploadSource::Bytes(body) }
    }

    async fn load(self) -> Result<Vec<u8>> {
        match self.source {
            UploadSource::Path(path) => tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display())),
            UploadSource::Bytes(body) => Ok(body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub name: String,
    pub key: String,
    pub error: Option<String>,
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<UploadOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

pub struct UploadPipeline {
    query: Arc<dyn QueryBackend>,
    transfer: Arc<dyn TransferBackend>,
    bucket: String,
    credentials: CredentialCache,
    lifetime: Duration,
    state: watch::Sender<UploadState>,
    events: Vec<mpsc::UnboundedSender<UploadState>>,
}

impl UploadPipeline {
    pub fn new(query: Arc<dyn QueryBackend>, transfer: Arc<dyn TransferBackend>, bucket: &str) -> Self {
        let (state, _) = watch::channel(UploadState::default());
        Self {
            query,
            transfer,
            bucket: bucket.to_string(),
            credentials: CredentialCache::new(),
            lifetime: Duration::seconds(900),
            state,
            events: Vec::new(),
        }
    }

    /// Session lifetime assumed when the broker sends no expiry.
    pub fn with_credential_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    /// Every state change in order. The watch channel only keeps the latest.
    pub fn events(&mut self) -> mpsc::UnboundedReceiver<UploadState> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events.push(tx);
        rx
    }

    fn publish(&self, modify: impl FnOnce(&mut UploadState)) {
        self.state.send_modify(modify);
        if !self.events.is_empty() {
            let snapshot = self.state.borrow().clone();
            for tx in &self.events {
                let _ = tx.send(snapshot.clone());
            }
        }
    }

    pub fn state(&self) -> UploadState {
        self.state.borrow().clone()
    }

    fn report(&self, phase: UploadPhase, message: &str, percent: f64) {
        tracing::debug!(status = message, percent, "upload progress");
        self.publish(|state| {
            state.busy = true;
            state.phase = phase;
            state.message = message.to_string();
            state.percent = percent;
        });
    }

    /// Return the cached credential, or fetch a new one from the broker.
    pub async fn authenticate(&mut self) -> Result<Credential> {
        if let Some(credential) = self.credentials.current(Utc::now()) {
            return Ok(credential.clone());
        }

        self.report(UploadPhase::Authenticating, AUTHENTICATING, 0.0);
        let frame = self
            .query
            .query(QueryRequest::credentials())
            .await
            .context("Credential request failed")?;
        self.report(UploadPhase::Authenticating, AUTHENTICATING, 80.0);

        let credential = Credential::from_frame(&frame, self.lifetime, Utc::now())?;
        tracing::info!(access_key_id = %credential.access_key_id, expiry = %credential.expiry, "credential refreshed");
        self.credentials.install(credential.clone());
        self.report(UploadPhase::Authenticating, AUTHENTICATING, 100.0);

        Ok(credential)
    }

    /// Upload `tasks` one after another under `prefix`, calling `refresh`
    /// after every attempted file.
    pub async fn upload_batch<F>(&mut self, prefix: &str, tasks: Vec<UploadTask>, mut refresh: F) -> BatchReport
    where
        F: FnMut() + Send,
    {
        let mut report = BatchReport::default();
        if tasks.is_empty() {
            return report;
        }

        self.publish(|state| {
            state.errors.clear();
            state.busy = true;
        });

        let total = tasks.len();
        let mut queue: VecDeque<UploadTask> = tasks.into();
        let mut index = 0;

        while let Some(task) = queue.pop_front() {
            index += 1;
            let name = task.name.clone();
            let key = format!("{}{}", prefix, name);

            let error = match self.upload_one(task, &key, index, total).await {
                Ok(()) => {
                    tracing::info!(%key, "uploaded");
                    None
                }
                Err(err) => {
                    let line = format!("{}: {:#}", name, err);
                    tracing::warn!(%key, "upload failed: {:#}", err);
                    self.publish(|state| {
                        state.message = line.clone();
                        state.percent = 100.0;
                        state.errors.push(line.clone());
                    });
                    Some(line)
                }
            };

            report.outcomes.push(UploadOutcome { name, key, error });
            refresh();
        }

        self.publish(|state| {
            state.busy = false;
            state.phase = UploadPhase::Idle;
            state.message = DONE.to_string();
            state.percent = 100.0;
        });

        report
    }

    async fn upload_one(&mut self, task: UploadTask, key: &str, index: usize, total: usize) -> Result<()> {
        let credential = self.authenticate().await?;

        let phase = UploadPhase::Uploading { index, total };
        let message = format!("Uploading ({} of {}): \"{}\"", index, total, task.name);
        self.report(phase, &message, 0.0);

        let body = task.load().await?;
        let request = TransferRequest {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            body,
            access_control: AccessControl::Private,
        };

        let progress = |loaded: u64, size: u64| {
            let percent = if size == 0 { 100.0 } else { 100.0 * loaded as f64 / size as f64 };
            self.report(phase, &message, percent);
        };

        self.transfer.put(request, &credential, &progress).await
    }
}
