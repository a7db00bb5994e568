use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use opendal::{
    services::{Memory, S3},
    Metadata, Operator,
};

use crate::config::Settings;
use crate::datasource::backend::{Progress, QueryBackend, TransferBackend, TransferRequest};
use crate::datasource::query::{
    Frame, Operation, QueryRequest, ACCESS_KEY_ID_FIELD, DELETE_FIELD, EXPIRATION_FIELD,
    LAST_MODIFIED_FIELD, NAME_FIELD, SECRET_ACCESS_KEY_FIELD, SESSION_TOKEN_FIELD, SIZE_FIELD,
};
use crate::error::ExplorerError;
use crate::listing::{EntryKind, ObjectEntry};
use crate::upload::Credential;

/// Bytes handed to the writer between two progress reports.
const PROGRESS_SLICE: usize = 256 * 1024;

/// Object timestamp as UTC. Goes through the text form so it does not
/// depend on which time type the service metadata carries.
fn modified_at(meta: &Metadata) -> Option<DateTime<Utc>> {
    meta.last_modified()?.to_string().parse().ok()
}

/// Query backend over an OpenDAL operator (S3, or an in-memory bucket)
pub struct OpenDalDatasource {
    operator: Operator,
    bucket: String,
    keys: Option<(String, String)>,
    session_duration: Duration,
}

impl OpenDalDatasource {
    pub fn new(operator: Operator, bucket: &str) -> Self {
        Self {
            operator,
            bucket: bucket.to_string(),
            keys: None,
            session_duration: Duration::seconds(900),
        }
    }

    /// In-memory bucket, for offline runs and tests
    pub fn memory(bucket: &str) -> Result<Self> {
        let operator = Operator::new(Memory::default())?.finish();
        Ok(Self::new(operator, bucket))
    }

    /// Connect to the configured S3-compatible bucket.
    ///
    /// Without explicit keys OpenDAL falls back to the standard AWS credential
    /// chain (environment, shared config, instance profile).
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut builder = S3::default()
            .bucket(&settings.bucket)
            .region(&settings.region);

        if let Some(endpoint) = settings.resolved_endpoint() {
            builder = builder.endpoint(&endpoint);
        }
        if let Some((key, secret)) = settings.static_keys() {
            builder = builder.access_key_id(&key).secret_access_key(&secret);
        }

        let operator = Operator::new(builder)?.finish();

        Ok(Self::new(operator, &settings.bucket)
            .with_session(settings.static_keys(), settings.session_duration()))
    }

    /// Keys vended by credential requests and the lifetime stamped on them.
    pub fn with_session(mut self, keys: Option<(String, String)>, duration: Duration) -> Self {
        self.keys = keys;
        self.session_duration = duration;
        self
    }

    pub fn operator(&self) -> Operator {
        self.operator.clone()
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn display_path(&self, path: &str) -> String {
        format!("s3://{}/{}", self.bucket, path.trim_start_matches('/'))
    }

    async fn list(&self, prefix: &str, formatted: bool) -> Result<Frame> {
        let entries = self
            .operator
            .list(prefix)
            .await
            .with_context(|| format!("Failed to list {}", self.display_path(prefix)))?;

        let mut folders = Vec::new();
        let mut files = Vec::new();

        for entry in entries {
            let key = entry.path();

            // Skip the directory marker of the listed prefix itself
            if key.is_empty() || key == "/" || key == prefix {
                continue;
            }

            let name = entry.name().trim_end_matches('/').to_string();
            if entry.metadata().mode().is_dir() {
                folders.push(ObjectEntry::folder(name, key));
            } else {
                // Some services list without sizes or timestamps
                let mut size = entry.metadata().content_length();
                let mut modified = modified_at(entry.metadata());
                if size == 0 || modified.is_none() {
                    if let Ok(meta) = self.operator.stat(key).await {
                        size = meta.content_length();
                        modified = modified.or_else(|| modified_at(&meta));
                    }
                }
                files.push((ObjectEntry::file(name, key), size, modified));
            }
        }

        folders.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        files.sort_by(|a, b| a.0.display_name.cmp(&b.0.display_name));

        let render = |entry: &ObjectEntry| {
            if formatted {
                entry.encode()
            } else {
                entry.display_name.clone()
            }
        };

        let mut names = Vec::with_capacity(folders.len() + files.len());
        let mut sizes = Vec::with_capacity(folders.len() + files.len());
        let mut modified = Vec::with_capacity(folders.len() + files.len());
        for folder in &folders {
            names.push(Some(render(folder)));
            sizes.push(None);
            modified.push(None);
        }
        for (file, size, at) in &files {
            names.push(Some(render(file)));
            sizes.push(Some(size.to_string()));
            modified.push(at.map(|t| t.to_rfc3339()));
        }

        let rows = names.len();
        let mut frame = Frame::new()
            .with_field(NAME_FIELD, names)
            .with_field(SIZE_FIELD, sizes)
            .with_field(LAST_MODIFIED_FIELD, modified);
        if formatted {
            frame = frame.with_field(DELETE_FIELD, vec![Some(String::new()); rows]);
        }

        Ok(frame.with_folders(folders.into_iter().map(|f| f.display_name).collect()))
    }

    async fn delete(&self, path: &str, kind: EntryKind) -> Result<Frame> {
        match kind {
            EntryKind::File => {
                self.operator
                    .delete(path)
                    .await
                    .with_context(|| format!("Failed to delete {}", self.display_path(path)))?;
            }
            EntryKind::Folder => {
                // One level only: objects directly under the folder prefix
                let entries = self
                    .operator
                    .list(path)
                    .await
                    .with_context(|| format!("Failed to list {}", self.display_path(path)))?;

                for entry in entries {
                    if entry.metadata().mode().is_dir() {
                        continue;
                    }
                    self.operator.delete(entry.path()).await.with_context(|| {
                        format!("Failed to delete {}", self.display_path(entry.path()))
                    })?;
                }
            }
            EntryKind::Error => {
                return Err(ExplorerError::UndeletableEntry { name: path.to_string() }.into());
            }
        }

        Ok(Frame::new())
    }

    fn issue_credentials(&self) -> Frame {
        let (key, secret) = self.keys.clone().unwrap_or_default();
        let expiry = Utc::now() + self.session_duration;

        Frame::new()
            .with_field(ACCESS_KEY_ID_FIELD, [Some(key)])
            .with_field(SECRET_ACCESS_KEY_FIELD, [Some(secret)])
            .with_field(SESSION_TOKEN_FIELD, [Some(String::new())])
            .with_field(EXPIRATION_FIELD, [Some(expiry.to_rfc3339())])
    }
}

#[async_trait]
impl QueryBackend for OpenDalDatasource {
    async fn query(&self, request: QueryRequest) -> Result<Frame> {
        let operation = request.operation()?;
        tracing::debug!(path = %request.path, %operation, "query");

        match operation {
            Operation::List { formatted } => self.list(&request.path, formatted).await,
            Operation::Delete(kind) => self.delete(&request.path, kind).await,
            Operation::CredentialRequest => Ok(self.issue_credentials()),
        }
    }
}

type Connect = Box<dyn Fn(&str, &Credential) -> Result<Operator> + Send + Sync>;

/// Transfer backend writing through OpenDAL with the active credential
pub struct OpenDalTransfer {
    connect: Connect,
    part_size: usize,
}

impl OpenDalTransfer {
    /// Build a fresh S3 operator per transfer from the session credential.
    pub fn s3(settings: &Settings) -> Self {
        let region = settings.region.clone();
        let endpoint = settings.resolved_endpoint();

        let connect: Connect = Box::new(move |bucket, credential| {
            let mut builder = S3::default().bucket(bucket).region(&region);
            if let Some(endpoint) = &endpoint {
                builder = builder.endpoint(endpoint);
            }
            if !credential.access_key_id.is_empty() {
                builder = builder
                    .access_key_id(&credential.access_key_id)
                    .secret_access_key(&credential.secret_access_key);
            }
            if !credential.session_token.is_empty() {
                builder = builder.session_token(&credential.session_token);
            }
            Ok(Operator::new(builder)?.finish())
        });

        Self { connect, part_size: settings.part_size }
    }

    /// Write into an existing operator, ignoring credentials.
    pub fn shared(operator: Operator, part_size: usize) -> Self {
        Self {
            connect: Box::new(move |_, _| Ok(operator.clone())),
            part_size,
        }
    }
}

/// The parts of an object writer the transfer loop drives.
#[async_trait]
trait ObjectSink: Send {
    async fn write_slice(&mut self, slice: &[u8]) -> opendal::Result<()>;
    async fn finish(&mut self) -> opendal::Result<()>;
    async fn abort(&mut self) -> opendal::Result<()>;
}

#[async_trait]
impl ObjectSink for opendal::Writer {
    async fn write_slice(&mut self, slice: &[u8]) -> opendal::Result<()> {
        self.write(slice.to_vec()).await
    }

    async fn finish(&mut self) -> opendal::Result<()> {
        self.close().await.map(|_| ())
    }

    async fn abort(&mut self) -> opendal::Result<()> {
        opendal::Writer::abort(self).await
    }
}

/// Stream `body` into `sink`, reporting after every slice. A failed write
/// or close aborts the sink so no partial multipart upload is left behind.
async fn stream_body<S: ObjectSink>(
    sink: &mut S,
    key: &str,
    body: &[u8],
    progress: Progress<'_>,
) -> Result<()> {
    let total = body.len() as u64;
    let mut loaded = 0u64;
    progress(loaded, total);

    let mut outcome = Ok(());
    for slice in body.chunks(PROGRESS_SLICE) {
        if let Err(err) = sink.write_slice(slice).await {
            outcome = Err(err);
            break;
        }
        loaded += slice.len() as u64;
        progress(loaded, total);
    }
    if outcome.is_ok() {
        outcome = sink.finish().await;
    }

    if let Err(err) = outcome {
        if let Err(abort_err) = sink.abort().await {
            tracing::warn!(%key, "abort after failed upload failed: {}", abort_err);
        }
        return Err(err).with_context(|| format!("Failed to upload {}", key));
    }
    Ok(())
}

#[async_trait]
impl TransferBackend for OpenDalTransfer {
    async fn put(
        &self,
        request: TransferRequest,
        credential: &Credential,
        progress: Progress<'_>,
    ) -> Result<()> {
        let operator = (self.connect)(&request.bucket, credential)?;
        // Objects get the bucket's default ACL, which is private
        tracing::debug!(
            key = %request.key,
            bytes = request.body.len(),
            acl = request.access_control.as_str(),
            "put object"
        );

        let mut writer = operator
            .writer_with(&request.key)
            .chunk(self.part_size.max(1))
            .await
            .with_context(|| format!("Failed to open writer for {}", request.key))?;

        stream_body(&mut writer, &request.key, &request.body, progress).await
    }
}
