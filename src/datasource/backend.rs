use anyhow::Result;
use async_trait::async_trait;

use crate::datasource::query::{Frame, QueryRequest};
use crate::upload::Credential;

/// Executes scoped queries (listing, delete, credential requests).
#[async_trait]
pub trait QueryBackend: Send + Sync {
    async fn query(&self, request: QueryRequest) -> Result<Frame>;
}

/// Canned ACL applied to uploaded objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessControl {
    #[default]
    Private,
}

impl AccessControl {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessControl::Private => "private",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
    pub access_control: AccessControl,
}

/// Byte-level progress callback: `(loaded, total)`.
pub type Progress<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

/// Moves object bodies into the bucket using a short-lived credential.
#[async_trait]
pub trait TransferBackend: Send + Sync {
    async fn put(
        &self,
        request: TransferRequest,
        credential: &Credential,
        progress: Progress<'_>,
    ) -> Result<()>;
}
