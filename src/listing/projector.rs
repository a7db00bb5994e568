//! Projects a flat, server-side listing into table rows and folder hints.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::datasource::query::{Field, QueryRequest, LAST_MODIFIED_FIELD, NAME_FIELD, SIZE_FIELD};
use crate::datasource::QueryBackend;
use crate::error::ExplorerError;
use crate::listing::entry::{EntryKind, ObjectEntry, DELETE_ICON};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Replaces the displayed table.
    Browse,
    /// Only refreshes autocomplete hints while a crumb is being edited.
    Hints,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub prefix: String,
    pub mode: ListMode,
}

impl ListRequest {
    pub fn browse(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), mode: ListMode::Browse }
    }

    pub fn hints(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), mode: ListMode::Hints }
    }
}

/// Autocomplete suggestion for the terminal crumb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub label: String,
    pub value: String,
}

impl Hint {
    pub fn new(folder: &str) -> Self {
        Self { label: folder.to_string(), value: folder.to_string() }
    }
}

/// One table row. Display, link and delete behaviour are derived from the
/// decoded entry on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub entry: ObjectEntry,
    pub size: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
}

impl ListingRow {
    pub fn name_cell(&self) -> String {
        self.entry.label()
    }

    /// Prefix to navigate to when the name is clicked; folders only.
    pub fn link(&self) -> Option<&str> {
        if self.entry.is_folder() {
            Some(&self.entry.key)
        } else {
            None
        }
    }

    pub fn size_cell(&self) -> String {
        match (self.entry.kind, self.size) {
            (EntryKind::Folder, _) => "<DIR>".to_string(),
            (_, Some(size)) => humansize::format_size(size, humansize::BINARY),
            (_, None) => String::new(),
        }
    }

    pub fn modified_cell(&self) -> String {
        self.modified
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    }

    pub fn delete_cell(&self) -> &'static str {
        DELETE_ICON
    }

    /// Delete request scoped to `(kind, key)`; unparseable rows have none.
    pub fn delete_request(&self) -> Option<QueryRequest> {
        if self.entry.is_error() {
            None
        } else {
            Some(QueryRequest::delete(self.entry.kind, &self.entry.key))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub request: ListRequest,
    pub rows: Vec<ListingRow>,
    pub hints: Vec<Hint>,
}

fn cell(field: Option<&Field>, row: usize) -> Option<&str> {
    field?.values.get(row)?.as_deref()
}

#[derive(Clone)]
pub struct ListingProjector {
    backend: Arc<dyn QueryBackend>,
}

impl ListingProjector {
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        Self { backend }
    }

    pub async fn list(&self, request: ListRequest) -> Result<Listing> {
        let frame = self
            .backend
            .query(QueryRequest::list(&request.prefix))
            .await
            .with_context(|| format!("Failed to list '{}'", request.prefix))?;

        let names = frame
            .field(NAME_FIELD)
            .or_else(|| frame.fields.first())
            .ok_or_else(|| ExplorerError::MalformedListing { prefix: request.prefix.clone() })?;
        let sizes = frame.field(SIZE_FIELD);
        let modified = frame.field(LAST_MODIFIED_FIELD);

        let rows = names
            .values
            .iter()
            .enumerate()
            .map(|(i, raw)| ListingRow {
                entry: ObjectEntry::decode(raw.as_deref().unwrap_or_default()),
                size: cell(sizes, i).and_then(|v| v.parse().ok()),
                modified: cell(modified, i)
                    .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
                    .map(|t| t.with_timezone(&Utc)),
            })
            .collect();

        let hints = frame.meta.folders.iter().map(|f| Hint::new(f)).collect();

        Ok(Listing { request, rows, hints })
    }

    /// Issue the row's delete request. Returns `false` when the row offers
    /// no delete affordance.
    pub async fn delete(&self, row: &ListingRow) -> Result<bool> {
        let Some(request) = row.delete_request() else {
            return Ok(false);
        };

        tracing::info!(key = %row.entry.key, kind = row.entry.kind.as_str(), "delete");
        self.backend
            .query(request)
            .await
            .with_context(|| format!("Failed to delete '{}'", row.entry.key))?;
        Ok(true)
    }
}
