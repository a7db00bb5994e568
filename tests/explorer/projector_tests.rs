// Tests for turning listing frames into table rows and hints

use s3explorer::datasource::query::{LAST_MODIFIED_FIELD, NAME_FIELD};
use s3explorer::datasource::{Frame, Operation, QueryRequest};
use s3explorer::listing::{EntryKind, Hint, ListRequest, ListingProjector};

use crate::support::{listing_frame, ScriptedBackend};

#[tokio::test]
async fn test_list_projects_rows_and_hints() {
    let backend = ScriptedBackend::new();
    backend.set_listing("docs/", listing_frame("docs/", &["drafts"], &[("a.txt", 2048)]));
    let projector = ListingProjector::new(backend.clone());

    let listing = projector.list(ListRequest::browse("docs/")).await.unwrap();

    assert_eq!(listing.request, ListRequest::browse("docs/"));
    assert_eq!(listing.rows.len(), 2);
    assert_eq!(listing.rows[0].link(), Some("docs/drafts/"));
    assert_eq!(listing.rows[0].size_cell(), "<DIR>");
    assert_eq!(listing.rows[1].link(), None);
    assert_eq!(listing.rows[1].size, Some(2048));
    assert_eq!(listing.rows[1].size_cell(), "2 KiB");
    assert_eq!(listing.hints, vec![Hint::new("drafts")]);

    assert_eq!(backend.requests(), vec![QueryRequest::list("docs/")]);
}

#[tokio::test]
async fn test_unparseable_row_has_no_link_or_delete() {
    let backend = ScriptedBackend::new();
    backend.set_listing("", Frame::new().with_field(NAME_FIELD, [Some("garbage")]));
    let projector = ListingProjector::new(backend.clone());

    let listing = projector.list(ListRequest::browse("")).await.unwrap();
    let row = &listing.rows[0];

    assert_eq!(row.entry.kind, EntryKind::Error);
    assert_eq!(row.name_cell(), "⚠ garbage");
    assert!(row.link().is_none());
    assert!(row.delete_request().is_none());

    // Deleting it is a no-op that never reaches the backend
    assert!(!projector.delete(row).await.unwrap());
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn test_delete_is_scoped_to_kind_and_key() {
    let backend = ScriptedBackend::new();
    backend.set_listing("", listing_frame("", &["logs"], &[("x.bin", 1)]));
    let projector = ListingProjector::new(backend.clone());
    let listing = projector.list(ListRequest::browse("")).await.unwrap();

    assert!(projector.delete(&listing.rows[0]).await.unwrap());
    assert!(projector.delete(&listing.rows[1]).await.unwrap());

    let requests = backend.requests();
    assert_eq!(requests[1].path, "logs/");
    assert_eq!(requests[1].operation().unwrap(), Operation::Delete(EntryKind::Folder));
    assert_eq!(requests[2].path, "x.bin");
    assert_eq!(requests[2].operation().unwrap(), Operation::Delete(EntryKind::File));
}

#[tokio::test]
async fn test_listing_failure_carries_prefix() {
    let backend = ScriptedBackend::new();
    backend.fail_prefix("secret/");
    let projector = ListingProjector::new(backend);

    let err = projector.list(ListRequest::browse("secret/")).await.unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("secret/"));
    assert!(message.contains("access denied"));
}

#[tokio::test]
async fn test_empty_frame_is_malformed() {
    let backend = ScriptedBackend::new();
    let projector = ListingProjector::new(backend);

    // No listing configured: the backend answers with a frame without columns
    let err = projector.list(ListRequest::browse("void/")).await.unwrap_err();
    assert!(err.to_string().contains("void/"));
}

#[tokio::test]
async fn test_last_modified_column() {
    let backend = ScriptedBackend::new();
    let frame = listing_frame("", &["dir"], &[("a.txt", 1)])
        .with_field(LAST_MODIFIED_FIELD, [None, Some("2024-03-05T14:07:09+00:00")]);
    backend.set_listing("", frame);
    let projector = ListingProjector::new(backend);

    let listing = projector.list(ListRequest::browse("")).await.unwrap();

    assert!(listing.rows[0].modified.is_none());
    assert_eq!(listing.rows[0].modified_cell(), "");
    assert_eq!(listing.rows[1].modified_cell(), "2024-03-05 14:07:09");
}
