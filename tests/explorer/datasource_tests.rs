// Tests for the OpenDAL datasource over the in-memory service

use chrono::{Duration, Utc};
use std::sync::Mutex;

use s3explorer::datasource::query::{LAST_MODIFIED_FIELD, NAME_FIELD, SIZE_FIELD};
use s3explorer::datasource::{
    AccessControl, OpenDalDatasource, OpenDalTransfer, QueryBackend, QueryRequest,
    TransferBackend, TransferRequest,
};
use s3explorer::listing::{EntryKind, ListRequest, ListingProjector, ObjectEntry};
use s3explorer::upload::Credential;

async fn seeded() -> OpenDalDatasource {
    let datasource = OpenDalDatasource::memory("test").unwrap();
    let op = datasource.operator();
    op.write("docs/b.txt", b"bbbb".to_vec()).await.unwrap();
    op.write("docs/a.txt", b"aaa".to_vec()).await.unwrap();
    op.write("docs/sub/c.txt", b"c".to_vec()).await.unwrap();
    op.write("top.bin", b"t".to_vec()).await.unwrap();
    datasource
}

fn names(frame: &s3explorer::datasource::Frame) -> Vec<String> {
    frame
        .field(NAME_FIELD)
        .unwrap()
        .values
        .iter()
        .map(|v| v.clone().unwrap_or_default())
        .collect()
}

#[tokio::test]
async fn test_list_prefix_folders_first() {
    let datasource = seeded().await;
    let frame = datasource.query(QueryRequest::list("docs/")).await.unwrap();

    assert_eq!(
        names(&frame),
        vec![
            "sub,type=folder,key=docs/sub/",
            "a.txt,type=file,key=docs/a.txt",
            "b.txt,type=file,key=docs/b.txt",
        ]
    );
    let sizes = &frame.field(SIZE_FIELD).unwrap().values;
    assert_eq!(sizes[0], None);
    assert_eq!(sizes[1].as_deref(), Some("3"));
    assert_eq!(frame.meta.folders, vec!["sub".to_string()]);

    let modified = &frame.field(LAST_MODIFIED_FIELD).unwrap().values;
    assert_eq!(modified.len(), 3);
    assert_eq!(modified[0], None);
}

#[tokio::test]
async fn test_list_root() {
    let datasource = seeded().await;
    let frame = datasource.query(QueryRequest::list("")).await.unwrap();

    let entries: Vec<ObjectEntry> = names(&frame).iter().map(|n| ObjectEntry::decode(n)).collect();
    assert_eq!(
        entries,
        vec![ObjectEntry::folder("docs", "docs/"), ObjectEntry::file("top.bin", "top.bin")]
    );
}

#[tokio::test]
async fn test_projector_over_datasource() {
    let projector = ListingProjector::new(std::sync::Arc::new(seeded().await));
    let listing = projector.list(ListRequest::browse("docs/")).await.unwrap();

    assert_eq!(listing.rows.len(), 3);
    assert_eq!(listing.rows[0].link(), Some("docs/sub/"));
    assert_eq!(listing.rows[2].size, Some(4));
    assert_eq!(listing.hints.len(), 1);
}

#[tokio::test]
async fn test_delete_file() {
    let datasource = seeded().await;
    datasource
        .query(QueryRequest::delete(EntryKind::File, "docs/a.txt"))
        .await
        .unwrap();

    assert!(!datasource.operator().exists("docs/a.txt").await.unwrap());
    assert!(datasource.operator().exists("docs/b.txt").await.unwrap());
}

#[tokio::test]
async fn test_delete_folder_removes_one_level() {
    let datasource = seeded().await;
    datasource
        .query(QueryRequest::delete(EntryKind::Folder, "docs/"))
        .await
        .unwrap();

    let op = datasource.operator();
    assert!(!op.exists("docs/a.txt").await.unwrap());
    assert!(!op.exists("docs/b.txt").await.unwrap());
    assert!(op.exists("docs/sub/c.txt").await.unwrap());
}

#[tokio::test]
async fn test_unknown_query_is_rejected() {
    let datasource = seeded().await;
    let request = QueryRequest { path: "docs/".to_string(), query: "TRUNCATE".to_string() };
    let err = datasource.query(request).await.unwrap_err();
    assert!(err.to_string().contains("TRUNCATE"));
}

#[tokio::test]
async fn test_credential_request_vends_session() {
    let datasource = OpenDalDatasource::memory("test")
        .unwrap()
        .with_session(Some(("AKIA".to_string(), "SK".to_string())), Duration::seconds(900));

    let frame = datasource.query(QueryRequest::credentials()).await.unwrap();
    let now = Utc::now();
    let credential = Credential::from_frame(&frame, Duration::seconds(1), now).unwrap();

    assert_eq!(credential.access_key_id, "AKIA");
    assert_eq!(credential.secret_access_key, "SK");
    assert!(credential.expiry > now + Duration::seconds(800));
    assert!(!credential.is_expired_at(now));
}

#[tokio::test]
async fn test_shared_transfer_writes_object() {
    let datasource = OpenDalDatasource::memory("test").unwrap();
    let transfer = OpenDalTransfer::shared(datasource.operator(), 1024);
    let credential = Credential {
        access_key_id: String::new(),
        secret_access_key: String::new(),
        session_token: String::new(),
        expiry: Utc::now() + Duration::hours(1),
    };

    let seen = Mutex::new(Vec::new());
    let progress = |loaded: u64, total: u64| seen.lock().unwrap().push((loaded, total));
    let request = TransferRequest {
        bucket: "test".to_string(),
        key: "up/hello.txt".to_string(),
        body: b"hello".to_vec(),
        access_control: AccessControl::Private,
    };
    transfer.put(request, &credential, &progress).await.unwrap();

    let body = datasource.operator().read("up/hello.txt").await.unwrap().to_vec();
    assert_eq!(body, b"hello".to_vec());
    assert_eq!(seen.lock().unwrap().last(), Some(&(5, 5)));
}
