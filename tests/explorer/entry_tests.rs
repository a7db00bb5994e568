// Tests for decoding raw listing rows

use s3explorer::listing::{EntryKind, ObjectEntry};

#[test]
fn test_decode_folder() {
    let entry = ObjectEntry::decode("photos,type=folder,key=photos/");
    assert_eq!(entry.display_name, "photos");
    assert_eq!(entry.kind, EntryKind::Folder);
    assert_eq!(entry.key, "photos/");
}

#[test]
fn test_decode_file_under_prefix() {
    let entry = ObjectEntry::decode("a.txt,type=file,key=docs/a.txt");
    assert_eq!(entry, ObjectEntry::file("a.txt", "docs/a.txt"));
}

#[test]
fn test_decode_name_with_commas() {
    let entry = ObjectEntry::decode("report, final, v2.pdf,type=file,key=r/report, final, v2.pdf");
    assert_eq!(entry.display_name, "report, final, v2.pdf");
    assert_eq!(entry.key, "r/report, final, v2.pdf");
    assert_eq!(entry.kind, EntryKind::File);
}

#[test]
fn test_decode_key_containing_marker_text() {
    let entry = ObjectEntry::decode("x,type=file,key=a,b");
    assert_eq!(entry.display_name, "x");
    assert_eq!(entry.key, "a,b");
}

#[test]
fn test_decode_garbage_is_error_entry() {
    let entry = ObjectEntry::decode("garbage");
    assert_eq!(entry.kind, EntryKind::Error);
    assert_eq!(entry.display_name, "garbage");
    assert!(entry.key.is_empty());
    assert!(entry.is_error());
}

#[test]
fn test_decode_unknown_kind_is_error_entry() {
    let raw = "thing,type=symlink,key=thing";
    let entry = ObjectEntry::decode(raw);
    assert_eq!(entry.kind, EntryKind::Error);
    assert_eq!(entry.display_name, raw);
}

#[test]
fn test_decode_empty_row() {
    let entry = ObjectEntry::decode("");
    assert_eq!(entry.kind, EntryKind::Error);
    assert_eq!(entry.display_name, "");
}

#[test]
fn test_labels_carry_kind_icon() {
    assert_eq!(ObjectEntry::folder("a", "a/").label(), "🗀 a");
    assert_eq!(ObjectEntry::file("b", "b").label(), "🖹 b");
    assert_eq!(ObjectEntry::decode("bad").label(), "⚠ bad");
}
