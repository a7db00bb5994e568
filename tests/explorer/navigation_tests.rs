// Tests for the navigation state machine and its address-bar sync

use s3explorer::listing::{Hint, ListRequest, Listing, ListingRow, ObjectEntry};
use s3explorer::nav::{Location, MemoryHistory, NavigationManager, NavigationPort};

fn listing(request: ListRequest, names: &[&str]) -> Listing {
    let rows = names
        .iter()
        .map(|name| ListingRow {
            entry: ObjectEntry::file(*name, format!("{}{}", request.prefix, name)),
            size: Some(1),
            modified: None,
        })
        .collect();
    let hints = names.iter().map(|name| Hint::new(name)).collect();
    Listing { request, rows, hints }
}

fn mounted(initial: &str) -> (MemoryHistory, NavigationManager<MemoryHistory>, Option<ListRequest>) {
    let history = MemoryHistory::new(initial);
    let (nav, request) = NavigationManager::mount(history.clone());
    (history, nav, request)
}

#[test]
fn test_mount_reads_address_bar() {
    let (_, nav, request) = mounted("?prefix=logs%2F2024%2F&explore=true");

    assert_eq!(nav.prefix(), "logs/2024/");
    assert!(nav.state().panel_open);
    assert!(nav.state().listing_stale);
    assert!(nav.table().is_none());
    assert_eq!(request, Some(ListRequest::browse("logs/2024/")));
}

#[test]
fn test_mount_closed_issues_nothing() {
    let (_, nav, request) = mounted("");
    assert_eq!(nav.prefix(), "");
    assert!(!nav.state().panel_open);
    assert!(request.is_none());
}

#[test]
fn test_open_and_close_panel_push_history() {
    let (history, mut nav, _) = mounted("");

    assert_eq!(nav.open_panel(), Some(ListRequest::browse("")));
    assert_eq!(history.current(), "?prefix=&explore=true");

    nav.close_panel();
    assert_eq!(history.current(), "?prefix=&explore=false");
    assert_eq!(history.len(), 3);
}

#[test]
fn test_unrelated_params_are_preserved() {
    let (history, mut nav, _) = mounted("?theme=dark");
    nav.open_panel();
    assert_eq!(history.current(), "?theme=dark&prefix=&explore=true");

    nav.navigate("a b/");
    assert_eq!(history.current(), "?theme=dark&prefix=a%20b%2F&explore=true");
}

#[test]
fn test_navigate_to_current_prefix_is_noop() {
    let (history, mut nav, _) = mounted("?prefix=a%2F&explore=true");
    assert!(nav.navigate("a/").is_none());
    assert_eq!(history.len(), 1);
}

#[test]
fn test_navigate_marks_listing_stale() {
    let (_, mut nav, initial) = mounted("?prefix=&explore=true");
    assert!(nav.apply_listing(listing(initial.unwrap(), &["x"])));
    assert!(!nav.state().listing_stale);
    assert_eq!(nav.table().map(|rows| rows.len()), Some(1));

    let request = nav.navigate("docs/");
    assert_eq!(request, Some(ListRequest::browse("docs/")));
    assert!(nav.state().listing_stale);
    assert!(nav.table().is_none());
    assert!(nav.state().hints.is_empty());
}

#[test]
fn test_stale_response_is_dropped() {
    let (_, mut nav, _) = mounted("?prefix=&explore=true");
    let first = nav.navigate("a/").unwrap();
    let second = nav.navigate("b/").unwrap();

    // The response for "a/" arrives after the user moved on
    assert!(!nav.apply_listing(listing(first, &["old"])));
    assert!(nav.state().listing_stale);
    assert!(nav.table().is_none());

    assert!(nav.apply_listing(listing(second, &["new"])));
    let rows = nav.table().unwrap();
    assert_eq!(rows[0].entry.key, "b/new");
}

#[test]
fn test_history_round_trip() {
    let (history, mut nav, _) = mounted("?prefix=&explore=true");
    nav.navigate("a/");
    nav.navigate("a/b/");
    assert_eq!(history.len(), 3);

    assert!(history.back());
    assert_eq!(nav.poll_history(), Some(ListRequest::browse("a/")));
    assert_eq!(nav.prefix(), "a/");
    assert!(nav.state().listing_stale);

    assert!(history.back());
    assert_eq!(nav.poll_history(), Some(ListRequest::browse("")));
    assert_eq!(nav.prefix(), "");

    assert!(history.forward());
    assert_eq!(nav.poll_history(), Some(ListRequest::browse("a/")));

    // Pops never push new entries
    assert_eq!(history.len(), 3);
    assert_eq!(nav.state().location(), history.read());
}

#[test]
fn test_pop_without_change_issues_nothing() {
    let (_, mut nav, _) = mounted("?prefix=a%2F&explore=true");
    assert!(nav.poll_history().is_none());
    assert!(nav.on_history_pop().is_none());
}

#[test]
fn test_pop_to_closed_panel_skips_listing() {
    let (history, mut nav, _) = mounted("?prefix=&explore=false");
    nav.open_panel();

    assert!(history.back());
    assert!(nav.poll_history().is_none());
    assert!(!nav.state().panel_open);

    assert!(history.forward());
    assert_eq!(nav.poll_history(), Some(ListRequest::browse("")));
    assert!(nav.state().panel_open);
}

#[test]
fn test_failed_browse_listing_sets_notice() {
    let (_, mut nav, initial) = mounted("?prefix=x%2F&explore=true");
    let request = initial.unwrap();

    nav.listing_failed(&request, &anyhow::anyhow!("access denied"));
    let notice = nav.notice().unwrap();
    assert!(notice.contains("x/"));
    assert!(notice.contains("access denied"));
    assert_eq!(nav.prefix(), "x/");
    assert!(nav.state().listing_stale);

    nav.dismiss_notice();
    assert!(nav.notice().is_none());
}

#[test]
fn test_failed_stale_or_hint_listing_is_silent() {
    let (_, mut nav, _) = mounted("?prefix=x%2F&explore=true");
    nav.listing_failed(&ListRequest::browse("elsewhere/"), &anyhow::anyhow!("boom"));
    nav.listing_failed(&ListRequest::hints(""), &anyhow::anyhow!("boom"));
    assert!(nav.notice().is_none());
}

#[test]
fn test_delete_relists_current_prefix() {
    let (_, mut nav, _) = mounted("?prefix=x%2F&explore=true");

    assert_eq!(nav.delete_finished("x/a.txt", Ok(())), ListRequest::browse("x/"));
    assert!(nav.notice().is_none());

    let request = nav.delete_finished("x/b.txt", Err(anyhow::anyhow!("forbidden")));
    assert_eq!(request, ListRequest::browse("x/"));
    assert!(nav.notice().unwrap().contains("x/b.txt"));
}

#[test]
fn test_hints_apply_only_while_editing_their_parent() {
    let (history, mut nav, _) = mounted("?prefix=data%2F2024%2Fjan%2F&explore=true");
    let before = history.len();

    let request = nav.begin_edit("data/2024/jan");
    assert_eq!(request, ListRequest::hints("data/2024/"));
    assert!(nav.state().is_editing());
    assert_eq!(history.len(), before);

    assert!(!nav.apply_listing(listing(ListRequest::hints("other/"), &["z"])));
    assert!(nav.apply_listing(listing(request, &["feb", "jan"])));
    assert_eq!(nav.state().hints, vec![Hint::new("feb"), Hint::new("jan")]);
}

#[test]
fn test_hints_dropped_outside_edit_mode() {
    let (_, mut nav, _) = mounted("?prefix=data%2F&explore=true");
    assert!(!nav.state().is_editing());
    assert!(!nav.apply_listing(listing(ListRequest::hints(""), &["data"])));
    assert!(nav.state().hints.is_empty());
}

#[test]
fn test_location_parse_and_render() {
    let location = Location::parse("?explore=true&prefix=a%2Fb%2F");
    assert_eq!(location, Location::new("a/b/", true));

    // Existing keys keep their position
    assert_eq!(
        location.to_query_string("?explore=false&prefix=&x=1"),
        "?explore=true&prefix=a%2Fb%2F&x=1"
    );
}

#[test]
fn test_refresh_while_editing_keeps_editor_hints() {
    let (_, mut nav, initial) = mounted("?prefix=data%2F2024%2Fjan%2F&explore=true");
    assert!(nav.apply_listing(listing(initial.unwrap(), &["a.csv"])));

    let hints = nav.begin_edit("data/2024/jan");
    assert!(nav.apply_listing(listing(hints, &["feb", "jan"])));

    // An upload or delete finishing mid-edit re-lists the displayed folder
    let request = nav.refresh();
    assert_eq!(request, ListRequest::browse("data/2024/jan/"));
    assert!(nav.apply_listing(listing(request, &["b.csv"])));

    assert_eq!(nav.prefix(), "data/2024/jan");
    assert!(nav.state().is_editing());
    assert_eq!(nav.state().hints, vec![Hint::new("feb"), Hint::new("jan")]);
    assert_eq!(nav.table().unwrap()[0].entry.key, "data/2024/jan/b.csv");

    // A listing of the slash-less prefix is not the displayed folder
    assert!(!nav.apply_listing(listing(ListRequest::browse("data/2024/jan"), &["c.csv"])));
    assert_eq!(nav.table().unwrap()[0].entry.key, "data/2024/jan/b.csv");
}

#[test]
fn test_mount_without_trailing_separator_lists_folder() {
    let (_, nav, request) = mounted("?prefix=data&explore=true");
    assert_eq!(request, Some(ListRequest::browse("data/")));
    assert!(nav.state().is_editing());
}
