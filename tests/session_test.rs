//! Integration tests for the keyed session store.

use id_history::models::PendingAction;
use id_history::session::SessionStore;
use tempfile::tempdir;

#[test]
fn test_take_returns_and_clears() {
    let dir = tempdir().expect("temp dir");
    let store = SessionStore::open(dir.path().join("sessions"), 600).expect("open");

    store
        .begin(5, PendingAction::ExportByIdentifier)
        .expect("begin");
    assert_eq!(
        store.take(5).expect("take"),
        Some(PendingAction::ExportByIdentifier)
    );
    // consumed: a second take finds nothing
    assert_eq!(store.take(5).expect("take again"), None);
}

#[test]
fn test_peek_keeps_the_entry() {
    let dir = tempdir().expect("temp dir");
    let store = SessionStore::open(dir.path().join("sessions"), 600).expect("open");

    store
        .begin(5, PendingAction::ExportByIdentifier)
        .expect("begin");
    assert!(store.peek(5).expect("peek").is_some());
    assert!(store.peek(5).expect("peek again").is_some());
}

#[test]
fn test_sessions_are_per_user() {
    let dir = tempdir().expect("temp dir");
    let store = SessionStore::open(dir.path().join("sessions"), 600).expect("open");

    store
        .begin(5, PendingAction::ExportByIdentifier)
        .expect("begin");
    assert_eq!(store.peek(6).expect("other user"), None);
}

#[test]
fn test_expired_entry_reads_as_absent() {
    let dir = tempdir().expect("temp dir");
    // zero TTL: every entry is expired the moment it is read
    let store = SessionStore::open(dir.path().join("sessions"), 0).expect("open");

    store
        .begin(5, PendingAction::ExportByIdentifier)
        .expect("begin");
    assert_eq!(store.peek(5).expect("peek"), None);
}

#[test]
fn test_clear_is_idempotent() {
    let dir = tempdir().expect("temp dir");
    let store = SessionStore::open(dir.path().join("sessions"), 600).expect("open");

    store
        .begin(5, PendingAction::ExportByIdentifier)
        .expect("begin");
    store.clear(5).expect("clear");
    store.clear(5).expect("clear again");
    assert_eq!(store.peek(5).expect("peek"), None);
}
