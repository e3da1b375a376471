//! Integration tests for the ingestion pipeline: filtering, storage, edits.

use std::sync::Arc;

use id_history::db::Database;
use id_history::ingest::{IngestOutcome, Ingestor};
use id_history::models::{MediaKind, MessageEvent};
use tempfile::tempdir;

const CHAT_ID: i64 = -100_500;

fn setup(dir: &tempfile::TempDir) -> (Arc<Database>, Ingestor) {
    let db_path = dir.path().join("test.db");
    let db = Arc::new(
        Database::new(&format!("sqlite://{}", db_path.display()))
            .expect("Failed to create database"),
    );
    db.add_authorized_chat(CHAT_ID, "Group 1234567890 Chat", "1234567890", 7)
        .expect("authorize chat");
    let ingestor = Ingestor::new(Arc::clone(&db));
    (db, ingestor)
}

fn text_event(message_id: i64, date: i64, text: &str) -> MessageEvent {
    MessageEvent {
        chat_id: CHAT_ID,
        message_id,
        sender_id: Some(42),
        sender_username: Some("sender".to_string()),
        date,
        text: Some(text.to_string()),
        ..MessageEvent::default()
    }
}

#[test]
fn test_unauthorized_chat_is_dropped() {
    let dir = tempdir().expect("temp dir");
    let (_db, ingestor) = setup(&dir);

    let mut event = text_event(1, 1000, "9999999999");
    event.chat_id = -1; // not authorized
    let outcome = ingestor.ingest_new(&event).expect("ingest");
    assert_eq!(outcome, IngestOutcome::ChatNotAuthorized);
}

#[test]
fn test_media_only_message_is_dropped() {
    let dir = tempdir().expect("temp dir");
    let (db, ingestor) = setup(&dir);

    let event = MessageEvent {
        chat_id: CHAT_ID,
        message_id: 1,
        date: 1000,
        photo: Some("photo-ref".to_string()),
        ..MessageEvent::default()
    };
    let outcome = ingestor.ingest_new(&event).expect("ingest");
    assert_eq!(outcome, IngestOutcome::EmptyText);
    assert_eq!(db.count_stats().expect("stats").total_messages, 0);
}

#[test]
fn test_text_without_identifiers_is_dropped() {
    let dir = tempdir().expect("temp dir");
    let (db, ingestor) = setup(&dir);

    let outcome = ingestor
        .ingest_new(&text_event(1, 1000, "just chatting"))
        .expect("ingest");
    assert_eq!(outcome, IngestOutcome::NoIdentifiers);
    assert_eq!(db.count_stats().expect("stats").total_messages, 0);
}

#[test]
fn test_identifier_bearing_message_is_stored_and_linked() {
    let dir = tempdir().expect("temp dir");
    let (db, ingestor) = setup(&dir);

    let outcome = ingestor
        .ingest_new(&text_event(1, 1000, "met 9999999999 and 8888888888"))
        .expect("ingest");
    let IngestOutcome::Stored { surrogate_id, linked } = outcome else {
        panic!("expected Stored, got {outcome:?}");
    };
    assert!(surrogate_id > 0);
    assert_eq!(linked, 2);
    assert_eq!(db.count_by_identifier("9999999999").expect("count"), 1);
    assert_eq!(db.count_by_identifier("8888888888").expect("count"), 1);
}

#[test]
fn test_reingestion_is_idempotent() {
    let dir = tempdir().expect("temp dir");
    let (db, ingestor) = setup(&dir);

    let event = text_event(1, 1000, "met 9999999999");
    let first = ingestor.ingest_new(&event).expect("first ingest");
    let second = ingestor.ingest_new(&event).expect("second ingest");

    let IngestOutcome::Stored { surrogate_id: a, .. } = first else {
        panic!("expected Stored");
    };
    let IngestOutcome::Stored { surrogate_id: b, .. } = second else {
        panic!("expected Stored");
    };
    assert_eq!(a, b);
    assert_eq!(db.count_stats().expect("stats").total_messages, 1);
    assert_eq!(db.count_by_identifier("9999999999").expect("count"), 1);
}

#[test]
fn test_caption_of_media_message_is_indexed() {
    let dir = tempdir().expect("temp dir");
    let (db, ingestor) = setup(&dir);

    let event = MessageEvent {
        chat_id: CHAT_ID,
        message_id: 1,
        date: 1000,
        caption: Some("photo of 9999999999".to_string()),
        photo: Some("photo-ref".to_string()),
        ..MessageEvent::default()
    };
    let outcome = ingestor.ingest_new(&event).expect("ingest");
    assert!(matches!(outcome, IngestOutcome::Stored { .. }));

    let hits = db.search_by_identifier("9999999999", 5, 0).expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].media_type, MediaKind::Photo);
    assert_eq!(hits[0].file_id.as_deref(), Some("photo-ref"));
}

#[test]
fn test_edit_removing_identifiers_keeps_row_clears_links() {
    let dir = tempdir().expect("temp dir");
    let (db, ingestor) = setup(&dir);

    ingestor
        .ingest_new(&text_event(1, 1000, "met 9999999999"))
        .expect("ingest");

    let outcome = ingestor
        .ingest_edited(&text_event(1, 1000, "edited away"))
        .expect("edit");
    let IngestOutcome::Updated { surrogate_id, linked } = outcome else {
        panic!("expected Updated, got {outcome:?}");
    };
    assert_eq!(linked, 0);
    assert_eq!(db.count_by_identifier("9999999999").expect("count"), 0);

    // the row itself persists with the new text
    assert_eq!(
        db.message_surrogate_id(CHAT_ID, 1).expect("surrogate"),
        Some(surrogate_id)
    );
}

#[test]
fn test_edit_relinks_new_identifiers() {
    let dir = tempdir().expect("temp dir");
    let (db, ingestor) = setup(&dir);

    ingestor
        .ingest_new(&text_event(1, 1000, "met 9999999999"))
        .expect("ingest");
    ingestor
        .ingest_edited(&text_event(1, 1000, "actually 8888888888"))
        .expect("edit");

    assert_eq!(db.count_by_identifier("9999999999").expect("old id"), 0);
    assert_eq!(db.count_by_identifier("8888888888").expect("new id"), 1);

    let hits = db.search_by_identifier("8888888888", 5, 0).expect("search");
    assert_eq!(hits[0].text.as_deref(), Some("actually 8888888888"));
}

#[test]
fn test_edit_of_never_ingested_message_is_dropped() {
    let dir = tempdir().expect("temp dir");
    let (db, ingestor) = setup(&dir);

    let outcome = ingestor
        .ingest_edited(&text_event(77, 1000, "late edit 9999999999"))
        .expect("edit");
    assert_eq!(outcome, IngestOutcome::NeverIngested);
    // edits never create rows
    assert_eq!(db.count_stats().expect("stats").total_messages, 0);
}

#[test]
fn test_edit_in_unauthorized_chat_is_dropped() {
    let dir = tempdir().expect("temp dir");
    let (_db, ingestor) = setup(&dir);

    let mut event = text_event(1, 1000, "9999999999");
    event.chat_id = -1;
    let outcome = ingestor.ingest_edited(&event).expect("edit");
    assert_eq!(outcome, IngestOutcome::ChatNotAuthorized);
}

#[test]
fn test_media_attributes_survive_edits() {
    let dir = tempdir().expect("temp dir");
    let (db, ingestor) = setup(&dir);

    let event = MessageEvent {
        chat_id: CHAT_ID,
        message_id: 1,
        date: 1000,
        caption: Some("photo of 9999999999".to_string()),
        photo: Some("photo-ref".to_string()),
        ..MessageEvent::default()
    };
    ingestor.ingest_new(&event).expect("ingest");

    // the edit event carries no attachment; media fields must keep their
    // insert-time values regardless
    ingestor
        .ingest_edited(&text_event(1, 1000, "now 8888888888"))
        .expect("edit");

    let hits = db.search_by_identifier("8888888888", 5, 0).expect("search");
    assert_eq!(hits[0].media_type, MediaKind::Photo);
    assert_eq!(hits[0].file_id.as_deref(), Some("photo-ref"));
}
