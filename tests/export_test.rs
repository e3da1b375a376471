//! Integration tests for CSV/JSON export of indexed history.

use std::fs;

use id_history::db::Database;
use id_history::export::export_by_identifier;
use id_history::models::{ExportFormat, MediaKind, NewMessage};
use tempfile::tempdir;

const IDENTIFIER: &str = "9999999999";

fn seeded_db(dir: &tempfile::TempDir) -> Database {
    let db_path = dir.path().join("test.db");
    let db = Database::new(&format!("sqlite://{}", db_path.display()))
        .expect("Failed to create database");

    let rows = [
        (1, 1000, "first line\nsecond line 9999999999"),
        (2, 2000, "short note 9999999999"),
    ];
    for (message_id, date, text) in rows {
        let surrogate = db
            .save_message(&NewMessage {
                chat_id: -1,
                message_id,
                sender_id: Some(42),
                sender_username: Some("sender".to_string()),
                sender_first_name: Some("Sender".to_string()),
                date,
                text: text.to_string(),
                media_type: MediaKind::Text,
                file_id: None,
                is_forward: false,
            })
            .expect("save");
        db.link_identifiers(surrogate, [IDENTIFIER]).expect("link");
    }
    db
}

#[test]
fn test_csv_export_layout() {
    let dir = tempdir().expect("temp dir");
    let db = seeded_db(&dir);
    let output_dir = dir.path().join("output");

    let path = export_by_identifier(&db, IDENTIFIER, ExportFormat::Csv, &output_dir)
        .expect("export")
        .expect("file written");
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some("export_9999999999.csv")
    );

    let content = fs::read_to_string(&path).expect("read csv");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3); // header + 2 rows
    assert_eq!(
        lines[0],
        "chat_id,message_id,date,text,media_type,sender_id,sender_username,identifier"
    );
    // most recent first, matching search ordering
    assert!(lines[1].contains("short note 9999999999"));
    // newlines inside text are flattened so the message stays on one record
    assert!(lines[2].contains("first line second line 9999999999"));
    assert!(lines[1].ends_with(IDENTIFIER));
}

#[test]
fn test_json_export_layout() {
    let dir = tempdir().expect("temp dir");
    let db = seeded_db(&dir);
    let output_dir = dir.path().join("output");

    let path = export_by_identifier(&db, IDENTIFIER, ExportFormat::Json, &output_dir)
        .expect("export")
        .expect("file written");

    let content = fs::read_to_string(&path).expect("read json");
    let rows: Vec<serde_json::Value> = serde_json::from_str(&content).expect("parse json");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["date"], 2000);
    assert_eq!(rows[0]["identifier"], IDENTIFIER);
    assert_eq!(rows[1]["media_type"], "text");
    // JSON keeps the original text untouched, newline included
    assert_eq!(rows[1]["text"], "first line\nsecond line 9999999999");
}

#[test]
fn test_empty_result_set_writes_nothing() {
    let dir = tempdir().expect("temp dir");
    let db = seeded_db(&dir);
    let output_dir = dir.path().join("output");

    let written = export_by_identifier(&db, "1234567890", ExportFormat::Csv, &output_dir)
        .expect("export");
    assert!(written.is_none());
    // the output directory is not even created for an empty export
    assert!(!output_dir.exists());
}
