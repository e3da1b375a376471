//! Export of indexed history for a single identifier.
//!
//! This module writes the full unpaged row set for an identifier to a file in
//! CSV or JSON format with consistent column layout. Newlines inside message
//! text are flattened to spaces in CSV output so each message stays on one
//! record.

use std::fs::{create_dir_all, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use csv::Writer;

use crate::db::Database;
use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::models::{ExportFormat, StoredMessage};

/// Export every message linked to `identifier` into `output_dir`.
///
/// Returns the written path, or `None` when the identifier matches nothing
/// (no file is created for an empty result set).
pub fn export_by_identifier(
    db: &Database,
    identifier: &str,
    format: ExportFormat,
    output_dir: &Path,
) -> Result<Option<PathBuf>> {
    let messages = db.export_by_identifier(identifier)?;
    if messages.is_empty() {
        return Ok(None);
    }

    create_dir_all(output_dir)?;
    let file_path = output_dir.join(format!("export_{identifier}.{}", format.extension()));

    match format {
        ExportFormat::Csv => write_csv_file(&messages, identifier, &file_path)?,
        ExportFormat::Json => write_json_file(&messages, identifier, &file_path)?,
    }

    MetricsCollector::default().record_export(format.extension());
    Ok(Some(file_path))
}

/// Write messages to a CSV file.
///
/// Includes header row: `chat_id, message_id, date, text, media_type,
/// sender_id, sender_username, identifier`
fn write_csv_file(messages: &[StoredMessage], identifier: &str, file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record([
        "chat_id",
        "message_id",
        "date",
        "text",
        "media_type",
        "sender_id",
        "sender_username",
        "identifier",
    ])?;

    for message in messages {
        writer.write_record([
            message.chat_id.to_string(),
            message.message_id.to_string(),
            message.date.to_string(),
            message
                .text
                .as_deref()
                .unwrap_or_default()
                .replace('\n', " "),
            message.media_type.as_str().to_string(),
            message
                .sender_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            message.sender_username.clone().unwrap_or_default(),
            identifier.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write messages to a JSON file as an array of objects.
fn write_json_file(messages: &[StoredMessage], identifier: &str, file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let writer = BufWriter::new(file);

    let json_messages: Vec<serde_json::Value> = messages
        .iter()
        .map(|m| {
            serde_json::json!({
                "chat_id": m.chat_id,
                "message_id": m.message_id,
                "date": m.date,
                "text": m.text,
                "media_type": m.media_type.as_str(),
                "sender_id": m.sender_id,
                "sender_username": m.sender_username,
                "identifier": identifier,
            })
        })
        .collect();

    serde_json::to_writer_pretty(writer, &json_messages)?;
    Ok(())
}
