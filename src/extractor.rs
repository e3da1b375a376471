//! Identifier extraction and media classification.
//!
//! Pure functions over incoming message attributes: no state, no errors.
//! Malformed or absent text simply yields no identifiers.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{MediaKind, MessageEvent};

/// Length of an indexable identifier, in ASCII digits.
pub const IDENTIFIER_LEN: usize = 10;

/// Maximal digit runs; exact-length filtering happens on the match.
#[allow(clippy::unwrap_used)] // the pattern itself cannot fail to compile
fn digit_run_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("[0-9]+").unwrap())
}

/// Extract the set of candidate identifiers from message text.
///
/// An identifier is a maximal run of exactly ten consecutive digits: a run of
/// eleven or more digits contributes nothing, so identifiers embedded in longer
/// numbers are never matched. Duplicates collapse; iteration order is the
/// set's lexicographic order.
#[must_use]
pub fn extract_identifiers(text: &str) -> BTreeSet<String> {
    digit_run_pattern()
        .find_iter(text)
        .filter(|m| m.as_str().len() == IDENTIFIER_LEN)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// First identifier in the text, in document order.
///
/// Used to derive a chat's binding identifier from its display title, where
/// the first match wins.
#[must_use]
pub fn first_identifier(text: &str) -> Option<String> {
    digit_run_pattern()
        .find_iter(text)
        .find(|m| m.as_str().len() == IDENTIFIER_LEN)
        .map(|m| m.as_str().to_string())
}

/// Classify a message event into its text, media kind, and media reference.
///
/// Attachment kinds are examined in fixed priority order (photo > video >
/// document > voice > audio > sticker); the first present kind wins. Without
/// any attachment the kind is [`MediaKind::Text`]. The returned text is the
/// message body, falling back to the caption, falling back to empty.
#[must_use]
pub fn classify(event: &MessageEvent) -> (String, MediaKind, Option<String>) {
    let text = event
        .text
        .clone()
        .or_else(|| event.caption.clone())
        .unwrap_or_default();

    let (kind, file_id) = if let Some(file) = &event.photo {
        (MediaKind::Photo, Some(file.clone()))
    } else if let Some(file) = &event.video {
        (MediaKind::Video, Some(file.clone()))
    } else if let Some(file) = &event.document {
        (MediaKind::Document, Some(file.clone()))
    } else if let Some(file) = &event.voice {
        (MediaKind::Voice, Some(file.clone()))
    } else if let Some(file) = &event.audio {
        (MediaKind::Audio, Some(file.clone()))
    } else if let Some(file) = &event.sticker {
        (MediaKind::Sticker, Some(file.clone()))
    } else {
        (MediaKind::Text, None)
    };

    (text, kind, file_id)
}
