//! Data models for message handling and storage
//!
//! This module contains all data structures used throughout the application,
//! including incoming platform events, database models, and search results.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Media classification of a message, in extraction priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    /// Photo attachment
    Photo,
    /// Video attachment
    Video,
    /// Document attachment
    Document,
    /// Voice note attachment
    Voice,
    /// Audio attachment
    Audio,
    /// Sticker attachment
    Sticker,
    /// Plain text, no attachment
    Text,
}

impl MediaKind {
    /// Stable string form stored in the `media_type` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Document => "document",
            Self::Voice => "voice",
            Self::Audio => "audio",
            Self::Sticker => "sticker",
            Self::Text => "text",
        }
    }

    /// Parse the stored string form; unknown values fall back to `Text`.
    #[must_use]
    pub fn from_str_or_text(s: &str) -> Self {
        match s {
            "photo" => Self::Photo,
            "video" => Self::Video,
            "document" => Self::Document,
            "voice" => Self::Voice,
            "audio" => Self::Audio,
            "sticker" => Self::Sticker,
            _ => Self::Text,
        }
    }
}

/// A user's standing within a specific chat, as reported by the messaging platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatStanding {
    /// Not a participant of the chat
    NotMember,
    /// Ordinary participant
    Member,
    /// Chat administrator
    Administrator,
    /// Chat owner
    Owner,
}

impl ChatStanding {
    /// True for administrator or owner standing.
    #[must_use]
    pub const fn is_chat_admin(&self) -> bool {
        matches!(self, Self::Administrator | Self::Owner)
    }
}

/// An incoming message event from the messaging platform.
///
/// Carries the raw attributes the ingestion pipeline needs; attachment fields
/// hold the platform-specific file reference when that kind is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Chat the message was posted in
    pub chat_id: i64,
    /// Platform-assigned message id, unique within the chat
    pub message_id: i64,
    /// Sender user id, if known
    pub sender_id: Option<i64>,
    /// Sender username, if set
    pub sender_username: Option<String>,
    /// Sender first name, if known
    pub sender_first_name: Option<String>,
    /// Message timestamp (unix seconds)
    pub date: i64,
    /// Message body for text messages
    pub text: Option<String>,
    /// Caption for media messages
    pub caption: Option<String>,
    /// Photo file reference
    pub photo: Option<String>,
    /// Video file reference
    pub video: Option<String>,
    /// Document file reference
    pub document: Option<String>,
    /// Voice note file reference
    pub voice: Option<String>,
    /// Audio file reference
    pub audio: Option<String>,
    /// Sticker file reference
    pub sticker: Option<String>,
    /// True when the message was forwarded from another user or chat
    pub is_forward: bool,
}

/// Database representation of a stored message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Surrogate primary key
    pub id: i64,
    /// Chat the message belongs to
    pub chat_id: i64,
    /// Platform message id within the chat
    pub message_id: i64,
    /// Sender user id, if known
    pub sender_id: Option<i64>,
    /// Sender username, if set
    pub sender_username: Option<String>,
    /// Sender first name, if known
    pub sender_first_name: Option<String>,
    /// Message timestamp (unix seconds)
    pub date: i64,
    /// Message text content
    pub text: Option<String>,
    /// Media classification at insert time
    pub media_type: MediaKind,
    /// Platform media reference at insert time
    pub file_id: Option<String>,
    /// True when the message was forwarded
    pub is_forward: bool,
}

/// Fields required to insert a message row.
#[derive(Debug, Clone)]
pub struct NewMessage {
    /// Chat the message belongs to
    pub chat_id: i64,
    /// Platform message id within the chat
    pub message_id: i64,
    /// Sender user id, if known
    pub sender_id: Option<i64>,
    /// Sender username, if set
    pub sender_username: Option<String>,
    /// Sender first name, if known
    pub sender_first_name: Option<String>,
    /// Message timestamp (unix seconds)
    pub date: i64,
    /// Message text content
    pub text: String,
    /// Media classification
    pub media_type: MediaKind,
    /// Platform media reference
    pub file_id: Option<String>,
    /// True when the message was forwarded
    pub is_forward: bool,
}

/// Database representation of a user.
#[derive(Debug, Clone)]
pub struct User {
    /// Platform user id
    pub user_id: i64,
    /// First name
    pub first_name: Option<String>,
    /// Last name
    pub last_name: Option<String>,
    /// Username
    pub username: Option<String>,
    /// Stored language preference, if any
    pub lang: Option<String>,
    /// Last upsert timestamp
    pub updated_at: NaiveDateTime,
}

/// A chat approved for ingestion, bound to the identifier from its title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedChat {
    /// Chat id
    pub chat_id: i64,
    /// Chat title at authorization time
    pub title: String,
    /// 10-digit identifier derived from the title
    pub female_id: String,
    /// Admin who authorized the chat
    pub added_by: i64,
    /// Authorization timestamp
    pub added_at: NaiveDateTime,
}

/// One row of the append-only search log.
#[derive(Debug, Clone)]
pub struct SearchLogEntry {
    /// Primary key
    pub id: i64,
    /// Searching user
    pub user_id: i64,
    /// Query type tag (e.g. "identifier")
    pub query_type: String,
    /// Queried value
    pub query_value: String,
    /// Log timestamp
    pub created_at: NaiveDateTime,
}

/// A bounded page of search results plus continuation state.
#[derive(Debug, Clone)]
pub struct SearchPage {
    /// Matching messages, most recent first
    pub items: Vec<StoredMessage>,
    /// Total number of matches for the identifier
    pub total: u64,
    /// Offset this page was fetched at
    pub offset: u64,
    /// Continuation offset, present only while more results remain
    pub next_offset: Option<u64>,
}

impl SearchPage {
    /// True when the identifier matched nothing at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Aggregate counters over the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Number of distinct identifiers linked to at least one message
    pub distinct_identifiers: u64,
    /// Total stored messages
    pub total_messages: u64,
    /// Number of authorized chats
    pub authorized_chats: u64,
}

/// A transient per-user action awaiting its follow-up input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingAction {
    /// Operator asked for an identifier export and owes us the identifier
    ExportByIdentifier,
}

/// Output format for exported search results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format
    Csv,
    /// JSON format
    Json,
}

impl ExportFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}
