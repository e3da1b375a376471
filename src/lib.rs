//! Id History - Message Indexing and Search
//!
//! A Rust library that ingests messages from authorized group chats, indexes
//! them by the 10-digit identifiers embedded in their text, and serves
//! search, pagination, and export over the indexed history. Chats opt in
//! through a secret-based authorization handshake; searches pass a per-user
//! rate-limit gate.
//!
//! # Features
//!
//! - Identifier extraction and media classification of platform events
//! - Durable SQLite store for messages, identifier links, and protocol state
//! - Cursor-style search pagination with a bounded page size
//! - Admin-driven chat authorization bound to the chat title's identifier
//! - CSV/JSON export of the full row set for an identifier

/// Chat authorization handshake
pub mod auth;
/// Configuration management
pub mod config;
/// Database operations and connection pooling
pub mod db;
/// Error types
pub mod error;
/// Search result export
pub mod export;
/// Identifier extraction and media classification
pub mod extractor;
/// Ingestion pipeline
pub mod ingest;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Database schema definitions
pub mod schema;
/// Search and pagination engine
pub mod search;
/// Per-user session state
pub mod session;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use auth::{ChatAuthorizer, ChatMembership};
pub use db::Database;
pub use error::{AuthFailure, IdHistoryError, Result};
pub use ingest::{IngestOutcome, Ingestor};
pub use models::{
    AuthorizedChat, ChatStanding, ExportFormat, MediaKind, MessageEvent, SearchPage, Stats,
    StoredMessage,
};
pub use search::SearchEngine;
pub use session::SessionStore;
