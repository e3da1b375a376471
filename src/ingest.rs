//! Ingestion pipeline for incoming and edited group messages.
//!
//! Consumes platform message events, applies the extractor, and updates the
//! store. A message is stored only when its chat is authorized, its text is
//! non-empty, and at least one identifier was extracted; edits update the
//! existing row and relink identifiers from the new text.

use std::sync::Arc;

use tracing::{debug, info};

use crate::db::Database;
use crate::error::Result;
use crate::extractor;
use crate::metrics::MetricsCollector;
use crate::models::{MessageEvent, NewMessage};

/// Terminal result of processing one message event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// New message stored and linked
    Stored {
        /// Surrogate id of the stored row
        surrogate_id: i64,
        /// Number of identifiers linked
        linked: usize,
    },
    /// Existing message updated and relinked
    Updated {
        /// Surrogate id of the updated row
        surrogate_id: i64,
        /// Number of identifiers linked after the edit
        linked: usize,
    },
    /// Dropped: the chat is not authorized for ingestion
    ChatNotAuthorized,
    /// Dropped: no text or caption to index
    EmptyText,
    /// Dropped: text carries no identifier
    NoIdentifiers,
    /// Dropped: edit for a message that was never ingested
    NeverIngested,
}

impl IngestOutcome {
    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Stored { .. } => "stored",
            Self::Updated { .. } => "updated",
            Self::ChatNotAuthorized => "chat_not_authorized",
            Self::EmptyText => "empty_text",
            Self::NoIdentifiers => "no_identifiers",
            Self::NeverIngested => "never_ingested",
        }
    }
}

/// Consumes message events and keeps the identifier index current.
pub struct Ingestor {
    db: Arc<Database>,
    metrics: MetricsCollector,
}

impl Ingestor {
    /// Create a pipeline over the given store.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            metrics: MetricsCollector::default(),
        }
    }

    /// Process a new-message event.
    pub fn ingest_new(&self, event: &MessageEvent) -> Result<IngestOutcome> {
        let outcome = self.ingest_new_inner(event)?;
        self.metrics.record_ingest(outcome.kind());
        debug!(
            chat_id = event.chat_id,
            message_id = event.message_id,
            outcome = outcome.kind(),
            "ingest"
        );
        Ok(outcome)
    }

    fn ingest_new_inner(&self, event: &MessageEvent) -> Result<IngestOutcome> {
        if self.db.get_authorized_chat(event.chat_id)?.is_none() {
            return Ok(IngestOutcome::ChatNotAuthorized);
        }

        let (text, media_type, file_id) = extractor::classify(event);
        if text.is_empty() {
            return Ok(IngestOutcome::EmptyText);
        }

        let identifiers = extractor::extract_identifiers(&text);
        if identifiers.is_empty() {
            return Ok(IngestOutcome::NoIdentifiers);
        }

        let surrogate_id = self.db.save_message(&NewMessage {
            chat_id: event.chat_id,
            message_id: event.message_id,
            sender_id: event.sender_id,
            sender_username: event.sender_username.clone(),
            sender_first_name: event.sender_first_name.clone(),
            date: event.date,
            text,
            media_type,
            file_id,
            is_forward: event.is_forward,
        })?;

        let linked = self
            .db
            .link_identifiers(surrogate_id, identifiers.iter().map(String::as_str))?;

        info!(
            chat_id = event.chat_id,
            message_id = event.message_id,
            surrogate_id,
            linked,
            "message indexed"
        );
        Ok(IngestOutcome::Stored {
            surrogate_id,
            linked,
        })
    }

    /// Process an edited-message event.
    ///
    /// The row's text is updated and its links rebuilt from the new text, even
    /// when the new identifier set is empty. Media attributes keep their
    /// insert-time values. An edit for a never-ingested message is dropped;
    /// edits do not create rows.
    pub fn ingest_edited(&self, event: &MessageEvent) -> Result<IngestOutcome> {
        let outcome = self.ingest_edited_inner(event)?;
        self.metrics.record_ingest(outcome.kind());
        debug!(
            chat_id = event.chat_id,
            message_id = event.message_id,
            outcome = outcome.kind(),
            "ingest edit"
        );
        Ok(outcome)
    }

    fn ingest_edited_inner(&self, event: &MessageEvent) -> Result<IngestOutcome> {
        if self.db.get_authorized_chat(event.chat_id)?.is_none() {
            return Ok(IngestOutcome::ChatNotAuthorized);
        }

        let Some(surrogate_id) = self
            .db
            .message_surrogate_id(event.chat_id, event.message_id)?
        else {
            return Ok(IngestOutcome::NeverIngested);
        };

        let (text, _, _) = extractor::classify(event);
        self.db
            .update_message_text(event.chat_id, event.message_id, &text)?;
        self.db.unlink_all_identifiers(surrogate_id)?;

        let identifiers = extractor::extract_identifiers(&text);
        let linked = self
            .db
            .link_identifiers(surrogate_id, identifiers.iter().map(String::as_str))?;

        Ok(IngestOutcome::Updated {
            surrogate_id,
            linked,
        })
    }
}
