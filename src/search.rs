//! Search and pagination engine.
//!
//! Serves bounded pages over the identifier index, most recent first, with
//! cursor-style continuation offsets. The initiating search passes the
//! per-user rate-limit gate and is logged exactly once; continuation fetches
//! are neither gated nor re-logged.

use std::sync::Arc;

use tracing::debug;

use crate::db::Database;
use crate::error::{IdHistoryError, Result};
use crate::metrics::MetricsCollector;
use crate::models::{SearchLogEntry, SearchPage, Stats};

/// Query type tag written to the search log.
pub const QUERY_TYPE_IDENTIFIER: &str = "identifier";

/// Search entry point over the store.
pub struct SearchEngine {
    db: Arc<Database>,
    page_size: u64,
    min_search_interval: i64,
    metrics: MetricsCollector,
}

impl SearchEngine {
    /// Create an engine with the given page size and rate-limit interval.
    #[must_use]
    pub fn new(db: Arc<Database>, page_size: u64, min_search_interval: i64) -> Self {
        Self {
            db,
            page_size,
            min_search_interval,
            metrics: MetricsCollector::default(),
        }
    }

    /// Service a top-level search: rate-limit gate, log once, first page.
    ///
    /// A rejected gate surfaces as [`IdHistoryError::RateLimited`] and leaves
    /// the limiter window untouched. An identifier with zero matches yields an
    /// empty page (`total == 0`), which is the neutral not-found signal, not
    /// an error.
    pub fn search(&self, user_id: i64, identifier: &str, now: i64) -> Result<SearchPage> {
        if !self
            .db
            .rate_limit_allowed(user_id, now, self.min_search_interval)?
        {
            debug!(user_id, identifier, "search rejected by rate limiter");
            self.metrics.record_search("rate_limited");
            return Err(IdHistoryError::RateLimited(self.min_search_interval));
        }

        self.db
            .log_search(user_id, QUERY_TYPE_IDENTIFIER, identifier)?;
        let page = self.page(identifier, 0)?;
        self.metrics
            .record_search(if page.is_empty() { "not_found" } else { "hit" });
        Ok(page)
    }

    /// Fetch a continuation page at `offset`. Not logged, not rate-limited.
    pub fn next_page(&self, identifier: &str, offset: u64) -> Result<SearchPage> {
        self.page(identifier, offset)
    }

    fn page(&self, identifier: &str, offset: u64) -> Result<SearchPage> {
        let total = self.db.count_by_identifier(identifier)?;
        if total == 0 {
            return Ok(SearchPage {
                items: Vec::new(),
                total: 0,
                offset,
                next_offset: None,
            });
        }

        let items = self
            .db
            .search_by_identifier(identifier, self.page_size, offset)?;
        let next = offset + self.page_size;
        Ok(SearchPage {
            items,
            total,
            offset,
            next_offset: (next < total).then_some(next),
        })
    }

    /// A user's recent logged searches, newest first.
    pub fn recent_searches(&self, user_id: i64, limit: u64) -> Result<Vec<SearchLogEntry>> {
        self.db.get_user_searches(user_id, limit)
    }

    /// Aggregate index counters.
    pub fn stats(&self) -> Result<Stats> {
        self.db.count_stats()
    }
}
