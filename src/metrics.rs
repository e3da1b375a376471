use metrics::counter;

use crate::error::{IdHistoryError, Result};

/// Metrics collection and management
///
/// Metric names are stable `id_history_*` identifiers; label values come from
/// the components' outcome kinds. Without an installed exporter the default
/// no-op recorder swallows everything.
#[derive(Debug, Clone, Copy)]
pub struct MetricsCollector {
    // Ingestion metrics
    pub messages_ingested_total: &'static str,

    // Search metrics
    pub searches_total: &'static str,

    // Authorization metrics
    pub auth_events_total: &'static str,

    // Export metrics
    pub exports_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            messages_ingested_total: "id_history_messages_ingested_total",
            searches_total: "id_history_searches_total",
            auth_events_total: "id_history_auth_events_total",
            exports_total: "id_history_exports_total",
        }
    }
}

impl MetricsCollector {
    /// Initialize metrics collection
    pub fn init() -> Result<()> {
        // Initialize the metrics recorder
        metrics::set_global_recorder(metrics::NoopRecorder)
            .map_err(|e| IdHistoryError::Other(format!("Failed to initialize metrics recorder: {e}")))?;

        Ok(())
    }

    /// Count one processed ingest event by outcome kind.
    pub fn record_ingest(&self, outcome: &'static str) {
        counter!(self.messages_ingested_total, "outcome" => outcome).increment(1);
    }

    /// Count one search by result kind (hit / not_found / rate_limited).
    pub fn record_search(&self, result: &'static str) {
        counter!(self.searches_total, "result" => result).increment(1);
    }

    /// Count one authorization protocol event by kind.
    pub fn record_auth(&self, event: &'static str) {
        counter!(self.auth_events_total, "event" => event).increment(1);
    }

    /// Count one completed export by format.
    pub fn record_export(&self, format: &'static str) {
        counter!(self.exports_total, "format" => format).increment(1);
    }
}
