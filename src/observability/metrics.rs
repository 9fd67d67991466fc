//! Metrics recording.
//!
//! # Metrics
//! - `ctf_transactions_submitted_total` (counter): relayed captures accepted by a relay
//! - `ctf_relay_events_total` (counter): relay lifecycle events, by `kind`
//! - `ctf_event_scan_failures_total` (counter): recent-event scans that degraded to empty
//! - `ctf_block_timestamp_cache_size` (gauge): memoized block timestamps
//!
//! No exporter is installed here. A host application picks the recorder.

/// Record a transaction handed to a relay.
pub fn record_transaction_submitted() {
    ::metrics::counter!("ctf_transactions_submitted_total").increment(1);
}

/// Record a relay lifecycle event.
pub fn record_relay_event(kind: &'static str) {
    ::metrics::counter!("ctf_relay_events_total", "kind" => kind).increment(1);
}

/// Record a recent-event scan that failed and returned nothing.
pub fn record_event_scan_failure() {
    ::metrics::counter!("ctf_event_scan_failures_total").increment(1);
}

/// Record the number of memoized block timestamps.
pub fn record_cache_size(size: usize) {
    ::metrics::gauge!("ctf_block_timestamp_cache_size").set(size as f64);
}
