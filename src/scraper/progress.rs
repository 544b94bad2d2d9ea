use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::ListingRecord;

/// Receives progress reports from a running harvest.
pub trait StatusSink: Send + Sync {
    /// `percent` is 0..=100
    fn progress(&self, percent: u8, message: &str);

    /// Number of candidates the reconciler is about to process
    fn candidates_found(&self, _count: usize) {}

    /// A record passed deduplication and was appended
    fn record_accepted(&self, _record: &ListingRecord) {}
}

/// Sink that only logs.
pub struct LogSink;

impl StatusSink for LogSink {
    fn progress(&self, percent: u8, message: &str) {
        tracing::info!(percent, "{}", message);
    }

    fn candidates_found(&self, count: usize) {
        tracing::info!("Collecting details for {} listings", count);
    }

    fn record_accepted(&self, record: &ListingRecord) {
        tracing::debug!(name = record.name.as_str(), "Listing accepted");
    }
}

/// Sink that keeps every report; handy for one-shot runs and tests.
#[derive(Default)]
pub struct CollectingSink {
    pub reports: Mutex<Vec<(u8, String)>>,
    pub records: Mutex<Vec<ListingRecord>>,
}

impl StatusSink for CollectingSink {
    fn progress(&self, percent: u8, message: &str) {
        tracing::info!(percent, "{}", message);
        if let Ok(mut reports) = self.reports.lock() {
            reports.push((percent, message.to_string()));
        }
    }

    fn record_accepted(&self, record: &ListingRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}

/// Shared cancellation flag checked at every suspension point.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_shared_between_clones() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(!other.is_cancelled());
        flag.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn test_collecting_sink_records_reports() {
        let sink = CollectingSink::default();
        sink.progress(10, "Opening");
        sink.record_accepted(&ListingRecord::new("A", "u"));
        assert_eq!(sink.reports.lock().unwrap().len(), 1);
        assert_eq!(sink.records.lock().unwrap().len(), 1);
    }
}
