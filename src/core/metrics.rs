//! Logger metrics for observability
//!
//! Counters for the local sinks and the upload path. All counters are
//! relaxed atomics; a snapshot is taken with `clone()`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use agent_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_written();
/// metrics.record_upload_failure();
///
/// assert_eq!(metrics.records_written(), 1);
/// assert_eq!(metrics.upload_failures(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records written to at least one local sink or the backlog
    records_written: AtomicU64,

    /// Records rejected by both the local and the remote level filters
    records_filtered: AtomicU64,

    /// Sink write failures; the record is lost for that sink
    sink_failures: AtomicU64,

    /// Log calls dropped because the worker queue was full
    queue_full_events: AtomicU64,

    /// Successful deliveries
    uploads_succeeded: AtomicU64,

    /// Failed delivery attempts
    upload_failures: AtomicU64,

    /// Payload bytes delivered
    bytes_uploaded: AtomicU64,

    /// Pending payloads discarded to stay under the queue cap
    payloads_dropped: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            records_written: AtomicU64::new(0),
            records_filtered: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            uploads_succeeded: AtomicU64::new(0),
            upload_failures: AtomicU64::new(0),
            bytes_uploaded: AtomicU64::new(0),
            payloads_dropped: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn records_filtered(&self) -> u64 {
        self.records_filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn uploads_succeeded(&self) -> u64 {
        self.uploads_succeeded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn upload_failures(&self) -> u64 {
        self.upload_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn bytes_uploaded(&self) -> u64 {
        self.bytes_uploaded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn payloads_dropped(&self) -> u64 {
        self.payloads_dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_written(&self) -> u64 {
        self.records_written.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.records_filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_failure(&self) -> u64 {
        self.sink_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a successful delivery of `bytes` payload bytes
    #[inline]
    pub fn record_upload_success(&self, bytes: u64) -> u64 {
        self.bytes_uploaded.fetch_add(bytes, Ordering::Relaxed);
        self.uploads_succeeded.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_upload_failure(&self) -> u64 {
        self.upload_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_payload_dropped(&self) -> u64 {
        self.payloads_dropped.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of delivery attempts that failed, as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been attempted.
    pub fn upload_failure_rate(&self) -> f64 {
        let failed = self.upload_failures() as f64;
        let total = self.uploads_succeeded() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.records_written.store(0, Ordering::Relaxed);
        self.records_filtered.store(0, Ordering::Relaxed);
        self.sink_failures.store(0, Ordering::Relaxed);
        self.queue_full_events.store(0, Ordering::Relaxed);
        self.uploads_succeeded.store(0, Ordering::Relaxed);
        self.upload_failures.store(0, Ordering::Relaxed);
        self.bytes_uploaded.store(0, Ordering::Relaxed);
        self.payloads_dropped.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            records_written: AtomicU64::new(self.records_written()),
            records_filtered: AtomicU64::new(self.records_filtered()),
            sink_failures: AtomicU64::new(self.sink_failures()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
            uploads_succeeded: AtomicU64::new(self.uploads_succeeded()),
            upload_failures: AtomicU64::new(self.upload_failures()),
            bytes_uploaded: AtomicU64::new(self.bytes_uploaded()),
            payloads_dropped: AtomicU64::new(self.payloads_dropped()),
        }
    }
}
