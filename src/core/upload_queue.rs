//! Pending upload payloads with single-flight delivery and retry backoff
//!
//! Remote-admitted records are first persisted to a backlog [`FileSink`].
//! `enqueue_current_log` moves the unread tail of the backlog into the
//! in-memory queue, extending the last payload when it has not been handed
//! out yet. `begin_drain` hands the head payload out for delivery and
//! `complete` applies the outcome. The queue owns no threads; the logger's
//! worker drives it.

use super::error::{LoggerError, Result};
use super::log_record::frame_json_array;
use crate::appenders::FileSink;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::Write;
use std::time::{Duration, Instant};

/// Default cap for one coalesced payload (1 MiB)
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Default cap for the number of pending payloads
///
/// Payloads queued while the ingest key or entity guid is missing do not
/// count against the cap and are never dropped, so memory grows with
/// whatever is logged before credentials arrive.
pub const DEFAULT_MAX_PENDING_PAYLOADS: usize = 64;

/// Retry delay after failed deliveries
///
/// `delay(n) = min(initial * multiplier^(n-1), max)` for `n` consecutive
/// failures, which never decreases as `n` grows.
///
/// # Example
///
/// ```
/// use agent_logger::BackoffPolicy;
/// use std::time::Duration;
///
/// let policy = BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(10), 2);
/// assert_eq!(policy.delay(1), Duration::from_secs(1));
/// assert_eq!(policy.delay(3), Duration::from_secs(4));
/// assert_eq!(policy.delay(9), Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: u32,
}

impl BackoffPolicy {
    pub const fn new(initial: Duration, max: Duration, multiplier: u32) -> Self {
        Self {
            initial,
            max,
            multiplier,
        }
    }

    pub fn delay(&self, failure_count: u32) -> Duration {
        if failure_count == 0 {
            return Duration::ZERO;
        }
        let factor = self
            .multiplier
            .max(1)
            .checked_pow(failure_count - 1)
            .unwrap_or(u32::MAX);
        self.initial
            .checked_mul(factor)
            .unwrap_or(self.max)
            .min(self.max)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(300), 2)
    }
}

/// One batch of separated records awaiting delivery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    data: Vec<u8>,
}

impl Payload {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn extend(&mut self, more: &[u8]) {
        self.data.extend_from_slice(more);
    }

    /// Request body: the records framed as a JSON array, gzip-compressed
    /// when `compress` is set
    pub fn to_body(&self, compress: bool) -> Result<Vec<u8>> {
        let framed = frame_json_array(&self.data);
        if !compress {
            return Ok(framed);
        }

        let mut encoder = GzEncoder::new(Vec::with_capacity(framed.len() / 4), Compression::default());
        encoder
            .write_all(&framed)
            .map_err(|e| LoggerError::io_operation("compressing payload", "gzip write failed", e))?;
        encoder
            .finish()
            .map_err(|e| LoggerError::io_operation("compressing payload", "gzip finish failed", e))
    }
}

/// Snapshot of the queue state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UploadStatus {
    pub pending_payloads: usize,
    pub pending_bytes: usize,
    pub is_uploading: bool,
    pub failure_count: u32,
}

/// Result of moving backlog bytes into the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnqueueOutcome {
    pub bytes: usize,
    pub payloads_dropped: usize,
}

/// A payload handed out for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub body: Vec<u8>,
}

pub struct UploadQueue {
    backlog: FileSink,
    pending: VecDeque<Payload>,
    is_uploading: bool,
    failure_count: u32,
    retry_at: Option<Instant>,
    /// Set when a drain was refused for missing credentials
    awaiting_credentials: bool,
    /// Head payloads queued while credentials were missing; exempt from the cap
    deferred_payloads: usize,
    backoff: BackoffPolicy,
    max_payload_bytes: usize,
    max_pending_payloads: usize,
    compress: bool,
}

impl UploadQueue {
    pub fn new(backlog: FileSink) -> Self {
        Self {
            backlog,
            pending: VecDeque::new(),
            is_uploading: false,
            failure_count: 0,
            retry_at: None,
            awaiting_credentials: false,
            deferred_payloads: 0,
            backoff: BackoffPolicy::default(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            max_pending_payloads: DEFAULT_MAX_PENDING_PAYLOADS,
            compress: false,
        }
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn with_max_payload_bytes(mut self, max: usize) -> Self {
        self.max_payload_bytes = max;
        self
    }

    /// Cap on pending payloads; values below 1 are raised to 1
    #[must_use]
    pub fn with_max_pending_payloads(mut self, max: usize) -> Self {
        self.max_pending_payloads = max.max(1);
        self
    }

    #[must_use]
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn backlog(&self) -> &FileSink {
        &self.backlog
    }

    pub fn is_uploading(&self) -> bool {
        self.is_uploading
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// When the next retry is due, if a failed delivery is backing off
    pub fn retry_deadline(&self) -> Option<Instant> {
        self.retry_at
    }

    pub fn pending(&self) -> impl Iterator<Item = &Payload> {
        self.pending.iter()
    }

    pub fn status(&self) -> UploadStatus {
        UploadStatus {
            pending_payloads: self.pending.len(),
            pending_bytes: self.pending.iter().map(Payload::len).sum(),
            is_uploading: self.is_uploading,
            failure_count: self.failure_count,
        }
    }

    /// Persist one serialized record to the backlog. When the backlog is
    /// full its unread tail is queued first, then the file is truncated.
    pub fn stage(&mut self, line: &[u8]) -> Result<EnqueueOutcome> {
        let mut outcome = EnqueueOutcome::default();
        if !self.backlog.has_room_for(line.len() as u64)? {
            outcome = self.enqueue_current_log()?;
            self.backlog.truncate()?;
        }
        self.backlog.append_line(line)?;
        Ok(outcome)
    }

    /// Queue everything appended to the backlog since the last call
    pub fn enqueue_current_log(&mut self) -> Result<EnqueueOutcome> {
        let delta = self.backlog.size_delta()?;
        if delta.is_empty() {
            return Ok(EnqueueOutcome::default());
        }

        let bytes = delta.len();
        // The head is frozen while it is being delivered.
        let tail_in_flight = self.is_uploading && self.pending.len() == 1;
        match self.pending.back_mut() {
            Some(tail) if !tail_in_flight && tail.len() + bytes <= self.max_payload_bytes => {
                tail.extend(&delta);
            }
            _ => self.pending.push_back(Payload::new(delta)),
        }

        let mut payloads_dropped = 0;
        if self.awaiting_credentials {
            self.deferred_payloads = self.pending.len();
        } else {
            while self.pending.len() > self.max_pending_payloads + self.deferred_payloads {
                let oldest_idle = self.deferred_payloads.max(usize::from(self.is_uploading));
                if self.pending.remove(oldest_idle).is_none() {
                    break;
                }
                payloads_dropped += 1;
            }
        }

        Ok(EnqueueOutcome {
            bytes,
            payloads_dropped,
        })
    }

    /// Hand out the head payload if a delivery may start now.
    ///
    /// Returns `Ok(None)` when a delivery is already outstanding, nothing is
    /// pending, or a retry is still backing off. Missing credentials are
    /// reported as [`LoggerError::MissingCredentials`]; the payload stays
    /// queued.
    pub fn begin_drain(
        &mut self,
        ingest_key: &str,
        entity_guid: &str,
        now: Instant,
    ) -> Result<Option<Delivery>> {
        if self.is_uploading || self.pending.is_empty() {
            return Ok(None);
        }
        match self.retry_at {
            Some(at) if now < at => return Ok(None),
            // Elapsed deadlines are consumed so a deferred drain waits for
            // the next trigger instead of firing again immediately.
            Some(_) => self.retry_at = None,
            None => {}
        }
        let missing = if ingest_key.is_empty() {
            Some("ingest key")
        } else if entity_guid.is_empty() {
            Some("entity guid")
        } else {
            None
        };
        if let Some(field) = missing {
            self.awaiting_credentials = true;
            self.deferred_payloads = self.pending.len();
            return Err(LoggerError::missing_credentials(field));
        }
        self.awaiting_credentials = false;

        let body = match self.pending.front() {
            Some(head) => head.to_body(self.compress)?,
            None => return Ok(None),
        };

        self.is_uploading = true;
        Ok(Some(Delivery { body }))
    }

    /// Apply the outcome of the outstanding delivery. Returns the delay
    /// before the next attempt on failure.
    pub fn complete(&mut self, delivered: bool, now: Instant) -> Result<Option<Duration>> {
        if !self.is_uploading {
            return Ok(None);
        }
        self.is_uploading = false;

        if delivered {
            self.pending.pop_front();
            self.deferred_payloads = self.deferred_payloads.saturating_sub(1);
            self.failure_count = 0;
            self.retry_at = None;

            if self.pending.is_empty() && self.backlog.unread_len() == 0 {
                self.backlog.truncate()?;
            }
            Ok(None)
        } else {
            self.failure_count = self.failure_count.saturating_add(1);
            let delay = self.backoff.delay(self.failure_count);
            self.retry_at = Some(now + delay);
            Ok(Some(delay))
        }
    }
}
