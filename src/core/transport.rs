//! Remote log delivery collaborator

use super::error::{LoggerError, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// Delivers one framed payload to the log-ingestion endpoint.
///
/// Called from the logger's uploader thread, never concurrently with
/// another `send` on the same logger. An `Err` is treated as a failed
/// attempt: the payload is kept and retried after a backoff delay.
pub trait RemoteLogTransport: Send + Sync {
    fn send(&self, payload: &[u8], ingest_key: &str, entity_guid: &str, url: &str) -> Result<()>;
}

impl<T: RemoteLogTransport + ?Sized> RemoteLogTransport for Arc<T> {
    fn send(&self, payload: &[u8], ingest_key: &str, entity_guid: &str, url: &str) -> Result<()> {
        (**self).send(payload, ingest_key, entity_guid, url)
    }
}

impl<T: RemoteLogTransport + ?Sized> RemoteLogTransport for Box<T> {
    fn send(&self, payload: &[u8], ingest_key: &str, entity_guid: &str, url: &str) -> Result<()> {
        (**self).send(payload, ingest_key, entity_guid, url)
    }
}

/// One delivery observed by [`MemoryTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedDelivery {
    pub payload: Vec<u8>,
    pub ingest_key: String,
    pub entity_guid: String,
    pub url: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    delivered: Vec<RecordedDelivery>,
    attempts: usize,
    failures_remaining: usize,
}

/// Transport that keeps payloads in memory
///
/// Cloned handles share state, so a test can hand one clone to the logger
/// and inspect deliveries through another.
///
/// # Example
///
/// ```
/// use agent_logger::{MemoryTransport, RemoteLogTransport};
///
/// let transport = MemoryTransport::new();
/// transport.fail_next(1);
///
/// assert!(transport.send(b"[]", "key", "guid", "url").is_err());
/// assert!(transport.send(b"[]", "key", "guid", "url").is_ok());
/// assert_eq!(transport.attempts(), 2);
/// assert_eq!(transport.deliveries().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` attempts with a transport error
    pub fn fail_next(&self, count: usize) {
        self.state.lock().failures_remaining = count;
    }

    /// Successful deliveries, oldest first
    pub fn deliveries(&self) -> Vec<RecordedDelivery> {
        self.state.lock().delivered.clone()
    }

    /// All `send` calls, failed ones included
    pub fn attempts(&self) -> usize {
        self.state.lock().attempts
    }
}

impl RemoteLogTransport for MemoryTransport {
    fn send(&self, payload: &[u8], ingest_key: &str, entity_guid: &str, url: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.attempts += 1;
        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(LoggerError::transport(format!(
                "simulated failure on attempt {}",
                state.attempts
            )));
        }
        state.delivered.push(RecordedDelivery {
            payload: payload.to_vec(),
            ingest_key: ingest_key.to_string(),
            entity_guid: entity_guid.to_string(),
            url: url.to_string(),
        });
        Ok(())
    }
}
