//! # Agent Logger
//!
//! Internal diagnostic logger for client SDKs. Records are filtered by a
//! severity bitmask, written to the console and a local JSON file, and, when
//! flagged for agent reporting, staged for batched delivery to a remote
//! log-ingestion endpoint.
//!
//! ## Features
//!
//! - **Ordered**: one worker thread applies every call in arrival order
//! - **Non-blocking uploads**: deliveries run on their own thread, one at a time
//! - **Retry-safe**: failed payloads stay queued and are retried with backoff
//! - **Bounded**: capped log files, payload sizes and pending queue
//!
//! ## Example
//!
//! ```no_run
//! use agent_logger::prelude::*;
//! use agent_logger::log_error;
//!
//! let logger = Logger::builder()
//!     .levels(LevelMask::WARNING)
//!     .targets(LogTargets::CONSOLE | LogTargets::FILE)
//!     .build()?;
//!
//! log_error!(logger, "connection reset after {} ms", 250);
//! logger.flush();
//! # Ok::<(), agent_logger::LoggerError>(())
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{ConsoleSink, FileSink};
    pub use crate::core::{
        string_to_level, Appender, BackoffPolicy, FieldValue, LevelMask, LogAttributes, LogLevel,
        LogRecord, LogTargets, Logger, LoggerBuilder, LoggerError, LoggerMetrics, LoggerSettings,
        OverflowPolicy, RemoteLogTransport, Result, UploadStatus, DEFAULT_SHUTDOWN_TIMEOUT,
    };
}

pub use crate::appenders::{ConsoleSink, FileSink};
pub use crate::core::{
    frame_json_array, parse_records, string_to_level, Appender, AsyncRemoteLogTransport,
    BackoffPolicy, FieldValue, Instrumentation, LevelMask, LogAttributes, LogLevel, LogRecord,
    LogRecordBuilder, LogTargets, Logger, LoggerBuilder, LoggerError, LoggerMetrics,
    LoggerSettings, MemoryTransport, OverflowPolicy, RecordIdentity, RecordedDelivery,
    RemoteLogTransport, Result, UploadQueue, UploadStatus, DEFAULT_LOG_URL,
    DEFAULT_SHUTDOWN_TIMEOUT, RECORD_SEPARATOR,
};
#[cfg(feature = "async-transport")]
pub use crate::core::TokioTransport;
