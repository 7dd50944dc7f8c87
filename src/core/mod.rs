//! Core logger types and traits

pub mod appender;
pub mod async_transport;
pub mod attributes;
pub mod error;
pub mod level_filter;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod overflow_policy;
pub mod transport;
pub mod upload_queue;

pub use appender::Appender;
pub use async_transport::AsyncRemoteLogTransport;
#[cfg(feature = "async-transport")]
pub use async_transport::TokioTransport;
pub use attributes::{FieldValue, LogAttributes};
pub use error::{LoggerError, Result};
pub use log_level::{string_to_level, LevelMask, LogLevel, LogTargets};
pub use log_record::{
    frame_json_array, parse_records, Instrumentation, LogRecord, LogRecordBuilder, RecordIdentity,
    RECORD_SEPARATOR,
};
pub use logger::{
    Logger, LoggerBuilder, LoggerSettings, DEFAULT_LOG_URL, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use metrics::LoggerMetrics;
pub use overflow_policy::OverflowPolicy;
pub use transport::{MemoryTransport, RecordedDelivery, RemoteLogTransport};
pub use upload_queue::{BackoffPolicy, UploadQueue, UploadStatus};
