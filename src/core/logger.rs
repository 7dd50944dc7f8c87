//! Logger facade and its worker
//!
//! Every stateful operation is a [`Command`] sent to one worker thread, which
//! owns the configuration, the console and file sinks, and the upload queue.
//! Commands are processed in arrival order, so records reach the file and the
//! transport in the order their `log` calls were enqueued, and a
//! configuration change applies to exactly the calls enqueued after it.
//!
//! Deliveries run on a separate uploader thread so a slow endpoint never
//! stalls logging. The uploader reports each outcome back on its own channel,
//! which the worker selects on alongside commands; the worker never hands out
//! a second payload while one is outstanding.

use super::{
    appender::Appender,
    error::{LoggerError, Result},
    level_filter,
    log_level::{string_to_level, LevelMask, LogLevel, LogTargets},
    log_record::{Instrumentation, LogRecord, RecordIdentity},
    attributes::LogAttributes,
    metrics::LoggerMetrics,
    overflow_policy::OverflowPolicy,
    transport::RemoteLogTransport,
    upload_queue::{
        BackoffPolicy, EnqueueOutcome, UploadQueue, UploadStatus, DEFAULT_MAX_PAYLOAD_BYTES,
        DEFAULT_MAX_PENDING_PAYLOADS,
    },
};
use crate::appenders::{ConsoleSink, FileSink};
use crossbeam_channel::{
    bounded, never, select, Receiver, RecvError, SendTimeoutError, Sender, TrySendError,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default shutdown timeout for logger cleanup (5 seconds)
///
/// Used when the logger is dropped without explicit shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default log ingestion endpoint
pub const DEFAULT_LOG_URL: &str = "https://log-api.newrelic.com/log/v1";

/// Default capacity of the worker command queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

/// Default cap for the local log file (4 MiB)
pub const DEFAULT_MAX_LOG_FILE_BYTES: u64 = 4 * 1024 * 1024;

/// Default cap for the upload backlog file (512 KiB)
pub const DEFAULT_MAX_BACKLOG_BYTES: u64 = 512 * 1024;

pub const LOG_FILE_NAME: &str = "agent.log";
pub const BACKLOG_FILE_NAME: &str = "agent_upload.log";

/// Runtime-mutable configuration
///
/// # Example
///
/// ```
/// use agent_logger::{LevelMask, LoggerSettings, LogTargets};
///
/// let settings: LoggerSettings =
///     serde_json::from_str(r#"{"levels": 7, "targets": 3, "debug_logs": true}"#).unwrap();
/// assert_eq!(settings.levels, LevelMask::from_bits(7));
/// assert_eq!(settings.targets, LogTargets::ALL);
/// assert_eq!(settings.remote_level, LevelMask::ERROR);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerSettings {
    pub levels: LevelMask,
    pub remote_level: LevelMask,
    pub targets: LogTargets,
    pub ingest_key: String,
    pub entity_guid: String,
    pub url: String,
    pub debug_logs: bool,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            levels: LevelMask::ERROR | LevelMask::WARNING,
            remote_level: LevelMask::ERROR,
            targets: LogTargets::CONSOLE,
            ingest_key: String::new(),
            entity_guid: String::new(),
            url: DEFAULT_LOG_URL.to_string(),
            debug_logs: false,
        }
    }
}

enum Command {
    Log {
        record: LogRecord,
        agent_logs_on: bool,
    },
    SetLevels(LevelMask),
    SetRemoteLevel(LevelMask),
    SetTargets(LogTargets),
    SetIngestKey(String),
    SetEntityGuid(String),
    SetUrl(String),
    SetDebugLogs(bool),
    LogFileData(Sender<Result<Vec<u8>>>),
    ClearLog(Sender<()>),
    LogLevels(Sender<LevelMask>),
    Settings(Sender<LoggerSettings>),
    UploadStatus(Sender<UploadStatus>),
    EnqueueUpload,
    Flush(Sender<()>),
    Shutdown,
}

enum Event {
    Command(std::result::Result<Command, RecvError>),
    Upload(std::result::Result<Result<()>, RecvError>),
    Timer,
}

struct UploadJob {
    body: Vec<u8>,
    ingest_key: String,
    entity_guid: String,
    url: String,
}

struct Worker {
    settings: LoggerSettings,
    identity: RecordIdentity,
    console: ConsoleSink,
    file: FileSink,
    uploads: UploadQueue,
    upload_jobs: Option<Sender<UploadJob>>,
    upload_results: Receiver<Result<()>>,
    in_flight_bytes: u64,
    upload_interval: Option<Duration>,
    next_scheduled_upload: Option<Instant>,
    metrics: Arc<LoggerMetrics>,
}

impl Worker {
    fn run(mut self, commands: Receiver<Command>) {
        loop {
            // Serviced before receiving so a busy command queue cannot
            // starve retries or scheduled uploads.
            let deadline = self.next_deadline();
            if deadline.is_some_and(|at| Instant::now() >= at) {
                self.isolated("timer", Self::on_timer);
                continue;
            }

            let event = match deadline {
                Some(at) => select! {
                    recv(commands) -> command => Event::Command(command),
                    recv(self.upload_results) -> result => Event::Upload(result),
                    default(at.saturating_duration_since(Instant::now())) => Event::Timer,
                },
                None => select! {
                    recv(commands) -> command => Event::Command(command),
                    recv(self.upload_results) -> result => Event::Upload(result),
                },
            };

            match event {
                // A closed command channel means every facade handle is
                // gone, even if the Shutdown command never got queued.
                Event::Command(Ok(Command::Shutdown)) | Event::Command(Err(_)) => break,
                Event::Command(Ok(command)) => self.isolated("command", |w| w.handle(command)),
                Event::Upload(Ok(result)) => {
                    self.isolated("upload completion", |w| w.finish_upload(result))
                }
                Event::Upload(Err(_)) => self.uploader_stopped(),
                Event::Timer => self.isolated("timer", Self::on_timer),
            }
        }

        let _ = self.console.flush();
        let _ = self.file.flush();
        // Closing the job channel lets the uploader exit once its current
        // attempt returns. Undelivered payloads are not flushed.
        self.upload_jobs.take();
    }

    /// Run `f`, reporting a panic from a sink or transport adapter instead
    /// of letting it take the worker down
    fn isolated(&mut self, what: &str, f: impl FnOnce(&mut Self)) {
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(self)));
        if let Err(panic_info) = outcome {
            self.diagnostic(
                "CRITICAL",
                format_args!("{} panicked: {}", what, panic_message(&panic_info)),
            );
        }
    }

    fn uploader_stopped(&mut self) {
        self.upload_results = never();
        if self.uploads.is_uploading() {
            self.finish_upload(Err(LoggerError::other("uploader thread stopped")));
        }
        self.upload_jobs = None;
        self.diagnostic("ERROR", format_args!("uploader thread stopped"));
    }

    fn next_deadline(&self) -> Option<Instant> {
        let can_retry = self.upload_jobs.is_some()
            && !self.uploads.is_uploading()
            && self.uploads.pending().next().is_some();
        let retry = if can_retry {
            self.uploads.retry_deadline()
        } else {
            None
        };
        match (retry, self.next_scheduled_upload) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn on_timer(&mut self) {
        let now = Instant::now();
        if let (Some(due), Some(interval)) = (self.next_scheduled_upload, self.upload_interval) {
            if now >= due {
                self.next_scheduled_upload = Some(now + interval);
                self.enqueue_log_upload();
                return;
            }
        }
        self.drain();
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Log {
                record,
                agent_logs_on,
            } => self.log(record, agent_logs_on),
            Command::SetLevels(mask) => self.settings.levels = mask,
            Command::SetRemoteLevel(mask) => self.settings.remote_level = mask,
            Command::SetTargets(targets) => self.settings.targets = targets,
            Command::SetIngestKey(key) => {
                self.settings.ingest_key = key;
                self.drain();
            }
            Command::SetEntityGuid(guid) => {
                self.identity.entity_guid = guid.clone();
                self.settings.entity_guid = guid;
                self.drain();
            }
            Command::SetUrl(url) => self.settings.url = url,
            Command::SetDebugLogs(enabled) => self.settings.debug_logs = enabled,
            Command::LogFileData(reply) => {
                let _ = reply.send(self.file.read_all());
            }
            Command::ClearLog(reply) => {
                if let Err(e) = self.file.truncate() {
                    self.diagnostic("ERROR", format_args!("clearing log file: {}", e));
                }
                let _ = reply.send(());
            }
            Command::LogLevels(reply) => {
                let _ = reply.send(self.settings.levels);
            }
            Command::Settings(reply) => {
                let _ = reply.send(self.settings.clone());
            }
            Command::UploadStatus(reply) => {
                let _ = reply.send(self.uploads.status());
            }
            Command::EnqueueUpload => self.enqueue_log_upload(),
            Command::Flush(reply) => {
                let _ = self.console.flush();
                if let Err(e) = self.file.flush() {
                    self.diagnostic("ERROR", format_args!("flushing log file: {}", e));
                }
                let _ = reply.send(());
            }
            Command::Shutdown => {}
        }
    }

    fn log(&mut self, record: LogRecord, agent_logs_on: bool) {
        let level = record.level();
        let local = level_filter::admits_local(level, self.settings.targets, self.settings.levels);
        let remote =
            level_filter::admits_remote(level, self.settings.remote_level, agent_logs_on);

        if local.is_empty() && !remote {
            self.metrics.record_filtered();
            return;
        }

        let mut written = false;

        if local.contains(LogTargets::CONSOLE) {
            match self.console.append(&record, &self.identity) {
                Ok(()) => written = true,
                Err(_) => {
                    self.metrics.record_sink_failure();
                }
            }
        }

        let to_file = local.contains(LogTargets::FILE);
        if to_file || remote {
            let line = match record.to_json_line(&self.identity) {
                Ok(line) => line,
                Err(e) => {
                    self.metrics.record_sink_failure();
                    self.diagnostic("ERROR", format_args!("serializing record: {}", e));
                    return;
                }
            };

            if to_file {
                match self.append_local(&line) {
                    Ok(()) => written = true,
                    Err(e) => {
                        self.metrics.record_sink_failure();
                        self.diagnostic("ERROR", format_args!("writing log file: {}", e));
                    }
                }
            }

            if remote {
                match self.uploads.stage(&line) {
                    Ok(outcome) => {
                        written = true;
                        self.note_enqueued(outcome);
                    }
                    Err(e) => {
                        self.metrics.record_sink_failure();
                        self.diagnostic("ERROR", format_args!("writing upload backlog: {}", e));
                    }
                }
            }
        }

        if written {
            self.metrics.record_written();
        }
    }

    fn append_local(&mut self, line: &[u8]) -> Result<()> {
        if !self.file.has_room_for(line.len() as u64)? {
            self.file.truncate()?;
            self.diagnostic(
                "WARNING",
                format_args!("log file reached its size cap and was cleared"),
            );
        }
        self.file.append_line(line)
    }

    fn enqueue_log_upload(&mut self) {
        match self.uploads.enqueue_current_log() {
            Ok(outcome) => self.note_enqueued(outcome),
            Err(e) => self.diagnostic("ERROR", format_args!("reading upload backlog: {}", e)),
        }
        self.drain();
    }

    fn note_enqueued(&self, outcome: EnqueueOutcome) {
        if outcome.payloads_dropped > 0 {
            for _ in 0..outcome.payloads_dropped {
                self.metrics.record_payload_dropped();
            }
            self.diagnostic(
                "WARNING",
                format_args!(
                    "upload queue full, dropped {} oldest payload(s)",
                    outcome.payloads_dropped
                ),
            );
        }
    }

    fn drain(&mut self) {
        let Some(jobs) = self.upload_jobs.as_ref() else {
            return;
        };

        match self.uploads.begin_drain(
            &self.settings.ingest_key,
            &self.settings.entity_guid,
            Instant::now(),
        ) {
            Ok(Some(delivery)) => {
                self.in_flight_bytes = delivery.body.len() as u64;
                let job = UploadJob {
                    body: delivery.body,
                    ingest_key: self.settings.ingest_key.clone(),
                    entity_guid: self.settings.entity_guid.clone(),
                    url: self.settings.url.clone(),
                };
                if jobs.send(job).is_err() {
                    self.finish_upload(Err(LoggerError::other("uploader thread stopped")));
                }
            }
            Ok(None) => {}
            Err(e) => self.diagnostic("WARNING", format_args!("upload deferred: {}", e)),
        }
    }

    fn finish_upload(&mut self, result: Result<()>) {
        let delivered = result.is_ok();
        let completion = self.uploads.complete(delivered, Instant::now());

        match result {
            Ok(()) => {
                self.metrics.record_upload_success(self.in_flight_bytes);
            }
            Err(e) => {
                self.metrics.record_upload_failure();
                let retry_in = completion.as_ref().ok().copied().flatten();
                self.diagnostic(
                    "WARNING",
                    format_args!(
                        "upload failed (attempt {}): {}; retrying in {:?}",
                        self.uploads.failure_count(),
                        e,
                        retry_in.unwrap_or_default()
                    ),
                );
            }
        }
        self.in_flight_bytes = 0;

        if let Err(e) = completion {
            self.diagnostic("ERROR", format_args!("compacting upload backlog: {}", e));
        }

        if delivered {
            self.drain();
        }
    }

    /// Internal failure report. Written straight to stderr, never through
    /// the logger itself, and only when debug logs are enabled.
    fn diagnostic(&self, severity: &str, message: fmt::Arguments<'_>) {
        if self.settings.debug_logs {
            let _ = writeln!(std::io::stderr().lock(), "[AGENT LOGGER {}] {}", severity, message);
        }
    }
}

fn spawn_uploader(
    transport: Arc<dyn RemoteLogTransport>,
    jobs: Receiver<UploadJob>,
    results: Sender<Result<()>>,
) -> std::io::Result<()> {
    thread::Builder::new()
        .name("agent-logger-upload".to_string())
        .spawn(move || {
            for job in jobs.iter() {
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    transport.send(&job.body, &job.ingest_key, &job.entity_guid, &job.url)
                }))
                .unwrap_or_else(|panic_info| {
                    Err(LoggerError::transport(format!(
                        "transport panicked: {}",
                        panic_message(&panic_info)
                    )))
                });

                if results.send(result).is_err() {
                    break;
                }
            }
        })
        .map(|_| ())
}

fn panic_message(panic_info: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn generate_session_id() -> String {
    let bytes: [u8; 16] = rand::random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// The diagnostic logger
///
/// All methods are safe to call from any thread. Logging and configuration
/// calls return as soon as the command is queued; `log_file_data`,
/// `clear_log`, `log_levels`, `settings`, `upload_status` and `flush` wait
/// for the worker so their result reflects every earlier call.
pub struct Logger {
    sender: Option<Sender<Command>>,
    worker: Option<thread::JoinHandle<()>>,
    log_file_path: PathBuf,
    metrics: Arc<LoggerMetrics>,
    overflow_policy: OverflowPolicy,
}

impl Logger {
    /// Create a builder for Logger
    ///
    /// # Example
    /// ```no_run
    /// use agent_logger::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .levels(LevelMask::INFO)
    ///     .targets(LogTargets::CONSOLE | LogTargets::FILE)
    ///     .log_dir("/var/tmp/my-sdk")
    ///     .build()
    ///     .expect("logger");
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Log without agent reporting: the record only goes to local targets
    pub fn log(
        &self,
        level: LogLevel,
        file: &str,
        line: u32,
        method: &str,
        message: impl Into<String>,
    ) {
        self.log_with_agent_logs(level, file, line, method, message, false);
    }

    /// Log, optionally flagging the record for remote reporting
    pub fn log_with_agent_logs(
        &self,
        level: LogLevel,
        file: &str,
        line: u32,
        method: &str,
        message: impl Into<String>,
        agent_logs_on: bool,
    ) {
        let record = LogRecord::builder(level, message)
            .location(file, line, method)
            .build();
        self.log_record(record, agent_logs_on);
    }

    /// Log with attributes. Attribute records are eligible for remote
    /// reporting.
    pub fn log_with_attributes(
        &self,
        level: LogLevel,
        file: &str,
        line: u32,
        method: &str,
        message: impl Into<String>,
        attributes: LogAttributes,
    ) {
        let record = LogRecord::builder(level, message)
            .location(file, line, method)
            .attributes(attributes)
            .build();
        self.log_record(record, true);
    }

    /// Log a message with an explicit epoch-millisecond timestamp, as
    /// forwarded from a hybrid or cross-platform layer. Eligible for remote
    /// reporting.
    pub fn log_with_timestamp(&self, level: LogLevel, message: impl Into<String>, timestamp: i64) {
        let record = LogRecord::builder(level, message).timestamp(timestamp).build();
        self.log_record(record, true);
    }

    /// Hand a prebuilt record to the worker
    pub fn log_record(&self, record: LogRecord, agent_logs_on: bool) {
        self.send_log(Command::Log {
            record,
            agent_logs_on,
        });
    }

    /// Local level mask. A single level also enables every higher priority.
    pub fn set_log_levels(&self, levels: impl Into<LevelMask>) {
        self.send_control(Command::SetLevels(levels.into()));
    }

    pub fn set_remote_log_level(&self, level: impl Into<LevelMask>) {
        self.send_control(Command::SetRemoteLevel(level.into()));
    }

    pub fn set_log_targets(&self, targets: LogTargets) {
        self.send_control(Command::SetTargets(targets));
    }

    pub fn set_log_ingest_key(&self, key: impl Into<String>) {
        self.send_control(Command::SetIngestKey(key.into()));
    }

    pub fn set_log_entity_guid(&self, guid: impl Into<String>) {
        self.send_control(Command::SetEntityGuid(guid.into()));
    }

    pub fn set_log_url(&self, url: impl Into<String>) {
        self.send_control(Command::SetUrl(url.into()));
    }

    /// Report internal failures on stderr
    pub fn set_debug_logs(&self, enabled: bool) {
        self.send_control(Command::SetDebugLogs(enabled));
    }

    pub fn log_file_path(&self) -> &Path {
        &self.log_file_path
    }

    /// Contents of the local log file: comma-separated JSON records
    pub fn log_file_data(&self) -> Result<Vec<u8>> {
        self.request(Command::LogFileData)
            .unwrap_or(Err(LoggerError::WorkerStopped))
    }

    /// Truncate the local log file
    pub fn clear_log(&self) {
        let _ = self.request(Command::ClearLog);
    }

    /// Queue everything staged for upload since the last call and start a
    /// delivery if none is outstanding
    pub fn enqueue_log_upload(&self) {
        self.send_control(Command::EnqueueUpload);
    }

    /// Case-insensitive level lookup; unknown names map to `NONE`
    pub fn string_to_level(name: &str) -> LevelMask {
        string_to_level(name)
    }

    /// Currently configured local level mask
    pub fn log_levels(&self) -> LevelMask {
        self.request(Command::LogLevels).unwrap_or(LevelMask::NONE)
    }

    pub fn settings(&self) -> LoggerSettings {
        self.request(Command::Settings).unwrap_or_default()
    }

    pub fn upload_status(&self) -> UploadStatus {
        self.request(Command::UploadStatus).unwrap_or_default()
    }

    /// Wait until every previously queued call has been processed
    pub fn flush(&self) {
        let _ = self.request(Command::Flush);
    }

    /// Get the logger metrics for detailed observability
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    fn send_log(&self, command: Command) {
        let Some(sender) = self.sender.as_ref() else {
            return;
        };

        match self.overflow_policy {
            OverflowPolicy::Block => {
                let _ = sender.send(command);
            }
            OverflowPolicy::BlockWithTimeout(timeout) => {
                if let Err(SendTimeoutError::Timeout(_)) = sender.send_timeout(command, timeout) {
                    self.metrics.record_queue_full();
                }
            }
            OverflowPolicy::DropNewest => {
                if let Err(TrySendError::Full(_)) = sender.try_send(command) {
                    self.metrics.record_queue_full();
                }
            }
        }
    }

    /// Configuration and control commands are never dropped
    fn send_control(&self, command: Command) {
        if let Some(sender) = self.sender.as_ref() {
            let _ = sender.send(command);
        }
    }

    fn request<T>(&self, make: impl FnOnce(Sender<T>) -> Command) -> Option<T> {
        let sender = self.sender.as_ref()?;
        let (reply, response) = bounded(1);
        sender.send(make(reply)).ok()?;
        response.recv().ok()
    }

    /// Stop the worker, waiting up to `timeout` for queued commands to be
    /// processed. Pending uploads are not flushed.
    ///
    /// Returns `true` if the worker finished within the timeout.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send_timeout(Command::Shutdown, timeout);
        }

        let Some(handle) = self.worker.take() else {
            return true;
        };

        let start = Instant::now();
        loop {
            if handle.is_finished() {
                return handle.join().is_ok();
            }
            if start.elapsed() >= timeout {
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```no_run
/// use agent_logger::prelude::*;
/// use std::time::Duration;
///
/// let logger = Logger::builder()
///     .levels(LevelMask::ERROR | LevelMask::WARNING)
///     .remote_level(LevelMask::WARNING)
///     .ingest_key("ingest-key")
///     .entity_guid("entity-guid")
///     .backoff(BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(60), 2))
///     .upload_interval(Duration::from_secs(60))
///     .build()
///     .expect("logger");
/// ```
pub struct LoggerBuilder {
    settings: LoggerSettings,
    log_dir: Option<PathBuf>,
    log_file: Option<PathBuf>,
    backlog_file: Option<PathBuf>,
    session_id: Option<String>,
    app_id: String,
    instrumentation: Instrumentation,
    max_log_file_bytes: Option<u64>,
    max_backlog_bytes: Option<u64>,
    max_payload_bytes: usize,
    max_pending_payloads: usize,
    compress_payloads: bool,
    backoff: BackoffPolicy,
    upload_interval: Option<Duration>,
    queue_capacity: usize,
    overflow_policy: OverflowPolicy,
    transport: Option<Arc<dyn RemoteLogTransport>>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            settings: LoggerSettings::default(),
            log_dir: None,
            log_file: None,
            backlog_file: None,
            session_id: None,
            app_id: String::new(),
            instrumentation: Instrumentation::default(),
            max_log_file_bytes: Some(DEFAULT_MAX_LOG_FILE_BYTES),
            max_backlog_bytes: Some(DEFAULT_MAX_BACKLOG_BYTES),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            max_pending_payloads: DEFAULT_MAX_PENDING_PAYLOADS,
            compress_payloads: false,
            backoff: BackoffPolicy::default(),
            upload_interval: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            overflow_policy: OverflowPolicy::default(),
            transport: None,
        }
    }

    /// Replace all runtime-mutable settings at once
    #[must_use = "builder methods return a new value"]
    pub fn settings(mut self, settings: LoggerSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn levels(mut self, levels: impl Into<LevelMask>) -> Self {
        self.settings.levels = levels.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn remote_level(mut self, level: impl Into<LevelMask>) -> Self {
        self.settings.remote_level = level.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn targets(mut self, targets: LogTargets) -> Self {
        self.settings.targets = targets;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn ingest_key(mut self, key: impl Into<String>) -> Self {
        self.settings.ingest_key = key.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn entity_guid(mut self, guid: impl Into<String>) -> Self {
        self.settings.entity_guid = guid.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.settings.url = url.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn debug_logs(mut self, enabled: bool) -> Self {
        self.settings.debug_logs = enabled;
        self
    }

    /// Directory holding the log and backlog files. Must already exist.
    /// Defaults to the system temp directory.
    #[must_use = "builder methods return a new value"]
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Explicit path of the local log file
    #[must_use = "builder methods return a new value"]
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Explicit path of the upload backlog file
    #[must_use = "builder methods return a new value"]
    pub fn backlog_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.backlog_file = Some(path.into());
        self
    }

    /// Session id stamped on records; a random id is generated otherwise
    #[must_use = "builder methods return a new value"]
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn instrumentation(mut self, instrumentation: Instrumentation) -> Self {
        self.instrumentation = instrumentation;
        self
    }

    /// Size cap of the local log file; `None` for unbounded
    #[must_use = "builder methods return a new value"]
    pub fn max_log_file_bytes(mut self, max: Option<u64>) -> Self {
        self.max_log_file_bytes = max;
        self
    }

    /// Size cap of the upload backlog file; `None` for unbounded
    #[must_use = "builder methods return a new value"]
    pub fn max_backlog_bytes(mut self, max: Option<u64>) -> Self {
        self.max_backlog_bytes = max;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_payload_bytes(mut self, max: usize) -> Self {
        self.max_payload_bytes = max;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_pending_payloads(mut self, max: usize) -> Self {
        self.max_pending_payloads = max;
        self
    }

    /// Gzip request bodies
    #[must_use = "builder methods return a new value"]
    pub fn compress_payloads(mut self, enabled: bool) -> Self {
        self.compress_payloads = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Enqueue and deliver staged records on this period
    #[must_use = "builder methods return a new value"]
    pub fn upload_interval(mut self, interval: Duration) -> Self {
        self.upload_interval = Some(interval);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Determines what `log` does when the worker queue is full.
    /// Default is `Block`.
    #[must_use = "builder methods return a new value"]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    /// Transport used for remote delivery. Without one, records are staged
    /// but never sent.
    #[must_use = "builder methods return a new value"]
    pub fn transport<T: RemoteLogTransport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Build the Logger and start its worker
    pub fn build(self) -> Result<Logger> {
        if self.queue_capacity == 0 {
            return Err(LoggerError::config("LoggerBuilder", "queue capacity must be non-zero"));
        }
        if self.max_payload_bytes == 0 {
            return Err(LoggerError::config("LoggerBuilder", "max payload bytes must be non-zero"));
        }
        if self.max_pending_payloads == 0 {
            return Err(LoggerError::config(
                "LoggerBuilder",
                "max pending payloads must be non-zero",
            ));
        }
        if self.upload_interval == Some(Duration::ZERO) {
            return Err(LoggerError::config("LoggerBuilder", "upload interval must be non-zero"));
        }

        let dir = self.log_dir.unwrap_or_else(std::env::temp_dir);
        let log_file_path = self.log_file.unwrap_or_else(|| dir.join(LOG_FILE_NAME));
        let backlog_path = self.backlog_file.unwrap_or_else(|| dir.join(BACKLOG_FILE_NAME));
        if log_file_path == backlog_path {
            return Err(LoggerError::config(
                "LoggerBuilder",
                "log file and backlog file must differ",
            ));
        }

        let mut file = FileSink::new(&log_file_path);
        if let Some(max) = self.max_log_file_bytes {
            file = file.with_max_bytes(max);
        }
        let mut backlog = FileSink::new(backlog_path);
        if let Some(max) = self.max_backlog_bytes {
            backlog = backlog.with_max_bytes(max);
        }
        let uploads = UploadQueue::new(backlog)
            .with_backoff(self.backoff)
            .with_max_payload_bytes(self.max_payload_bytes)
            .with_max_pending_payloads(self.max_pending_payloads)
            .with_compression(self.compress_payloads);

        let identity = RecordIdentity {
            session_id: self.session_id.unwrap_or_else(generate_session_id),
            app_id: self.app_id,
            entity_guid: self.settings.entity_guid.clone(),
            instrumentation: self.instrumentation,
        };

        let (sender, receiver) = bounded(self.queue_capacity);
        let metrics = Arc::new(LoggerMetrics::new());

        let (upload_jobs, upload_results) = match self.transport {
            Some(transport) => {
                let (jobs, job_receiver) = bounded(1);
                let (results, result_receiver) = bounded(1);
                spawn_uploader(transport, job_receiver, results).map_err(|e| {
                    LoggerError::io_operation("spawning uploader thread", "thread spawn failed", e)
                })?;
                (Some(jobs), result_receiver)
            }
            None => (None, never()),
        };

        let worker = Worker {
            settings: self.settings,
            identity,
            console: ConsoleSink::new(),
            file,
            uploads,
            upload_jobs,
            upload_results,
            in_flight_bytes: 0,
            upload_interval: self.upload_interval,
            next_scheduled_upload: self.upload_interval.map(|interval| Instant::now() + interval),
            metrics: Arc::clone(&metrics),
        };

        let handle = thread::Builder::new()
            .name("agent-logger".to_string())
            .spawn(move || worker.run(receiver))
            .map_err(|e| {
                LoggerError::io_operation("spawning worker thread", "thread spawn failed", e)
            })?;

        Ok(Logger {
            sender: Some(sender),
            worker: Some(handle),
            log_file_path,
            metrics,
            overflow_policy: self.overflow_policy,
        })
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
