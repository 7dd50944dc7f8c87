//! Log record structure, builder, and JSON serialization

use super::attributes::LogAttributes;
use super::error::Result;
use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Bytes written after every serialized record
pub const RECORD_SEPARATOR: &[u8] = b",\n";

pub const KEY_LEVEL: &str = "level";
pub const KEY_FILE: &str = "file";
pub const KEY_LINE_NUMBER: &str = "lineNumber";
pub const KEY_METHOD: &str = "method";
pub const KEY_TIMESTAMP: &str = "timestamp";
pub const KEY_MESSAGE: &str = "message";
pub const KEY_SESSION_ID: &str = "sessionId";
pub const KEY_APP_ID: &str = "appId";
pub const KEY_ENTITY_GUID: &str = "entity.guid";
pub const KEY_INSTRUMENTATION_PROVIDER: &str = "instrumentation.provider";
pub const KEY_INSTRUMENTATION_NAME: &str = "instrumentation.name";
pub const KEY_INSTRUMENTATION_VERSION: &str = "instrumentation.version";
pub const KEY_COLLECTOR_NAME: &str = "collector.name";

/// Instrumentation identity stamped on every record; constant per process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrumentation {
    pub provider: String,
    pub name: String,
    pub version: String,
    pub collector_name: String,
}

impl Default for Instrumentation {
    fn default() -> Self {
        Self {
            provider: "mobile".to_string(),
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            collector_name: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

/// Process and configuration identity joined with a record at serialization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordIdentity {
    pub session_id: String,
    pub app_id: String,
    pub entity_guid: String,
    pub instrumentation: Instrumentation,
}

/// An immutable diagnostic record, built on the calling thread
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    level: LogLevel,
    source_file: String,
    line_number: u32,
    method: String,
    message: String,
    timestamp: i64,
    attributes: Option<LogAttributes>,
}

impl LogRecord {
    pub fn builder(level: LogLevel, message: impl Into<String>) -> LogRecordBuilder {
        LogRecordBuilder::new(level, message)
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Final path component of the call-site file
    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn line_number(&self) -> u32 {
        self.line_number
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Milliseconds since the Unix epoch
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn attributes(&self) -> Option<&LogAttributes> {
        self.attributes.as_ref()
    }

    /// JSON object for this record. Attributes are merged at top level;
    /// they never override the reserved keys.
    pub fn to_json_value(&self, identity: &RecordIdentity) -> Value {
        let mut map = Map::new();

        if let Some(attributes) = &self.attributes {
            for (key, value) in attributes.iter() {
                map.insert(key.clone(), value.to_json_value());
            }
        }

        map.insert(KEY_LEVEL.into(), Value::from(self.level.to_str()));
        map.insert(KEY_FILE.into(), Value::from(self.source_file.as_str()));
        map.insert(KEY_LINE_NUMBER.into(), Value::from(self.line_number));
        map.insert(KEY_METHOD.into(), Value::from(self.method.as_str()));
        map.insert(KEY_TIMESTAMP.into(), Value::from(self.timestamp));
        map.insert(KEY_MESSAGE.into(), Value::from(self.message.as_str()));
        map.insert(KEY_SESSION_ID.into(), Value::from(identity.session_id.as_str()));
        map.insert(KEY_APP_ID.into(), Value::from(identity.app_id.as_str()));
        map.insert(KEY_ENTITY_GUID.into(), Value::from(identity.entity_guid.as_str()));

        let instrumentation = &identity.instrumentation;
        map.insert(
            KEY_INSTRUMENTATION_PROVIDER.into(),
            Value::from(instrumentation.provider.as_str()),
        );
        map.insert(
            KEY_INSTRUMENTATION_NAME.into(),
            Value::from(instrumentation.name.as_str()),
        );
        map.insert(
            KEY_INSTRUMENTATION_VERSION.into(),
            Value::from(instrumentation.version.as_str()),
        );
        map.insert(
            KEY_COLLECTOR_NAME.into(),
            Value::from(instrumentation.collector_name.as_str()),
        );

        Value::Object(map)
    }

    /// Serialized record followed by [`RECORD_SEPARATOR`], ready to append
    pub fn to_json_line(&self, identity: &RecordIdentity) -> Result<Vec<u8>> {
        let mut line = serde_json::to_vec(&self.to_json_value(identity))?;
        line.extend_from_slice(RECORD_SEPARATOR);
        Ok(line)
    }
}

/// Assembles a [`LogRecord`] from call-site inputs. Performs no I/O.
#[derive(Debug, Clone)]
pub struct LogRecordBuilder {
    level: LogLevel,
    file: String,
    line: u32,
    method: String,
    message: String,
    attributes: Option<LogAttributes>,
    timestamp: Option<i64>,
}

impl LogRecordBuilder {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            file: String::new(),
            line: 0,
            method: String::new(),
            message: message.into(),
            attributes: None,
            timestamp: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn location(mut self, file: &str, line: u32, method: &str) -> Self {
        self.file = basename(file).to_string();
        self.line = line;
        self.method = method.to_string();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn attributes(mut self, attributes: LogAttributes) -> Self {
        self.attributes = if attributes.is_empty() {
            None
        } else {
            Some(attributes)
        };
        self
    }

    /// Explicit timestamp in epoch milliseconds
    #[must_use = "builder methods return a new value"]
    pub fn timestamp(mut self, millis: i64) -> Self {
        self.timestamp = Some(millis);
        self
    }

    /// Build the record. Without an explicit timestamp the current time is
    /// captured here, on the calling thread.
    pub fn build(self) -> LogRecord {
        LogRecord {
            level: self.level,
            source_file: self.file,
            line_number: self.line,
            method: self.method,
            message: self.message,
            timestamp: self
                .timestamp
                .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
            attributes: self.attributes,
        }
    }
}

/// Final component of a `/` or `\` separated path
pub fn basename(path: &str) -> &str {
    path.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
}

/// Frame a run of separated records as a JSON array
pub fn frame_json_array(raw: &[u8]) -> Vec<u8> {
    let mut end = raw.len();
    while end > 0 && raw[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    if end > 0 && raw[end - 1] == b',' {
        end -= 1;
    }

    let mut framed = Vec::with_capacity(end + 2);
    framed.push(b'[');
    framed.extend_from_slice(&raw[..end]);
    framed.push(b']');
    framed
}

/// Parse the contents of a log file into its records
pub fn parse_records(raw: &[u8]) -> Result<Vec<Value>> {
    Ok(serde_json::from_slice(&frame_json_array(raw))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> RecordIdentity {
        RecordIdentity {
            session_id: "session-1".to_string(),
            app_id: "app-7".to_string(),
            entity_guid: "guid-abc".to_string(),
            instrumentation: Instrumentation::default(),
        }
    }

    #[test]
    fn test_basename_strips_directories() {
        assert_eq!(basename("/Users/dev/project/src/net/upload.rs"), "upload.rs");
        assert_eq!(basename("C:\\build\\agent\\harvest.c"), "harvest.c");
        assert_eq!(basename("main.rs"), "main.rs");
        assert_eq!(basename("src/dir/"), "dir");
        assert_eq!(basename(""), "");
    }

    #[test]
    fn test_builder_captures_time_when_absent() {
        let before = chrono::Utc::now().timestamp_millis();
        let record = LogRecord::builder(LogLevel::Info, "hello").build();
        let after = chrono::Utc::now().timestamp_millis();

        assert!(record.timestamp() >= before && record.timestamp() <= after);
    }

    #[test]
    fn test_builder_explicit_fields() {
        let record = LogRecord::builder(LogLevel::Warning, "disk low")
            .location("/a/b/storage.rs", 88, "storage::check")
            .timestamp(1_700_000_000_000)
            .build();

        assert_eq!(record.level(), LogLevel::Warning);
        assert_eq!(record.source_file(), "storage.rs");
        assert_eq!(record.line_number(), 88);
        assert_eq!(record.method(), "storage::check");
        assert_eq!(record.timestamp(), 1_700_000_000_000);
        assert!(record.attributes().is_none());
    }

    #[test]
    fn test_json_has_all_keys() {
        let record = LogRecord::builder(LogLevel::Error, "boom")
            .location("net.rs", 12, "send")
            .timestamp(42)
            .build();

        let value = record.to_json_value(&identity());
        assert_eq!(value[KEY_LEVEL], "ERROR");
        assert_eq!(value[KEY_FILE], "net.rs");
        assert_eq!(value[KEY_LINE_NUMBER], 12);
        assert_eq!(value[KEY_METHOD], "send");
        assert_eq!(value[KEY_TIMESTAMP], 42);
        assert_eq!(value[KEY_MESSAGE], "boom");
        assert_eq!(value[KEY_SESSION_ID], "session-1");
        assert_eq!(value[KEY_APP_ID], "app-7");
        assert_eq!(value[KEY_ENTITY_GUID], "guid-abc");
        assert_eq!(value[KEY_INSTRUMENTATION_PROVIDER], "mobile");
        assert_eq!(value[KEY_INSTRUMENTATION_NAME], "agent_logger");
        assert!(value[KEY_INSTRUMENTATION_VERSION].is_string());
        assert!(value[KEY_COLLECTOR_NAME].is_string());
    }

    #[test]
    fn test_attributes_cannot_override_reserved_keys() {
        let attrs = LogAttributes::new()
            .with_field("level", "DEBUG")
            .with_field("userId", 7);
        let record = LogRecord::builder(LogLevel::Error, "x")
            .attributes(attrs)
            .build();

        let value = record.to_json_value(&identity());
        assert_eq!(value["level"], "ERROR");
        assert_eq!(value["userId"], 7);
    }

    #[test]
    fn test_json_line_is_terminated() {
        let record = LogRecord::builder(LogLevel::Info, "line\nbreak").build();
        let line = record.to_json_line(&identity()).unwrap();

        assert!(line.ends_with(RECORD_SEPARATOR));
        // Embedded newlines are escaped, so each record occupies one line
        assert_eq!(line.iter().filter(|b| **b == b'\n').count(), 1);
    }

    #[test]
    fn test_frame_and_parse_records() {
        let id = identity();
        let mut raw = Vec::new();
        for i in 0..3 {
            let record = LogRecord::builder(LogLevel::Info, format!("m{}", i)).build();
            raw.extend(record.to_json_line(&id).unwrap());
        }

        let records = parse_records(&raw).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2]["message"], "m2");

        assert_eq!(frame_json_array(b""), b"[]");
        assert!(parse_records(b"").unwrap().is_empty());
    }
}
