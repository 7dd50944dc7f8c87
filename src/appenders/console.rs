//! Console sink: one human-readable line per record on stderr

use crate::core::{Appender, LogRecord, RecordIdentity, Result};
use chrono::{DateTime, Utc};
#[cfg(feature = "console")]
use colored::Colorize;
use std::io::Write;

pub struct ConsoleSink {
    use_colors: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            use_colors: cfg!(feature = "console"),
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors: use_colors && cfg!(feature = "console"),
        }
    }

    /// Render a record as a single line
    pub fn format_line(&self, record: &LogRecord) -> String {
        let timestamp = DateTime::<Utc>::from_timestamp_millis(record.timestamp())
            .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
            .unwrap_or_else(|| record.timestamp().to_string());

        let mut line = format!(
            "[{}] [{}] {}:{} {} - {}",
            timestamp,
            self.level_tag(record),
            record.source_file(),
            record.line_number(),
            record.method(),
            sanitize_message(record.message())
        );

        if let Some(attributes) = record.attributes() {
            line.push(' ');
            line.push_str(&attributes.format_fields());
        }

        line
    }

    #[cfg(feature = "console")]
    fn level_tag(&self, record: &LogRecord) -> String {
        let tag = format!("{:7}", record.level().to_str());
        if self.use_colors {
            tag.color(record.level().color_code()).to_string()
        } else {
            tag
        }
    }

    #[cfg(not(feature = "console"))]
    fn level_tag(&self, record: &LogRecord) -> String {
        format!("{:7}", record.level().to_str())
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleSink {
    fn append(&mut self, record: &LogRecord, _identity: &RecordIdentity) -> Result<()> {
        let line = self.format_line(record);
        // Best-effort: a failed console write is swallowed, never a panic.
        let _ = writeln!(std::io::stderr().lock(), "{}", line);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let _ = std::io::stderr().flush();
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

/// Escape line breaks so one record stays on one console line
fn sanitize_message(message: &str) -> String {
    message
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogAttributes, LogLevel};

    #[test]
    fn test_format_line_plain() {
        let sink = ConsoleSink::with_colors(false);
        let record = LogRecord::builder(LogLevel::Warning, "retrying\nupload")
            .location("/src/net/upload.rs", 77, "upload::send")
            .timestamp(0)
            .build();

        let line = sink.format_line(&record);
        assert_eq!(
            line,
            "[1970-01-01 00:00:00.000] [WARNING] upload.rs:77 upload::send - retrying\\nupload"
        );
    }

    #[test]
    fn test_format_line_with_attributes() {
        let sink = ConsoleSink::with_colors(false);
        let record = LogRecord::builder(LogLevel::Info, "harvest")
            .attributes(LogAttributes::new().with_field("count", 3))
            .timestamp(0)
            .build();

        assert!(sink.format_line(&record).ends_with("harvest count=3"));
    }

    #[test]
    fn test_append_never_fails() {
        let mut sink = ConsoleSink::new();
        let record = LogRecord::builder(LogLevel::Error, "to stderr").build();
        assert!(sink.append(&record, &RecordIdentity::default()).is_ok());
        assert!(sink.flush().is_ok());
        assert_eq!(sink.name(), "console");
    }
}
