//! Logging macros that capture the call site.
//!
//! Each macro formats its arguments like `format!` and fills in the source
//! file, line and module path of the caller.
//!
//! The `log_*` family writes to local targets only. The `agent_*` family
//! also flags the record for remote reporting, subject to the remote level
//! threshold.
//!
//! # Examples
//!
//! ```no_run
//! use agent_logger::prelude::*;
//! use agent_logger::{agent_error, log_warning};
//!
//! let logger = Logger::builder().build()?;
//!
//! log_warning!(logger, "cache miss for {}", "session");
//! agent_error!(logger, "harvest failed with status {}", 503);
//! # Ok::<(), agent_logger::LoggerError>(())
//! ```

/// Log at an explicit level, choosing whether the record is reported
/// remotely.
///
/// # Examples
///
/// ```no_run
/// # use agent_logger::prelude::*;
/// # let logger = Logger::builder().build().unwrap();
/// use agent_logger::agent_log;
/// agent_log!(logger, LogLevel::Info, false, "Simple message");
/// agent_log!(logger, LogLevel::Error, true, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! agent_log {
    ($logger:expr, $level:expr, $agent_logs_on:expr, $($arg:tt)+) => {
        $logger.log_with_agent_logs(
            $level,
            file!(),
            line!(),
            module_path!(),
            format!($($arg)+),
            $agent_logs_on,
        )
    };
}

/// Log with attributes. The record is eligible for remote reporting.
///
/// # Examples
///
/// ```no_run
/// # use agent_logger::prelude::*;
/// # let logger = Logger::builder().build().unwrap();
/// use agent_logger::log_attrs;
/// let attrs = LogAttributes::new().with_field("request_id", "r-1");
/// log_attrs!(logger, LogLevel::Warning, attrs, "slow response: {} ms", 1200);
/// ```
#[macro_export]
macro_rules! log_attrs {
    ($logger:expr, $level:expr, $attributes:expr, $($arg:tt)+) => {
        $logger.log_with_attributes(
            $level,
            file!(),
            line!(),
            module_path!(),
            format!($($arg)+),
            $attributes,
        )
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::agent_log!($logger, $crate::LogLevel::Error, false, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::agent_log!($logger, $crate::LogLevel::Warning, false, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::agent_log!($logger, $crate::LogLevel::Info, false, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_verbose {
    ($logger:expr, $($arg:tt)+) => {
        $crate::agent_log!($logger, $crate::LogLevel::Verbose, false, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_audit {
    ($logger:expr, $($arg:tt)+) => {
        $crate::agent_log!($logger, $crate::LogLevel::Audit, false, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::agent_log!($logger, $crate::LogLevel::Debug, false, $($arg)+)
    };
}

/// Log an error and flag it for remote reporting.
#[macro_export]
macro_rules! agent_error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::agent_log!($logger, $crate::LogLevel::Error, true, $($arg)+)
    };
}

#[macro_export]
macro_rules! agent_warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::agent_log!($logger, $crate::LogLevel::Warning, true, $($arg)+)
    };
}

#[macro_export]
macro_rules! agent_info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::agent_log!($logger, $crate::LogLevel::Info, true, $($arg)+)
    };
}

#[macro_export]
macro_rules! agent_verbose {
    ($logger:expr, $($arg:tt)+) => {
        $crate::agent_log!($logger, $crate::LogLevel::Verbose, true, $($arg)+)
    };
}

#[macro_export]
macro_rules! agent_audit {
    ($logger:expr, $($arg:tt)+) => {
        $crate::agent_log!($logger, $crate::LogLevel::Audit, true, $($arg)+)
    };
}

#[macro_export]
macro_rules! agent_debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::agent_log!($logger, $crate::LogLevel::Debug, true, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{parse_records, LevelMask, LogAttributes, LogLevel, LogTargets, Logger};
    use tempfile::tempdir;

    fn logger(dir: &std::path::Path) -> Logger {
        Logger::builder()
            .log_dir(dir)
            .targets(LogTargets::FILE)
            .levels(LevelMask::ALL)
            .build()
            .unwrap()
    }

    #[test]
    fn test_level_macros_capture_call_site() {
        let dir = tempdir().unwrap();
        let logger = logger(dir.path());

        log_error!(logger, "Error message");
        log_warning!(logger, "Retry {} of {}", 1, 3);
        log_info!(logger, "Info message");
        log_verbose!(logger, "Verbose message");
        log_audit!(logger, "Audit message");
        log_debug!(logger, "Count: {}", 5);

        let records = parse_records(&logger.log_file_data().unwrap()).unwrap();
        let levels: Vec<_> = records.iter().map(|r| r["level"].clone()).collect();
        assert_eq!(
            levels,
            vec!["ERROR", "WARNING", "INFO", "VERBOSE", "AUDIT", "DEBUG"]
        );
        assert_eq!(records[1]["message"], "Retry 1 of 3");
        assert_eq!(records[0]["file"], "macros.rs");
        assert_eq!(records[0]["method"], module_path!());
        assert!(records[0]["lineNumber"].as_u64().unwrap() > 0);
    }

    #[test]
    fn test_agent_macros_write_locally_too() {
        let dir = tempdir().unwrap();
        let logger = logger(dir.path());

        agent_error!(logger, "reported {}", 1);
        agent_debug!(logger, "not reported remotely");

        let records = parse_records(&logger.log_file_data().unwrap()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["message"], "reported 1");
    }

    #[test]
    fn test_log_attrs_macro() {
        let dir = tempdir().unwrap();
        let logger = logger(dir.path());

        let attrs = LogAttributes::new().with_field("request_id", "r-7");
        log_attrs!(logger, LogLevel::Info, attrs, "attributed");

        let records = parse_records(&logger.log_file_data().unwrap()).unwrap();
        assert_eq!(records[0]["request_id"], "r-7");
        assert_eq!(records[0]["message"], "attributed");
    }
}
