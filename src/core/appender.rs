//! Appender trait for local log sinks

use super::{
    error::Result,
    log_record::{LogRecord, RecordIdentity},
};

pub trait Appender: Send + Sync {
    fn append(&mut self, record: &LogRecord, identity: &RecordIdentity) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
