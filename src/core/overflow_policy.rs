//! Overflow policies for the worker command queue
//!
//! `log()` only hands a record to the worker. When the worker falls behind
//! and its bounded queue is full, the policy decides whether the calling
//! thread waits or the record is dropped.

use std::fmt;
use std::time::Duration;

/// Policy for handling a full worker queue
///
/// # Example
///
/// ```
/// use agent_logger::OverflowPolicy;
/// use std::time::Duration;
///
/// // Default: wait for space, never drop
/// let policy = OverflowPolicy::default();
///
/// // Wait a little, then drop
/// let policy = OverflowPolicy::BlockWithTimeout(Duration::from_millis(5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Block until space is available
    ///
    /// Preserves every record and the call order. The calling thread waits
    /// only while the worker is saturated.
    #[default]
    Block,

    /// Block with timeout, then drop
    BlockWithTimeout(Duration),

    /// Drop the record immediately; counted in metrics
    DropNewest,
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Block => write!(f, "Block"),
            OverflowPolicy::BlockWithTimeout(d) => write!(f, "BlockWithTimeout({:?})", d),
            OverflowPolicy::DropNewest => write!(f, "DropNewest"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_policy_default() {
        assert_eq!(OverflowPolicy::default(), OverflowPolicy::Block);
    }

    #[test]
    fn test_overflow_policy_display() {
        assert_eq!(OverflowPolicy::Block.to_string(), "Block");
        assert_eq!(OverflowPolicy::DropNewest.to_string(), "DropNewest");
        assert_eq!(
            OverflowPolicy::BlockWithTimeout(Duration::from_millis(100)).to_string(),
            "BlockWithTimeout(100ms)"
        );
    }
}
