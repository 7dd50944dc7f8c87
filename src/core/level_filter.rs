//! Level admission rules
//!
//! A mask with several bits set is exact: a level passes only if its own bit
//! is set. A mask with exactly one bit set also passes every level of higher
//! priority, so configuring `INFO` admits `Error`, `Warning` and `Info`.

use super::log_level::{LevelMask, LogLevel, LogTargets};

/// Whether `level` passes `mask`
#[inline]
pub fn admits(level: LogLevel, mask: LevelMask) -> bool {
    if mask.contains(level) {
        return true;
    }
    // Lower bit value means higher priority.
    mask.is_single() && level.bit() < mask.bits()
}

/// Subset of `targets` a record at `level` should be written to
pub fn admits_local(level: LogLevel, targets: LogTargets, mask: LevelMask) -> LogTargets {
    if admits(level, mask) {
        targets
    } else {
        LogTargets::NONE
    }
}

/// Whether a record should be forwarded for remote upload. Records not
/// flagged for agent reporting stay local regardless of the threshold.
pub fn admits_remote(level: LogLevel, threshold: LevelMask, agent_logs_on: bool) -> bool {
    agent_logs_on && admits(level, threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_bit_includes_higher_priority() {
        assert!(admits(LogLevel::Error, LevelMask::INFO));
        assert!(admits(LogLevel::Warning, LevelMask::INFO));
        assert!(admits(LogLevel::Info, LevelMask::INFO));
        assert!(!admits(LogLevel::Verbose, LevelMask::INFO));
        assert!(!admits(LogLevel::Debug, LevelMask::INFO));
    }

    #[test]
    fn test_multi_bit_mask_is_exact() {
        let mask = LogLevel::Warning | LogLevel::Info;
        assert!(!admits(LogLevel::Error, mask));
        assert!(admits(LogLevel::Warning, mask));
        assert!(admits(LogLevel::Info, mask));
        assert!(!admits(LogLevel::Verbose, mask));
    }

    #[test]
    fn test_none_and_all() {
        for level in LogLevel::ALL {
            assert!(!admits(level, LevelMask::NONE));
            assert!(admits(level, LevelMask::ALL));
        }
    }

    #[test]
    fn test_admits_local_returns_target_subset() {
        let targets = LogTargets::CONSOLE | LogTargets::FILE;
        assert_eq!(admits_local(LogLevel::Error, targets, LevelMask::ERROR), targets);
        assert_eq!(
            admits_local(LogLevel::Warning, targets, LevelMask::ERROR),
            LogTargets::NONE
        );
        assert_eq!(
            admits_local(LogLevel::Error, LogTargets::NONE, LevelMask::ALL),
            LogTargets::NONE
        );
    }

    #[test]
    fn test_admits_remote_requires_agent_flag() {
        assert!(admits_remote(LogLevel::Error, LevelMask::ERROR, true));
        assert!(!admits_remote(LogLevel::Error, LevelMask::ERROR, false));
        assert!(!admits_remote(LogLevel::Info, LevelMask::WARNING, true));
        assert!(admits_remote(LogLevel::Error, LevelMask::WARNING, true));
    }
}
