//! Severity levels, level bitmasks, and target bitmasks

use super::error::LoggerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

/// A single severity. Declaration order is priority order: `Error` is the
/// highest priority, `Debug` the lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Error = 1,
    Warning = 1 << 1,
    Info = 1 << 2,
    Verbose = 1 << 3,
    Audit = 1 << 4,
    Debug = 1 << 5,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Error,
        LogLevel::Warning,
        LogLevel::Info,
        LogLevel::Verbose,
        LogLevel::Audit,
        LogLevel::Debug,
    ];

    #[inline]
    pub const fn bit(self) -> u32 {
        self as u32
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
            LogLevel::Info => "INFO",
            LogLevel::Verbose => "VERBOSE",
            LogLevel::Audit => "AUDIT",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Map a single-bit mask back to its level
    pub fn from_bit(bit: u32) -> Option<Self> {
        LogLevel::ALL.into_iter().find(|level| level.bit() == bit)
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Error => Red,
            LogLevel::Warning => Yellow,
            LogLevel::Info => Green,
            LogLevel::Verbose => Cyan,
            LogLevel::Audit => Magenta,
            LogLevel::Debug => Blue,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ERROR" => Ok(LogLevel::Error),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "INFO" => Ok(LogLevel::Info),
            "VERBOSE" => Ok(LogLevel::Verbose),
            "AUDIT" => Ok(LogLevel::Audit),
            "DEBUG" => Ok(LogLevel::Debug),
            _ => Err(LoggerError::InvalidLevel(s.to_string())),
        }
    }
}

/// Bitwise OR-combination of severities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelMask(u32);

impl LevelMask {
    pub const NONE: LevelMask = LevelMask(0);
    pub const ERROR: LevelMask = LevelMask(LogLevel::Error.bit());
    pub const WARNING: LevelMask = LevelMask(LogLevel::Warning.bit());
    pub const INFO: LevelMask = LevelMask(LogLevel::Info.bit());
    pub const VERBOSE: LevelMask = LevelMask(LogLevel::Verbose.bit());
    pub const AUDIT: LevelMask = LevelMask(LogLevel::Audit.bit());
    pub const DEBUG: LevelMask = LevelMask(LogLevel::Debug.bit());
    pub const ALL: LevelMask = LevelMask(0xffff);

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        LevelMask(bits)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when exactly one bit is set, i.e. the mask was configured from a
    /// single level constant
    #[inline]
    pub const fn is_single(self) -> bool {
        self.0.count_ones() == 1
    }

    #[inline]
    pub const fn contains(self, level: LogLevel) -> bool {
        self.0 & level.bit() != 0
    }
}

impl From<LogLevel> for LevelMask {
    fn from(level: LogLevel) -> Self {
        LevelMask(level.bit())
    }
}

impl BitOr for LevelMask {
    type Output = LevelMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        LevelMask(self.0 | rhs.0)
    }
}

impl BitOr<LogLevel> for LevelMask {
    type Output = LevelMask;

    fn bitor(self, rhs: LogLevel) -> Self::Output {
        LevelMask(self.0 | rhs.bit())
    }
}

impl BitOr for LogLevel {
    type Output = LevelMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        LevelMask(self.bit() | rhs.bit())
    }
}

impl BitOrAssign for LevelMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for LevelMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "NONE");
        }
        if *self == LevelMask::ALL {
            return write!(f, "ALL");
        }
        let names: Vec<&str> = LogLevel::ALL
            .iter()
            .filter(|level| self.contains(**level))
            .map(LogLevel::to_str)
            .collect();
        write!(f, "{}", names.join("|"))
    }
}

/// Case-insensitive level name lookup. Unrecognized input resolves to
/// [`LevelMask::NONE`].
pub fn string_to_level(name: &str) -> LevelMask {
    name.parse::<LogLevel>()
        .map(LevelMask::from)
        .unwrap_or(LevelMask::NONE)
}

/// Bitwise OR-combination of output targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogTargets(u32);

impl LogTargets {
    pub const NONE: LogTargets = LogTargets(0);
    pub const CONSOLE: LogTargets = LogTargets(1);
    pub const FILE: LogTargets = LogTargets(1 << 1);
    pub const ALL: LogTargets = LogTargets(0b11);

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        LogTargets(bits)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn contains(self, other: LogTargets) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }
}

impl BitOr for LogTargets {
    type Output = LogTargets;

    fn bitor(self, rhs: Self) -> Self::Output {
        LogTargets(self.0 | rhs.0)
    }
}

impl BitAnd for LogTargets {
    type Output = LogTargets;

    fn bitand(self, rhs: Self) -> Self::Output {
        LogTargets(self.0 & rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_bits_match_wire_constants() {
        assert_eq!(LevelMask::NONE.bits(), 0);
        assert_eq!(LevelMask::ERROR.bits(), 1);
        assert_eq!(LevelMask::WARNING.bits(), 2);
        assert_eq!(LevelMask::INFO.bits(), 4);
        assert_eq!(LevelMask::VERBOSE.bits(), 8);
        assert_eq!(LevelMask::AUDIT.bits(), 16);
        assert_eq!(LevelMask::DEBUG.bits(), 32);
        assert_eq!(LevelMask::ALL.bits(), 0xffff);
        assert_eq!(LogTargets::CONSOLE.bits(), 1);
        assert_eq!(LogTargets::FILE.bits(), 2);
    }

    #[test]
    fn test_priority_order() {
        assert!(LogLevel::Error < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Verbose);
        assert!(LogLevel::Verbose < LogLevel::Audit);
        assert!(LogLevel::Audit < LogLevel::Debug);
    }

    #[test]
    fn test_string_to_level() {
        assert_eq!(string_to_level("warning"), LevelMask::WARNING);
        assert_eq!(string_to_level("WARN"), LevelMask::WARNING);
        assert_eq!(string_to_level("Audit"), LevelMask::AUDIT);
        assert_eq!(string_to_level(" debug "), LevelMask::DEBUG);
        assert_eq!(string_to_level("bogus"), LevelMask::NONE);
        assert_eq!(string_to_level(""), LevelMask::NONE);
    }

    #[test]
    fn test_mask_combination() {
        let mask = LogLevel::Error | LogLevel::Warning;
        assert_eq!(mask.bits(), 3);
        assert!(mask.contains(LogLevel::Error));
        assert!(!mask.contains(LogLevel::Info));
        assert!(!mask.is_single());
        assert!(LevelMask::INFO.is_single());
        assert_eq!(mask.to_string(), "ERROR|WARNING");
        assert_eq!(LevelMask::ALL.to_string(), "ALL");
    }

    #[test]
    fn test_targets_contains() {
        let targets = LogTargets::CONSOLE | LogTargets::FILE;
        assert!(targets.contains(LogTargets::CONSOLE));
        assert!(targets.contains(LogTargets::FILE));
        assert!(!LogTargets::CONSOLE.contains(LogTargets::FILE));
        assert!(!targets.contains(LogTargets::NONE));
    }

    #[test]
    fn test_from_bit() {
        assert_eq!(LogLevel::from_bit(4), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_bit(3), None);
    }
}
