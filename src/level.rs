//! Severity levels and verbosity mapping.
//!
//! # Design Decisions
//! - Declaration order is urgency order: `Panic` is the most urgent,
//!   `Debug` the least. Deriving `Ord` gives `Panic < ... < Debug`.
//! - A sink admits an event iff `event <= sink minimum`.

use std::fmt;

use crate::error::{LogError, LogResult};

/// Ordered urgency of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Panic,
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
}

impl Severity {
    /// All severities, most urgent first.
    pub const ALL: [Severity; 6] = [
        Severity::Panic,
        Severity::Fatal,
        Severity::Error,
        Severity::Warn,
        Severity::Info,
        Severity::Debug,
    ];

    /// Map an integer verbosity (0..=6) to the least urgent severity it admits.
    ///
    /// `6` and `5` both map to `Debug`; anything outside the range is rejected.
    pub fn from_verbosity(verbosity: i32) -> LogResult<Self> {
        match verbosity {
            6 | 5 => Ok(Severity::Debug),
            4 => Ok(Severity::Info),
            3 => Ok(Severity::Warn),
            2 => Ok(Severity::Error),
            1 => Ok(Severity::Fatal),
            0 => Ok(Severity::Panic),
            other => Err(LogError::InvalidVerbosity(other)),
        }
    }

    /// True if an event at `self` passes a filter whose minimum is `min`.
    #[inline]
    pub fn admitted_by(self, min: Severity) -> bool {
        self <= min
    }

    /// Lowercase name used by every encoding.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Panic => "panic",
            Severity::Fatal => "fatal",
            Severity::Error => "error",
            Severity::Warn => "warn",
            Severity::Info => "info",
            Severity::Debug => "debug",
        }
    }
}

impl TryFrom<i32> for Severity {
    type Error = LogError;

    fn try_from(verbosity: i32) -> Result<Self, LogError> {
        Severity::from_verbosity(verbosity)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_mapping() {
        let expected = [
            (0, Severity::Panic),
            (1, Severity::Fatal),
            (2, Severity::Error),
            (3, Severity::Warn),
            (4, Severity::Info),
            (5, Severity::Debug),
            (6, Severity::Debug),
        ];
        for (verbosity, severity) in expected {
            assert_eq!(Severity::from_verbosity(verbosity).unwrap(), severity);
        }
    }

    #[test]
    fn test_try_from_agrees_with_from_verbosity() {
        for verbosity in 0..=6 {
            assert_eq!(
                Severity::try_from(verbosity).unwrap(),
                Severity::from_verbosity(verbosity).unwrap()
            );
        }
    }

    #[test]
    fn test_out_of_range_verbosity_is_rejected() {
        for verbosity in [-1, 7, 100, i32::MIN] {
            match Severity::try_from(verbosity) {
                Err(LogError::InvalidVerbosity(v)) => assert_eq!(v, verbosity),
                other => panic!("expected InvalidVerbosity, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_ordering_is_urgency() {
        assert!(Severity::Panic < Severity::Fatal);
        assert!(Severity::Error < Severity::Warn);
        assert!(Severity::Info < Severity::Debug);
    }

    #[test]
    fn test_admission_matches_ordering() {
        for event in Severity::ALL {
            for min in Severity::ALL {
                assert_eq!(event.admitted_by(min), event <= min, "{} vs {}", event, min);
            }
        }
        assert!(Severity::Error.admitted_by(Severity::Info));
        assert!(!Severity::Debug.admitted_by(Severity::Info));
    }
}
