//! Severity levels and threshold ordering.
//!
//! Levels are ordered from lowest to highest severity. Two sentinels sit
//! above the severities: [`Level::NoLevel`] marks records emitted without a
//! level field, and [`Level::Disabled`] turns a logger off entirely.

use std::fmt;
use std::str::FromStr;

use crate::error::FieldlogError;

/// Severity of a log record, also used as a logger's minimum threshold.
///
/// The derived ordering is the gating order: an event passes a logger whose
/// threshold is at or below the event's level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Level {
    /// Finest-grained diagnostics.
    #[default]
    Trace,
    /// Developer-facing diagnostics.
    Debug,
    /// Normal operational records.
    Info,
    /// Something unexpected but recoverable.
    Warn,
    /// An operation failed.
    Error,
    /// The process cannot continue; emitting the record is all this core does.
    Fatal,
    /// No level field; bypasses the threshold check entirely.
    NoLevel,
    /// Sentinel threshold that drops every levelled record.
    Disabled,
}

impl Level {
    /// The string written into the `"level"` field.
    ///
    /// `NoLevel` has no textual form because no field is emitted for it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
            Self::NoLevel => "",
            Self::Disabled => "disabled",
        }
    }

    /// Check whether this level carries a `"level"` field when emitted.
    pub fn is_levelled(&self) -> bool {
        !matches!(self, Self::NoLevel | Self::Disabled)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = FieldlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            "" => Ok(Self::NoLevel),
            "disabled" => Ok(Self::Disabled),
            other => Err(FieldlogError::unknown_level(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Fatal);
        assert!(Level::Fatal < Level::Disabled);
    }

    #[test]
    fn test_string_round_trip() {
        for level in [
            Level::Trace,
            Level::Debug,
            Level::Info,
            Level::Warn,
            Level::Error,
            Level::Fatal,
            Level::NoLevel,
            Level::Disabled,
        ] {
            assert_eq!(level.as_str().parse::<Level>().unwrap(), level);
        }
    }

    #[test]
    fn test_unknown_level() {
        let err = "verbose".parse::<Level>().unwrap_err();
        assert!(matches!(err, FieldlogError::UnknownLevel { .. }));
    }

    #[test]
    fn test_levelled() {
        assert!(Level::Info.is_levelled());
        assert!(!Level::NoLevel.is_levelled());
        assert!(!Level::Disabled.is_levelled());
    }
}
