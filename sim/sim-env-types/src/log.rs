//! Diagnostic severity levels.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Severity of a diagnostic message, ordered `Debug < Info < Warn < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum LogLevel {
    /// Verbose developer output.
    Debug = 0,
    /// Informational messages.
    #[default]
    Info = 1,
    /// Something unexpected that does not stop the caller.
    Warn = 2,
    /// A failure the caller should react to.
    Error = 3,
}

impl LogLevel {
    /// Decode a level from its numeric representation.
    ///
    /// Values above `3` saturate to [`LogLevel::Error`].
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Debug,
            1 => Self::Info,
            2 => Self::Warn,
            _ => Self::Error,
        }
    }

    /// Numeric representation.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether a message at this level passes the given threshold.
    #[must_use]
    pub fn passes(self, threshold: Self) -> bool {
        self >= threshold
    }

    /// Tag printed in front of each line.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Debug => "[Debug]",
            Self::Info => "[Info]",
            Self::Warn => "[Warning]",
            Self::Error => "[Error]",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LogLevel::Error.passes(LogLevel::Warn));
        assert!(!LogLevel::Debug.passes(LogLevel::Info));
        assert!(LogLevel::Info.passes(LogLevel::Info));
    }

    #[test]
    fn test_u8_round_trip() {
        for level in [
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ] {
            assert_eq!(LogLevel::from_u8(level.as_u8()), level);
        }
        assert_eq!(LogLevel::from_u8(200), LogLevel::Error);
    }
}
