//! Severity levels
//!
//! Lower numbers are more severe. A sink threshold of `n` lets through every
//! record whose severity number is `<= n`.

use crate::config::Value;

/// Severity of a log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Fatal: the process terminates after the buffer is flushed
    Error = 1,
    /// Plain program output
    Print = 2,
    Warning = 3,
    Notice = 4,
    Debug = 5,
}

impl Severity {
    /// Get the textual name used in log files
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Print => "PRINT",
            Severity::Warning => "WARNING",
            Severity::Notice => "NOTICE",
            Severity::Debug => "DEBUG",
        }
    }

    pub fn number(self) -> u8 {
        self as u8
    }

    /// Convert a level number, mapping anything outside `1..=5` to `Debug`
    pub fn from_number(level: i64) -> Self {
        match level {
            1 => Severity::Error,
            2 => Severity::Print,
            3 => Severity::Warning,
            4 => Severity::Notice,
            _ => Severity::Debug,
        }
    }

    /// Convert a level number, clamping it into `1..=5`
    pub fn clamped(level: i64) -> Self {
        Self::from_number(level.clamp(1, 5))
    }

    /// Whether a record of this severity passes a sink with `threshold`
    pub fn passes(self, threshold: Severity) -> bool {
        self <= threshold
    }
}

/// Normalize an arbitrary value into a severity
///
/// Non-integers and integers outside `1..=5` become `Debug`, so a bad level
/// makes a message more visible rather than dropping it.
pub fn normalize_level(value: &Value) -> Severity {
    match value {
        Value::Int(n) => Severity::from_number(*n),
        _ => Severity::Debug,
    }
}
