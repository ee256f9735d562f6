//! Console output for buffered log records

use std::io::{self, Write};

use super::buffer::{LogRecord, TIMESTAMP_FORMAT};
use super::level::Severity;

/// Default console threshold: errors and plain output
pub const DEFAULT_DISPLAY_LEVEL: Severity = Severity::Print;

/// Writes log records to the console (or any writer)
pub struct DisplaySink {
    min_level: Severity,
    out: Box<dyn Write>,
}

impl Default for DisplaySink {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink {
    /// Create a sink writing to stdout
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    /// Create a sink writing to a custom writer
    pub fn with_writer(out: Box<dyn Write>) -> Self {
        Self {
            min_level: DEFAULT_DISPLAY_LEVEL,
            out,
        }
    }

    pub fn level(&self) -> Severity {
        self.min_level
    }

    /// Replace the threshold, returning the previous one if it changed
    pub(crate) fn set_level(&mut self, level: Severity) -> Option<Severity> {
        if level == self.min_level {
            return None;
        }
        let previous = self.min_level;
        self.min_level = level;
        Some(previous)
    }

    pub fn accepts(&self, severity: Severity) -> bool {
        severity.passes(self.min_level)
    }

    /// Write one record
    ///
    /// The first line carries the tag; following lines are padded with the
    /// same width so multi-line messages stay aligned.
    pub fn emit(&mut self, record: &LogRecord) -> io::Result<()> {
        let mut prefix = tag(record);
        for line in record.lines() {
            writeln!(self.out, "{}{}", prefix, line)?;
            prefix = " ".repeat(prefix.chars().count());
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

fn tag(record: &LogRecord) -> String {
    match record.severity() {
        Severity::Error => "[! Error] ".to_string(),
        Severity::Print => String::new(),
        Severity::Warning => "[w] ".to_string(),
        Severity::Notice => "[n] ".to_string(),
        Severity::Debug => format!("{} ", record.timestamp().format(TIMESTAMP_FORMAT)),
    }
}
