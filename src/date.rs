//! Date and time helpers pinned to the application start

use std::fmt::Write;

use chrono::{DateTime, Duration, Local};

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

/// A fixed instant, captured once when the application starts
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    now: DateTime<Local>,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        Self::at(Local::now())
    }

    pub fn at(now: DateTime<Local>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Local> {
        self.now
    }

    /// Format the date
    ///
    /// Accepts the shortcuts `natural`, `standard` and `monthname`; anything
    /// else is used as a strftime pattern. An invalid pattern falls back to
    /// the standard layout.
    pub fn date(&self, format: &str) -> String {
        let format = match format {
            "" | "standard" => DEFAULT_DATE_FORMAT,
            "natural" => "%d-%m-%Y",
            "monthname" => "%d-%B-%Y",
            other => other,
        };
        self.format_or(format, DEFAULT_DATE_FORMAT)
    }

    /// Format the time; an empty format means `%H:%M:%S`
    pub fn time(&self, format: &str) -> String {
        let format = if format.is_empty() {
            DEFAULT_TIME_FORMAT
        } else {
            format
        };
        self.format_or(format, DEFAULT_TIME_FORMAT)
    }

    pub fn datetime(&self) -> String {
        format!("{} {}", self.date(""), self.time(""))
    }

    /// Time elapsed between `origin` and this clock's instant
    pub fn age(&self, origin: DateTime<Local>) -> Duration {
        self.now.signed_duration_since(origin)
    }

    fn format_or(&self, format: &str, fallback: &str) -> String {
        let mut out = String::new();
        if write!(out, "{}", self.now.format(format)).is_err() {
            tracing::debug!("Invalid date format '{}', using '{}'", format, fallback);
            out.clear();
            // The fallbacks are known-good patterns
            let _ = write!(out, "{}", self.now.format(fallback));
        }
        out
    }
}
