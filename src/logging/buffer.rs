//! Buffered, leveled logging
//!
//! Records are collected in memory and pushed to the display sink and the
//! optional file sink on flush. Each sink filters records by its own
//! threshold.

use chrono::{DateTime, Local};

use super::content::Content;
use super::display::DisplaySink;
use super::file_writer::FileSink;
use super::level::Severity;
use super::log::Log;

/// Number of records the buffer holds before flushing on its own
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 16;

/// Timestamp layout used by both sinks
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Called to terminate the process after a fatal record has been flushed
pub type ExitHook = fn(i32) -> !;

fn exit_process(code: i32) -> ! {
    std::process::exit(code)
}

/// A single buffered log record
#[derive(Debug, Clone)]
pub struct LogRecord {
    content: Vec<String>,
    severity: Severity,
    timestamp: DateTime<Local>,
}

impl LogRecord {
    /// Create a new record stamped with the current time
    pub fn new(content: Content, severity: Severity) -> Self {
        Self {
            content: content.into_lines(),
            severity,
            timestamp: Local::now(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.content
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }
}

/// In-memory log buffer with a display sink and an optional file sink
pub struct LogBuffer {
    records: Vec<LogRecord>,
    max_size: usize,
    display: DisplaySink,
    file: Option<FileSink>,
    exit: ExitHook,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LogBuffer {
    /// Create a buffer that displays on stdout
    pub fn new() -> Self {
        Self::with_display(DisplaySink::new())
    }

    pub fn with_display(display: DisplaySink) -> Self {
        Self {
            records: Vec::with_capacity(DEFAULT_MAX_BUFFER_SIZE + 1),
            max_size: DEFAULT_MAX_BUFFER_SIZE,
            display,
            file: None,
            exit: exit_process,
        }
    }

    /// Replace the hook that ends the process on a fatal error
    pub fn with_exit_hook(mut self, exit: ExitHook) -> Self {
        self.exit = exit;
        self
    }

    /// Get the number of buffered records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size.max(1);
    }

    pub fn display_level(&self) -> Severity {
        self.display.level()
    }

    /// Change the console threshold, clamped into `1..=5`
    ///
    /// The change itself is logged at debug level.
    pub fn set_display_level(&mut self, level: i64) {
        let level = Severity::clamped(level);
        if let Some(previous) = self.display.set_level(level) {
            self.debug(format!(
                "Changed display level from {} to {}.",
                previous.number(),
                level.number()
            ));
        }
    }

    /// Attach the log file sink; a previously attached sink is closed first
    pub fn attach_file_sink(&mut self, sink: FileSink) {
        self.close_file();
        self.file = Some(sink);
    }

    pub fn file_sink(&self) -> Option<&FileSink> {
        self.file.as_ref()
    }

    /// Flush and close the log file, swallowing any failure
    pub fn close_file(&mut self) {
        if let Some(mut sink) = self.file.take() {
            if let Err(e) = sink.close() {
                tracing::warn!("Failed to close log file: {:#}", e);
            }
        }
    }

    fn push(&mut self, record: LogRecord) {
        self.records.push(record);
        if self.records.len() > self.max_size {
            self.flush();
        }
    }

    fn drain(&mut self) {
        let records = std::mem::take(&mut self.records);
        let mut file_error = None;

        for record in &records {
            if self.display.accepts(record.severity()) {
                if let Err(e) = self.display.emit(record) {
                    tracing::warn!("Failed to write to display: {}", e);
                }
            }
            if let Some(sink) = self.file.as_mut() {
                if file_error.is_none() && sink.accepts(record.severity()) {
                    if let Err(e) = sink.write_record(record) {
                        file_error = Some(e);
                    }
                }
            }
        }

        if let Err(e) = self.display.flush() {
            tracing::warn!("Failed to flush display: {}", e);
        }
        if let Some(sink) = self.file.as_mut() {
            if file_error.is_none() {
                file_error = sink.flush().err();
            }
        }

        // A broken log file is dropped; the warning shows up on the next flush.
        if let Some(e) = file_error {
            let path = self
                .file
                .take()
                .map(|sink| sink.info().path.display().to_string())
                .unwrap_or_default();
            self.records.push(LogRecord::new(
                Content::from(vec![
                    format!("Logging to file '{}' stopped.", path),
                    format!("{:#}", e),
                ]),
                Severity::Warning,
            ));
        }
    }
}

impl Log for LogBuffer {
    fn add(&mut self, content: Content, severity: Severity) {
        self.push(LogRecord::new(content, severity));
    }

    fn flush(&mut self) {
        self.drain();
    }

    fn fatal(&mut self, content: Content) -> ! {
        self.records.push(LogRecord::new(content, Severity::Error));
        self.drain();
        // A failing file sink re-queues its stop warning; the sink is gone by
        // now, so the second pass only reaches the display.
        if !self.records.is_empty() {
            self.drain();
        }
        self.close_file();
        eprintln!(
            "{} Stopping application because of error.",
            Local::now().format(TIMESTAMP_FORMAT)
        );
        (self.exit)(1)
    }
}

impl Drop for LogBuffer {
    fn drop(&mut self) {
        self.drain();
        self.close_file();
    }
}
