//! File-based logging
//!
//! The log file is opened lazily, on the first record that clears the file
//! threshold, and stays open until it is closed or the logger is dropped.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use super::buffer::{LogRecord, TIMESTAMP_FORMAT};
use super::level::Severity;
use crate::config::{Config, Value};

/// Suffix forced onto log file names that have no extension
pub const LOG_FILE_EXTENSION: &str = "log";

/// Which records reach the log file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileThreshold {
    /// Only plain `Print` output (level 0)
    #[default]
    PrintOnly,
    /// Everything at or above the given severity
    UpTo(Severity),
}

impl FileThreshold {
    /// Map a configured level; `0` and below mean print-only
    pub fn from_level(level: i64) -> Self {
        if level <= 0 {
            FileThreshold::PrintOnly
        } else {
            FileThreshold::UpTo(Severity::clamped(level))
        }
    }

    pub fn accepts(&self, severity: Severity) -> bool {
        match self {
            FileThreshold::PrintOnly => severity == Severity::Print,
            FileThreshold::UpTo(threshold) => severity.passes(*threshold),
        }
    }

    /// Verbose files get a startup banner
    pub fn is_verbose(&self) -> bool {
        matches!(self, FileThreshold::UpTo(_))
    }
}

/// How an existing log file is treated on open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Overwrite,
    Append,
}

impl WriteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteMode::Overwrite => "overwrite",
            WriteMode::Append => "append",
        }
    }
}

/// Information about the current log file
#[derive(Debug, Clone)]
pub struct LogFileInfo {
    /// Full path to the log file
    pub path: PathBuf,
    pub mode: WriteMode,
    pub threshold: FileThreshold,
}

impl LogFileInfo {
    /// Build log file settings from the `logfile*` configuration keys
    ///
    /// Returns `None` when file logging is not enabled.
    pub fn from_config(config: &Config, app_name: &str, date: &str, base_dir: &Path) -> Option<Self> {
        let name = match config.get("logfile") {
            value if !value.is_truthy() => return None,
            Value::Bool(_) => None,
            other => Some(other.to_string()),
        };
        let mode = if config.get("logfile_append").is_truthy() {
            WriteMode::Append
        } else {
            WriteMode::Overwrite
        };
        let threshold = match config.get("logfile_verbose") {
            Value::Int(level) => FileThreshold::from_level(*level),
            Value::Bool(true) => FileThreshold::UpTo(Severity::Debug),
            _ => FileThreshold::PrintOnly,
        };
        Some(Self {
            path: log_file_path(name.as_deref(), app_name, date, base_dir),
            mode,
            threshold,
        })
    }
}

/// Generate the default log file name
pub fn default_log_file_name(date: &str, app_name: &str) -> String {
    format!("{}-{}.{}", date, app_name, LOG_FILE_EXTENSION)
}

/// Resolve the log file target
///
/// Without a name the default `<date>-<app>.log` is used. Names without an
/// extension get `.log`; relative names are placed in `base_dir`.
pub fn log_file_path(name: Option<&str>, app_name: &str, date: &str, base_dir: &Path) -> PathBuf {
    let mut path = match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => PathBuf::from(shellexpand::tilde(name).as_ref()),
        None => PathBuf::from(default_log_file_name(date, app_name)),
    };
    if path.extension().is_none() {
        path.set_extension(LOG_FILE_EXTENSION);
    }
    if path.is_relative() {
        base_dir.join(path)
    } else {
        path
    }
}

/// Context written at the top of a verbose log file
#[derive(Debug, Clone)]
pub struct Banner {
    pub app_name: String,
    pub working_dir: PathBuf,
    pub command_line: String,
    pub started: DateTime<Local>,
}

impl Banner {
    fn lines(&self) -> Vec<String> {
        let started = self.started.format(TIMESTAMP_FORMAT);
        vec![
            format!(
                "{} Started {} in {}",
                started,
                self.app_name,
                self.working_dir.display()
            ),
            format!("{} Command: {}", started, self.command_line),
        ]
    }
}

/// Format one log file line
///
/// Print lines are written as-is so the file stays usable as plain output.
pub fn format_line(record: &LogRecord, line: &str) -> String {
    match record.severity() {
        Severity::Print => line.to_string(),
        severity => format!(
            "{} ({}): {}",
            record.timestamp().format(TIMESTAMP_FORMAT),
            severity.as_str(),
            line
        ),
    }
}

/// Log file sink with a lazily opened handle
pub struct FileSink {
    info: LogFileInfo,
    banner: Banner,
    file: Option<BufWriter<File>>,
}

impl FileSink {
    pub fn new(info: LogFileInfo, banner: Banner) -> Self {
        Self {
            info,
            banner,
            file: None,
        }
    }

    pub fn info(&self) -> &LogFileInfo {
        &self.info
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn accepts(&self, severity: Severity) -> bool {
        self.info.threshold.accepts(severity)
    }

    fn open(&mut self) -> Result<&mut BufWriter<File>> {
        if self.file.is_none() {
            if let Some(parent) = self.info.path.parent() {
                fs::create_dir_all(parent).context("Failed to create log directory")?;
            }

            let mut options = OpenOptions::new();
            options.create(true);
            match self.info.mode {
                WriteMode::Overwrite => options.write(true).truncate(true),
                WriteMode::Append => options.append(true),
            };
            let file = options
                .open(&self.info.path)
                .with_context(|| format!("Failed to open log file {}", self.info.path.display()))?;
            let mut writer = BufWriter::new(file);

            if self.info.threshold.is_verbose() {
                for line in self.banner.lines() {
                    writeln!(writer, "{}", line).context("Failed to write log banner")?;
                }
            }
            tracing::debug!("Opened log file {}", self.info.path.display());
            self.file = Some(writer);
        }
        self.file.as_mut().context("Log file is not open")
    }

    /// Write every line of a record, opening the file if needed
    pub fn write_record(&mut self, record: &LogRecord) -> Result<()> {
        let writer = self.open()?;
        for line in record.lines() {
            writeln!(writer, "{}", format_line(record, line)).context("Failed to write log line")?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.file.as_mut() {
            writer.flush().context("Failed to flush log file")?;
        }
        Ok(())
    }

    /// Flush and release the handle
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.file.take() {
            writer.flush().context("Failed to flush log file")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn banner() -> Banner {
        Banner {
            app_name: "tool".to_string(),
            working_dir: PathBuf::from("/work"),
            command_line: "tool --logfile".to_string(),
            started: Local::now(),
        }
    }

    fn sink(dir: &TempDir, mode: WriteMode, threshold: FileThreshold) -> FileSink {
        FileSink::new(
            LogFileInfo {
                path: dir.path().join("out.log"),
                mode,
                threshold,
            },
            banner(),
        )
    }

    #[test]
    fn test_threshold_print_only() {
        let threshold = FileThreshold::from_level(0);
        assert_eq!(threshold, FileThreshold::PrintOnly);
        assert!(threshold.accepts(Severity::Print));
        assert!(!threshold.accepts(Severity::Error));
        assert!(!threshold.accepts(Severity::Debug));
    }

    #[test]
    fn test_threshold_up_to() {
        let threshold = FileThreshold::from_level(3);
        assert!(threshold.accepts(Severity::Error));
        assert!(threshold.accepts(Severity::Warning));
        assert!(!threshold.accepts(Severity::Notice));
        assert_eq!(FileThreshold::from_level(12), FileThreshold::UpTo(Severity::Debug));
    }

    #[test]
    fn test_log_file_path() {
        let base = Path::new("/tmp/base");
        assert_eq!(
            log_file_path(None, "tool", "2026-01-21", base),
            PathBuf::from("/tmp/base/2026-01-21-tool.log")
        );
        assert_eq!(
            log_file_path(Some("run"), "tool", "2026-01-21", base),
            PathBuf::from("/tmp/base/run.log")
        );
        assert_eq!(
            log_file_path(Some("run.txt"), "tool", "2026-01-21", base),
            PathBuf::from("/tmp/base/run.txt")
        );
        assert_eq!(
            log_file_path(Some("/var/log/x"), "tool", "2026-01-21", base),
            PathBuf::from("/var/log/x.log")
        );
    }

    #[test]
    fn test_lazy_open() {
        let dir = TempDir::new().unwrap();
        let mut sink = sink(&dir, WriteMode::Overwrite, FileThreshold::PrintOnly);
        assert!(!sink.is_open());
        assert!(!dir.path().join("out.log").exists());

        sink.write_record(&LogRecord::new("hello".into(), Severity::Print))
            .unwrap();
        assert!(sink.is_open());
        sink.close().unwrap();
        assert!(!sink.is_open());

        let content = fs::read_to_string(dir.path().join("out.log")).unwrap();
        assert_eq!(content, "hello\n");
    }

    #[test]
    fn test_verbose_banner_and_prefixes() {
        let dir = TempDir::new().unwrap();
        let mut sink = sink(
            &dir,
            WriteMode::Overwrite,
            FileThreshold::UpTo(Severity::Debug),
        );
        sink.write_record(&LogRecord::new("careful".into(), Severity::Warning))
            .unwrap();
        sink.write_record(&LogRecord::new("plain".into(), Severity::Print))
            .unwrap();
        sink.close().unwrap();

        let content = fs::read_to_string(dir.path().join("out.log")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("Started tool in /work"));
        assert!(lines[1].ends_with("Command: tool --logfile"));
        assert!(lines[2].ends_with(" (WARNING): careful"));
        assert_eq!(lines[3], "plain");
    }

    #[test]
    fn test_append_mode_keeps_content() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("out.log"), "earlier\n").unwrap();

        let mut sink = sink(&dir, WriteMode::Append, FileThreshold::PrintOnly);
        sink.write_record(&LogRecord::new("later".into(), Severity::Print))
            .unwrap();
        sink.close().unwrap();

        let content = fs::read_to_string(dir.path().join("out.log")).unwrap();
        assert_eq!(content, "earlier\nlater\n");
    }

    #[test]
    fn test_overwrite_mode_truncates() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("out.log"), "earlier\n").unwrap();

        let mut sink = sink(&dir, WriteMode::Overwrite, FileThreshold::PrintOnly);
        sink.write_record(&LogRecord::new("later".into(), Severity::Print))
            .unwrap();
        sink.close().unwrap();

        let content = fs::read_to_string(dir.path().join("out.log")).unwrap();
        assert_eq!(content, "later\n");
    }

    #[test]
    fn test_info_from_config() {
        let base = Path::new("/tmp/base");
        let mut config = Config::with_defaults();
        assert!(LogFileInfo::from_config(&config, "tool", "2026-01-21", base).is_none());

        config.set("logfile", true);
        config.set("logfile_verbose", 4);
        config.set("logfile_append", true);
        let info = LogFileInfo::from_config(&config, "tool", "2026-01-21", base).unwrap();
        assert_eq!(info.path, PathBuf::from("/tmp/base/2026-01-21-tool.log"));
        assert_eq!(info.mode, WriteMode::Append);
        assert_eq!(info.threshold, FileThreshold::UpTo(Severity::Notice));

        config.set("logfile", "custom");
        let info = LogFileInfo::from_config(&config, "tool", "2026-01-21", base).unwrap();
        assert_eq!(info.path, PathBuf::from("/tmp/base/custom.log"));
    }
}
