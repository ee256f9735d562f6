//! Logging system
//!
//! Provides the buffered, leveled log used for program output (console plus
//! optional log file) and the `tracing` setup used for internal diagnostics.

mod buffer;
mod content;
mod display;
mod file_writer;
mod level;
mod log;

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use buffer::{ExitHook, LogBuffer, LogRecord, DEFAULT_MAX_BUFFER_SIZE, TIMESTAMP_FORMAT};
pub use content::{normalize_content, Content};
pub use display::{DisplaySink, DEFAULT_DISPLAY_LEVEL};
pub use file_writer::{
    default_log_file_name, format_line, log_file_path, Banner, FileSink, FileThreshold,
    LogFileInfo, WriteMode,
};
pub use level::{normalize_level, Severity};
pub use log::{ConsoleLog, Log};

/// Install the diagnostics subscriber on stderr
///
/// Filtered through `RUST_LOG`; defaults to warnings from this crate.
pub fn init_tracing() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "scaffold=warn".into());

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
        .context("Failed to initialize tracing")
}
