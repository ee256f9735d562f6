//! Application context
//!
//! Bundles the core components (logging, config, files, date, prompts and
//! modules) and runs the startup sequence for a command-line program.

use std::path::{Path, PathBuf};

use crate::config::{resolve_verbosity, tokenize_in, Config, Value, CONF_DIR};
use crate::date::Clock;
use crate::files::Files;
use crate::interact::{Prompter, Question};
use crate::logging::{Banner, ConsoleLog, FileSink, Log, LogBuffer, LogFileInfo};
use crate::modules::{Module, ModuleRegistry};

/// Name used when the executable name cannot be determined
pub const DEFAULT_APP_NAME: &str = "app";

/// Core components reported at startup
pub const CORE_COMPONENTS: &[&str] = &["Logging", "Files", "Config", "Interact", "Date"];

/// Everything a program built on this crate needs at runtime
pub struct App {
    name: String,
    core_path: PathBuf,
    command_line: String,
    pub log: LogBuffer,
    pub config: Config,
    pub files: Files,
    pub date: Clock,
    pub prompter: Prompter,
    pub modules: ModuleRegistry,
}

impl App {
    /// Create the context for an application called `name`
    ///
    /// Templates are looked up next to the running executable.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let core_path = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            files: Files::new(name.clone()),
            name,
            core_path,
            command_line: std::env::args().collect::<Vec<_>>().join(" "),
            log: LogBuffer::new(),
            config: Config::with_defaults(),
            date: Clock::new(),
            prompter: Prompter::new(),
            modules: ModuleRegistry::with_builtin(),
        }
    }

    /// Create the context, naming the application after the executable
    pub fn from_env() -> Self {
        let argv0 = std::env::args().next().unwrap_or_default();
        Self::new(app_name_from(&argv0))
    }

    /// Directory that holds the `conf/` templates
    pub fn with_core_path(mut self, core_path: PathBuf) -> Self {
        self.core_path = core_path;
        self
    }

    /// Working directory used for relative paths and the log file
    pub fn with_cwd(mut self, cwd: PathBuf) -> Self {
        self.files = Files::with_cwd(self.name.clone(), cwd);
        self
    }

    pub fn with_log(mut self, log: LogBuffer) -> Self {
        self.log = log;
        self
    }

    pub fn with_prompter(mut self, prompter: Prompter) -> Self {
        self.prompter = prompter;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn core_path(&self) -> &Path {
        &self.core_path
    }

    pub fn conf_dir(&self) -> PathBuf {
        self.core_path.join(CONF_DIR)
    }

    /// Run the startup sequence against the given arguments
    ///
    /// Arguments exclude the program name.
    pub fn run<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args = tokenize_in(args, self.files.cwd());
        self.config = Config::bootstrap(&args, &self.name, &self.conf_dir(), &mut self.log);

        if let Some(level) = resolve_verbosity(&self.config) {
            self.log.set_display_level(level.number().into());
        }
        if let Value::Int(size) = self.config.get("log_buffer_size") {
            if let Ok(size) = usize::try_from(*size) {
                self.log.set_max_size(size);
            }
        }

        self.init_log_file();
        self.log.debug(format!(
            "Loaded core with following components: {}",
            CORE_COMPONENTS.join(", ")
        ));
    }

    fn init_log_file(&mut self) {
        let date = self.date.date("standard");
        let Some(info) = LogFileInfo::from_config(&self.config, &self.name, &date, self.files.cwd())
        else {
            return;
        };
        let message = format!(
            "Logging to '{}' ({} mode).",
            info.path.display(),
            info.mode.as_str()
        );
        let banner = Banner {
            app_name: self.name.clone(),
            working_dir: self.files.cwd().to_path_buf(),
            command_line: self.command_line.clone(),
            started: self.date.now(),
        };
        self.log.attach_file_sink(FileSink::new(info, banner));
        self.log.notice(message);
    }

    /// Ask the user a question
    pub fn ask(&mut self, question: &Question) -> Option<Value> {
        self.prompter.ask(&mut self.log, &self.config, question)
    }

    /// Get a module, loading it on first use
    pub fn module<T: Module>(&mut self, name: &str) -> Option<&mut T> {
        self.modules.get::<T, _>(&mut self.log, name)
    }
}

/// File stem of the program path, or the default name when there is none
fn app_name_from(argv0: &str) -> String {
    if argv0.trim().is_empty() {
        return DEFAULT_APP_NAME.to_string();
    }
    Files::new(DEFAULT_APP_NAME)
        .get_file(&mut ConsoleLog, argv0, false)
        .and_then(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| DEFAULT_APP_NAME.to_string())
}
