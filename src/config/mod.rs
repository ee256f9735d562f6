//! Configuration management
//!
//! All configuration lives in one flat map of lowercase, dot-separated keys.
//! It is built once at startup in a fixed order: built-in defaults, then an
//! optional template file, then command-line arguments.

mod args;
mod template;
mod value;

use std::collections::BTreeMap;
use std::path::Path;

use crate::logging::{Log, DEFAULT_MAX_BUFFER_SIZE};

pub use args::{resolve_verbosity, tokenize, tokenize_in, ArgMap};
pub use template::{
    custom_template_stem, locate_template, read_template, TemplateError, APP_TEMPLATE_PREFIX,
    CUSTOM_TEMPLATE_PREFIX, TEMPLATE_EXTENSIONS,
};
pub use value::Value;

/// Joins prefix segments and keys
pub const KEY_SEPARATOR: &str = ".";

/// Template key that locks existing keys against later layers
pub const PERSISTENCE_KEY: &str = "persistence";

/// Directory holding template files, relative to the install location
pub const CONF_DIR: &str = "conf";

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    entries: BTreeMap<String, Value>,
    allow_overwrite: bool,
    persistence_applied: bool,
    fallback: Value,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Create an empty configuration that allows overwrites
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            allow_overwrite: true,
            persistence_applied: false,
            fallback: Value::Null,
        }
    }

    /// Create a configuration holding the built-in defaults
    pub fn with_defaults() -> Self {
        let mut config = Self::new();
        config.set("logfile", false);
        config.set("logfile_append", false);
        config.set("logfile_verbose", 0);
        config.set("log_buffer_size", DEFAULT_MAX_BUFFER_SIZE as i64);
        config
    }

    /// Set a value
    ///
    /// Returns `false` when overwriting is disabled and the key exists.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> bool {
        self.set_prefixed(key, value, &[])
    }

    /// Set a value below the given prefix segments
    ///
    /// Mappings are flattened into dotted keys instead of being stored whole.
    pub fn set_prefixed(&mut self, key: &str, value: impl Into<Value>, prefix: &[&str]) -> bool {
        let key = normalize_key(key, prefix);
        self.insert(key, value.into())
    }

    fn insert(&mut self, key: String, value: Value) -> bool {
        match value {
            Value::Map(entries) => {
                let mut stored = true;
                for (sub_key, sub_value) in entries {
                    let full_key = normalize_key(&sub_key, &[key.as_str()]);
                    stored &= self.insert(full_key, sub_value);
                }
                stored
            }
            value => {
                if !self.allow_overwrite && self.entries.contains_key(&key) {
                    return false;
                }
                self.entries.insert(key, normalize_value(value));
                true
            }
        }
    }

    /// Look up a value, falling back to the configured default
    pub fn get(&self, key: &str) -> &Value {
        self.get_prefixed(key, &[])
    }

    pub fn get_prefixed(&self, key: &str, prefix: &[&str]) -> &Value {
        self.entries
            .get(&normalize_key(key, prefix))
            .unwrap_or(&self.fallback)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&normalize_key(key, &[]))
    }

    /// Change the value returned for missing keys
    pub fn set_fallback(&mut self, fallback: Value) {
        self.fallback = fallback;
    }

    pub fn allow_overwrite(&self) -> bool {
        self.allow_overwrite
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Layer the entries of a template file
    ///
    /// A truthy `persistence` key disables overwriting for every layer that
    /// follows. The policy can only be flipped once.
    pub fn apply_template(&mut self, entries: Vec<(String, Value)>) {
        let mut persist = false;
        for (key, value) in entries {
            if key.trim().eq_ignore_ascii_case(PERSISTENCE_KEY) && value.is_truthy() {
                persist = true;
            }
            self.set(&key, value);
        }
        if persist && !self.persistence_applied {
            self.allow_overwrite = false;
            self.persistence_applied = true;
        }
    }

    /// Layer tokenized command-line arguments
    pub fn apply_args(&mut self, args: &ArgMap) {
        for (key, value) in args.values() {
            self.set(key, value.clone());
        }
        if !args.files().is_empty() {
            let files: Vec<Value> = args.files().iter().map(|f| Value::from(f.as_path())).collect();
            self.set("files", Value::List(files));
        }
    }

    /// Build the configuration for an application run
    ///
    /// Defaults first, then the template requested with `--config`, then the
    /// arguments themselves.
    pub fn bootstrap<L: Log>(args: &ArgMap, app_name: &str, conf_dir: &Path, log: &mut L) -> Self {
        let mut config = Self::with_defaults();

        match args.get("config") {
            None | Some(Value::Null) | Some(Value::Bool(false)) => {}
            Some(Value::Bool(true)) => {
                let stem = format!("{}{}", APP_TEMPLATE_PREFIX, app_name);
                match locate_template(conf_dir, Path::new(&stem)) {
                    Some(path) => config.load_template(&path, log),
                    None => log.debug(format!(
                        "No configuration template '{}' in '{}'.",
                        stem,
                        conf_dir.display()
                    )),
                }
            }
            Some(name) => {
                let stem = custom_template_stem(&name.to_string());
                match locate_template(conf_dir, &stem) {
                    Some(path) => config.load_template(&path, log),
                    None => log.warning(vec![
                        format!("Configuration template '{}' not found.", stem.display()),
                        format!("Looked in '{}'.", conf_dir.display()),
                    ]),
                }
            }
        }

        config.apply_args(args);
        config
    }

    fn load_template<L: Log>(&mut self, path: &Path, log: &mut L) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        log.debug(format!("Reading configuration from '{}'.", name));
        match read_template(path) {
            Ok(entries) => self.apply_template(entries),
            Err(e) => log.error(vec![
                "Config: Error when reading configuration template:".to_string(),
                e.to_string(),
            ]),
        }
    }

    pub fn is_truthy(&self, key: &str) -> bool {
        self.get(key).is_truthy()
    }
}

fn normalize_key(key: &str, prefix: &[&str]) -> String {
    prefix
        .iter()
        .copied()
        .chain(std::iter::once(key))
        .map(|segment| segment.trim().to_lowercase())
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

/// Trim strings and coerce the literal `true`/`false`/`none`
fn normalize_value(value: Value) -> Value {
    match value {
        Value::Str(s) => {
            let trimmed = s.trim();
            match trimmed.to_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "none" => Value::Null,
                _ => Value::Str(trimmed.to_string()),
            }
        }
        other => other,
    }
}
