//! Command-line argument tokenizer
//!
//! Turns raw tokens into key/value pairs plus a list of existing files.
//! There is no fixed flag schema: `--key value`, `--key:value`,
//! `--key=value`, `-vvv` counters and bare file names are all recognized.

use std::path::{Path, PathBuf};

use super::value::Value;
use super::Config;
use crate::logging::Severity;

/// Reserved flags that take the following token as their value
const VALUE_FLAGS: &[&str] = &[
    "config",
    "verbose",
    "source",
    "destination",
    "logfile",
    "logfile_verbose",
];

/// Reserved flags whose value may name an existing file
const PATH_FLAGS: &[&str] = &["source", "destination"];

/// Short forms of reserved flags
const ALIASES: &[(&str, &str)] = &[("s", "source"), ("d", "destination")];

/// Tokenized arguments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgMap {
    values: Vec<(String, Value)>,
    files: Vec<PathBuf>,
}

impl ArgMap {
    /// Get the value stored for a key
    pub fn get(&self, key: &str) -> Option<&Value> {
        let key = key.to_lowercase();
        self.values.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Store a value; a repeated key replaces the earlier value in place
    pub fn insert(&mut self, key: &str, value: Value) {
        let key = key.to_lowercase();
        match self.values.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.values.push((key, value)),
        }
    }

    pub fn values(&self) -> &[(String, Value)] {
        &self.values
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.files.is_empty()
    }
}

/// Tokenize arguments, resolving bare file names against the current directory
pub fn tokenize<I, S>(tokens: I) -> ArgMap
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    tokenize_in(tokens, &cwd)
}

/// Tokenize arguments, resolving bare file names against `base`
pub fn tokenize_in<I, S>(tokens: I, base: &Path) -> ArgMap
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tokens: Vec<String> = tokens.into_iter().map(|t| t.as_ref().to_string()).collect();
    let mut args = ArgMap::default();
    let mut index = 0;

    while index < tokens.len() {
        let token = tokens[index].as_str();
        index += 1;

        let Some(body) = strip_setter(token) else {
            if base.join(token).exists() {
                args.files.push(PathBuf::from(token));
            } else {
                args.insert(token, Value::Bool(true));
            }
            continue;
        };
        if body.is_empty() {
            continue;
        }

        // Two-token form: `--key: value` / `--key= value`
        if let Some(key) = body.strip_suffix([':', '=']) {
            let value = match tokens.get(index) {
                Some(next) => {
                    index += 1;
                    Value::from_arg(next)
                }
                None => Value::Null,
            };
            args.insert(resolve_alias(key), value);
            continue;
        }

        // Reserved flags look ahead for an optional value. Only `source` and
        // `destination` may swallow an existing file; for the others it stays
        // in `files`.
        let key = resolve_alias(body);
        let flag = key.to_lowercase();
        if VALUE_FLAGS.contains(&flag.as_str()) {
            let takes_path = PATH_FLAGS.contains(&flag.as_str());
            let value = tokens.get(index).filter(|next| {
                strip_setter(next).is_none() && (takes_path || !base.join(next.as_str()).exists())
            });
            match value {
                Some(next) => {
                    index += 1;
                    args.insert(key, Value::from_arg(next));
                }
                None => args.insert(key, Value::Bool(true)),
            }
            continue;
        }

        if let Some((flag, count)) = counter(body) {
            args.insert(&flag.to_string(), Value::Int(count));
            continue;
        }

        match body.split_once([':', '=']) {
            Some((key, value)) => args.insert(resolve_alias(key), Value::from_arg(value)),
            None => args.insert(key, Value::Bool(true)),
        }
    }

    args
}

/// Strip one or two leading dashes; `None` for non-setter tokens
fn strip_setter(token: &str) -> Option<&str> {
    let body = token.strip_prefix('-')?;
    Some(body.strip_prefix('-').unwrap_or(body))
}

fn resolve_alias(key: &str) -> &str {
    ALIASES
        .iter()
        .find(|(short, _)| *short == key)
        .map(|(_, long)| *long)
        .unwrap_or(key)
}

/// Recognize `vvvv` (a character repeated N times) and `v3` (verbosity count)
fn counter(body: &str) -> Option<(char, i64)> {
    let mut chars = body.chars();
    let first = chars.next()?;
    if first == ':' || first == '=' {
        return None;
    }
    let rest = chars.as_str();
    if rest.chars().all(|c| c == first) {
        return Some((first, body.chars().count() as i64));
    }
    if first == 'v' && !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
        return rest.parse().ok().map(|n| (first, n));
    }
    None
}

/// Work out the display level requested on the command line
///
/// `-v` counts map to `count + 1`; `--debug` means debug; an explicit
/// `--verbose N` (or bare `--verbose`) wins over both.
pub fn resolve_verbosity(config: &Config) -> Option<Severity> {
    let mut level = None;
    if let Value::Int(count) = config.get("v") {
        level = Some(Severity::clamped(count.saturating_add(1)));
    }
    if config.get("debug") == &Value::Bool(true) {
        level = Some(Severity::Debug);
    }
    match config.get("verbose") {
        Value::Int(n) => level = Some(Severity::clamped(*n)),
        Value::Bool(true) => level = Some(Severity::Debug),
        _ => {}
    }
    level
}
