//! Configuration template files
//!
//! Templates live in the `conf/` directory next to the installed program and
//! are found by naming convention: `app_<appname>` for a bare `--config`,
//! `custom_<name>` for `--config <name>`. YAML, TOML and JSON are accepted.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::value::Value;

pub const APP_TEMPLATE_PREFIX: &str = "app_";
pub const CUSTOM_TEMPLATE_PREFIX: &str = "custom_";

/// Extensions tried, in order, for a template stem
pub const TEMPLATE_EXTENSIONS: &[&str] = &["yml", "yaml", "toml", "json"];

/// Errors raised while reading a template file
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unsupported template format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("{0} does not contain a key/value mapping")]
    NotAMapping(PathBuf),
}

/// Stem of a custom template for `--config <name>`
///
/// Directory components are kept; only the file name gets the prefix and any
/// extension is dropped.
pub fn custom_template_stem(name: &str) -> PathBuf {
    let path = Path::new(name.trim());
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}{}", CUSTOM_TEMPLATE_PREFIX, stem))
}

/// Find the first existing template file for a stem
pub fn locate_template(conf_dir: &Path, stem: &Path) -> Option<PathBuf> {
    let found = TEMPLATE_EXTENSIONS
        .iter()
        .map(|ext| conf_dir.join(stem).with_extension(ext))
        .find(|candidate| candidate.is_file());
    tracing::debug!(
        "Template lookup for {} in {}: {:?}",
        stem.display(),
        conf_dir.display(),
        found
    );
    found
}

/// Read a template into ordered key/value pairs
///
/// An empty file yields no entries.
pub fn read_template(path: &Path) -> Result<Vec<(String, Value)>, TemplateError> {
    let content = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_error = |message: String| TemplateError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let value = match extension.as_str() {
        "yml" | "yaml" => serde_yaml::from_str::<serde_yaml::Value>(&content)
            .map(Value::from)
            .map_err(|e| parse_error(e.to_string()))?,
        "toml" => content
            .parse::<toml::Table>()
            .map(|table| Value::from(toml::Value::Table(table)))
            .map_err(|e| parse_error(e.to_string()))?,
        "json" => serde_json::from_str::<serde_json::Value>(&content)
            .map(Value::from)
            .map_err(|e| parse_error(e.to_string()))?,
        _ => return Err(TemplateError::UnsupportedFormat(path.to_path_buf())),
    };

    match value {
        Value::Null => Ok(Vec::new()),
        Value::Map(entries) => Ok(entries),
        _ => Err(TemplateError::NotAMapping(path.to_path_buf())),
    }
}
