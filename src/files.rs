//! Path and file helpers
//!
//! Relative paths are resolved against the working directory captured at
//! startup, and `~` is expanded to the home directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::logging::Log;

/// What a path points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Dir,
    File,
    Symlink,
    Other,
    Missing,
}

/// Timestamp used to rank files in `recent_file_in`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecencyMethod {
    #[default]
    Modified,
    Created,
}

/// Options for `Files::suggest_filename`
#[derive(Debug, Clone, Default)]
pub struct FilenameSuggestion {
    /// Proposed file name; the application name when empty
    pub suggestion: Option<String>,
    /// Target directory; a path with an extension also supplies the name
    pub path: Option<PathBuf>,
    /// Extension to enforce, including the dot (e.g. `.csv`)
    pub suffix: Option<String>,
    /// Date text prepended as `<date>-`
    pub date_prefix: Option<String>,
    /// Append `-1`, `-2`, ... until the name is free
    pub unique: bool,
}

/// File system helpers bound to a working directory
#[derive(Debug, Clone)]
pub struct Files {
    cwd: PathBuf,
    app_name: String,
}

impl Files {
    pub fn new(app_name: impl Into<String>) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::with_cwd(app_name, cwd)
    }

    pub fn with_cwd(app_name: impl Into<String>, cwd: PathBuf) -> Self {
        Self {
            cwd,
            app_name: app_name.into(),
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Resolve a path; empty means the working directory
    pub fn get_path(&self, path: &str) -> PathBuf {
        let path = path.trim();
        if path.is_empty() {
            return self.cwd.clone();
        }
        self.absolute(PathBuf::from(shellexpand::tilde(path).as_ref()))
    }

    /// Resolve a directory; a path naming a file yields its parent
    pub fn get_dir(&self, path: &str) -> PathBuf {
        let path = self.get_path(path);
        match path.parent() {
            Some(parent) if path.is_file() => parent.to_path_buf(),
            _ => path,
        }
    }

    /// Resolve a file name
    ///
    /// An empty name is fatal. With `must_exist`, anything that is not a
    /// regular file yields a warning and `None`.
    pub fn get_file<L: Log>(&self, log: &mut L, file: &str, must_exist: bool) -> Option<PathBuf> {
        if file.trim().is_empty() {
            log.error("Files: No file name supplied.");
        }
        let path = self.get_path(file);
        if must_exist && !path.is_file() {
            log.warning(vec![
                "Files: File reference supplied is not a file:".to_string(),
                format!("- {}", path.display()),
            ]);
            return None;
        }
        Some(path)
    }

    /// Find the most recently modified (or created) file
    ///
    /// An existing file matching the filter is returned as-is. Otherwise the
    /// directory (or, for a file, its parent) is searched.
    pub fn recent_file_in<L: Log>(
        &self,
        log: &mut L,
        path: &str,
        filter: Option<&str>,
        recursive: bool,
        method: RecencyMethod,
    ) -> Option<PathBuf> {
        let filter = ExtensionFilter::parse(filter);
        let mut path = self.get_path(path);

        if path.is_file() {
            if filter.matches(&path) {
                return Some(path);
            }
            log.debug(format!(
                "Files: {} does not match filter {}",
                path.display(),
                filter
            ));
        }
        if !path.is_dir() {
            match path.parent() {
                Some(parent) => path = parent.to_path_buf(),
                None => return None,
            }
        }
        if !path.is_dir() {
            log.notice(format!(
                "Files: Unable to find file in {}.",
                path.display()
            ));
            return None;
        }

        log.debug(format!("Files: Getting most recent file in {}", path.display()));
        let mut candidates = Vec::new();
        collect_files(&path, &filter, recursive, &mut candidates);
        candidates
            .into_iter()
            .filter_map(|file| file_time(&file, method).map(|time| (time, file)))
            .max_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, file)| file)
    }

    /// Propose a file name for writing output
    pub fn suggest_filename<L: Log>(&self, log: &mut L, options: &FilenameSuggestion) -> PathBuf {
        let mut suggestion = options
            .suggestion
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let mut dir = match &options.path {
            Some(path) => self.absolute(path.clone()),
            None => self.cwd.clone(),
        };
        if dir.extension().is_some() {
            if let Some(name) = dir.file_name() {
                log.debug(format!(
                    "Files: File name '{}' detected in path. Moving it to the suggested file name.",
                    name.to_string_lossy()
                ));
                suggestion.get_or_insert_with(|| PathBuf::from(name));
            }
            if let Some(parent) = dir.parent() {
                dir = parent.to_path_buf();
            }
        }

        let mut name = suggestion.unwrap_or_else(|| PathBuf::from(&self.app_name));

        if let Some(suffix) = options.suffix.as_deref() {
            let wanted = suffix.trim_start_matches('.');
            let current = name
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            if current != wanted {
                log.debug(format!(
                    "Files: Forcing suffix of '{}': got '{}', expected '{}'.",
                    name.display(),
                    current,
                    wanted
                ));
                name.set_extension(wanted);
            }
        }

        if let Some(date) = options.date_prefix.as_deref() {
            let file_name = name
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            name.set_file_name(format!("{}-{}", date, file_name));
        }

        if options.unique && dir.join(&name).is_file() {
            log.debug(format!(
                "Files: Suggested file '{}' already exists. Looking for a free number.",
                name.display()
            ));
            let stem = name
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let extension = name.extension().map(|e| e.to_string_lossy().into_owned());
            let numbered = |number: u32| {
                let mut candidate = name.with_file_name(format!("{}-{}", stem, number));
                if let Some(extension) = &extension {
                    candidate.set_extension(extension);
                }
                candidate
            };
            let mut number = 1;
            while dir.join(numbered(number)).is_file() {
                number += 1;
            }
            name = numbered(number);
        }

        dir.join(name)
    }

    fn absolute(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() {
            path
        } else {
            self.cwd.join(path)
        }
    }
}

/// Classify a path without following a final symlink
pub fn path_kind(path: &Path) -> PathKind {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => PathKind::Symlink,
        Ok(meta) if meta.is_dir() => PathKind::Dir,
        Ok(meta) if meta.is_file() => PathKind::File,
        Ok(_) => PathKind::Other,
        Err(_) => PathKind::Missing,
    }
}

/// Short form of `path` for prompts and messages
///
/// Paths under `cwd` are shown relative to it (`.` for `cwd` itself), paths
/// under the home directory start with `~`, anything else is left as is.
pub fn display_path(path: &Path, cwd: &Path) -> String {
    if let Ok(relative) = path.strip_prefix(cwd) {
        return match relative.as_os_str().is_empty() {
            true => ".".to_string(),
            false => relative.display().to_string(),
        };
    }
    match dirs::home_dir().and_then(|home| path.strip_prefix(home).ok().map(Path::to_path_buf)) {
        Some(under_home) if under_home.as_os_str().is_empty() => "~".to_string(),
        Some(under_home) => format!("~/{}", under_home.display()),
        None => path.display().to_string(),
    }
}

/// Extension filter: `None` matches everything
#[derive(Debug, Clone, PartialEq)]
struct ExtensionFilter(Option<String>);

impl ExtensionFilter {
    fn parse(filter: Option<&str>) -> Self {
        let filter = filter.map(str::trim).unwrap_or_default();
        match filter {
            "" | "*" | "*.*" => Self(None),
            other => Self(Some(
                other
                    .trim_start_matches('*')
                    .trim_start_matches('.')
                    .to_lowercase(),
            )),
        }
    }

    fn matches(&self, path: &Path) -> bool {
        match &self.0 {
            None => true,
            Some(wanted) => path
                .extension()
                .is_some_and(|e| e.to_string_lossy().to_lowercase() == *wanted),
        }
    }
}

impl std::fmt::Display for ExtensionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            None => write!(f, "*"),
            Some(ext) => write!(f, "*.{}", ext),
        }
    }
}

fn collect_files(dir: &Path, filter: &ExtensionFilter, recursive: bool, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_file() {
            if filter.matches(&path) {
                out.push(path);
            }
        } else if recursive && path.is_dir() {
            collect_files(&path, filter, recursive, out);
        }
    }
}

fn file_time(path: &Path, method: RecencyMethod) -> Option<SystemTime> {
    let meta = fs::metadata(path).ok()?;
    match method {
        RecencyMethod::Modified => meta.modified().ok(),
        // Not every file system records creation time
        RecencyMethod::Created => meta.created().or_else(|_| meta.modified()).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogBuffer, Severity};
    use crate::testing::captured_log;
    use std::panic::{self, AssertUnwindSafe};
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    fn files(dir: &TempDir) -> Files {
        Files::with_cwd("tool", dir.path().to_path_buf())
    }

    fn touch(path: &Path, age_secs: u64) {
        fs::write(path, "x").unwrap();
        let time = SystemTime::now() - Duration::from_secs(age_secs);
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn test_get_path() {
        let dir = tempdir().unwrap();
        let files = files(&dir);
        assert_eq!(files.get_path(""), dir.path());
        assert_eq!(files.get_path("a/b.txt"), dir.path().join("a/b.txt"));
        assert_eq!(files.get_path("/etc"), PathBuf::from("/etc"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(files.get_path("~/x"), home.join("x"));
        }
    }

    #[test]
    fn test_get_dir_of_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        let files = files(&dir);
        assert_eq!(files.get_dir("a.txt"), dir.path());
        assert_eq!(files.get_dir(""), dir.path());
    }

    #[test]
    fn test_get_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        let files = files(&dir);
        let (mut log, _writer) = captured_log();

        assert_eq!(
            files.get_file(&mut log, "a.txt", true),
            Some(dir.path().join("a.txt"))
        );
        assert_eq!(
            files.get_file(&mut log, "new.txt", false),
            Some(dir.path().join("new.txt"))
        );
        assert!(log.is_empty());

        assert_eq!(files.get_file(&mut log, "new.txt", true), None);
        assert_eq!(log.records()[0].severity(), Severity::Warning);
    }

    #[test]
    fn test_get_file_without_name_is_fatal() {
        let dir = tempdir().unwrap();
        let files = files(&dir);
        let (mut log, writer) = captured_log();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            files.get_file(&mut log, "  ", false);
        }));
        assert!(result.is_err());
        assert!(writer.contents().contains("No file name supplied"));
    }

    #[test]
    fn test_path_kind() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        assert_eq!(path_kind(dir.path()), PathKind::Dir);
        assert_eq!(path_kind(&dir.path().join("a.txt")), PathKind::File);
        assert_eq!(path_kind(&dir.path().join("nope")), PathKind::Missing);
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(dir.path().join("a.txt"), dir.path().join("link")).unwrap();
            assert_eq!(path_kind(&dir.path().join("link")), PathKind::Symlink);
        }
    }

    #[test]
    fn test_recent_file_in_directory() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("old.csv"), 300);
        touch(&dir.path().join("new.csv"), 10);
        touch(&dir.path().join("newest.txt"), 0);
        let files = files(&dir);
        let (mut log, _writer) = captured_log();

        let recent = |log: &mut LogBuffer, filter| {
            files.recent_file_in(log, "", filter, false, RecencyMethod::Modified)
        };
        assert_eq!(recent(&mut log, None), Some(dir.path().join("newest.txt")));
        assert_eq!(recent(&mut log, Some("*.*")), Some(dir.path().join("newest.txt")));
        for filter in ["csv", ".csv", "*.csv"] {
            assert_eq!(recent(&mut log, Some(filter)), Some(dir.path().join("new.csv")));
        }
        assert_eq!(recent(&mut log, Some("json")), None);
    }

    #[test]
    fn test_recent_file_in_with_file_argument() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("old.csv"), 300);
        touch(&dir.path().join("new.csv"), 10);
        let files = files(&dir);
        let (mut log, _writer) = captured_log();

        assert_eq!(
            files.recent_file_in(&mut log, "old.csv", Some("csv"), false, RecencyMethod::Modified),
            Some(dir.path().join("old.csv"))
        );
        assert_eq!(
            files.recent_file_in(&mut log, "old.csv", Some("txt"), false, RecencyMethod::Modified),
            None
        );
        // A missing file searches its parent
        assert_eq!(
            files.recent_file_in(&mut log, "gone.csv", Some("csv"), false, RecencyMethod::Modified),
            Some(dir.path().join("new.csv"))
        );
    }

    #[test]
    fn test_recent_file_in_recursive() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("top.csv"), 100);
        touch(&dir.path().join("sub/deep.csv"), 0);
        let files = files(&dir);
        let (mut log, _writer) = captured_log();

        assert_eq!(
            files.recent_file_in(&mut log, "", Some("csv"), false, RecencyMethod::Modified),
            Some(dir.path().join("top.csv"))
        );
        assert_eq!(
            files.recent_file_in(&mut log, "", Some("csv"), true, RecencyMethod::Modified),
            Some(dir.path().join("sub/deep.csv"))
        );
    }

    #[test]
    fn test_suggest_filename_defaults_to_app_name() {
        let dir = tempdir().unwrap();
        let files = files(&dir);
        let (mut log, _writer) = captured_log();

        let options = FilenameSuggestion {
            suffix: Some(".csv".to_string()),
            ..Default::default()
        };
        assert_eq!(
            files.suggest_filename(&mut log, &options),
            dir.path().join("tool.csv")
        );
    }

    #[test]
    fn test_suggest_filename_takes_name_from_path() {
        let dir = tempdir().unwrap();
        let files = files(&dir);
        let (mut log, _writer) = captured_log();

        let options = FilenameSuggestion {
            path: Some(PathBuf::from("out/report.txt")),
            suffix: Some("csv".to_string()),
            date_prefix: Some("2024-03-07".to_string()),
            ..Default::default()
        };
        assert_eq!(
            files.suggest_filename(&mut log, &options),
            dir.path().join("out/2024-03-07-report.csv")
        );
    }

    #[test]
    fn test_suggest_filename_unique() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("data.csv"), "x").unwrap();
        fs::write(dir.path().join("data-1.csv"), "x").unwrap();
        let files = files(&dir);
        let (mut log, _writer) = captured_log();

        let mut options = FilenameSuggestion {
            suggestion: Some("data.csv".to_string()),
            unique: true,
            ..Default::default()
        };
        assert_eq!(
            files.suggest_filename(&mut log, &options),
            dir.path().join("data-2.csv")
        );

        options.unique = false;
        assert_eq!(
            files.suggest_filename(&mut log, &options),
            dir.path().join("data.csv")
        );
    }

    #[test]
    fn test_display_path_relative_to_cwd() {
        let cwd = Path::new("/srv/reports");
        assert_eq!(display_path(&cwd.join("2024/q1.csv"), cwd), "2024/q1.csv");
        assert_eq!(display_path(cwd, cwd), ".");
        // A sibling sharing the name prefix is not under cwd
        assert_eq!(
            display_path(Path::new("/srv/reports-old/a.csv"), cwd),
            "/srv/reports-old/a.csv"
        );
    }

    #[test]
    fn test_display_path_under_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let cwd = Path::new("/srv/reports");
        assert_eq!(display_path(&home.join(".config/tool.yml"), cwd), "~/.config/tool.yml");
        assert_eq!(display_path(&home, cwd), "~");
    }
}
