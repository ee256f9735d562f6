//! Delimited text files
//!
//! Reads `.csv`/`.txt` files with a guessed separator into keyed records and
//! writes rows back out.

use std::any::Any;
use std::fmt;
use std::path::Path;

use super::Module;
use crate::logging::Log;

pub const NAME: &str = "readcsv";

/// Separator candidates, quoted forms first
const SEPARATORS: &[(&str, u8)] = &[
    ("\";\"", b';'),
    ("';'", b';'),
    ("\",\"", b','),
    ("','", b','),
    ("\"|\"", b'|'),
    ("'|'", b'|'),
    ("\"\t\"", b'\t'),
    ("'\t'", b'\t'),
    (";", b';'),
    (",", b','),
    ("|", b'|'),
    ("\t", b'\t'),
];

const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "txt"];

/// Column key: the header name, or the column index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKey {
    Name(String),
    Index(usize),
}

impl From<&str> for ColumnKey {
    fn from(name: &str) -> Self {
        ColumnKey::Name(name.to_string())
    }
}

impl From<usize> for ColumnKey {
    fn from(index: usize) -> Self {
        ColumnKey::Index(index)
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKey::Name(name) => write!(f, "{}", name),
            ColumnKey::Index(index) => write!(f, "{}", index),
        }
    }
}

/// One parsed row, columns in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRecord(Vec<(ColumnKey, String)>);

impl CsvRecord {
    pub fn get(&self, key: impl Into<ColumnKey>) -> Option<&str> {
        let key = key.into();
        self.0
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn columns(&self) -> &[(ColumnKey, String)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ReadCsv;

impl ReadCsv {
    pub fn load(_log: &mut dyn Log) -> Box<dyn Module> {
        Box::new(ReadCsv)
    }

    /// Read a delimited file
    ///
    /// With `header`, the first row names the columns and every row carries
    /// every named column. Missing, unsupported or empty files are fatal.
    pub fn read<L: Log>(&self, log: &mut L, source: &Path, header: bool) -> Vec<CsvRecord> {
        let fail = |reason: String| {
            vec![
                format!("ReadCsv: Error when trying to read '{}'.", source.display()),
                reason,
            ]
        };

        if !source.is_file() {
            log.error(fail("File does not exist.".to_string()));
        }
        let extension = source
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            log.error(fail(format!("File suffix '.{}' is not supported.", extension)));
        }

        log.debug(format!("ReadCsv: Reading {}", source.display()));
        let content = match std::fs::read_to_string(source) {
            Ok(content) => content,
            Err(e) => log.error(fail(e.to_string())),
        };
        let Some(first_line) = content.lines().next() else {
            log.error(fail("File is empty and cannot be read.".to_string()));
        };

        let Some(separator) = guess_separator(first_line) else {
            let supported: Vec<String> = SEPARATORS.iter().map(|(s, _)| format!("{:?}", s)).collect();
            log.error(vec![
                "ReadCsv: Error when detecting the separator. No character detected.".to_string(),
                format!("Supported characters are: {}", supported.join(", ")),
            ]);
        };
        log.debug(format!(
            "ReadCsv: Detected separator: {:?}",
            char::from(separator)
        ));

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(separator)
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for row in reader.records() {
            match row {
                Ok(row) => rows.push(row),
                Err(e) => log.error(fail(e.to_string())),
            }
        }

        let mut rows = rows.into_iter();
        let header: Option<Vec<ColumnKey>> = if header {
            rows.next().map(|names| {
                names
                    .iter()
                    .enumerate()
                    .map(|(index, name)| match name {
                        "" => ColumnKey::Index(index),
                        name => ColumnKey::Name(name.to_string()),
                    })
                    .collect()
            })
        } else {
            None
        };

        rows.filter(|row| row.iter().any(|field| !field.is_empty()))
            .map(|row| match &header {
                Some(names) => {
                    let width = names.len().max(row.len());
                    let columns = (0..width)
                        .filter_map(|index| {
                            let value = row.get(index).unwrap_or_default();
                            match names.get(index) {
                                Some(name) => Some((name.clone(), value.to_string())),
                                None if !value.is_empty() => {
                                    Some((ColumnKey::Index(index), value.to_string()))
                                }
                                None => None,
                            }
                        })
                        .collect();
                    CsvRecord(columns)
                }
                None => CsvRecord(
                    row.iter()
                        .enumerate()
                        .map(|(index, value)| (ColumnKey::Index(index), value.to_string()))
                        .collect(),
                ),
            })
            .collect()
    }

    /// Write rows to `target`, fields joined by `separator`
    pub fn write<L: Log>(
        &self,
        log: &mut L,
        target: Option<&Path>,
        rows: &[Vec<String>],
        separator: u8,
    ) {
        let Some(target) = target else {
            log.error("ReadCsv: Data was sent to an output file but no file name was specified.");
        };
        log.debug(format!("ReadCsv: Writing {} rows to {}", rows.len(), target.display()));

        let result = csv::WriterBuilder::new()
            .delimiter(separator)
            .flexible(true)
            .from_path(target)
            .and_then(|mut writer| {
                for row in rows {
                    writer.write_record(row)?;
                }
                writer.flush()?;
                Ok(())
            });
        if let Err(e) = result {
            log.error(vec![
                format!("ReadCsv: Error when trying to write '{}'.", target.display()),
                e.to_string(),
            ]);
        }
    }
}

impl Module for ReadCsv {
    fn name(&self) -> &str {
        NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn guess_separator(line: &str) -> Option<u8> {
    SEPARATORS
        .iter()
        .find(|(pattern, _)| line.contains(pattern))
        .map(|(_, separator)| *separator)
}
