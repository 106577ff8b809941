//! The table of metrics records accumulated over a batch of traces.
//!
//! On disk the table is plain text, one record per line: the composite key,
//! then every metrics field in schema order, space separated. Values are
//! written with the shortest representation that reads back to the same
//! `f64`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use super::config_key::{ConfigKey, ConfigKeyError, Scenario};
use super::metrics::MetricsRecord;

/// Errors from building, reading or writing a metrics table
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("I/O error on metrics file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: invalid key: {source}")]
    Key {
        line: usize,
        #[source]
        source: ConfigKeyError,
    },

    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("duplicate metrics for {0}")]
    DuplicateKey(String),
}

/// Metrics records keyed by experiment, each key written at most once
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsTable {
    records: BTreeMap<ConfigKey, MetricsRecord>,
}

impl MetricsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert the record of a key not seen before
    pub fn insert(&mut self, key: ConfigKey, record: MetricsRecord) -> Result<(), TableError> {
        if self.records.contains_key(&key) {
            return Err(TableError::DuplicateKey(key.to_string()));
        }
        self.records.insert(key, record);
        Ok(())
    }

    pub fn get(&self, key: &ConfigKey) -> Option<&MetricsRecord> {
        self.records.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &ConfigKey) -> Option<&mut MetricsRecord> {
        self.records.get_mut(key)
    }

    pub(crate) fn remove(&mut self, key: &ConfigKey) -> Option<MetricsRecord> {
        self.records.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ConfigKey, &MetricsRecord)> {
        self.records.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ConfigKey> {
        self.records.keys()
    }

    /// Distinct methods present in the table
    pub fn methods(&self) -> BTreeSet<String> {
        self.records.keys().map(|k| k.method.clone()).collect()
    }

    /// Distinct scenarios present in the table
    pub fn scenarios(&self) -> BTreeSet<Scenario> {
        self.records.keys().map(|k| k.scenario.clone()).collect()
    }

    /// Format one table line
    pub fn render_line(key: &ConfigKey, record: &MetricsRecord) -> String {
        let mut line = key.to_string();
        for value in record.values() {
            line.push(' ');
            line.push_str(&value.to_string());
        }
        line
    }

    /// Parse one table line
    pub fn parse_line(text: &str, line: usize) -> Result<(ConfigKey, MetricsRecord), TableError> {
        let mut tokens = text.split_whitespace();
        let key_text = tokens.next().ok_or_else(|| TableError::Malformed {
            line,
            reason: "empty line".to_string(),
        })?;
        let key: ConfigKey = key_text
            .parse()
            .map_err(|source| TableError::Key { line, source })?;

        let values = tokens
            .map(|token| {
                token.parse::<f64>().map_err(|_| TableError::Malformed {
                    line,
                    reason: format!("invalid value '{}'", token),
                })
            })
            .collect::<Result<Vec<f64>, TableError>>()?;

        let record = MetricsRecord::from_values(&values).ok_or_else(|| TableError::Malformed {
            line,
            reason: format!(
                "expected {} values, found {}",
                MetricsRecord::field_count(),
                values.len()
            ),
        })?;
        Ok((key, record))
    }

    /// Write every record, one line each
    pub fn to_writer<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        for (key, record) in &self.records {
            writeln!(writer, "{}", Self::render_line(key, record))?;
        }
        writer.flush()
    }

    /// Read a table; blank lines are ignored
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut table = MetricsTable::new();
        for (index, line) in BufReader::new(reader).lines().enumerate() {
            let line_no = index + 1;
            let text = line.map_err(|source| TableError::Io {
                path: format!("<line {}>", line_no),
                source,
            })?;
            if text.trim().is_empty() {
                continue;
            }
            let (key, record) = Self::parse_line(&text, line_no)?;
            table.insert(key, record)?;
        }
        Ok(table)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), TableError> {
        let io_error = |source| TableError::Io {
            path: path.display().to_string(),
            source,
        };
        let file = File::create(path).map_err(io_error)?;
        self.to_writer(BufWriter::new(file)).map_err(io_error)?;
        log::info!("Wrote {} metrics records to {}", self.len(), path.display());
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self, TableError> {
        let file = File::open(path).map_err(|source| TableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_reader(file)?;
        log::info!("Read {} metrics records from {}", table.len(), path.display());
        Ok(table)
    }
}
