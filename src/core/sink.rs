//! Output sinks and existence checks.
//!
//! Writing and "does this output already exist" are separate traits so the
//! supplementary merger's only-if-missing rule can be checked against an
//! in-memory listing.

use crate::core::error::EtlError;
use crate::core::table::Table;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

/// Record of one written output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenFile {
    pub name: String,
    pub rows: usize,
    pub sha256: String,
}

pub trait OutputSink {
    /// Persist `table` under `name`, replacing any previous content.
    fn write(&mut self, name: &str, table: &Table) -> Result<WrittenFile, EtlError>;
}

pub trait OutputListing {
    fn exists(&self, name: &str) -> bool;
}

/// Render a table as comma-delimited text with a header row.
pub fn encode_csv(table: &Table) -> Result<Vec<u8>, EtlError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(&table.columns)?;
    for row in &table.rows {
        wtr.write_record(row)?;
    }
    wtr.into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Writes CSV files below a root directory; logical names are relative paths.
#[derive(Debug, Clone)]
pub struct CsvDirSink {
    pub root: PathBuf,
}

impl CsvDirSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl OutputSink for CsvDirSink {
    fn write(&mut self, name: &str, table: &Table) -> Result<WrittenFile, EtlError> {
        let path = self.path_for(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = encode_csv(table)?;
        fs::write(&path, &bytes)?;
        tracing::debug!(file = name, rows = table.rows.len(), "wrote output");
        Ok(WrittenFile {
            name: name.to_string(),
            rows: table.rows.len(),
            sha256: hash_bytes(&bytes),
        })
    }
}

impl OutputListing for CsvDirSink {
    fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }
}

/// Sink that keeps tables in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub tables: BTreeMap<String, Table>,
}

impl OutputSink for MemorySink {
    fn write(&mut self, name: &str, table: &Table) -> Result<WrittenFile, EtlError> {
        let bytes = encode_csv(table)?;
        self.tables.insert(name.to_string(), table.clone());
        Ok(WrittenFile {
            name: name.to_string(),
            rows: table.rows.len(),
            sha256: hash_bytes(&bytes),
        })
    }
}

impl OutputListing for MemorySink {
    fn exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }
}

/// Fixed set of names that already exist.
#[derive(Debug, Clone, Default)]
pub struct MemoryListing {
    pub names: BTreeSet<String>,
}

impl MemoryListing {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl OutputListing for MemoryListing {
    fn exists(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Table {
        let mut table = Table::new(["concept", "name", "concept_type"]);
        table.push(vec![
            "se_1".to_string(),
            "Rate, total".to_string(),
            "measure".to_string(),
        ]);
        table
    }

    #[test]
    fn test_encode_csv_quotes_when_needed() {
        let text = String::from_utf8(encode_csv(&sample()).unwrap()).unwrap();
        assert_eq!(text, "concept,name,concept_type\nse_1,\"Rate, total\",measure\n");
    }

    #[test]
    fn test_dir_sink_creates_nested_dirs_and_reports_existence() {
        let tmp = tempdir().unwrap();
        let mut sink = CsvDirSink::new(tmp.path());
        let name = "global_datapoints/ddf--datapoints--x--by--global--year.csv";
        assert!(!sink.exists(name));
        let written = sink.write(name, &sample()).unwrap();
        assert!(sink.exists(name));
        assert_eq!(written.rows, 1);
        let on_disk = fs::read(tmp.path().join(name)).unwrap();
        assert_eq!(written.sha256, hash_bytes(&on_disk));
    }

    #[test]
    fn test_memory_listing() {
        let listing = MemoryListing::new(["a.csv"]);
        assert!(listing.exists("a.csv"));
        assert!(!listing.exists("b.csv"));
    }
}
