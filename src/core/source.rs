//! Raw table suppliers.
//!
//! The archive is consumed through `TableSource`: give it a table name, get a
//! `RawTable` back. `DirSource` reads an extracted archive where each table is
//! a `<name>.csv` file.

use crate::core::error::EtlError;
use crate::core::table::RawTable;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub trait TableSource {
    fn load(&self, table: &str) -> Result<RawTable, EtlError>;
}

/// Extracted archive directory.
#[derive(Debug, Clone)]
pub struct DirSource {
    pub root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.root.join(format!("{}.csv", table))
    }
}

impl TableSource for DirSource {
    fn load(&self, table: &str) -> Result<RawTable, EtlError> {
        let path = self.table_path(table);
        if !path.is_file() {
            return Err(EtlError::MissingTable(format!(
                "{} (expected at {})",
                table,
                path.display()
            )));
        }
        read_csv_file(&path, table)
    }
}

/// Read a CSV file with a header row into a `RawTable`.
pub fn read_csv_file(path: &Path, name: &str) -> Result<RawTable, EtlError> {
    let file = File::open(path)?;
    read_csv(file, name)
}

pub fn read_csv<R: Read>(reader: R, name: &str) -> Result<RawTable, EtlError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    tracing::debug!(table = name, rows = rows.len(), "loaded raw table");
    Ok(RawTable::new(name, headers, rows))
}
