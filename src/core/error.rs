use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Missing source table: {0}")]
    MissingTable(String),
    #[error("Table '{table}' has no column '{column}'")]
    MissingColumn { table: String, column: String },
    #[error("Invalid timestamp: {0}")]
    TimestampError(String),
    #[error("Versions document error: {0}")]
    VersionDocumentError(String),
}
