//! Shared primitives: ids, tables, sources, sinks, configuration, and output.

pub mod config;
pub mod error;
pub mod ids;
pub mod output;
pub mod schemas;
pub mod sink;
pub mod source;
pub mod table;
pub mod time;
