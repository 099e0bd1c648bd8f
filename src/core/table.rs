//! In-memory tabular structures.
//!
//! `RawTable` is what the archive supplier hands over: named columns, string
//! cells, never mutated after load. `Table` is what goes to the sink.
//! `IndicatorTable` is the narrow per-indicator shape between the two.

use crate::core::error::EtlError;
use serde::Serialize;
use std::fmt;

/// Raw row set from a source file. Column lookup is case-insensitive.
#[derive(Debug, Clone)]
pub struct RawTable {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a required column.
    pub fn column(&self, column: &str) -> Result<usize, EtlError> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(column))
            .ok_or_else(|| EtlError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }
}

/// Cell text, or `""` when the row is short.
pub fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// Cell text, `None` when empty after trimming.
pub fn non_empty(row: &[String], idx: usize) -> Option<&str> {
    let value = cell(row, idx).trim();
    if value.is_empty() { None } else { Some(value) }
}

/// Output table: a header row plus string rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }
}

/// Entity kind an indicator table is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Country,
    Global,
}

impl Scope {
    /// Entity column name in datapoint files.
    pub fn key(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One observation in narrow form. Any field may be missing at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub entity: Option<String>,
    pub year: Option<i32>,
    pub value: Option<f64>,
}

impl DataPoint {
    pub fn is_complete(&self) -> bool {
        self.entity.is_some() && self.year.is_some() && self.value.is_some()
    }
}

/// Observations of a single indicator for a single scope.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorTable {
    pub indicator: String,
    pub scope: Scope,
    pub rows: Vec<DataPoint>,
}

impl IndicatorTable {
    /// Number of rows that would be dropped for missing fields.
    pub fn incomplete_rows(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_complete()).count()
    }

    /// Render as `<scope>,year,<indicator>`, keeping complete rows only.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new([self.scope.key(), "year", self.indicator.as_str()]);
        for row in &self.rows {
            if let (Some(entity), Some(year), Some(value)) = (&row.entity, row.year, row.value) {
                table.push(vec![entity.clone(), year.to_string(), format_value(value)]);
            }
        }
        table
    }
}

/// Shortest decimal form that round-trips, integers without a fraction.
pub fn format_value(value: f64) -> String {
    format!("{}", value)
}

/// Parse a year cell. Accepts `2019` and `2019.0`; out-of-range years read as missing.
pub fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if let Ok(year) = raw.parse::<i32>() {
        return Some(year);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|y| y.fract() == 0.0)
        .filter(|y| (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(y))
        .map(|y| y as i32)
}

/// Parse a value cell. Non-numeric and non-finite values read as missing.
pub fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
