//! Supplementary-source backfill.
//!
//! A secondary dataset covers a few indicators the archive may lack. Its
//! tables are written only where no datapoint file exists yet, so a primary
//! file for the same indicator is never replaced and re-running is a no-op.

use crate::core::error::EtlError;
use crate::core::ids::{WORLD_ENTITY, normalize_entity, source_indicator_code};
use crate::core::schemas;
use crate::core::sink::{OutputListing, OutputSink, WrittenFile};
use crate::core::table::{
    DataPoint, IndicatorTable, RawTable, Scope, cell, non_empty, parse_value, parse_year,
};
use serde::Serialize;

pub const INDICATOR_COLUMN: &str = "indicator_id";
pub const COUNTRY_COLUMN: &str = "country_id";
pub const YEAR_COLUMN: &str = "year";
pub const VALUE_COLUMN: &str = "value";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupplementaryIndicator {
    /// Canonical id.
    pub id: &'static str,
    pub name: &'static str,
}

pub const SUPPLEMENTARY_INDICATORS: &[SupplementaryIndicator] = &[
    SupplementaryIndicator {
        id: "xgdp_fsgov",
        name: "Government expenditure on education as a percentage of GDP (%)",
    },
    SupplementaryIndicator {
        id: "xgovexp_imf",
        name: "Government expenditure on education as a percentage of total government expenditure (%)",
    },
    SupplementaryIndicator {
        id: "lr_ag15t99",
        name: "Adult literacy rate, population 15+ years, both sexes (%)",
    },
];

/// Secondary source files; either may be absent.
#[derive(Debug, Clone, Default)]
pub struct SupplementarySource {
    pub national: Option<RawTable>,
    pub global: Option<RawTable>,
}

struct Columns {
    indicator: usize,
    entity: Option<usize>,
    year: usize,
    value: usize,
}

fn resolve(raw: &RawTable, scope: Scope) -> Result<Columns, EtlError> {
    Ok(Columns {
        indicator: raw.column(INDICATOR_COLUMN)?,
        entity: match scope {
            Scope::Country => Some(raw.column(COUNTRY_COLUMN)?),
            Scope::Global => None,
        },
        year: raw.column(YEAR_COLUMN)?,
        value: raw.column(VALUE_COLUMN)?,
    })
}

fn select(
    raw: &RawTable,
    cols: &Columns,
    target: &SupplementaryIndicator,
    scope: Scope,
) -> IndicatorTable {
    let code = source_indicator_code(target.id);
    let rows = raw
        .rows()
        .iter()
        .filter(|row| cell(row, cols.indicator).trim() == code)
        .map(|row| DataPoint {
            entity: match cols.entity {
                Some(idx) => non_empty(row, idx).map(normalize_entity),
                None => Some(WORLD_ENTITY.to_string()),
            },
            year: parse_year(cell(row, cols.year)),
            value: parse_value(cell(row, cols.value)),
        })
        .collect();
    IndicatorTable {
        indicator: target.id.to_string(),
        scope,
        rows,
    }
}

/// Narrow tables for every target indicator and available scope.
///
/// Rows for codes outside `targets` are ignored. Columns are resolved before
/// any row is read, so a malformed file fails as a whole.
pub fn reshape(
    source: &SupplementarySource,
    targets: &[SupplementaryIndicator],
) -> Result<Vec<IndicatorTable>, EtlError> {
    let mut tables = Vec::new();
    for (raw, scope) in [
        (source.national.as_ref(), Scope::Country),
        (source.global.as_ref(), Scope::Global),
    ] {
        let Some(raw) = raw else { continue };
        let cols = resolve(raw, scope)?;
        for target in targets {
            tables.push(select(raw, &cols, target, scope));
        }
    }
    Ok(tables)
}

/// Whether the datapoint file for `indicator` in `scope` is still missing.
pub fn needs_backfill(listing: &impl OutputListing, indicator: &str, scope: Scope) -> bool {
    !listing.exists(&schemas::datapoints_name(indicator, scope))
}

/// Why a supplementary table was not written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Held {
    AlreadyPresent,
    NoRows,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeldTable {
    pub indicator: String,
    pub scope: Scope,
    pub reason: Held,
}

/// Tables to write and tables held back, decided from the listing alone.
pub fn plan_backfill<'t>(
    tables: &'t [IndicatorTable],
    listing: &impl OutputListing,
) -> (Vec<&'t IndicatorTable>, Vec<HeldTable>) {
    let mut write = Vec::new();
    let mut held = Vec::new();
    for table in tables {
        let reason = if !needs_backfill(listing, &table.indicator, table.scope) {
            Some(Held::AlreadyPresent)
        } else if table.rows.iter().all(|r| !r.is_complete()) {
            Some(Held::NoRows)
        } else {
            None
        };
        match reason {
            Some(reason) => held.push(HeldTable {
                indicator: table.indicator.clone(),
                scope: table.scope,
                reason,
            }),
            None => write.push(table),
        }
    }
    (write, held)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BackfillReport {
    pub written: Vec<WrittenFile>,
    pub held: Vec<HeldTable>,
    pub dropped_rows: usize,
}

/// Write every planned table; never overwrites an existing output.
pub fn backfill<S: OutputSink + OutputListing>(
    sink: &mut S,
    tables: &[IndicatorTable],
) -> Result<BackfillReport, EtlError> {
    let (to_write, held) = plan_backfill(tables, &*sink);
    let mut report = BackfillReport {
        held,
        ..Default::default()
    };
    for table in to_write {
        let name = schemas::datapoints_name(&table.indicator, table.scope);
        report.dropped_rows += table.incomplete_rows();
        report.written.push(sink.write(&name, &table.to_table())?);
        tracing::info!(
            indicator = %table.indicator,
            scope = %table.scope,
            "supplementary table written"
        );
    }
    Ok(report)
}
