//! End-to-end run: load, transform, write.
//!
//! Everything that can fail structurally (missing tables, missing columns,
//! unreadable supplementary files) fails in `load_inputs` or `transform`,
//! before the sink sees a single table.

use crate::core::config::EtlConfig;
use crate::core::error::EtlError;
use crate::core::ids::{IdCollision, detect_collisions};
use crate::core::schemas;
use crate::core::sink::{OutputListing, OutputSink, WrittenFile};
use crate::core::source::{TableSource, read_csv_file};
use crate::core::table::{IndicatorTable, RawTable, Scope, Table, non_empty};
use crate::plugins::concepts::{self, ConceptCatalog};
use crate::plugins::entities;
use crate::plugins::gatekeeper::{self, GateResult, Skip};
use crate::plugins::observations;
use crate::plugins::supplementary::{
    self, BackfillReport, SUPPLEMENTARY_INDICATORS, SupplementaryIndicator, SupplementarySource,
};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::path::Path;

/// Raw tables of one run. Never mutated after loading.
#[derive(Debug, Clone)]
pub struct RawInputs {
    pub countries: RawTable,
    pub labels: RawTable,
    pub national: RawTable,
    pub regional: RawTable,
    pub supplementary: SupplementarySource,
}

fn load_optional(path: Option<&Path>, name: &str) -> Result<Option<RawTable>, EtlError> {
    match path {
        None => Ok(None),
        Some(p) if !p.is_file() => Err(EtlError::MissingTable(format!(
            "{} (expected at {})",
            name,
            p.display()
        ))),
        Some(p) => read_csv_file(p, name).map(Some),
    }
}

pub fn load_inputs(source: &impl TableSource, config: &EtlConfig) -> Result<RawInputs, EtlError> {
    let tables = &config.tables;
    Ok(RawInputs {
        countries: source.load(&tables.country)?,
        labels: source.load(&tables.label)?,
        national: source.load(&tables.national)?,
        regional: source.load(&tables.regional)?,
        supplementary: SupplementarySource {
            national: load_optional(
                config.supplementary_national.as_deref(),
                "supplementary_national",
            )?,
            global: load_optional(config.supplementary_global.as_deref(), "supplementary_global")?,
        },
    })
}

/// Every table a run will write, computed without touching the sink.
#[derive(Debug)]
pub struct Transformed {
    pub country_entities: Table,
    pub global_entities: Table,
    pub catalog: ConceptCatalog,
    pub country: GateResult,
    pub global: GateResult,
    pub supplementary: Vec<IndicatorTable>,
    /// Indicator ids reached from more than one raw code anywhere in the archive.
    pub collisions: Vec<IdCollision>,
}

/// Collisions over every raw indicator code of the archive.
///
/// Labels, national rows, and all regional rows share one id space, so
/// `SE.1` in one table and `SE_1` in another collide just as they would
/// within a single table.
pub fn archive_collisions(inputs: &RawInputs) -> Result<Vec<IdCollision>, EtlError> {
    let mut codes = Vec::new();
    for (table, column) in [
        (&inputs.labels, concepts::INDICATOR_ID_COLUMN),
        (&inputs.national, observations::INDICATOR_COLUMN),
        (&inputs.regional, observations::INDICATOR_COLUMN),
    ] {
        let idx = table.column(column)?;
        codes.extend(table.rows().iter().filter_map(|row| non_empty(row, idx)));
    }
    Ok(detect_collisions(codes))
}

pub fn transform(inputs: &RawInputs, world_region: &str) -> Result<Transformed, EtlError> {
    let collisions = archive_collisions(inputs)?;
    for c in &collisions {
        tracing::warn!(
            indicator = %c.canonical,
            raw = ?c.raw_codes,
            "indicator ids collide after normalization; withheld"
        );
    }
    let withheld: FxHashSet<&str> = collisions.iter().map(|c| c.canonical.as_str()).collect();
    let extra: Vec<SupplementaryIndicator> = SUPPLEMENTARY_INDICATORS
        .iter()
        .filter(|ind| !withheld.contains(ind.id))
        .copied()
        .collect();

    let countries = entities::build_country_entities(&inputs.countries)?;
    let catalog = concepts::build_catalog(&inputs.labels, &withheld)?.with_supplementary(&extra);
    tracing::info!(
        countries = countries.len(),
        concepts = catalog.continuous.len(),
        "entities and concepts built"
    );

    let (national, global) =
        observations::group_all(&inputs.national, &inputs.regional, world_region, &withheld)?;
    tracing::info!(
        national = national.tables.len(),
        global = global.tables.len(),
        "observations grouped"
    );

    let supplementary = supplementary::reshape(&inputs.supplementary, &extra)?;

    let (country, global) = {
        let measures = catalog.measure_ids();
        (
            gatekeeper::run_gatekeeper(national, &measures),
            gatekeeper::run_gatekeeper(global, &measures),
        )
    };
    drop(withheld);

    Ok(Transformed {
        country_entities: entities::country_table(&countries),
        global_entities: entities::global_table(),
        catalog,
        country,
        global,
        supplementary,
        collisions,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct ScopeSummary {
    pub scope: Scope,
    pub written: usize,
    pub skipped: Vec<Skip>,
    /// Rows left out for a missing entity, year, or value.
    pub dropped_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub files: Vec<WrittenFile>,
    pub country: ScopeSummary,
    pub global: ScopeSummary,
    /// Withheld from every output: concepts, datapoints, supplementary.
    pub collisions: Vec<IdCollision>,
    pub supplementary: BackfillReport,
}

impl RunReport {
    pub fn skipped_total(&self) -> usize {
        self.country.skipped.len() + self.global.skipped.len()
    }
}

fn write_scope<S: OutputSink>(
    sink: &mut S,
    out: GateResult,
    files: &mut Vec<WrittenFile>,
) -> Result<ScopeSummary, EtlError> {
    let mut dropped_rows = 0;
    for table in &out.kept {
        dropped_rows += table.incomplete_rows();
        let name = schemas::datapoints_name(&table.indicator, out.scope);
        files.push(sink.write(&name, &table.to_table())?);
    }
    Ok(ScopeSummary {
        scope: out.scope,
        written: out.kept.len(),
        skipped: out.skipped,
        dropped_rows,
    })
}

/// Write primary outputs unconditionally, then backfill supplementary ones.
pub fn write_outputs<S: OutputSink + OutputListing>(
    sink: &mut S,
    transformed: Transformed,
) -> Result<RunReport, EtlError> {
    let Transformed {
        country_entities,
        global_entities,
        catalog,
        country,
        global,
        supplementary,
        collisions,
    } = transformed;

    let mut files = vec![
        sink.write(schemas::COUNTRY_ENTITIES, &country_entities)?,
        sink.write(schemas::GLOBAL_ENTITIES, &global_entities)?,
        sink.write(schemas::CONTINUOUS_CONCEPTS, &catalog.continuous_table())?,
        sink.write(schemas::DISCRETE_CONCEPTS, &catalog.discrete_table())?,
    ];
    let country = write_scope(sink, country, &mut files)?;
    let global = write_scope(sink, global, &mut files)?;
    tracing::info!(
        country = country.written,
        global = global.written,
        skipped = country.skipped.len() + global.skipped.len(),
        "datapoints written"
    );

    let supplementary = supplementary::backfill(sink, &supplementary)?;
    files.extend(supplementary.written.iter().cloned());

    Ok(RunReport {
        files,
        country,
        global,
        collisions,
        supplementary,
    })
}

/// Load, transform, and write one run.
pub fn run_pipeline<S: OutputSink + OutputListing>(
    source: &impl TableSource,
    sink: &mut S,
    config: &EtlConfig,
) -> Result<RunReport, EtlError> {
    let inputs = load_inputs(source, config)?;
    let transformed = transform(&inputs, &config.world_region)?;
    write_outputs(sink, transformed)
}
