//! Indicator gatekeeper.
//!
//! A grouped indicator table passes only if its id is a measure concept.
//! There is no partial pass: an unlabelled indicator loses every row, and the
//! skip is recorded for the end-of-run summary.

use crate::core::table::{IndicatorTable, Scope};
use crate::plugins::observations::GroupedScope;
use rustc_hash::FxHashSet;
use serde::Serialize;

/// Indicator withheld because no measure concept defines it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skip {
    pub indicator: String,
    pub scope: Scope,
    pub rows: usize,
}

#[derive(Debug)]
pub struct GateResult {
    pub scope: Scope,
    pub kept: Vec<IndicatorTable>,
    pub skipped: Vec<Skip>,
}

/// Split one scope's tables into kept and skipped.
pub fn run_gatekeeper(grouped: GroupedScope, measures: &FxHashSet<&str>) -> GateResult {
    let mut kept = Vec::new();
    let mut skipped = Vec::new();
    for table in grouped.tables {
        if measures.contains(table.indicator.as_str()) {
            kept.push(table);
        } else {
            tracing::warn!(
                scope = %grouped.scope,
                indicator = %table.indicator,
                rows = table.rows.len(),
                "indicator has no concept; skipped"
            );
            skipped.push(Skip {
                indicator: table.indicator,
                scope: grouped.scope,
                rows: table.rows.len(),
            });
        }
    }
    GateResult {
        scope: grouped.scope,
        kept,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::DataPoint;

    fn indicator(id: &str, rows: usize) -> IndicatorTable {
        IndicatorTable {
            indicator: id.to_string(),
            scope: Scope::Global,
            rows: (0..rows)
                .map(|i| DataPoint {
                    entity: Some("world".to_string()),
                    year: Some(2000 + i as i32),
                    value: Some(1.0),
                })
                .collect(),
        }
    }

    #[test]
    fn test_keeps_only_measure_concepts() {
        let grouped = GroupedScope {
            scope: Scope::Global,
            tables: vec![indicator("se_1", 2), indicator("orphan", 3)],
        };
        let measures: FxHashSet<&str> = ["se_1"].into_iter().collect();
        let result = run_gatekeeper(grouped, &measures);
        assert_eq!(result.kept.len(), 1);
        assert_eq!(result.kept[0].indicator, "se_1");
        assert_eq!(
            result.skipped,
            vec![Skip {
                indicator: "orphan".to_string(),
                scope: Scope::Global,
                rows: 3,
            }]
        );
    }

    #[test]
    fn test_empty_universe_skips_everything() {
        let grouped = GroupedScope {
            scope: Scope::Global,
            tables: vec![indicator("se_1", 1)],
        };
        let result = run_gatekeeper(grouped, &FxHashSet::default());
        assert!(result.kept.is_empty());
        assert_eq!(result.skipped.len(), 1);
    }
}
