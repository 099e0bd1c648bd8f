//! Concept catalog.
//!
//! Measure concepts come from the label table and define which indicators may
//! be emitted. Discrete concepts are fixed. Supplementary indicators add
//! measure concepts only for ids the labels do not already define.

use crate::core::error::EtlError;
use crate::core::ids::normalize_indicator;
use crate::core::schemas;
use crate::core::table::{RawTable, Table, non_empty};
use crate::plugins::supplementary::SupplementaryIndicator;
use rustc_hash::FxHashSet;
use std::fmt;

pub const INDICATOR_ID_COLUMN: &str = "indicator_id";
pub const INDICATOR_LABEL_COLUMN: &str = "indicator_label_en";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConceptType {
    Measure,
    String,
    Time,
    EntitySet,
    EntityDomain,
}

impl ConceptType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Measure => "measure",
            Self::String => "string",
            Self::Time => "time",
            Self::EntitySet => "entity_set",
            Self::EntityDomain => "entity_domain",
        }
    }
}

impl fmt::Display for ConceptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a measure concept came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Label,
    Supplementary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concept {
    pub id: String,
    pub name: String,
    pub concept_type: ConceptType,
    pub domain: Option<String>,
    pub provenance: Provenance,
}

impl Concept {
    fn discrete(id: &str, name: &str, concept_type: ConceptType, domain: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            concept_type,
            domain: domain.map(str::to_string),
            provenance: Provenance::Label,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConceptCatalog {
    pub continuous: Vec<Concept>,
    pub discrete: Vec<Concept>,
}

/// The six structural concepts every dataset carries.
pub fn discrete_concepts() -> Vec<Concept> {
    vec![
        Concept::discrete("name", "Name", ConceptType::String, None),
        Concept::discrete("year", "Year", ConceptType::Time, None),
        Concept::discrete("country", "Country", ConceptType::EntitySet, Some("geo")),
        Concept::discrete("domain", "Domain", ConceptType::String, None),
        Concept::discrete("global", "Global", ConceptType::EntitySet, Some("geo")),
        Concept::discrete("geo", "Geo", ConceptType::EntityDomain, None),
    ]
}

/// Measure concepts from the label table, in source order.
///
/// `withheld` holds every canonical id reached from more than one raw code
/// in the archive; none of them becomes a concept.
pub fn build_catalog(
    labels: &RawTable,
    withheld: &FxHashSet<&str>,
) -> Result<ConceptCatalog, EtlError> {
    let id_col = labels.column(INDICATOR_ID_COLUMN)?;
    let name_col = labels.column(INDICATOR_LABEL_COLUMN)?;

    let entries: Vec<(&str, &str)> = labels
        .rows()
        .iter()
        .filter_map(|row| {
            let id = non_empty(row, id_col)?;
            Some((id, non_empty(row, name_col).unwrap_or("")))
        })
        .collect();

    let mut seen = FxHashSet::default();
    let mut continuous = Vec::new();
    for (raw, name) in entries {
        let id = normalize_indicator(raw);
        if withheld.contains(id.as_str()) {
            continue;
        }
        if !seen.insert(id.clone()) {
            tracing::debug!(concept = %id, "duplicate label row ignored");
            continue;
        }
        continuous.push(Concept {
            id,
            name: name.to_string(),
            concept_type: ConceptType::Measure,
            domain: None,
            provenance: Provenance::Label,
        });
    }

    Ok(ConceptCatalog {
        continuous,
        discrete: discrete_concepts(),
    })
}

impl ConceptCatalog {
    /// Append supplementary measures whose id is not already defined.
    pub fn with_supplementary(mut self, extra: &[SupplementaryIndicator]) -> Self {
        for ind in extra {
            if self.continuous.iter().any(|c| c.id == ind.id) {
                tracing::debug!(concept = ind.id, "supplementary concept already labelled");
                continue;
            }
            self.continuous.push(Concept {
                id: ind.id.to_string(),
                name: ind.name.to_string(),
                concept_type: ConceptType::Measure,
                domain: None,
                provenance: Provenance::Supplementary,
            });
        }
        self
    }

    /// The authoritative indicator universe.
    pub fn measure_ids(&self) -> FxHashSet<&str> {
        self.continuous
            .iter()
            .filter(|c| c.concept_type == ConceptType::Measure)
            .map(|c| c.id.as_str())
            .collect()
    }

    pub fn continuous_table(&self) -> Table {
        let mut table = Table::new(schemas::CONTINUOUS_CONCEPT_COLUMNS);
        for c in &self.continuous {
            table.push(vec![
                c.id.clone(),
                c.name.clone(),
                c.concept_type.to_string(),
            ]);
        }
        table
    }

    pub fn discrete_table(&self) -> Table {
        let mut table = Table::new(schemas::DISCRETE_CONCEPT_COLUMNS);
        for c in &self.discrete {
            table.push(vec![
                c.id.clone(),
                c.name.clone(),
                c.concept_type.to_string(),
                c.domain.clone().unwrap_or_default(),
            ]);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(rows: &[(&str, &str)]) -> ConceptCatalog {
        build_catalog(&labels(rows), &FxHashSet::default()).unwrap()
    }

    fn labels(rows: &[(&str, &str)]) -> RawTable {
        RawTable::new(
            "SDG_LABEL",
            vec!["INDICATOR_ID".to_string(), "INDICATOR_LABEL_EN".to_string()],
            rows.iter()
                .map(|(a, b)| vec![a.to_string(), b.to_string()])
                .collect(),
        )
    }

    #[test]
    fn test_label_rows_become_trimmed_measures() {
        let catalog = catalog(&[(" SE.ADM.1 ", "  Admin rate ")]);
        assert_eq!(catalog.continuous.len(), 1);
        let c = &catalog.continuous[0];
        assert_eq!(c.id, "se_adm_1");
        assert_eq!(c.name, "Admin rate");
        assert_eq!(c.concept_type, ConceptType::Measure);
        assert_eq!(
            catalog.continuous_table().rows,
            vec![vec!["se_adm_1", "Admin rate", "measure"]]
        );
    }

    #[test]
    fn test_discrete_concepts_are_fixed() {
        let catalog = catalog(&[]);
        let ids: Vec<&str> = catalog.discrete.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["name", "year", "country", "domain", "global", "geo"]);
        let table = catalog.discrete_table();
        assert_eq!(table.rows[2], vec!["country", "Country", "entity_set", "geo"]);
        assert_eq!(table.rows[5], vec!["geo", "Geo", "entity_domain", ""]);
    }

    #[test]
    fn test_supplementary_only_added_when_absent() {
        let extra = [
            SupplementaryIndicator { id: "se_adm_1", name: "Other name" },
            SupplementaryIndicator { id: "xgdp_fsgov", name: "Spending" },
        ];
        let catalog = catalog(&[("SE.ADM.1", "Admin rate")]).with_supplementary(&extra);
        assert_eq!(catalog.continuous.len(), 2);
        assert_eq!(catalog.continuous[0].name, "Admin rate");
        assert_eq!(catalog.continuous[0].provenance, Provenance::Label);
        assert_eq!(catalog.continuous[1].id, "xgdp_fsgov");
        assert_eq!(catalog.continuous[1].provenance, Provenance::Supplementary);
        let twice = catalog.with_supplementary(&extra);
        assert_eq!(twice.continuous.len(), 2);
    }

    #[test]
    fn test_withheld_ids_are_not_concepts() {
        let withheld: FxHashSet<&str> = ["se_1"].into_iter().collect();
        let table = labels(&[("SE.1", "Dotted"), ("SE_1", "Underscored"), ("SE.2", "Ok")]);
        let catalog = build_catalog(&table, &withheld).unwrap();
        let ids = catalog.measure_ids();
        assert!(!ids.contains("se_1"));
        assert!(ids.contains("se_2"));
    }

    #[test]
    fn test_duplicate_raw_code_keeps_first() {
        let catalog = catalog(&[("SE.1", "First"), ("SE.1", "Second")]);
        assert_eq!(catalog.continuous.len(), 1);
        assert_eq!(catalog.continuous[0].name, "First");
    }
}
