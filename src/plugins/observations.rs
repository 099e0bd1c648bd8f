//! Observation grouping.
//!
//! Splits the wide national and regional observation tables into one narrow
//! table per indicator. Regional rows only contribute the world aggregate.

use crate::core::error::EtlError;
use crate::core::ids::{WORLD_ENTITY, normalize_entity, normalize_indicator};
use crate::core::table::{
    DataPoint, IndicatorTable, RawTable, Scope, cell, non_empty, parse_value, parse_year,
};
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

pub const INDICATOR_COLUMN: &str = "indicator_id";
pub const COUNTRY_COLUMN: &str = "country_id";
pub const REGION_COLUMN: &str = "region_id";
pub const YEAR_COLUMN: &str = "year";
pub const VALUE_COLUMN: &str = "value";

/// Per-indicator tables of one scope, ordered by raw indicator id.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedScope {
    pub scope: Scope,
    pub tables: Vec<IndicatorTable>,
}

#[derive(Clone, Copy)]
enum EntitySource {
    Column(usize),
    Fixed(&'static str),
}

fn group_rows<'a>(
    raw: &'a RawTable,
    rows: impl Iterator<Item = &'a Vec<String>>,
    entity_source: EntitySource,
    scope: Scope,
    withheld: &FxHashSet<&str>,
) -> Result<GroupedScope, EtlError> {
    let ind_col = raw.column(INDICATOR_COLUMN)?;
    let year_col = raw.column(YEAR_COLUMN)?;
    let value_col = raw.column(VALUE_COLUMN)?;

    let mut groups: BTreeMap<&str, Vec<DataPoint>> = BTreeMap::new();
    for row in rows {
        let entity = match entity_source {
            EntitySource::Column(idx) => non_empty(row, idx).map(normalize_entity),
            EntitySource::Fixed(id) => Some(id.to_string()),
        };
        groups
            .entry(cell(row, ind_col).trim())
            .or_default()
            .push(DataPoint {
                entity,
                year: parse_year(cell(row, year_col)),
                value: parse_value(cell(row, value_col)),
            });
    }

    let tables = groups
        .into_iter()
        .map(|(raw_id, rows)| IndicatorTable {
            indicator: normalize_indicator(raw_id),
            scope,
            rows,
        })
        .filter(|t| !withheld.contains(t.indicator.as_str()))
        .collect();

    Ok(GroupedScope { scope, tables })
}

/// Group national observations into country-keyed tables.
///
/// Indicators in `withheld` (colliding ids) produce no table.
pub fn group_national(
    national: &RawTable,
    withheld: &FxHashSet<&str>,
) -> Result<GroupedScope, EtlError> {
    let country_col = national.column(COUNTRY_COLUMN)?;
    group_rows(
        national,
        national.rows().iter(),
        EntitySource::Column(country_col),
        Scope::Country,
        withheld,
    )
}

/// Group the world-aggregate region's observations into global tables.
pub fn group_global(
    regional: &RawTable,
    world_region: &str,
    withheld: &FxHashSet<&str>,
) -> Result<GroupedScope, EtlError> {
    let region_col = regional.column(REGION_COLUMN)?;
    let world_rows = regional
        .rows()
        .iter()
        .filter(move |row| cell(row, region_col).trim() == world_region);
    group_rows(
        regional,
        world_rows,
        EntitySource::Fixed(WORLD_ENTITY),
        Scope::Global,
        withheld,
    )
}

/// Both scopes. They share nothing, so they are grouped in parallel.
pub fn group_all(
    national: &RawTable,
    regional: &RawTable,
    world_region: &str,
    withheld: &FxHashSet<&str>,
) -> Result<(GroupedScope, GroupedScope), EtlError> {
    let (country, global) = rayon::join(
        || group_national(national, withheld),
        || group_global(regional, world_region, withheld),
    );
    Ok((country?, global?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            name,
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn national(rows: &[&[&str]]) -> RawTable {
        table(
            "SDG_DATA_NATIONAL",
            &["INDICATOR_ID", "COUNTRY_ID", "YEAR", "VALUE", "MAGNITUDE"],
            rows,
        )
    }

    fn regional(rows: &[&[&str]]) -> RawTable {
        table("SDG_DATA_REGIONAL", &["INDICATOR_ID", "REGION_ID", "YEAR", "VALUE"], rows)
    }

    fn none() -> FxHashSet<&'static str> {
        FxHashSet::default()
    }

    #[test]
    fn test_national_groups_by_indicator_in_stable_order() {
        let raw = national(&[
            &["SE.B.2", "FRA", "2018", "3", ""],
            &["SE.A.1", "USA", "2019", "42", ""],
            &["SE.B.2", "USA", "2019", "7.5", ""],
        ]);
        let grouped = group_national(&raw, &none()).unwrap();
        let ids: Vec<&str> = grouped.tables.iter().map(|t| t.indicator.as_str()).collect();
        assert_eq!(ids, ["se_a_1", "se_b_2"]);
        let b = &grouped.tables[1];
        assert_eq!(b.scope, Scope::Country);
        assert_eq!(b.rows.len(), 2);
        assert_eq!(b.rows[0].entity.as_deref(), Some("fra"));
        assert_eq!(b.to_table().columns, vec!["country", "year", "se_b_2"]);
    }

    #[test]
    fn test_global_keeps_only_world_region() {
        let raw = regional(&[
            &["X", "SDG: World", "2020", "5"],
            &["X", "Other", "2020", "9"],
        ]);
        let grouped = group_global(&raw, "SDG: World", &none()).unwrap();
        assert_eq!(grouped.tables.len(), 1);
        let out = grouped.tables[0].to_table();
        assert_eq!(out.columns, vec!["global", "year", "x"]);
        assert_eq!(out.rows, vec![vec!["world", "2020", "5"]]);
    }

    #[test]
    fn test_global_without_world_rows_is_empty() {
        let raw = regional(&[&["X", "Africa", "2020", "9"]]);
        assert!(group_global(&raw, "SDG: World", &none()).unwrap().tables.is_empty());
    }

    #[test]
    fn test_missing_cells_are_kept_until_output() {
        let raw = national(&[&["SE.1", "", "2019", "1", ""], &["SE.1", "USA", "", "2", ""]]);
        let grouped = group_national(&raw, &none()).unwrap();
        assert_eq!(grouped.tables[0].rows.len(), 2);
        assert_eq!(grouped.tables[0].incomplete_rows(), 2);
        assert!(grouped.tables[0].to_table().rows.is_empty());
    }

    #[test]
    fn test_withheld_ids_produce_no_table() {
        let raw = national(&[
            &["SE.1", "USA", "2019", "1", ""],
            &["SE_1", "USA", "2019", "2", ""],
            &["SE.2", "USA", "2019", "3", ""],
        ]);
        let withheld: FxHashSet<&str> = ["se_1"].into_iter().collect();
        let grouped = group_national(&raw, &withheld).unwrap();
        let ids: Vec<&str> = grouped.tables.iter().map(|t| t.indicator.as_str()).collect();
        assert_eq!(ids, ["se_2"]);
    }

    #[test]
    fn test_missing_region_column_is_structural() {
        let raw = national(&[]);
        assert!(matches!(
            group_global(&raw, "SDG: World", &none()),
            Err(EtlError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_group_all_matches_sequential() {
        let nat = national(&[&["SE.1", "USA", "2019", "1", ""]]);
        let reg = regional(&[&["SE.1", "SDG: World", "2019", "4"]]);
        let (country, global) = group_all(&nat, &reg, "SDG: World", &none()).unwrap();
        assert_eq!(country, group_national(&nat, &none()).unwrap());
        assert_eq!(global, group_global(&reg, "SDG: World", &none()).unwrap());
    }
}
