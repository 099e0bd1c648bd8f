//! Entity tables: countries from the reference table plus the world aggregate.

use crate::core::error::EtlError;
use crate::core::ids::{WORLD_ENTITY, normalize_entity};
use crate::core::schemas;
use crate::core::table::{RawTable, Table, cell};

pub const COUNTRY_ID_COLUMN: &str = "country_id";
pub const COUNTRY_NAME_COLUMN: &str = "country_name_en";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: String,
    pub name: String,
}

/// Country entities in source order. Names are passed through untouched.
pub fn build_country_entities(countries: &RawTable) -> Result<Vec<Entity>, EtlError> {
    let id_col = countries.column(COUNTRY_ID_COLUMN)?;
    let name_col = countries.column(COUNTRY_NAME_COLUMN)?;
    Ok(countries
        .rows()
        .iter()
        .map(|row| Entity {
            id: normalize_entity(cell(row, id_col)),
            name: cell(row, name_col).to_string(),
        })
        .collect())
}

pub fn world_entity() -> Entity {
    Entity {
        id: WORLD_ENTITY.to_string(),
        name: "World".to_string(),
    }
}

pub fn country_table(entities: &[Entity]) -> Table {
    let mut table = Table::new(schemas::COUNTRY_ENTITY_COLUMNS);
    for e in entities {
        table.push(vec![e.id.clone(), e.name.clone(), "TRUE".to_string()]);
    }
    table
}

pub fn global_table() -> Table {
    let world = world_entity();
    let mut table = Table::new(schemas::GLOBAL_ENTITY_COLUMNS);
    table.push(vec![world.id, world.name, "TRUE".to_string()]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn countries() -> RawTable {
        RawTable::new(
            "SDG_COUNTRY",
            vec!["COUNTRY_ID".to_string(), "COUNTRY_NAME_EN".to_string()],
            vec![
                vec!["USA".to_string(), "United States of America".to_string()],
                vec!["XKX".to_string(), String::new()],
            ],
        )
    }

    #[test]
    fn test_country_entities_are_normalized() {
        let entities = build_country_entities(&countries()).unwrap();
        assert_eq!(entities[0].id, "usa");
        assert_eq!(entities[0].name, "United States of America");
    }

    #[test]
    fn test_missing_name_passes_through_empty() {
        let entities = build_country_entities(&countries()).unwrap();
        assert_eq!(entities[1], Entity { id: "xkx".into(), name: String::new() });
    }

    #[test]
    fn test_country_table_sets_flag() {
        let table = country_table(&build_country_entities(&countries()).unwrap());
        assert_eq!(table.columns, vec!["country", "name", "is--country"]);
        assert_eq!(table.rows[0], vec!["usa", "United States of America", "TRUE"]);
    }

    #[test]
    fn test_global_table_is_single_world_row() {
        let table = global_table();
        assert_eq!(table.columns, vec!["global", "name", "is--global"]);
        assert_eq!(table.rows, vec![vec!["world", "World", "TRUE"]]);
    }

    #[test]
    fn test_missing_country_column_is_structural() {
        let raw = RawTable::new("SDG_COUNTRY", vec!["ID".to_string()], vec![]);
        assert!(matches!(
            build_country_entities(&raw),
            Err(EtlError::MissingColumn { .. })
        ));
    }
}
