//! DDF output layout: logical file names and column headers.

use crate::core::table::Scope;

pub const COUNTRY_ENTITIES: &str = "ddf--entities--geo--country.csv";
pub const GLOBAL_ENTITIES: &str = "ddf--entities--geo--global.csv";
pub const CONTINUOUS_CONCEPTS: &str = "ddf--concepts--continuous.csv";
pub const DISCRETE_CONCEPTS: &str = "ddf--concepts--discrete.csv";

pub const COUNTRY_ENTITY_COLUMNS: [&str; 3] = ["country", "name", "is--country"];
pub const GLOBAL_ENTITY_COLUMNS: [&str; 3] = ["global", "name", "is--global"];
pub const CONTINUOUS_CONCEPT_COLUMNS: [&str; 3] = ["concept", "name", "concept_type"];
pub const DISCRETE_CONCEPT_COLUMNS: [&str; 4] = ["concept", "name", "concept_type", "domain"];

/// Directory holding datapoint files for a scope.
pub fn datapoints_dir(scope: Scope) -> &'static str {
    match scope {
        Scope::Country => "countries_etc_datapoints",
        Scope::Global => "global_datapoints",
    }
}

/// Logical output name of one indicator's datapoints for a scope.
pub fn datapoints_name(indicator: &str, scope: Scope) -> String {
    format!(
        "{}/ddf--datapoints--{}--by--{}--year.csv",
        datapoints_dir(scope),
        indicator,
        scope.key()
    )
}
