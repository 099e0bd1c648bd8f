//! Identifier normalization.
//!
//! Every id written to a DDF file is produced here. Raw source codes such as
//! `SE.ADM.1` or `USA` become `se_adm_1` and `usa`; comparisons anywhere in the
//! pipeline happen on the normalized form only.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Literal id of the synthetic world-aggregate entity.
pub const WORLD_ENTITY: &str = "world";

/// Lowercase and replace every `.` with `_`.
pub fn normalize_indicator(raw: &str) -> String {
    raw.to_lowercase().replace('.', "_")
}

/// Lowercase a raw country code.
pub fn normalize_entity(raw: &str) -> String {
    raw.to_lowercase()
}

/// Key form used by the supplementary source for a canonical indicator id.
pub fn source_indicator_code(canonical: &str) -> String {
    canonical.to_uppercase()
}

/// Distinct raw codes that normalize to the same canonical id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdCollision {
    pub canonical: String,
    pub raw_codes: Vec<String>,
}

/// Find canonical ids reached from more than one distinct raw code.
///
/// Output is sorted by canonical id, raw codes sorted within each entry.
pub fn detect_collisions<'a, I>(raw_ids: I) -> Vec<IdCollision>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut by_canonical: BTreeMap<String, BTreeSet<&'a str>> = BTreeMap::new();
    for raw in raw_ids {
        by_canonical
            .entry(normalize_indicator(raw))
            .or_default()
            .insert(raw);
    }
    by_canonical
        .into_iter()
        .filter(|(_, raws)| raws.len() > 1)
        .map(|(canonical, raws)| IdCollision {
            canonical,
            raw_codes: raws.into_iter().map(str::to_string).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_indicator_lowercases_and_replaces_dots() {
        assert_eq!(normalize_indicator("SE.ADM.1"), "se_adm_1");
        assert_eq!(normalize_indicator("ROFST.1.CP"), "rofst_1_cp");
        assert_eq!(normalize_indicator(""), "");
    }

    #[test]
    fn test_normalize_entity_lowercases_only() {
        assert_eq!(normalize_entity("USA"), "usa");
        assert_eq!(normalize_entity("a.b"), "a.b");
    }

    #[test]
    fn test_source_code_is_upper_canonical() {
        assert_eq!(source_indicator_code("xgdp_fsgov"), "XGDP_FSGOV");
    }

    #[test]
    fn test_detect_collision_between_dot_and_underscore_forms() {
        let collisions = detect_collisions(["SE.1", "SE_1", "SE.2", "SE.1"]);
        assert_eq!(
            collisions,
            vec![IdCollision {
                canonical: "se_1".to_string(),
                raw_codes: vec!["SE.1".to_string(), "SE_1".to_string()],
            }]
        );
    }

    #[test]
    fn test_case_variants_collide() {
        let collisions = detect_collisions(["ab.c", "AB.C"]);
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].canonical, "ab_c");
    }

    proptest! {
        #[test]
        fn normalized_indicator_has_no_dots_or_uppercase(raw in "[A-Za-z0-9._]{0,24}") {
            let id = normalize_indicator(&raw);
            prop_assert!(!id.contains('.'));
            prop_assert_eq!(id.to_lowercase(), id.clone());
            prop_assert_eq!(normalize_indicator(&id), id);
        }

        #[test]
        fn no_collisions_without_shared_canonical(
            raws in proptest::collection::btree_set("[A-Z]{1,4}\\.[0-9]{1,2}", 0..12)
        ) {
            // Upper-case letters with a single dot never normalize onto each other.
            prop_assert!(detect_collisions(raws.iter().map(String::as_str)).is_empty());
        }
    }
}
