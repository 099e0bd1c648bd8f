//! Run configuration from `etl.toml`.
//!
//! Every field has a default, so a missing file is a valid configuration.
//! CLI flags are applied on top by the driver.

use crate::core::error::EtlError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "etl.toml";
pub const DEFAULT_WORLD_REGION: &str = "SDG: World";
pub const DEFAULT_LAST_UPDATE: &str = "2023-09-04";
pub const DEFAULT_THEME: &str = "EDUCATION";

/// Archive table names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TableNames {
    pub country: String,
    pub national: String,
    pub regional: String,
    pub label: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            country: "SDG_COUNTRY".to_string(),
            national: "SDG_DATA_NATIONAL".to_string(),
            regional: "SDG_DATA_REGIONAL".to_string(),
            label: "SDG_LABEL".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EtlConfig {
    /// Extracted archive directory.
    pub source_dir: PathBuf,
    /// Root of the DDF output.
    pub output_dir: PathBuf,
    /// Region label that designates the world aggregate.
    pub world_region: String,
    /// Locally recorded "last update" baseline for the version gate.
    pub last_update: String,
    /// Theme entry to read from the versions document.
    pub theme: String,
    pub supplementary_national: Option<PathBuf>,
    pub supplementary_global: Option<PathBuf>,
    pub tables: TableNames,
    /// File this configuration was read from; `None` for built-in defaults.
    #[serde(skip)]
    pub origin: Option<PathBuf>,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("source/SDG"),
            output_dir: PathBuf::from("."),
            world_region: DEFAULT_WORLD_REGION.to_string(),
            last_update: DEFAULT_LAST_UPDATE.to_string(),
            theme: DEFAULT_THEME.to_string(),
            supplementary_national: None,
            supplementary_global: None,
            tables: TableNames::default(),
            origin: None,
        }
    }
}

impl EtlConfig {
    pub fn parse(content: &str) -> Result<Self, EtlError> {
        let config: EtlConfig =
            toml::from_str(content).map_err(|e| EtlError::ConfigError(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Relative paths in the file resolve against the file's directory.
    pub fn load(path: &Path) -> Result<Self, EtlError> {
        let content = fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        config.origin = Some(path.to_path_buf());
        Ok(config)
    }

    /// Load `path` if given, else `./etl.toml` if present, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, EtlError> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let local = Path::new(CONFIG_FILE_NAME);
                if local.is_file() {
                    Self::load(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn rebase(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.source_dir);
        join(&mut self.output_dir);
        if let Some(p) = self.supplementary_national.as_mut() {
            join(p);
        }
        if let Some(p) = self.supplementary_global.as_mut() {
            join(p);
        }
    }

    fn check(&self) -> Result<(), EtlError> {
        if self.world_region.trim().is_empty() {
            return Err(EtlError::ConfigError(
                "world_region must not be empty".to_string(),
            ));
        }
        let tables = [
            &self.tables.country,
            &self.tables.national,
            &self.tables.regional,
            &self.tables.label,
        ];
        if tables.iter().any(|t| t.trim().is_empty()) {
            return Err(EtlError::ConfigError(
                "table names must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EtlConfig::parse("").unwrap();
        assert_eq!(config, EtlConfig::default());
        assert_eq!(config.world_region, "SDG: World");
        assert_eq!(config.tables.regional, "SDG_DATA_REGIONAL");
    }

    #[test]
    fn test_partial_tables_section_keeps_other_defaults() {
        let config = EtlConfig::parse(
            r#"
world_region = "World"
[tables]
label = "LABELS"
"#,
        )
        .unwrap();
        assert_eq!(config.world_region, "World");
        assert_eq!(config.tables.label, "LABELS");
        assert_eq!(config.tables.country, "SDG_COUNTRY");
    }

    #[test]
    fn test_rejects_blank_world_region() {
        let err = EtlConfig::parse("world_region = \" \"").unwrap_err();
        assert!(matches!(err, EtlError::ConfigError(_)));
    }

    #[test]
    fn test_rejects_unknown_types() {
        assert!(EtlConfig::parse("last_update = 3").is_err());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "source_dir = \"src_data\"\nsupplementary_global = \"extra/global.csv\"\n",
        )
        .unwrap();
        let config = EtlConfig::load(&path).unwrap();
        assert_eq!(config.source_dir, tmp.path().join("src_data"));
        assert_eq!(
            config.supplementary_global,
            Some(tmp.path().join("extra/global.csv"))
        );
        assert_eq!(config.output_dir, tmp.path().join("."));
        assert_eq!(config.origin.as_deref(), Some(path.as_path()));
    }
}
