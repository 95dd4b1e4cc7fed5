//! Configuration: state directory, source file locations, extra profiles.
//!
//! Values come from an optional TOML file layered over built-in defaults.
//! Source tables and profiles in the file are merged key by key, so a file
//! that only relocates the law spreadsheets keeps the other types' defaults.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use lawrecon_core::{CanonicalField, ColumnPair, FieldMapper, LegislationTypeProfile};
use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;

/// Paths of the two files holding one legislation type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourcePaths {
    pub a: PathBuf,
    pub b: PathBuf,
}

impl SourcePaths {
    pub fn new(a: impl Into<PathBuf>, b: impl Into<PathBuf>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }

    fn resolve(&self, root: &Path) -> Self {
        Self {
            a: root.join(&self.a),
            b: root.join(&self.b),
        }
    }
}

/// A profile as written in the config file, keyed by canonical field name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub columns: IndexMap<String, ColumnPair>,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the persisted review state.
    pub state_dir: PathBuf,
    /// Base for relative source paths.
    pub data_root: PathBuf,
    pub default_type: String,
    pub sources: IndexMap<String, SourcePaths>,
    pub profiles: IndexMap<String, ProfileConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    state_dir: Option<PathBuf>,
    data_root: Option<PathBuf>,
    default_type: Option<String>,
    #[serde(default)]
    sources: IndexMap<String, SourcePaths>,
    #[serde(default)]
    profiles: IndexMap<String, ProfileConfig>,
}

impl Default for Config {
    fn default() -> Self {
        let sources = IndexMap::from([
            (
                "bylaw".to_string(),
                SourcePaths::new(
                    "extData/Bylaws/Qis_ByLaws_V2.xlsx",
                    "extData/Bylaws/Diwan_ByLaws_V2.xlsx",
                ),
            ),
            (
                "law".to_string(),
                SourcePaths::new(
                    "extData/Laws/Qis_Laws_V2.xlsx",
                    "extData/Laws/Diwan_Laws_V2.xlsx",
                ),
            ),
            (
                "instruction".to_string(),
                SourcePaths::new(
                    "extData/Instructions/Qis_Instructions.xlsx",
                    "extData/Instructions/Diwan_Instructions.xlsx",
                ),
            ),
            (
                "agreement".to_string(),
                SourcePaths::new(
                    "extData/Agreements/Qis_Agreements.xlsx",
                    "extData/Agreements/Diwan_Agreements.xlsx",
                ),
            ),
        ]);
        Self {
            state_dir: PathBuf::from("."),
            data_root: PathBuf::from("."),
            default_type: lawrecon_core::profile::DEFAULT_TYPE.to_string(),
            sources,
            profiles: IndexMap::new(),
        }
    }
}

impl Config {
    /// Load a TOML config file over the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let raw: RawConfig = toml::from_str(text)?;
        let mut config = Self::default();
        if let Some(dir) = raw.state_dir {
            config.state_dir = dir;
        }
        if let Some(root) = raw.data_root {
            config.data_root = root;
        }
        if let Some(kind) = raw.default_type {
            config.default_type = kind;
        }
        config.sources.extend(raw.sources);
        config.profiles.extend(raw.profiles);
        Ok(config)
    }

    /// Source paths for a profile key, resolved against `data_root`.
    pub fn source_paths(&self, key: &str) -> Option<SourcePaths> {
        self.sources.get(key).map(|p| p.resolve(&self.data_root))
    }

    /// State directory of one legislation type.
    pub fn state_dir_for(&self, key: &str) -> PathBuf {
        self.state_dir.join(key)
    }

    /// Built-in profiles plus those defined in the config file.
    pub fn field_mapper(&self) -> Result<FieldMapper, ConfigError> {
        let mut mapper = FieldMapper::builtin();
        for (key, raw) in &self.profiles {
            mapper.insert(build_profile(key, raw)?)?;
        }
        Ok(mapper)
    }
}

fn build_profile(key: &str, raw: &ProfileConfig) -> Result<LegislationTypeProfile, ConfigError> {
    let mut columns = IndexMap::new();
    for (name, pair) in &raw.columns {
        let field = CanonicalField::from_key(name).ok_or_else(|| ConfigError::UnknownField {
            profile: key.to_string(),
            field: name.clone(),
        })?;
        columns.insert(field, pair.clone());
    }
    Ok(LegislationTypeProfile {
        key: key.to_string(),
        aliases: raw.aliases.clone(),
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lawrecon_core::{ProfileError, Side};

    #[test]
    fn defaults_cover_builtin_types() {
        let config = Config::default();
        let mapper = config.field_mapper().unwrap();
        for p in mapper.profiles() {
            assert!(config.source_paths(&p.key).is_some(), "{}", p.key);
        }
        assert_eq!(config.default_type, "bylaw");
    }

    #[test]
    fn relative_paths_resolve_against_data_root() {
        let config = Config::from_toml_str(r#"data_root = "/srv/legis""#).unwrap();
        let paths = config.source_paths("law").unwrap();
        assert_eq!(
            paths.a,
            PathBuf::from("/srv/legis/extData/Laws/Qis_Laws_V2.xlsx")
        );
    }

    #[test]
    fn each_type_gets_its_own_state_dir() {
        let config = Config::from_toml_str(r#"state_dir = "/var/lib/lawrecon""#).unwrap();
        assert_eq!(
            config.state_dir_for("law"),
            PathBuf::from("/var/lib/lawrecon/law")
        );
    }

    #[test]
    fn file_sources_merge_over_defaults() {
        let config = Config::from_toml_str(
            r#"
            state_dir = "/var/lib/lawrecon"
            [sources.law]
            a = "laws_a.parquet"
            b = "laws_b.parquet"
            "#,
        )
        .unwrap();
        assert_eq!(config.state_dir, PathBuf::from("/var/lib/lawrecon"));
        assert_eq!(config.sources["law"].a, PathBuf::from("laws_a.parquet"));
        assert!(config.sources.contains_key("bylaw"));
    }

    #[test]
    fn unknown_top_level_key_rejected() {
        assert!(Config::from_toml_str("stat_dir = \"x\"").is_err());
    }

    #[test]
    fn misspelled_keys_inside_tables_rejected() {
        let alias_typo = r#"
            [profiles.decree]
            alias = ["مرسوم"]
            "#;
        assert!(Config::from_toml_str(alias_typo).is_err());

        let side_typo = r#"
            [profiles.decree.columns]
            name = { a = "LegName", c = "Decree_Name" }
            "#;
        assert!(Config::from_toml_str(side_typo).is_err());

        let source_typo = r#"
            [sources.law]
            a = "a.xlsx"
            b = "b.xlsx"
            c = "c.xlsx"
            "#;
        assert!(Config::from_toml_str(source_typo).is_err());
    }

    #[test]
    fn config_profile_added_to_mapper() {
        let config = Config::from_toml_str(
            r#"
            [profiles.decree]
            aliases = ["مرسوم"]
            [profiles.decree.columns]
            name = { a = "LegName", b = "Decree_Name" }
            number = { a = "LegNumber", b = "Decree_Number" }
            status = { a = "Status", b = "Status" }
            canceledBy = { a = "Canceled By" }
            "#,
        )
        .unwrap();
        let mapper = config.field_mapper().unwrap();
        let p = mapper.resolve("مرسوم").unwrap();
        assert_eq!(p.key, "decree");
        assert_eq!(p.column(CanonicalField::Name, Side::B), Some("Decree_Name"));
    }

    #[test]
    fn invalid_config_profile_is_an_error() {
        let config = Config::from_toml_str(
            r#"
            [profiles.decree.columns]
            name = { a = "LegName", b = "Decree_Name" }
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.field_mapper(),
            Err(ConfigError::Profile(ProfileError::MissingRequired { .. }))
        ));
    }

    #[test]
    fn unknown_profile_field_is_an_error() {
        let config = Config::from_toml_str(
            r#"
            [profiles.decree.columns]
            title = { a = "Title", b = "Title" }
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.field_mapper(),
            Err(ConfigError::UnknownField { .. })
        ));
    }
}
