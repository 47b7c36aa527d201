use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    data_dir::DataDir,
    error::{Error, Result},
    identity::check_component,
    provider::FieldKind,
    search::QueryOptions,
    text::TextOptions,
};

fn default_true() -> bool {
    true
}

fn default_supported_field_kinds() -> Vec<FieldKind> {
    vec![FieldKind::String, FieldKind::Text]
}

fn default_type_config_filename() -> String {
    "types.toml".to_string()
}

fn default_field_config_suffix() -> String {
    "_fields.toml".to_string()
}

/// Settings read from `keysift.toml`.
///
/// Unknown keys are an error rather than being ignored.
///
/// ```
/// use keysift::SearchConfig;
///
/// let config: SearchConfig = toml::from_str(
///     r#"
///     collections = ["blog"]
///
///     [query]
///     regex_match = true
///     "#,
/// )
/// .unwrap();
/// config.validate().unwrap();
/// assert!(config.query.full_match);
/// assert!(config.query.regex_match);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Collections to scan, index and load.
    pub collections: Vec<String>,

    /// Root of the persisted index tree.
    #[serde(default)]
    pub index_dir: Option<PathBuf>,

    /// Where the type and field enablement files live.
    #[serde(default)]
    pub enablement_dir: Option<PathBuf>,

    /// Root of the JSON record sources.
    #[serde(default)]
    pub source_dir: Option<PathBuf>,

    /// Value given to newly discovered entity types by `scan-types`.
    #[serde(default = "default_true")]
    pub default_type_enabled: bool,

    /// Value given to newly discovered fields by `scan-fields`.
    #[serde(default = "default_true")]
    pub default_field_enabled: bool,

    /// Field kinds that `scan-fields` offers for indexing.
    #[serde(default = "default_supported_field_kinds")]
    pub supported_field_kinds: Vec<FieldKind>,

    #[serde(default = "default_type_config_filename")]
    pub type_config_filename: String,

    /// Per-collection field files are named `<collection><suffix>`.
    #[serde(default = "default_field_config_suffix")]
    pub field_config_suffix: String,

    #[serde(default)]
    pub query: QueryOptions,

    #[serde(default)]
    pub text: TextOptions,
}

impl SearchConfig {
    /// A config with the given collections and every other setting at its
    /// default.
    pub fn new(collections: Vec<String>) -> Self {
        Self {
            collections,
            index_dir: None,
            enablement_dir: None,
            source_dir: None,
            default_type_enabled: true,
            default_field_enabled: true,
            supported_field_kinds: default_supported_field_kinds(),
            type_config_filename: default_type_config_filename(),
            field_config_suffix: default_field_config_suffix(),
            query: QueryOptions::default(),
            text: TextOptions::default(),
        }
    }

    /// Parse and validate the config file at `path`.
    ///
    /// Relative directories in the file are resolved against the file's
    /// own directory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::NotFound {
                kind: "config file",
                name: path.display().to_string(),
            });
        }
        let data = std::fs::read_to_string(path)?;
        let mut config: SearchConfig = toml::from_str(&data)?;
        config.validate()?;

        let base = path.parent().unwrap_or(Path::new("."));
        for dir in [
            &mut config.index_dir,
            &mut config.enablement_dir,
            &mut config.source_dir,
        ]
        .into_iter()
        .flatten()
        {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.collections.is_empty() {
            return Err(Error::Config("no collections configured".into()));
        }
        let mut seen = BTreeSet::new();
        for collection in &self.collections {
            check_component("collection", collection)?;
            if !seen.insert(collection) {
                return Err(Error::Config(format!(
                    "collection '{collection}' is listed twice"
                )));
            }
        }
        if self.type_config_filename.is_empty() {
            return Err(Error::Config("type_config_filename is empty".into()));
        }
        check_component("type_config_filename", &self.type_config_filename)?;
        if self.field_config_suffix.is_empty() {
            return Err(Error::Config("field_config_suffix is empty".into()));
        }
        if self.field_config_suffix.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "field_config_suffix may not contain a path separator: {}",
                self.field_config_suffix
            )));
        }
        Ok(())
    }

    pub fn collection_set(&self) -> BTreeSet<String> {
        self.collections.iter().cloned().collect()
    }

    pub fn index_dir(&self, data_dir: &DataDir) -> PathBuf {
        self.index_dir
            .clone()
            .unwrap_or_else(|| data_dir.index_dir())
    }

    pub fn enablement_dir(&self, data_dir: &DataDir) -> PathBuf {
        self.enablement_dir
            .clone()
            .unwrap_or_else(|| data_dir.enablement_dir())
    }

    pub fn source_dir(&self, data_dir: &DataDir) -> PathBuf {
        self.source_dir
            .clone()
            .unwrap_or_else(|| data_dir.source_dir())
    }

    pub fn type_config_path(&self, enablement_dir: &Path) -> PathBuf {
        enablement_dir.join(&self.type_config_filename)
    }

    pub fn field_config_path(
        &self,
        enablement_dir: &Path,
        collection: &str,
    ) -> PathBuf {
        enablement_dir.join(format!("{collection}{}", self.field_config_suffix))
    }
}
