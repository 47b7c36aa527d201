//! Which entity types and fields get indexed.
//!
//! Both settings live in human-editable TOML files in the enablement
//! directory. The type file has one table per collection:
//!
//! ```toml
//! [blog]
//! Comment = false
//! Post = true
//! ```
//!
//! and each collection has its own field file with one table per type:
//!
//! ```toml
//! [Post]
//! body = true
//! title = true
//! ```
//!
//! `scan_types` and `scan_fields` (re)generate these files from an
//! [`EntityProvider`], keeping any value a human already set.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    config::SearchConfig,
    error::Result,
    provider::EntityProvider,
};

/// Name → enabled flag, for types or fields.
type Switches = BTreeMap<String, bool>;

/// Answers which types and fields of a collection are indexed.
pub trait FieldEnablement {
    fn is_type_enabled(&self, collection: &str, entity_type: &str) -> bool;

    fn enabled_fields(
        &self,
        collection: &str,
        entity_type: &str,
    ) -> BTreeSet<String>;
}

/// Type and field switches loaded from the enablement files.
///
/// Anything not listed is disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnablementConfig {
    /// collection → type → enabled
    types: BTreeMap<String, Switches>,
    /// collection → type → field → enabled
    fields: BTreeMap<String, BTreeMap<String, Switches>>,
}

impl EnablementConfig {
    /// Read the type file and every configured collection's field file.
    /// Missing files count as empty.
    pub fn load(config: &SearchConfig, dir: &Path) -> Result<Self> {
        let types = read_toml(&config.type_config_path(dir))?;
        let mut fields = BTreeMap::new();
        for collection in &config.collections {
            let path = config.field_config_path(dir, collection);
            fields.insert(collection.clone(), read_toml(&path)?);
        }
        Ok(Self { types, fields })
    }

    pub fn set_type(&mut self, collection: &str, entity_type: &str, on: bool) {
        self.types
            .entry(collection.to_string())
            .or_default()
            .insert(entity_type.to_string(), on);
    }

    pub fn set_field(
        &mut self,
        collection: &str,
        entity_type: &str,
        field: &str,
        on: bool,
    ) {
        self.fields
            .entry(collection.to_string())
            .or_default()
            .entry(entity_type.to_string())
            .or_default()
            .insert(field.to_string(), on);
    }
}

impl FieldEnablement for EnablementConfig {
    fn is_type_enabled(&self, collection: &str, entity_type: &str) -> bool {
        self.types
            .get(collection)
            .and_then(|types| types.get(entity_type))
            .copied()
            .unwrap_or(false)
    }

    fn enabled_fields(
        &self,
        collection: &str,
        entity_type: &str,
    ) -> BTreeSet<String> {
        self.fields
            .get(collection)
            .and_then(|types| types.get(entity_type))
            .map(|fields| {
                fields
                    .iter()
                    .filter(|(_, on)| **on)
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Write the type file listing every entity type of every configured
/// collection. Returns the path written.
///
/// Types already in the file keep their value; new ones get
/// `default_type_enabled`.
pub fn scan_types(
    provider: &dyn EntityProvider,
    config: &SearchConfig,
    dir: &Path,
) -> Result<PathBuf> {
    let path = config.type_config_path(dir);
    let mut file: BTreeMap<String, Switches> = read_toml(&path)?;

    for collection in &config.collections {
        let switches = file.entry(collection.clone()).or_default();
        for entity_type in provider.list_entity_types(collection)? {
            debug!(%collection, %entity_type, "found entity type");
            switches
                .entry(entity_type)
                .or_insert(config.default_type_enabled);
        }
    }

    write_toml(&path, &file)?;
    info!(path = %path.display(), "wrote type config");
    Ok(path)
}

/// Write one field file per configured collection, listing the fields of
/// every enabled type whose kind is in `supported_field_kinds`. Returns
/// the paths written.
///
/// Fields already in a file keep their value; new ones get
/// `default_field_enabled`.
pub fn scan_fields(
    provider: &dyn EntityProvider,
    config: &SearchConfig,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let enablement = EnablementConfig::load(config, dir)?;
    let mut written = Vec::new();

    for collection in &config.collections {
        let path = config.field_config_path(dir, collection);
        let mut file: BTreeMap<String, Switches> = read_toml(&path)?;

        for entity_type in provider.list_entity_types(collection)? {
            if !enablement.is_type_enabled(collection, &entity_type) {
                continue;
            }
            let switches = file.entry(entity_type.clone()).or_default();
            for (field, kind) in
                provider.list_fields(collection, &entity_type)?
            {
                if config.supported_field_kinds.contains(&kind) {
                    debug!(%collection, %entity_type, %field, "found field");
                    switches
                        .entry(field)
                        .or_insert(config.default_field_enabled);
                }
            }
        }

        write_toml(&path, &file)?;
        info!(path = %path.display(), "wrote field config");
        written.push(path);
    }

    Ok(written)
}

fn read_toml<T: serde::de::DeserializeOwned + Default>(
    path: &Path,
) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let data = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&data)?)
}

fn write_toml<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(value)?)?;
    Ok(())
}
