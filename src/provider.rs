use std::{
    collections::BTreeMap,
    path::PathBuf,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{Error, Result},
    identity::check_component,
};

/// Declared kind of a source field.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Text,
    Integer,
    Float,
    Boolean,
    Other,
}

/// One record as handed over by an [`EntityProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub primary_key: String,
    pub values: BTreeMap<String, Value>,
}

/// Source of the records to index.
///
/// Entity types are namespaced by collection. Asking for an unknown
/// collection or type fails with [`Error::NotFound`].
pub trait EntityProvider {
    fn list_entity_types(&self, collection: &str) -> Result<Vec<String>>;

    fn list_fields(
        &self,
        collection: &str,
        entity_type: &str,
    ) -> Result<Vec<(String, FieldKind)>>;

    fn iterate_records(
        &self,
        collection: &str,
        entity_type: &str,
    ) -> Result<Box<dyn Iterator<Item = SourceRecord> + '_>>;
}

/// Contents of one `<entity_type>.json` source file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntityFile {
    primary_key: String,
    #[serde(default)]
    fields: BTreeMap<String, FieldKind>,
    #[serde(default)]
    records: Vec<serde_json::Map<String, Value>>,
}

/// Reads records from `<root>/<collection>/<entity_type>.json`.
///
/// Each file is an object with the name of the primary key field, the
/// declared field kinds, and the records themselves:
///
/// ```json
/// {
///   "primary_key": "id",
///   "fields": { "title": "string", "body": "text" },
///   "records": [ { "id": 1, "title": "Hello", "body": "..." } ]
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JsonDirProvider {
    root: PathBuf,
}

impl JsonDirProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn collection_dir(&self, collection: &str) -> Result<PathBuf> {
        check_component("collection", collection)?;
        let dir = self.root.join(collection);
        if !dir.is_dir() {
            return Err(Error::NotFound {
                kind: "collection",
                name: collection.to_string(),
            });
        }
        Ok(dir)
    }

    fn read_entity(
        &self,
        collection: &str,
        entity_type: &str,
    ) -> Result<EntityFile> {
        check_component("entity type", entity_type)?;
        let path = self
            .collection_dir(collection)?
            .join(format!("{entity_type}.json"));
        if !path.is_file() {
            return Err(Error::NotFound {
                kind: "entity type",
                name: format!("{collection}.{entity_type}"),
            });
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

impl EntityProvider for JsonDirProvider {
    fn list_entity_types(&self, collection: &str) -> Result<Vec<String>> {
        let dir = self.collection_dir(collection)?;
        let mut types = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("json")
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                types.push(stem.to_string());
            }
        }
        types.sort();
        Ok(types)
    }

    fn list_fields(
        &self,
        collection: &str,
        entity_type: &str,
    ) -> Result<Vec<(String, FieldKind)>> {
        let entity = self.read_entity(collection, entity_type)?;
        Ok(entity.fields.into_iter().collect())
    }

    fn iterate_records(
        &self,
        collection: &str,
        entity_type: &str,
    ) -> Result<Box<dyn Iterator<Item = SourceRecord> + '_>> {
        let entity = self.read_entity(collection, entity_type)?;
        let mut records = Vec::with_capacity(entity.records.len());
        for values in entity.records {
            let primary_key = match values.get(&entity.primary_key) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                other => {
                    return Err(Error::Config(format!(
                        "{collection}.{entity_type}: primary key '{}' must be \
                         a string or number, got {other:?}",
                        entity.primary_key
                    )));
                }
            };
            records.push(SourceRecord {
                primary_key,
                values: values.into_iter().collect(),
            });
        }
        Ok(Box::new(records.into_iter()))
    }
}
