use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Names one indexed entity: `(collection, entity_type, primary_key)`.
///
/// The identity is the only thing compared when deduplicating results.
///
/// # Examples
///
/// ```
/// use keysift::RecordIdentity;
///
/// let id = RecordIdentity::new("blog", "Post", "12");
/// assert_eq!(id.to_string(), "blog.Post:12");
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
pub struct RecordIdentity {
    collection: String,
    entity_type: String,
    primary_key: String,
}

impl RecordIdentity {
    pub fn new(
        collection: impl Into<String>,
        entity_type: impl Into<String>,
        primary_key: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            entity_type: entity_type.into(),
            primary_key: primary_key.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// `<base>/<collection>/<entity_type>/<primary_key>`, with every part
    /// checked to be a single plain directory name.
    pub fn dir_under(&self, base: &Path) -> Result<PathBuf> {
        check_component("collection", &self.collection)?;
        check_component("entity type", &self.entity_type)?;
        check_component("primary key", &self.primary_key)?;
        Ok(base
            .join(&self.collection)
            .join(&self.entity_type)
            .join(&self.primary_key))
    }
}

impl std::fmt::Display for RecordIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}:{}",
            self.collection, self.entity_type, self.primary_key
        )
    }
}

/// Reject values that would not map to exactly one directory level.
pub fn check_component(kind: &'static str, value: &str) -> Result<()> {
    let invalid = || Error::InvalidPathComponent {
        kind,
        value: value.to_string(),
    };
    if value.is_empty() || value.contains(['/', '\\']) {
        return Err(invalid());
    }
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid()),
    }
}
