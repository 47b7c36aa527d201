use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    error::Result,
    identity::{RecordIdentity, check_component},
    record::IndexRecord,
};

pub const CLEAN_DATA_FILE: &str = "clean_data.json";
pub const KEYWORDS_FILE: &str = "keywords.json";

/// The full in-memory sequence of index records.
///
/// Persisted as
/// `<index_dir>/<collection>/<entity_type>/<primary_key>/{clean_data,keywords}.json`.
#[derive(Debug, Clone, Default)]
pub struct IndexStore {
    records: Vec<IndexRecord>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append an independent copy of `record`.
    pub fn add(&mut self, record: &IndexRecord) {
        self.records.push(record.clone());
    }

    /// Append records the caller no longer needs.
    pub fn extend(&mut self, records: impl IntoIterator<Item = IndexRecord>) {
        self.records.extend(records);
    }

    /// Drop every in-memory record. Files on disk are left alone.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Read every record under `base_dir` and append it to the store.
    ///
    /// Only the collection directories named in `collections` are read; an
    /// empty set reads all of them. A missing `base_dir` leaves the store
    /// as it is. Any unreadable or malformed file fails the whole load and
    /// appends nothing.
    pub fn load(
        &mut self,
        base_dir: &Path,
        collections: &BTreeSet<String>,
    ) -> Result<()> {
        if !base_dir.exists() {
            warn!(path = %base_dir.display(), "index directory not found");
            return Ok(());
        }

        let start = Instant::now();
        let mut found = Vec::new();
        for (collection, collection_dir) in sorted_subdirs(base_dir)? {
            if !collections.is_empty() && !collections.contains(&collection) {
                continue;
            }
            for (entity_type, type_dir) in sorted_subdirs(&collection_dir)? {
                for (primary_key, record_dir) in sorted_subdirs(&type_dir)? {
                    let identity = RecordIdentity::new(
                        collection.as_str(),
                        entity_type.as_str(),
                        primary_key,
                    );
                    found.push((identity, record_dir));
                }
            }
        }

        let loaded = found
            .into_par_iter()
            .map(|(identity, dir)| read_record(identity, &dir))
            .collect::<Result<Vec<_>>>()?;

        info!(
            records = loaded.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "loaded index"
        );
        self.records.extend(loaded);
        Ok(())
    }

    /// Write every record under `base_dir`, overwriting existing files.
    ///
    /// Directories for all of `collections` are created even when they
    /// hold no records. Records are written in parallel; a failure part way
    /// through leaves earlier writes in place.
    pub fn save(
        &self,
        base_dir: &Path,
        collections: &BTreeSet<String>,
    ) -> Result<()> {
        for collection in collections {
            check_component("collection", collection)?;
            create_dir(&base_dir.join(collection))?;
        }

        let start = Instant::now();
        self.records
            .par_iter()
            .try_for_each(|record| write_record(record, base_dir))?;

        info!(
            records = self.records.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "saved index"
        );
        Ok(())
    }
}

/// `(name, path)` of every subdirectory of `dir`, sorted by name.
fn sorted_subdirs(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            debug!(path = %entry.path().display(), "skipping non-directory");
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            warn!(path = %entry.path().display(), "skipping non-UTF-8 directory");
            continue;
        };
        dirs.push((name, entry.path()));
    }
    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(dirs)
}

fn read_record(identity: RecordIdentity, dir: &Path) -> Result<IndexRecord> {
    let mut record = IndexRecord::new(identity);

    let path = dir.join(CLEAN_DATA_FILE);
    let data = std::fs::read_to_string(&path)?;
    record
        .deserialize_clean_text(&data)
        .map_err(|e| e.in_file(&path))?;

    let path = dir.join(KEYWORDS_FILE);
    let data = std::fs::read_to_string(&path)?;
    record
        .deserialize_tokens(&data)
        .map_err(|e| e.in_file(&path))?;

    Ok(record)
}

fn write_record(record: &IndexRecord, base_dir: &Path) -> Result<()> {
    let dir = record.identity().dir_under(base_dir)?;
    create_dir(&dir)?;

    let path = dir.join(CLEAN_DATA_FILE);
    std::fs::write(&path, record.serialize_clean_text()?)?;
    debug!(path = %path.display(), "wrote index file");

    let path = dir.join(KEYWORDS_FILE);
    std::fs::write(&path, record.serialize_tokens()?)?;
    debug!(path = %path.display(), "wrote index file");

    Ok(())
}

/// Create `path` and its parents; an existing directory is fine.
fn create_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        std::fs::create_dir_all(path)?;
        debug!(path = %path.display(), "created directory");
    }
    Ok(())
}

/// Process-wide handle to the index, loaded from disk on first use.
///
/// Queries take an `Arc` snapshot from [`LazyStore::get`]; a rebuild swaps
/// in a new snapshot with [`LazyStore::replace`] without disturbing
/// queries that still hold the old one.
#[derive(Debug)]
pub struct LazyStore {
    base_dir: PathBuf,
    collections: BTreeSet<String>,
    store: RwLock<Option<Arc<IndexStore>>>,
}

impl LazyStore {
    /// The store is not read until the first call to [`LazyStore::get`].
    pub fn new(base_dir: PathBuf, collections: BTreeSet<String>) -> Self {
        Self {
            base_dir,
            collections,
            store: RwLock::new(None),
        }
    }

    /// Returns `true` if the index has been loaded (or replaced).
    pub fn is_loaded(&self) -> bool {
        self.store.read().is_some()
    }

    /// The current snapshot, loading it from disk if nothing is held.
    pub fn get(&self) -> Result<Arc<IndexStore>> {
        if let Some(store) = self.store.read().as_ref() {
            return Ok(Arc::clone(store));
        }

        let mut slot = self.store.write();
        if let Some(store) = slot.as_ref() {
            return Ok(Arc::clone(store));
        }

        let mut store = IndexStore::new();
        store.load(&self.base_dir, &self.collections)?;
        let store = Arc::new(store);
        *slot = Some(Arc::clone(&store));
        Ok(store)
    }

    /// Install `store` as the current snapshot.
    pub fn replace(&self, store: IndexStore) -> Arc<IndexStore> {
        let store = Arc::new(store);
        *self.store.write() = Some(Arc::clone(&store));
        store
    }

    /// Drop the held snapshot; the next [`LazyStore::get`] reloads.
    pub fn clear(&self) {
        *self.store.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn record(collection: &str, ty: &str, pk: &str, text: &str) -> IndexRecord {
        let mut record = IndexRecord::new(RecordIdentity::new(collection, ty, pk));
        record.clean_text.insert("title".to_string(), text.to_string());
        record.tokens.insert(
            "title".to_string(),
            text.split_whitespace().map(str::to_string).collect(),
        );
        record
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn add_stores_independent_copy() {
        let mut store = IndexStore::new();
        let mut working = record("blog", "Post", "1", "red fox");
        store.add(&working);

        working.clean_text.insert("title".to_string(), "changed".into());
        working.tokens.clear();
        store.add(&working);

        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0].clean_text["title"], "red fox");
        assert_eq!(store.records()[0].tokens["title"], vec!["red", "fox"]);
        assert_eq!(store.records()[1].clean_text["title"], "changed");
    }

    #[test]
    fn clear_leaves_disk_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = IndexStore::new();
        store.add(&record("blog", "Post", "1", "red fox"));
        store.save(tmp.path(), &set(&["blog"])).unwrap();

        store.clear();
        assert!(store.is_empty());
        assert!(tmp.path().join("blog/Post/1").join(KEYWORDS_FILE).exists());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = IndexStore::new();
        store.add(&record("blog", "Post", "1", "red fox jumps"));
        store.add(&record("blog", "Post", "2", "北京 欢迎 你"));
        store.add(&record("shop", "Item", "9", "blue whale"));
        store.save(tmp.path(), &set(&["blog", "shop"])).unwrap();

        let mut loaded = IndexStore::new();
        loaded.load(tmp.path(), &BTreeSet::new()).unwrap();

        assert_eq!(loaded.records(), store.records());
    }

    #[test]
    fn save_writes_expected_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = IndexStore::new();
        store.add(&record("blog", "Post", "1", "ünïcode text"));
        store.save(tmp.path(), &set(&["blog", "empty"])).unwrap();

        let dir = tmp.path().join("blog").join("Post").join("1");
        assert_eq!(
            std::fs::read_to_string(dir.join(CLEAN_DATA_FILE)).unwrap(),
            r#"{"title":"ünïcode text"}"#
        );
        assert_eq!(
            std::fs::read_to_string(dir.join(KEYWORDS_FILE)).unwrap(),
            r#"{"title":["ünïcode","text"]}"#
        );
        assert!(tmp.path().join("empty").is_dir());
    }

    #[test]
    fn save_overwrites_and_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = IndexStore::new();
        store.add(&record("blog", "Post", "1", "old"));
        store.save(tmp.path(), &set(&["blog"])).unwrap();

        store.clear();
        store.add(&record("blog", "Post", "1", "new"));
        store.save(tmp.path(), &set(&["blog"])).unwrap();
        store.save(tmp.path(), &set(&["blog"])).unwrap();

        let mut loaded = IndexStore::new();
        loaded.load(tmp.path(), &set(&["blog"])).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.records()[0].clean_text["title"], "new");
    }

    #[test]
    fn load_missing_dir_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = IndexStore::new();
        store
            .load(&tmp.path().join("does-not-exist"), &set(&["blog"]))
            .unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn load_filters_collections() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = IndexStore::new();
        store.add(&record("blog", "Post", "1", "a"));
        store.add(&record("shop", "Item", "1", "b"));
        store.save(tmp.path(), &set(&["blog", "shop"])).unwrap();

        let mut loaded = IndexStore::new();
        loaded.load(tmp.path(), &set(&["shop"])).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.records()[0].identity().collection(), "shop");
    }

    #[test]
    fn load_skips_stray_files() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = IndexStore::new();
        store.add(&record("blog", "Post", "1", "a"));
        store.save(tmp.path(), &set(&["blog"])).unwrap();
        std::fs::write(tmp.path().join("README"), "notes").unwrap();
        std::fs::write(tmp.path().join("blog").join(".DS_Store"), "").unwrap();

        let mut loaded = IndexStore::new();
        loaded.load(tmp.path(), &BTreeSet::new()).unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn load_skips_non_utf8_dirs() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let tmp = tempfile::tempdir().unwrap();
        let mut store = IndexStore::new();
        store.add(&record("blog", "Post", "1", "a"));
        store.save(tmp.path(), &set(&["blog"])).unwrap();

        let post = tmp.path().join("blog").join("Post");
        for name in [b"bad\xff".as_slice(), b"bad\xfe".as_slice()] {
            let dir = post.join(OsStr::from_bytes(name));
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(CLEAN_DATA_FILE), "{}").unwrap();
            std::fs::write(dir.join(KEYWORDS_FILE), "{}").unwrap();
        }

        let mut loaded = IndexStore::new();
        loaded.load(tmp.path(), &BTreeSet::new()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.records()[0].identity().primary_key(), "1");
    }

    #[test]
    fn load_fails_on_malformed_file() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = IndexStore::new();
        store.add(&record("blog", "Post", "1", "a"));
        store.add(&record("blog", "Post", "2", "b"));
        store.save(tmp.path(), &set(&["blog"])).unwrap();

        let bad = tmp.path().join("blog/Post/2").join(KEYWORDS_FILE);
        std::fs::write(&bad, r#"{"title":"not a list"}"#).unwrap();

        let mut loaded = IndexStore::new();
        let err = loaded.load(tmp.path(), &BTreeSet::new()).unwrap_err();
        match err {
            Error::MalformedIndexData { context, .. } => {
                assert!(context.ends_with(KEYWORDS_FILE), "{context}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(loaded.is_empty(), "a failed load appends nothing");
    }

    #[test]
    fn load_fails_on_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("blog/Post/1")).unwrap();

        let mut loaded = IndexStore::new();
        let err = loaded.load(tmp.path(), &BTreeSet::new()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn save_rejects_bad_primary_key() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = IndexStore::new();
        store.add(&record("blog", "Post", "..", "a"));
        let err = store.save(tmp.path(), &set(&["blog"])).unwrap_err();
        assert!(matches!(err, Error::InvalidPathComponent { .. }));
    }

    #[test]
    fn lazy_store_loads_once_until_cleared() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = IndexStore::new();
        store.add(&record("blog", "Post", "1", "a"));
        store.save(tmp.path(), &set(&["blog"])).unwrap();

        let lazy = LazyStore::new(tmp.path().to_path_buf(), set(&["blog"]));
        assert!(!lazy.is_loaded());

        let first = lazy.get().unwrap();
        assert!(lazy.is_loaded());
        assert_eq!(first.len(), 1);

        // New data on disk is not picked up by an already-loaded store.
        store.add(&record("blog", "Post", "2", "b"));
        store.save(tmp.path(), &set(&["blog"])).unwrap();
        let second = lazy.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);

        lazy.clear();
        assert!(!lazy.is_loaded());
        assert_eq!(lazy.get().unwrap().len(), 2);
        // Snapshots handed out earlier are unaffected.
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn lazy_store_replace() {
        let tmp = tempfile::tempdir().unwrap();
        let lazy = LazyStore::new(tmp.path().join("missing"), BTreeSet::new());
        assert!(lazy.get().unwrap().is_empty());

        let mut rebuilt = IndexStore::new();
        rebuilt.add(&record("blog", "Post", "1", "a"));
        lazy.replace(rebuilt);
        assert_eq!(lazy.get().unwrap().len(), 1);
    }
}
