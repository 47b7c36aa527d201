//! keysift - field-level keyword search over structured records.
//!
//! Records are pulled from an [`EntityProvider`], tokenized per field with
//! a [tantivy](https://github.com/quickwit-oss/tantivy) analyzer, and kept
//! in an [`IndexStore`] that persists as plain JSON files. Queries run
//! substring, token-overlap and (for very short queries) regex matching
//! through a [`MatchEngine`] and come back merged and ranked.
//!
//! # Quick start
//!
//! ```
//! use keysift::{
//!     Analyzer, IndexRecord, IndexStore, MatchEngine, QueryOptions,
//!     RecordIdentity, TextProcessor,
//! };
//!
//! let text = Analyzer::default();
//! let mut record = IndexRecord::new(RecordIdentity::new("blog", "Post", "1"));
//! record.tokens.insert("title".into(), text.tokenize("Red fox jumps"));
//! record.clean_text.insert("title".into(), text.clean("Red fox jumps"));
//!
//! let mut store = IndexStore::new();
//! store.add(&record);
//!
//! let engine = MatchEngine::new(&store, &text);
//! let results = engine.query("fox", &QueryOptions::default()).unwrap();
//! assert_eq!(results.len(), 1);
//! for r in results.iter() {
//!     println!("{} (score: {:.3})", r.identity, r.score);
//! }
//! ```

pub mod builder;
pub mod config;
pub mod data_dir;
pub mod enablement;
pub mod error;
pub mod identity;
pub mod provider;
pub mod record;
pub mod result_set;
pub mod search;
pub mod store;
pub mod text;

pub use builder::{BuildReport, build_index};
pub use config::SearchConfig;
pub use data_dir::DataDir;
pub use enablement::{EnablementConfig, FieldEnablement};
pub use error::{Error, Result};
pub use identity::RecordIdentity;
pub use provider::{EntityProvider, FieldKind, JsonDirProvider, SourceRecord};
pub use record::IndexRecord;
pub use result_set::{MatchResult, MatchStrategy, ResultSet};
pub use search::{MatchEngine, QueryOptions};
pub use store::{IndexStore, LazyStore};
pub use text::{Analyzer, TextOptions, TextProcessor};
