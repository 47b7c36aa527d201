use std::{collections::BTreeSet, time::Instant};

use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    enablement::FieldEnablement,
    error::Result,
    identity::RecordIdentity,
    provider::{EntityProvider, SourceRecord},
    record::IndexRecord,
    store::IndexStore,
    text::TextProcessor,
};

/// Counts from one full build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub collections: usize,
    pub entity_types: usize,
    pub records: usize,
}

/// Analyse one source record into an index record.
///
/// Only string values of enabled fields are indexed; anything else is
/// skipped, so the record simply has no entry for that field.
pub fn analyse_record(
    identity: RecordIdentity,
    source: &SourceRecord,
    fields: &BTreeSet<String>,
    text: &dyn TextProcessor,
) -> IndexRecord {
    let mut record = IndexRecord::new(identity);
    for field in fields {
        let Some(Value::String(content)) = source.values.get(field) else {
            continue;
        };
        record.tokens.insert(field.clone(), text.tokenize(content));
        record.clean_text.insert(field.clone(), text.clean(content));
    }
    record
}

/// Rebuild `store` from scratch out of every enabled type of every
/// collection in `collections`.
///
/// The store is cleared first. Records are analysed in parallel but keep
/// the provider's order.
pub fn build_index(
    provider: &dyn EntityProvider,
    enablement: &dyn FieldEnablement,
    text: &dyn TextProcessor,
    collections: &[String],
    store: &mut IndexStore,
) -> Result<BuildReport> {
    let start = Instant::now();
    store.clear();
    let mut report = BuildReport::default();

    for collection in collections {
        report.collections += 1;
        for entity_type in provider.list_entity_types(collection)? {
            if !enablement.is_type_enabled(collection, &entity_type) {
                debug!(%collection, %entity_type, "type disabled, skipping");
                continue;
            }
            let fields = enablement.enabled_fields(collection, &entity_type);
            if fields.is_empty() {
                debug!(%collection, %entity_type, "no enabled fields, skipping");
                continue;
            }

            let sources: Vec<SourceRecord> = provider
                .iterate_records(collection, &entity_type)?
                .collect();
            let records: Vec<IndexRecord> = sources
                .par_iter()
                .map(|source| {
                    let identity = RecordIdentity::new(
                        collection.as_str(),
                        entity_type.as_str(),
                        source.primary_key.as_str(),
                    );
                    analyse_record(identity, source, &fields, text)
                })
                .collect();

            debug!(
                %collection,
                %entity_type,
                records = records.len(),
                "indexed entity type"
            );
            report.entity_types += 1;
            report.records += records.len();
            store.extend(records);
        }
    }

    info!(
        collections = report.collections,
        entity_types = report.entity_types,
        records = report.records,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "built index"
    );
    Ok(report)
}
