use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    record::IndexRecord,
    result_set::{MatchResult, MatchStrategy, ResultSet},
    store::IndexStore,
    text::TextProcessor,
};

/// Regex matching only runs for raw queries of at most this many chars.
pub const REGEX_MAX_QUERY_CHARS: usize = 2;

/// Which strategies a combined query runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryOptions {
    pub full_match: bool,
    pub word_match: bool,
    pub regex_match: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            full_match: true,
            word_match: true,
            regex_match: false,
        }
    }
}

/// Runs the matching strategies against a read-only store snapshot.
///
/// Every strategy scans the whole store; there is no per-term index.
pub struct MatchEngine<'a> {
    store: &'a IndexStore,
    text: &'a dyn TextProcessor,
}

impl<'a> MatchEngine<'a> {
    pub fn new(store: &'a IndexStore, text: &'a dyn TextProcessor) -> Self {
        Self { store, text }
    }

    /// Substring match of the cleaned query against each field's clean
    /// text. At most one result per record, all scored 1.0.
    ///
    /// A query that cleans down to the empty string matches every record.
    pub fn full_match(&self, raw: &str) -> ResultSet<'a> {
        let query = self.text.clean(raw);
        let mut set = ResultSet::new();
        for record in self.store.records() {
            if record.clean_text.values().any(|text| text.contains(&query)) {
                set.add(MatchResult {
                    identity: record.identity(),
                    query_raw: raw.to_string(),
                    query_token_count: 1,
                    strategy: MatchStrategy::FullMatch,
                    matched_token_count: 1,
                    score: 1.0,
                });
            }
        }
        set
    }

    /// Token overlap: the share of query tokens found in any field of the
    /// record. Records scoring zero are left out, and so is everything
    /// when the query has no tokens.
    pub fn word_match(&self, raw: &str) -> ResultSet<'a> {
        let query_tokens = self.text.tokenize(raw);
        let mut set = ResultSet::new();
        for record in self.store.records() {
            let matched = count_matched_tokens(record, &query_tokens);
            let score = word_score(matched, query_tokens.len());
            if score > 0.0 {
                set.add(MatchResult {
                    identity: record.identity(),
                    query_raw: raw.to_string(),
                    query_token_count: query_tokens.len(),
                    strategy: MatchStrategy::WordMatch,
                    matched_token_count: matched,
                    score,
                });
            }
        }
        set
    }

    /// Search each field's clean text for `pattern`. At most one result
    /// per record, all scored 0.0.
    pub fn regex_match(&self, pattern: &str) -> Result<ResultSet<'a>> {
        let regex = Regex::new(pattern)?;
        let mut set = ResultSet::new();
        for record in self.store.records() {
            if record.clean_text.values().any(|text| regex.is_match(text)) {
                set.add(MatchResult {
                    identity: record.identity(),
                    query_raw: pattern.to_string(),
                    query_token_count: 1,
                    strategy: MatchStrategy::RegexMatch,
                    matched_token_count: 1,
                    score: 0.0,
                });
            }
        }
        Ok(set)
    }

    /// Run the enabled strategies (full, word, then regex for very short
    /// queries), keep the first result per record and rank by score.
    ///
    /// Because full matches are merged first, a record found by several
    /// strategies keeps its full-match result.
    pub fn query(
        &self,
        raw: &str,
        options: &QueryOptions,
    ) -> Result<ResultSet<'a>> {
        let mut all = ResultSet::new();

        if options.full_match {
            all.extend(self.full_match(raw));
        }
        if options.word_match {
            all.extend(self.word_match(raw));
        }
        if options.regex_match
            && raw.chars().count() <= REGEX_MAX_QUERY_CHARS
        {
            all.extend(self.regex_match(&regex_pattern(raw))?);
        }

        all.remove_duplicates();
        all.all();
        Ok(all)
    }
}

/// Number of distinct query-token positions present in any field.
fn count_matched_tokens(record: &IndexRecord, query_tokens: &[String]) -> usize {
    query_tokens
        .iter()
        .filter(|token| {
            record
                .tokens
                .values()
                .any(|field_tokens| field_tokens.contains(token))
        })
        .count()
}

/// `matched / total`, or 0.0 for an empty query.
fn word_score(matched: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    matched as f32 / total as f32
}

/// Literal characters of `raw` joined by `\w`, so `ab` becomes `a\wb`.
pub fn regex_pattern(raw: &str) -> String {
    raw.chars()
        .map(|c| regex::escape(c.encode_utf8(&mut [0; 4])))
        .collect::<Vec<_>>()
        .join(r"\w")
}

/// A ranked result ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResult {
    pub rank: usize,
    pub score: f32,
    pub strategy: MatchStrategy,
    pub collection: String,
    pub entity_type: String,
    pub primary_key: String,
    pub matched_token_count: usize,
    pub query_token_count: usize,
}

/// Run a combined query and keep at most `limit` results.
pub fn execute_query(
    store: &IndexStore,
    text: &dyn TextProcessor,
    raw: &str,
    options: &QueryOptions,
    limit: Option<usize>,
) -> Result<Vec<RankedResult>> {
    let engine = MatchEngine::new(store, text);
    let results = engine.query(raw, options)?;

    Ok(results
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .enumerate()
        .map(|(i, r)| RankedResult {
            rank: i + 1,
            score: r.score,
            strategy: r.strategy,
            collection: r.identity.collection().to_string(),
            entity_type: r.identity.entity_type().to_string(),
            primary_key: r.identity.primary_key().to_string(),
            matched_token_count: r.matched_token_count,
            query_token_count: r.query_token_count,
        })
        .collect())
}

/// Format results for human-readable terminal output.
pub fn format_human(results: &[RankedResult]) {
    if results.is_empty() {
        println!("No results found.");
        return;
    }

    for r in results {
        println!(
            "{:>3}. [{:.3}] {}.{}:{} ({})",
            r.rank,
            r.score,
            r.collection,
            r.entity_type,
            r.primary_key,
            r.strategy.as_str()
        );
    }
    println!("\n{} result(s)", results.len());
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    query: &'a str,
    result_count: usize,
    results: &'a [RankedResult],
}

/// Format results as JSON output.
pub fn format_json(results: &[RankedResult], query: &str) -> Result<()> {
    let output = JsonOutput {
        query,
        result_count: results.len(),
        results,
    };
    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}
