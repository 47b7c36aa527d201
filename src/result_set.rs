use std::collections::HashSet;

use serde::Serialize;

use crate::identity::RecordIdentity;

/// Which matching strategy produced a [`MatchResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    FullMatch,
    WordMatch,
    RegexMatch,
}

impl MatchStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStrategy::FullMatch => "full",
            MatchStrategy::WordMatch => "word",
            MatchStrategy::RegexMatch => "regex",
        }
    }
}

/// One strategy's claim that a record matches a query.
///
/// Borrows the identity from the [`IndexRecord`](crate::IndexRecord) it
/// was produced from, so results cannot outlive the store snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult<'a> {
    pub identity: &'a RecordIdentity,
    /// The raw query string, or the derived pattern for regex matches.
    pub query_raw: String,
    pub query_token_count: usize,
    pub strategy: MatchStrategy,
    pub matched_token_count: usize,
    pub score: f32,
}

/// Ordered collection of match results for a single query.
#[derive(Debug, Clone, Default)]
pub struct ResultSet<'a> {
    results: Vec<MatchResult<'a>>,
}

impl<'a> ResultSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: MatchResult<'a>) {
        self.results.push(result);
    }

    /// Append every result of `other`, keeping its order.
    pub fn extend(&mut self, other: ResultSet<'a>) {
        self.results.extend(other.results);
    }

    /// Sort by descending score and return the results.
    ///
    /// The sort is stable, so equal scores keep their merge order. The
    /// set stays sorted afterwards.
    pub fn all(&mut self) -> &[MatchResult<'a>] {
        self.results.sort_by(|a, b| b.score.total_cmp(&a.score));
        &self.results
    }

    /// Keep only the first result for each identity.
    pub fn remove_duplicates(&mut self) {
        let mut seen = HashSet::new();
        self.results.retain(|r| seen.insert(r.identity));
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterate in the current internal order.
    pub fn iter(&self) -> std::slice::Iter<'_, MatchResult<'a>> {
        self.results.iter()
    }
}

impl<'a> IntoIterator for ResultSet<'a> {
    type Item = MatchResult<'a>;
    type IntoIter = std::vec::IntoIter<MatchResult<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}
